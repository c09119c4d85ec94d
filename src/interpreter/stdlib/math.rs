//! Math stdlib functions

use super::arg;
use crate::interpreter::types::Val;
use crate::interpreter::Interpreter;

type MathResult = Result<Val, Val>;

fn unary(interp: &Interpreter, args: &[Val], f: impl Fn(f64) -> f64) -> MathResult {
    Ok(Val::Num(f(interp.to_number(&arg(args, 0)))))
}

/// Math.floor(x)
pub fn floor(interp: &mut Interpreter, args: &[Val]) -> MathResult {
    unary(interp, args, f64::floor)
}

/// Math.ceil(x)
pub fn ceil(interp: &mut Interpreter, args: &[Val]) -> MathResult {
    unary(interp, args, f64::ceil)
}

/// Math.abs(x)
pub fn abs(interp: &mut Interpreter, args: &[Val]) -> MathResult {
    unary(interp, args, f64::abs)
}

/// Math.round(x) - halves round towards +Infinity
pub fn round(interp: &mut Interpreter, args: &[Val]) -> MathResult {
    unary(interp, args, |n| (n + 0.5).floor())
}

pub fn sqrt(interp: &mut Interpreter, args: &[Val]) -> MathResult {
    unary(interp, args, f64::sqrt)
}

pub fn pow(interp: &mut Interpreter, args: &[Val]) -> MathResult {
    let base = interp.to_number(&arg(args, 0));
    let exp = interp.to_number(&arg(args, 1));
    Ok(Val::Num(base.powf(exp)))
}

/// Math.max(...xs); `-Infinity` with no arguments, `NaN` if any argument is `NaN`
pub fn max(interp: &mut Interpreter, args: &[Val]) -> MathResult {
    fold(interp, args, f64::NEG_INFINITY, f64::max)
}

/// Math.min(...xs)
pub fn min(interp: &mut Interpreter, args: &[Val]) -> MathResult {
    fold(interp, args, f64::INFINITY, f64::min)
}

fn fold(interp: &Interpreter, args: &[Val], init: f64, pick: fn(f64, f64) -> f64) -> MathResult {
    let mut acc = init;
    for v in args {
        let n = interp.to_number(v);
        if n.is_nan() {
            return Ok(Val::Num(f64::NAN));
        }
        acc = pick(acc, n);
    }
    Ok(Val::Num(acc))
}
