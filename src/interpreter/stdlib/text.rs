//! String and Number stdlib functions

use super::{arg, int_arg, relative_index};
use crate::interpreter::convert::number_to_string;
use crate::interpreter::types::Val;
use crate::interpreter::Interpreter;

type TextResult = Result<Val, Val>;

/// Longest string a padding method will build, in chars
const MAX_STRING_LENGTH: usize = (1 << 29) - 24;

fn this_str(interp: &mut Interpreter, this: &Val, method: &str) -> Result<String, Val> {
    match this {
        Val::Str(s) => Ok(s.clone()),
        Val::Undefined | Val::Null => Err(interp.type_error(&format!(
            "String.prototype.{} called on null or undefined",
            method
        ))),
        other => Ok(interp.display_val(other)),
    }
}

fn str_arg(interp: &Interpreter, args: &[Val], idx: usize) -> String {
    interp.display_val(&arg(args, idx))
}

pub fn to_upper_case(interp: &mut Interpreter, this: &Val) -> TextResult {
    Ok(Val::Str(this_str(interp, this, "toUpperCase")?.to_uppercase()))
}

pub fn to_lower_case(interp: &mut Interpreter, this: &Val) -> TextResult {
    Ok(Val::Str(this_str(interp, this, "toLowerCase")?.to_lowercase()))
}

pub fn trim(interp: &mut Interpreter, this: &Val) -> TextResult {
    Ok(Val::str(this_str(interp, this, "trim")?.trim()))
}

pub fn includes(interp: &mut Interpreter, this: &Val, args: &[Val]) -> TextResult {
    let s = this_str(interp, this, "includes")?;
    Ok(Val::Bool(s.contains(&str_arg(interp, args, 0))))
}

pub fn starts_with(interp: &mut Interpreter, this: &Val, args: &[Val]) -> TextResult {
    let s = this_str(interp, this, "startsWith")?;
    Ok(Val::Bool(s.starts_with(&str_arg(interp, args, 0))))
}

pub fn ends_with(interp: &mut Interpreter, this: &Val, args: &[Val]) -> TextResult {
    let s = this_str(interp, this, "endsWith")?;
    Ok(Val::Bool(s.ends_with(&str_arg(interp, args, 0))))
}

/// str.split(separator); an empty separator splits into characters
pub fn split(interp: &mut Interpreter, this: &Val, args: &[Val]) -> TextResult {
    let s = this_str(interp, this, "split")?;
    let parts: Vec<Val> = match arg(args, 0) {
        Val::Undefined => vec![Val::Str(s)],
        sep => {
            let sep = interp.display_val(&sep);
            if sep.is_empty() {
                s.chars().map(|c| Val::Str(c.to_string())).collect()
            } else {
                s.split(sep.as_str()).map(Val::str).collect()
            }
        }
    };
    Ok(interp.alloc_array(parts))
}

/// str.slice(start?, end?) over characters
pub fn slice(interp: &mut Interpreter, this: &Val, args: &[Val]) -> TextResult {
    let chars: Vec<char> = this_str(interp, this, "slice")?.chars().collect();
    let len = chars.len();
    let start = relative_index(int_arg(interp, args, 0, 0), len);
    let end = relative_index(int_arg(interp, args, 1, len as i64), len);
    let picked: String = if start < end {
        chars[start..end].iter().collect()
    } else {
        String::new()
    };
    Ok(Val::Str(picked))
}

/// str.padStart(width, fill = " ")
pub fn pad_start(interp: &mut Interpreter, this: &Val, args: &[Val]) -> TextResult {
    let s = this_str(interp, this, "padStart")?;
    let width = int_arg(interp, args, 0, 0).max(0) as usize;
    if width > MAX_STRING_LENGTH {
        return Err(interp.make_error_val("RangeError", "Invalid string length"));
    }
    let fill = match arg(args, 1) {
        Val::Undefined => " ".to_string(),
        other => interp.display_val(&other),
    };
    let len = s.chars().count();
    if len >= width || fill.is_empty() {
        return Ok(Val::Str(s));
    }
    let padding: String = fill.chars().cycle().take(width - len).collect();
    Ok(Val::Str(padding + &s))
}

/// num.toFixed(digits)
pub fn to_fixed(interp: &mut Interpreter, this: &Val, args: &[Val]) -> TextResult {
    let n = match this {
        Val::Num(n) => *n,
        _ => return Err(interp.type_error("Number.prototype.toFixed requires a number")),
    };
    let digits = int_arg(interp, args, 0, 0);
    if !(0..=100).contains(&digits) {
        return Err(interp.make_error_val(
            "RangeError",
            "toFixed() digits argument must be between 0 and 100",
        ));
    }
    if !n.is_finite() {
        return Ok(Val::Str(number_to_string(n)));
    }
    Ok(Val::Str(format!("{:.*}", digits as usize, n)))
}
