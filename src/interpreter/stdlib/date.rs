//! Date stdlib functions
//!
//! A date is a heap object holding milliseconds since the Unix epoch.

use chrono::{DateTime, Utc};

use super::arg;
use crate::interpreter::convert::iso_string;
use crate::interpreter::heap::{Object, ObjectKind};
use crate::interpreter::types::Val;
use crate::interpreter::Interpreter;

pub fn now_ms() -> f64 {
    Utc::now().timestamp_millis() as f64
}

/// `new Date()`, `new Date(ms)` or `new Date(isoString)`
pub fn construct(interp: &mut Interpreter, args: &[Val]) -> Result<Val, Val> {
    let ms = match arg(args, 0) {
        Val::Undefined => now_ms(),
        Val::Str(s) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.timestamp_millis() as f64)
            .unwrap_or(f64::NAN),
        other => interp.to_number(&other),
    };
    let proto = interp.protos.date;
    Ok(Val::Obj(
        interp
            .heap
            .alloc(Object::new(ObjectKind::Date(ms), Some(proto))),
    ))
}

fn date_ms(interp: &mut Interpreter, this: &Val) -> Result<f64, Val> {
    if let Some(id) = this.as_obj() {
        if let ObjectKind::Date(ms) = interp.heap.get(id).kind {
            return Ok(ms);
        }
    }
    Err(interp.type_error("this is not a Date object."))
}

/// date.getTime() / date.valueOf()
pub fn get_time(interp: &mut Interpreter, this: &Val) -> Result<Val, Val> {
    date_ms(interp, this).map(Val::Num)
}

/// date.toISOString()
pub fn to_iso_string(interp: &mut Interpreter, this: &Val) -> Result<Val, Val> {
    let ms = date_ms(interp, this)?;
    match iso_string(ms) {
        Some(s) => Ok(Val::Str(s)),
        None => Err(interp.make_error_val("RangeError", "Invalid time value")),
    }
}
