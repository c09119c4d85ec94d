//! Error constructors

use super::arg;
use crate::interpreter::types::Val;
use crate::interpreter::Interpreter;

/// `Error(message)`, `new TypeError(message)`, ... (with or without `new`)
pub fn construct(interp: &mut Interpreter, name: &str, args: &[Val]) -> Result<Val, Val> {
    let message = match arg(args, 0) {
        Val::Undefined => String::new(),
        other => interp.display_val(&other),
    };
    Ok(interp.make_error_val(name, &message))
}
