//! JSON stdlib functions

use super::{arg, int_arg};
use crate::interpreter::types::Val;
use crate::interpreter::Interpreter;

/// JSON.stringify(value, replacer?, indent?)
///
/// Replacers are ignored; an indent argument switches to pretty output.
pub fn stringify(interp: &mut Interpreter, args: &[Val]) -> Result<Val, Val> {
    let Some(json) = interp.json_of(&arg(args, 0)) else {
        return Ok(Val::Undefined);
    };
    let pretty = int_arg(interp, args, 2, 0) > 0;
    let text = if pretty {
        serde_json::to_string_pretty(&json)
    } else {
        serde_json::to_string(&json)
    };
    text.map(Val::Str)
        .map_err(|e| interp.type_error(&e.to_string()))
}

/// JSON.parse(text)
pub fn parse(interp: &mut Interpreter, args: &[Val]) -> Result<Val, Val> {
    let text = interp.display_val(&arg(args, 0));
    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(json) => Ok(interp.val_from_json(&json)),
        Err(e) => Err(interp.make_error_val("SyntaxError", &format!("JSON.parse: {}", e))),
    }
}
