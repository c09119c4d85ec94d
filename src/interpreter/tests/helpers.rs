//! Test helpers for interpreter tests

use crate::error::EngineError;
use crate::interpreter::{Interpreter, Val};

/// Run a script in a fresh interpreter and render its completion value
pub fn eval_display(source: &str) -> String {
    let mut interp = Interpreter::new();
    let value = interp.run_script(source).expect("Script failed");
    interp.display_val(&value)
}

/// Run a script in a fresh interpreter and return its completion value
pub fn eval(source: &str) -> Val {
    Interpreter::new().run_script(source).expect("Script failed")
}

/// Run a script that must fail and return the engine error
pub fn eval_err(source: &str) -> EngineError {
    match Interpreter::new().run_script(source) {
        Ok(value) => panic!("Expected failure, script returned {:?}", value),
        Err(err) => err,
    }
}

/// Message of the uncaught value a script throws (`"Name: message"` for errors)
pub fn thrown_message(source: &str) -> String {
    match eval_err(source) {
        EngineError::Thrown { message, .. } => message,
        other => panic!("Expected a thrown value, got {:?}", other),
    }
}
