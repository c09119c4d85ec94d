//! Promise stdlib functions

use super::arg;
use crate::interpreter::types::{ObjId, Val};
use crate::interpreter::Interpreter;

/// `new Promise(executor)`
///
/// The executor runs synchronously; a throw from it rejects the promise unless
/// the executor already resolved it.
pub fn construct(interp: &mut Interpreter, args: Vec<Val>) -> Result<Val, Val> {
    let executor = arg(&args, 0);
    if !interp.is_callable_val(&executor) {
        return Err(interp.type_error("Promise resolver is not a function"));
    }

    let promise = interp.new_promise();
    let (resolve, reject) = interp.create_resolving_functions(promise);
    if let Err(e) = interp.call_function(&executor, Val::Undefined, vec![resolve, reject.clone()]) {
        interp.call_function(&reject, Val::Undefined, vec![e])?;
    }
    Ok(Val::Obj(promise))
}

/// Promise.resolve(value); promises pass through unchanged
pub fn resolve(interp: &mut Interpreter, args: Vec<Val>) -> Result<Val, Val> {
    let value = arg(&args, 0);
    if interp.promise_slot(&value).is_some() {
        return Ok(value);
    }
    let promise = interp.new_promise();
    interp.resolve_promise(promise, value);
    Ok(Val::Obj(promise))
}

pub fn reject(interp: &mut Interpreter, args: Vec<Val>) -> Result<Val, Val> {
    let promise = interp.new_promise();
    interp.reject_promise(promise, arg(&args, 0));
    Ok(Val::Obj(promise))
}

fn this_promise(interp: &mut Interpreter, this: &Val, method: &str) -> Result<ObjId, Val> {
    match this.as_obj() {
        Some(id) if interp.promise_slot(this).is_some() => Ok(id),
        _ => Err(interp.type_error(&format!(
            "Method Promise.prototype.{} called on incompatible receiver",
            method
        ))),
    }
}

/// Handlers that are not callable are treated as absent
fn handler(interp: &Interpreter, v: Val) -> Option<Val> {
    interp.is_callable_val(&v).then_some(v)
}

/// promise.then(onFulfilled, onRejected)
pub fn then(interp: &mut Interpreter, this: Val, args: Vec<Val>) -> Result<Val, Val> {
    let id = this_promise(interp, &this, "then")?;
    let on_fulfilled = handler(interp, arg(&args, 0));
    let on_rejected = handler(interp, arg(&args, 1));
    Ok(Val::Obj(interp.promise_then(id, on_fulfilled, on_rejected)))
}

/// promise.catch(onRejected)
pub fn catch(interp: &mut Interpreter, this: Val, args: Vec<Val>) -> Result<Val, Val> {
    let id = this_promise(interp, &this, "catch")?;
    let on_rejected = handler(interp, arg(&args, 0));
    Ok(Val::Obj(interp.promise_then(id, None, on_rejected)))
}
