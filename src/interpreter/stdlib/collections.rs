//! Array and Object stdlib functions

use super::{arg, int_arg, relative_index};
use crate::interpreter::expressions::strict_equals;
use crate::interpreter::heap::ObjectKind;
use crate::interpreter::types::{ObjId, Val};
use crate::interpreter::Interpreter;

type ArrayResult = Result<Val, Val>;

/// Receiver as an array id, or a TypeError naming the method
fn this_array(interp: &mut Interpreter, this: &Val, method: &str) -> Result<ObjId, Val> {
    if let Some(id) = this.as_obj() {
        if matches!(interp.heap.get(id).kind, ObjectKind::Array(_)) {
            return Ok(id);
        }
    }
    Err(interp.type_error(&format!("Array.prototype.{} called on non-array", method)))
}

fn items_mut(interp: &mut Interpreter, id: ObjId) -> Option<&mut Vec<Val>> {
    match &mut interp.heap.get_mut(id).kind {
        ObjectKind::Array(items) => Some(items),
        _ => None,
    }
}

/// Snapshot of the receiver's elements (callbacks may mutate the array)
fn snapshot(interp: &mut Interpreter, this: &Val, method: &str) -> Result<Vec<Val>, Val> {
    this_array(interp, this, method)?;
    Ok(interp.array_items(this).unwrap_or_default())
}

/// Object.keys(obj)
pub fn keys(interp: &mut Interpreter, args: &[Val]) -> Val {
    let keys = interp.iterate_keys(&arg(args, 0));
    interp.alloc_array(keys)
}

/// arr.push(...items) - returns the new length
pub fn push(interp: &mut Interpreter, this: &Val, args: Vec<Val>) -> ArrayResult {
    let id = this_array(interp, this, "push")?;
    let items = items_mut(interp, id).ok_or(Val::Undefined)?;
    items.extend(args);
    Ok(Val::Num(items.len() as f64))
}

pub fn pop(interp: &mut Interpreter, this: &Val) -> ArrayResult {
    let id = this_array(interp, this, "pop")?;
    let items = items_mut(interp, id).ok_or(Val::Undefined)?;
    Ok(items.pop().unwrap_or(Val::Undefined))
}

/// arr.join(separator = ",")
pub fn join(interp: &mut Interpreter, this: &Val, args: &[Val]) -> ArrayResult {
    let items = snapshot(interp, this, "join")?;
    let separator = match arg(args, 0) {
        Val::Undefined => ",".to_string(),
        other => interp.display_val(&other),
    };
    let parts: Vec<String> = items
        .iter()
        .map(|item| match item {
            Val::Undefined | Val::Null => String::new(),
            other => interp.display_val(other),
        })
        .collect();
    Ok(Val::Str(parts.join(&separator)))
}

pub fn includes(interp: &mut Interpreter, this: &Val, args: &[Val]) -> ArrayResult {
    let items = snapshot(interp, this, "includes")?;
    let needle = arg(args, 0);
    let found = items.iter().any(|item| match (item, &needle) {
        (Val::Num(a), Val::Num(b)) if a.is_nan() && b.is_nan() => true,
        _ => strict_equals(item, &needle),
    });
    Ok(Val::Bool(found))
}

pub fn index_of(interp: &mut Interpreter, this: &Val, args: &[Val]) -> ArrayResult {
    let items = snapshot(interp, this, "indexOf")?;
    let needle = arg(args, 0);
    let idx = items
        .iter()
        .position(|item| strict_equals(item, &needle))
        .map_or(-1.0, |i| i as f64);
    Ok(Val::Num(idx))
}

/// Call `callback(item, index, array)` for every element
fn each_result(
    interp: &mut Interpreter,
    this: &Val,
    args: &[Val],
    method: &str,
) -> Result<Vec<(Val, Val)>, Val> {
    let items = snapshot(interp, this, method)?;
    let callback = arg(args, 0);
    if !interp.is_callable_val(&callback) {
        let what = interp.display_val(&callback);
        return Err(interp.type_error(&format!("{} is not a function", what)));
    }
    let mut results = Vec::with_capacity(items.len());
    for (idx, item) in items.into_iter().enumerate() {
        let out = interp.call_function(
            &callback,
            Val::Undefined,
            vec![item.clone(), Val::Num(idx as f64), this.clone()],
        )?;
        results.push((item, out));
    }
    Ok(results)
}

pub fn map(interp: &mut Interpreter, this: &Val, args: &[Val]) -> ArrayResult {
    let mapped = each_result(interp, this, args, "map")?
        .into_iter()
        .map(|(_, out)| out)
        .collect();
    Ok(interp.alloc_array(mapped))
}

pub fn filter(interp: &mut Interpreter, this: &Val, args: &[Val]) -> ArrayResult {
    let kept = each_result(interp, this, args, "filter")?
        .into_iter()
        .filter(|(_, keep)| keep.is_truthy())
        .map(|(item, _)| item)
        .collect();
    Ok(interp.alloc_array(kept))
}

pub fn for_each(interp: &mut Interpreter, this: &Val, args: &[Val]) -> ArrayResult {
    each_result(interp, this, args, "forEach")?;
    Ok(Val::Undefined)
}

/// arr.slice(start?, end?) with negative offsets counted from the end
pub fn slice(interp: &mut Interpreter, this: &Val, args: &[Val]) -> ArrayResult {
    let items = snapshot(interp, this, "slice")?;
    let len = items.len();
    let start = relative_index(int_arg(interp, args, 0, 0), len);
    let end = relative_index(int_arg(interp, args, 1, len as i64), len);
    let picked = if start < end {
        items[start..end].to_vec()
    } else {
        Vec::new()
    };
    Ok(interp.alloc_array(picked))
}
