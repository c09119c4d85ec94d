//! Object model: allocation, property lookup along the prototype chain, and
//! property writes

use super::convert::array_index;
use super::heap::{Object, ObjectKind};
use super::types::{ObjId, Val};
use super::Interpreter;

/// Prototype chain depth limit (chains are built by the runtime, so this is never
/// reached by well-formed objects)
const MAX_PROTO_CHAIN: usize = 64;

/// Largest valid array length, 2^32 - 1
pub(crate) const MAX_ARRAY_LENGTH: f64 = 4_294_967_295.0;

/// Arrays are stored densely up to this many elements; index writes past it
/// land in ordinary properties
pub(crate) const MAX_DENSE_LENGTH: usize = 1 << 24;

impl Interpreter {
    /* ===================== Allocation ===================== */

    /// Allocate an empty ordinary object
    pub(crate) fn new_object(&mut self) -> ObjId {
        let proto = self.protos.object;
        self.heap.alloc(Object::new(ObjectKind::Ordinary, Some(proto)))
    }

    pub(crate) fn alloc_array(&mut self, items: Vec<Val>) -> Val {
        let proto = self.protos.array;
        Val::Obj(
            self.heap
                .alloc(Object::new(ObjectKind::Array(items), Some(proto))),
        )
    }

    /// Allocate an error object with own `name` and `message` properties
    pub(crate) fn make_error_val(&mut self, name: &str, message: &str) -> Val {
        let mut error = Object::new(ObjectKind::Error, Some(self.protos.error));
        error.props.insert("name".to_string(), Val::str(name));
        error.props.insert("message".to_string(), Val::str(message));
        Val::Obj(self.heap.alloc(error))
    }

    /// Error for broken interpreter bookkeeping; surfaces to scripts as a throw
    pub(crate) fn internal_error(&mut self, message: &str) -> Val {
        self.make_error_val("InternalError", message)
    }

    pub(crate) fn type_error(&mut self, message: &str) -> Val {
        self.make_error_val("TypeError", message)
    }

    /* ===================== Reads ===================== */

    /// Read a property; reading from `null`/`undefined` throws a TypeError
    pub(crate) fn get_prop(&mut self, target: &Val, key: &str) -> Result<Val, Val> {
        if target.is_nullish() {
            let what = self.display_val(target);
            return Err(self.type_error(&format!(
                "Cannot read properties of {} (reading '{}')",
                what, key
            )));
        }
        Ok(self.lookup_prop(target, key).unwrap_or(Val::Undefined))
    }

    /// Look up a property, own or inherited; `None` when absent
    pub(crate) fn lookup_prop(&self, target: &Val, key: &str) -> Option<Val> {
        let start = match target {
            Val::Undefined | Val::Null => return None,
            Val::Bool(_) => self.protos.object,
            Val::Num(_) => self.protos.number,
            Val::Str(s) => {
                if key == "length" {
                    return Some(Val::Num(s.chars().count() as f64));
                }
                if let Some(idx) = array_index(key) {
                    return s.chars().nth(idx).map(|c| Val::Str(c.to_string()));
                }
                self.protos.string
            }
            Val::Obj(id) => {
                if let Some(found) = self.own_prop(*id, key) {
                    return Some(found);
                }
                match self.heap.get(*id).proto {
                    Some(proto) => proto,
                    None => return None,
                }
            }
        };

        let mut current = Some(start);
        for _ in 0..MAX_PROTO_CHAIN {
            let id = current?;
            if let Some(found) = self.own_prop(id, key) {
                return Some(found);
            }
            current = self.heap.get(id).proto;
        }
        None
    }

    fn own_prop(&self, id: ObjId, key: &str) -> Option<Val> {
        let object = self.heap.get(id);
        match &object.kind {
            ObjectKind::Array(items) => {
                if key == "length" {
                    return Some(Val::Num(items.len() as f64));
                }
                if let Some(item) = array_index(key).and_then(|idx| items.get(idx)) {
                    return Some(item.clone());
                }
            }
            ObjectKind::Function(closure) if key == "name" => {
                return Some(Val::str(closure.def.name.clone().unwrap_or_default()));
            }
            _ => {}
        }
        object.props.get(key).cloned()
    }

    /// Own enumerable keys in the order `Object.keys` reports them
    pub(crate) fn own_keys(&self, target: &Val) -> Vec<String> {
        match target {
            Val::Obj(id) => {
                let object = self.heap.get(*id);
                let mut keys: Vec<String> = match &object.kind {
                    ObjectKind::Array(items) => (0..items.len()).map(|i| i.to_string()).collect(),
                    _ => Vec::new(),
                };
                keys.extend(object.props.keys().cloned());
                keys
            }
            Val::Str(s) => (0..s.chars().count()).map(|i| i.to_string()).collect(),
            _ => Vec::new(),
        }
    }

    /* ===================== Writes ===================== */

    pub(crate) fn put_prop(&mut self, target: &Val, key: &str, value: Val) -> Result<(), Val> {
        let id = match target {
            Val::Obj(id) => *id,
            Val::Undefined | Val::Null => {
                let what = self.display_val(target);
                return Err(self.type_error(&format!(
                    "Cannot set properties of {} (setting '{}')",
                    what, key
                )));
            }
            // writes to primitives are silently dropped
            _ => return Ok(()),
        };

        let object = self.heap.get_mut(id);
        if let ObjectKind::Array(items) = &mut object.kind {
            match array_index(key) {
                Some(idx) if idx < items.len() => {
                    items[idx] = value;
                    return Ok(());
                }
                Some(idx) if idx < MAX_DENSE_LENGTH => {
                    items.resize(idx + 1, Val::Undefined);
                    items[idx] = value;
                    return Ok(());
                }
                _ => {}
            }
            if key == "length" {
                let n = match value {
                    Val::Num(n) if n >= 0.0 && n.fract() == 0.0 && n <= MAX_ARRAY_LENGTH => n,
                    _ => return Err(self.make_error_val("RangeError", "Invalid array length")),
                };
                if n as usize > MAX_DENSE_LENGTH {
                    return Err(self.make_error_val(
                        "RangeError",
                        &format!("Array length {} exceeds the interpreter limit", n),
                    ));
                }
                items.resize(n as usize, Val::Undefined);
                return Ok(());
            }
        }
        object.props.insert(key.to_string(), value);
        Ok(())
    }

    /* ===================== Iteration ===================== */

    /// Values visited by `for (x of v)`
    pub(crate) fn iterate_values(&mut self, v: &Val) -> Result<Vec<Val>, Val> {
        match v {
            Val::Str(s) => Ok(s.chars().map(|c| Val::Str(c.to_string())).collect()),
            Val::Obj(id) => match &self.heap.get(*id).kind {
                ObjectKind::Array(items) => Ok(items.clone()),
                _ => Err(self.type_error("object is not iterable")),
            },
            other => {
                let what = self.display_val(other);
                Err(self.type_error(&format!("{} is not iterable", what)))
            }
        }
    }

    /// Keys visited by `for (k in v)`
    pub(crate) fn iterate_keys(&self, v: &Val) -> Vec<Val> {
        self.own_keys(v).into_iter().map(Val::Str).collect()
    }

    pub(crate) fn array_items(&self, v: &Val) -> Option<Vec<Val>> {
        match v {
            Val::Obj(id) => match &self.heap.get(*id).kind {
                ObjectKind::Array(items) => Some(items.clone()),
                _ => None,
            },
            _ => None,
        }
    }
}
