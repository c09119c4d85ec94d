//! [`ScriptEngine`] implementation for the built-in interpreter

use serde_json::Value as JsonValue;

use super::heap::{BindingError, NativeKind, Object, ObjectKind};
use super::promise::PromiseState;
use super::types::Val;
use super::Interpreter;
use crate::adapter::{NativeFn, PlaceholderStatus, ScriptEngine};
use crate::error::EngineError;
use crate::paired_future::PairedFuture;

impl Interpreter {
    fn promise_state(&self, value: &Val) -> Result<(PromiseState, Val), EngineError> {
        self.promise_slot(value)
            .map(|slot| (slot.state, slot.value.clone()))
            .ok_or_else(|| {
                EngineError::Shape(format!(
                    "expected a promise, got {}",
                    self.type_of(value)
                ))
            })
    }
}

impl ScriptEngine for Interpreter {
    type Value = Val;

    fn evaluate(&mut self, source: &str) -> Result<Val, EngineError> {
        self.run_script(source)
    }

    fn execute(&mut self, source: &str) -> Result<(), EngineError> {
        self.run_script(source).map(|_| ())
    }

    fn global(&self, name: &str) -> Option<Val> {
        self.heap
            .lookup(self.globals, name)
            .map(|binding| binding.value.clone())
    }

    fn define_global(&mut self, name: &str, value: Val) -> Result<(), EngineError> {
        // a script-level binding would shadow the global, so treat it as taken too
        if self.heap.lookup(self.script_scope, name).is_some() {
            return Err(EngineError::Redefinition(name.to_string()));
        }
        self.heap
            .declare(self.globals, name, value, false)
            .map_err(|err| match err {
                BindingError::AlreadyDeclared => EngineError::Redefinition(name.to_string()),
                other => EngineError::Internal(format!("{:?}", other)),
            })
    }

    fn create_native(&mut self, name: &str, func: NativeFn<Self>) -> Val {
        let proto = self.protos.function;
        Val::Obj(self.heap.alloc(Object::new(
            ObjectKind::Native(NativeKind::Host {
                name: name.to_string(),
                func,
            }),
            Some(proto),
        )))
    }

    fn get_property(&mut self, target: &Val, key: &str) -> Result<Option<Val>, EngineError> {
        if target.is_nullish() {
            return Err(EngineError::Shape(format!(
                "cannot read '{}' of {}",
                key,
                self.display_val(target)
            )));
        }
        Ok(self.lookup_prop(target, key))
    }

    fn is_object(&self, value: &Val) -> bool {
        matches!(value, Val::Obj(_))
    }

    fn is_callable(&self, value: &Val) -> bool {
        self.is_callable_val(value)
    }

    fn invoke(&mut self, callable: &Val, this: &Val, args: Vec<Val>) -> Result<Val, EngineError> {
        self.call_function(callable, this.clone(), args)
            .map_err(|e| self.thrown(&e))
    }

    fn call_depth(&self) -> usize {
        self.depth
    }

    fn reset_call_stack(&mut self) {
        self.depth = 0;
    }

    fn is_placeholder(&self, value: &Val) -> bool {
        self.promise_slot(value).is_some()
    }

    fn placeholder_status(&self, value: &Val) -> Result<PlaceholderStatus, EngineError> {
        let (state, _) = self.promise_state(value)?;
        Ok(match state {
            PromiseState::Pending => PlaceholderStatus::Pending,
            PromiseState::Fulfilled => PlaceholderStatus::Fulfilled,
            PromiseState::Rejected => PlaceholderStatus::Rejected,
        })
    }

    fn placeholder_value(&self, value: &Val) -> Result<Val, EngineError> {
        match self.promise_state(value)? {
            (PromiseState::Pending, _) => {
                Err(EngineError::Shape("promise is still pending".to_string()))
            }
            (_, settled) => Ok(settled),
        }
    }

    fn create_paired_future(&mut self) -> Result<PairedFuture<Val>, EngineError> {
        let promise = self.new_promise();
        let (resolve, reject) = self.create_resolving_functions(promise);
        Ok(PairedFuture::new(Val::Obj(promise), resolve, reject))
    }

    fn undefined(&self) -> Val {
        Val::Undefined
    }

    fn null(&self) -> Val {
        Val::Null
    }

    fn make_array(&mut self, items: Vec<Val>) -> Val {
        self.alloc_array(items)
    }

    fn make_error(&mut self, name: &str, message: &str) -> Val {
        self.make_error_val(name, message)
    }

    fn display(&self, value: &Val) -> String {
        self.display_val(value)
    }

    fn to_json(&self, value: &Val) -> JsonValue {
        self.json_of(value).unwrap_or(JsonValue::Null)
    }

    fn from_json(&mut self, json: &JsonValue) -> Val {
        self.val_from_json(json)
    }

    fn as_number(&self, value: &Val) -> Option<f64> {
        match value {
            Val::Num(n) => Some(*n),
            _ => None,
        }
    }

    fn as_string(&self, value: &Val) -> Option<String> {
        match value {
            Val::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}
