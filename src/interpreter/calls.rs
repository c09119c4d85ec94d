//! Function calls and construction
//!
//! Every script function activation runs in its own coroutine. Synchronous
//! functions run it to completion; async functions run it until the first
//! suspension and hand back a promise that settles when the coroutine finishes.

use std::sync::Arc;

use super::heap::{Closure, NativeKind, Object, ObjectKind};
use super::stdlib;
use super::types::{FunctionDef, ScopeId, Stmt, Val};
use super::vm::{CoOutcome, Coroutine};
use super::Interpreter;

impl Interpreter {
    /// Wrap a function definition in a callable closure object
    pub(crate) fn make_closure(
        &mut self,
        def: Arc<FunctionDef>,
        scope: ScopeId,
        this_val: Option<Val>,
    ) -> Val {
        let proto = self.protos.function;
        Val::Obj(self.heap.alloc(Object::new(
            ObjectKind::Function(Closure {
                def,
                scope,
                this_val,
            }),
            Some(proto),
        )))
    }

    /// Call any callable value
    ///
    /// Tracks the call depth and the native stack used since the outermost call,
    /// and throws a RangeError once either passes its configured limit.
    pub(crate) fn call_function(&mut self, callee: &Val, this: Val, args: Vec<Val>) -> Result<Val, Val> {
        self.check_call_limits()?;
        self.depth += 1;
        let result = self.dispatch_call(callee, this, args);
        self.depth = self.depth.saturating_sub(1);
        result
    }

    /// Record the stack base for an outermost call
    pub(crate) fn mark_stack_base(&mut self) {
        if self.depth == 0 {
            self.stack_base = stack_address();
        }
    }

    fn check_call_limits(&mut self) -> Result<(), Val> {
        self.mark_stack_base();
        if self.depth >= self.config.max_call_depth
            || self.stack_base.abs_diff(stack_address()) > self.config.max_stack_bytes
        {
            return Err(self.make_error_val("RangeError", "Maximum call stack size exceeded"));
        }
        Ok(())
    }

    fn dispatch_call(&mut self, callee: &Val, this: Val, args: Vec<Val>) -> Result<Val, Val> {
        let Some(id) = callee.as_obj() else {
            let what = self.display_val(callee);
            return Err(self.type_error(&format!("{} is not a function", what)));
        };

        match self.heap.get(id).kind.clone() {
            ObjectKind::Native(NativeKind::Builtin(func)) => {
                stdlib::call_stdlib_func(self, &func, this, args)
            }

            ObjectKind::Native(NativeKind::Host { func, .. }) => func(self, this, args),

            ObjectKind::Resolver {
                promise,
                reject,
                flag,
            } => {
                // the pair shares one flag: only the first call of either counts
                if !self.heap.flag(flag) {
                    self.heap.set_flag(flag);
                    let value = args.into_iter().next().unwrap_or(Val::Undefined);
                    if reject {
                        self.reject_promise(promise, value);
                    } else {
                        self.resolve_promise(promise, value);
                    }
                }
                Ok(Val::Undefined)
            }

            ObjectKind::Class(info) => Err(self.type_error(&format!(
                "Class constructor {} cannot be invoked without 'new'",
                info.def.name
            ))),

            ObjectKind::Function(closure) => self.call_closure(&closure, this, args),

            _ => {
                let what = self.display_val(callee);
                Err(self.type_error(&format!("{} is not a function", what)))
            }
        }
    }

    fn call_closure(&mut self, closure: &Closure, this: Val, args: Vec<Val>) -> Result<Val, Val> {
        let def = &closure.def;
        let fn_scope = self.heap.new_scope(Some(closure.scope));
        let mut args = args.into_iter();
        for param in &def.params {
            let value = args.next().unwrap_or(Val::Undefined);
            self.heap.declare_or_replace(fn_scope, param, value);
        }

        let this_val = closure.this_val.clone().unwrap_or(this);
        let mut co = Coroutine::new(self.next_co_id(), fn_scope, this_val);
        let body = Arc::new(Stmt::Block {
            body: def.body.clone(),
            span: def.span,
        });
        self.push_stmt(&mut co, body, fn_scope);

        if def.is_async {
            let promise = self.new_promise();
            co.promise = Some(promise);
            let outcome = self.run(&mut co);
            self.finish_coroutine(co, outcome);
            return Ok(Val::Obj(promise));
        }

        match self.run(&mut co) {
            CoOutcome::Returned(v) => Ok(v),
            CoOutcome::Threw(e) => Err(e),
            CoOutcome::Suspended => Err(self.internal_error("synchronous function suspended")),
        }
    }

    /// Settle an async coroutine's promise, or park it until its await resolves
    pub(crate) fn finish_coroutine(&mut self, co: Coroutine, outcome: CoOutcome) {
        match outcome {
            CoOutcome::Suspended => {
                self.suspended.insert(co.id, co);
            }
            CoOutcome::Returned(v) => {
                if let Some(promise) = co.promise {
                    self.resolve_promise(promise, v);
                }
            }
            CoOutcome::Threw(e) => {
                if let Some(promise) = co.promise {
                    self.reject_promise(promise, e);
                }
            }
        }
    }

    /* ===================== Construction ===================== */

    /// `new callee(...args)`
    pub(crate) fn construct(&mut self, callee: &Val, args: Vec<Val>, name: &str) -> Result<Val, Val> {
        let not_constructor = |interp: &mut Self| -> Result<Val, Val> {
            Err(interp.type_error(&format!("{} is not a constructor", name)))
        };
        let Some(id) = callee.as_obj() else {
            return not_constructor(self);
        };

        match self.heap.get(id).kind.clone() {
            ObjectKind::Class(info) => {
                let instance = Val::Obj(
                    self.heap
                        .alloc(Object::new(ObjectKind::Ordinary, Some(info.prototype))),
                );
                if let Some(ctor) = &info.def.constructor {
                    let closure = Closure {
                        def: ctor.clone(),
                        scope: info.scope,
                        this_val: None,
                    };
                    self.construct_with(&closure, instance.clone(), args)?;
                }
                Ok(instance)
            }

            ObjectKind::Function(closure) if !closure.def.is_arrow && !closure.def.is_async => {
                let prototype = match self.heap.get(id).props.get("prototype") {
                    Some(Val::Obj(proto)) => *proto,
                    _ => {
                        let proto = self.new_object();
                        self.heap
                            .get_mut(id)
                            .props
                            .insert("prototype".to_string(), Val::Obj(proto));
                        proto
                    }
                };
                let instance = Val::Obj(
                    self.heap
                        .alloc(Object::new(ObjectKind::Ordinary, Some(prototype))),
                );
                match self.construct_with(&closure, instance.clone(), args)? {
                    returned @ Val::Obj(_) => Ok(returned),
                    _ => Ok(instance),
                }
            }

            ObjectKind::Native(NativeKind::Builtin(func)) if func.is_constructor() => {
                stdlib::call_stdlib_func(self, &func, Val::Undefined, args)
            }

            _ => not_constructor(self),
        }
    }

    fn construct_with(&mut self, closure: &Closure, this: Val, args: Vec<Val>) -> Result<Val, Val> {
        self.check_call_limits()?;
        self.depth += 1;
        let result = self.call_closure(closure, this, args);
        self.depth = self.depth.saturating_sub(1);
        result
    }
}

/// Address of a local in the caller's frame, used to measure stack growth
#[inline(never)]
fn stack_address() -> usize {
    let marker = 0u8;
    std::ptr::addr_of!(marker) as usize
}
