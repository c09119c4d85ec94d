//! Statement execution handlers
//!
//! Each statement type has its own handler that processes the statement based on
//! its current execution phase. Handlers report errors by setting
//! `Control::Throw` and leaving their frame for `unwind()` to pop.

use std::sync::Arc;

use super::heap::{BindingError, ClassInfo, Object, ObjectKind};
use super::types::{
    ClassDef, Completion, Control, DeclareTarget, Expr, ForLoopKind, ForPhase, FrameKind, IfPhase,
    ScopeId, SimplePhase, Stmt, TryPhase, Val, VarKind,
};
use super::vm::{Coroutine, Step};
use super::Interpreter;

/// Replace the top frame's kind
fn set_top_kind(co: &mut Coroutine, kind: FrameKind) {
    if let Some(frame) = co.frames.last_mut() {
        frame.kind = kind;
    }
}

/// Record a thrown value and let `unwind()` take over
fn throw(co: &mut Coroutine, error: Val) -> Step {
    co.control = Control::Throw(error);
    Step::Continue
}

impl Interpreter {
    /* ===================== Blocks ===================== */

    pub(crate) fn execute_block(
        &mut self,
        co: &mut Coroutine,
        node: &Stmt,
        idx: usize,
        scope: ScopeId,
    ) -> Step {
        let Stmt::Block { body, .. } = node else {
            return throw(co, self.internal_error("block frame without block node"));
        };

        // Check if we've finished all statements in the block
        let Some(child) = body.get(idx) else {
            co.frames.pop();
            return Step::Continue;
        };

        set_top_kind(co, FrameKind::Block { idx: idx + 1 });
        self.push_stmt(co, Arc::new(child.clone()), scope);
        Step::Continue
    }

    /* ===================== Single-Step Statements ===================== */

    /// Expression, declaration, assignment, return, throw and the no-op statements
    pub(crate) fn execute_simple(
        &mut self,
        co: &mut Coroutine,
        node: &Stmt,
        phase: SimplePhase,
        scope: ScopeId,
    ) -> Step {
        let this = co.this_val.clone();

        let value = match phase {
            SimplePhase::Eval => {
                let rhs = match node {
                    Stmt::Expr { expr, .. } => Some(expr),
                    Stmt::Declare { init, .. } => init.as_ref(),
                    Stmt::Assign { value, .. } => Some(value),
                    Stmt::Return { value, .. } => value.as_ref(),
                    Stmt::Throw { value, .. } => Some(value),
                    _ => None,
                };

                match rhs {
                    Some(Expr::Await { inner, .. }) => {
                        let awaited = match self.eval_expr(inner, scope, &this) {
                            Ok(v) => v,
                            Err(e) => return throw(co, e),
                        };
                        self.await_value(co.id, awaited);
                        set_top_kind(
                            co,
                            FrameKind::Simple {
                                phase: SimplePhase::Awaiting,
                            },
                        );
                        co.control = Control::Suspend;
                        return Step::Suspend;
                    }
                    Some(expr) => match self.eval_expr(expr, scope, &this) {
                        Ok(v) => v,
                        Err(e) => return throw(co, e),
                    },
                    None => Val::Undefined,
                }
            }

            SimplePhase::Awaiting => match co.resume.take() {
                Some(Completion::Normal(v)) => v,
                Some(Completion::Throw(e)) => return throw(co, e),
                None => return throw(co, self.internal_error("resumed without a completion")),
            },
        };

        self.finish_simple(co, node, value, scope, &this)
    }

    fn finish_simple(
        &mut self,
        co: &mut Coroutine,
        node: &Stmt,
        value: Val,
        scope: ScopeId,
        this: &Val,
    ) -> Step {
        match node {
            Stmt::Expr { .. } => {
                if co.is_program {
                    co.completion = value;
                }
            }

            Stmt::Declare { kind, target, .. } => {
                let target_scope = match kind {
                    VarKind::Var => co.function_scope,
                    VarKind::Let | VarKind::Const => scope,
                };
                if let Err(e) = self.declare_target(target_scope, *kind, target, value) {
                    return throw(co, e);
                }
            }

            Stmt::Assign { target, op, .. } => {
                if let Err(e) = self.assign_target(target, *op, value, scope, this) {
                    return throw(co, e);
                }
            }

            Stmt::Return { .. } => {
                co.control = Control::Return(value);
                co.frames.pop();
                return Step::Continue;
            }

            Stmt::Throw { .. } => return throw(co, value),

            Stmt::Break { .. } => {
                co.control = Control::Break;
                return Step::Continue;
            }

            Stmt::Continue { .. } => {
                co.control = Control::Continue;
                return Step::Continue;
            }

            Stmt::Class { def, .. } => {
                let class = self.create_class(def.clone(), scope);
                if let Err(e) = self.declare_binding(scope, &def.name, class, true) {
                    return throw(co, e);
                }
            }

            // Function declarations are hoisted when their block is entered
            Stmt::Function { .. } | Stmt::Empty { .. } => {}

            _ => return throw(co, self.internal_error("simple frame for compound statement")),
        }

        co.frames.pop();
        Step::Continue
    }

    pub(crate) fn declare_binding(
        &mut self,
        scope: ScopeId,
        name: &str,
        value: Val,
        mutable: bool,
    ) -> Result<(), Val> {
        self.heap
            .declare(scope, name, value, mutable)
            .map_err(|err| match err {
                BindingError::AlreadyDeclared => self.make_error_val(
                    "SyntaxError",
                    &format!("Identifier '{}' has already been declared", name),
                ),
                _ => self.internal_error("declaration failed"),
            })
    }

    fn declare_target(
        &mut self,
        scope: ScopeId,
        kind: VarKind,
        target: &DeclareTarget,
        value: Val,
    ) -> Result<(), Val> {
        match target {
            DeclareTarget::Simple { name } if kind == VarKind::Var => {
                self.heap.declare_or_replace(scope, name, value);
                Ok(())
            }
            DeclareTarget::Simple { name } => {
                self.declare_binding(scope, name, value, kind.is_mutable())
            }
            DeclareTarget::Destructure { names } => {
                for (property, binding) in names {
                    let item = self.get_prop(&value, property)?;
                    if kind == VarKind::Var {
                        self.heap.declare_or_replace(scope, binding, item);
                    } else {
                        self.declare_binding(scope, binding, item, kind.is_mutable())?;
                    }
                }
                Ok(())
            }
        }
    }

    fn create_class(&mut self, def: Arc<ClassDef>, scope: ScopeId) -> Val {
        let prototype = self.new_object();
        for (name, method) in &def.methods {
            let func = self.make_closure(method.clone(), scope, None);
            self.heap.get_mut(prototype).props.insert(name.clone(), func);
        }

        let mut class = Object::new(
            ObjectKind::Class(ClassInfo {
                def: def.clone(),
                scope,
                prototype,
            }),
            Some(self.protos.function),
        );
        class
            .props
            .insert("prototype".to_string(), Val::Obj(prototype));
        class
            .props
            .insert("name".to_string(), Val::Str(def.name.clone()));
        let class_id = self.heap.alloc(class);

        self.heap
            .get_mut(prototype)
            .props
            .insert("constructor".to_string(), Val::Obj(class_id));
        Val::Obj(class_id)
    }

    /* ===================== Conditionals & Loops ===================== */

    pub(crate) fn execute_if(
        &mut self,
        co: &mut Coroutine,
        node: &Stmt,
        phase: IfPhase,
        scope: ScopeId,
    ) -> Step {
        let Stmt::If {
            test,
            then_s,
            else_s,
            ..
        } = node
        else {
            return throw(co, self.internal_error("if frame without if node"));
        };

        match phase {
            IfPhase::Test => {
                let this = co.this_val.clone();
                let cond = match self.eval_expr(test, scope, &this) {
                    Ok(v) => v.is_truthy(),
                    Err(e) => return throw(co, e),
                };
                set_top_kind(
                    co,
                    FrameKind::If {
                        phase: IfPhase::Done,
                    },
                );
                if cond {
                    self.push_stmt(co, Arc::new((**then_s).clone()), scope);
                } else if let Some(else_s) = else_s {
                    self.push_stmt(co, Arc::new((**else_s).clone()), scope);
                }
                Step::Continue
            }
            IfPhase::Done => {
                co.frames.pop();
                Step::Continue
            }
        }
    }

    pub(crate) fn execute_while(&mut self, co: &mut Coroutine, node: &Stmt, scope: ScopeId) -> Step {
        let Stmt::While { test, body, .. } = node else {
            return throw(co, self.internal_error("while frame without while node"));
        };

        let this = co.this_val.clone();
        match self.eval_expr(test, scope, &this) {
            Ok(v) if v.is_truthy() => {
                self.push_stmt(co, Arc::new((**body).clone()), scope);
            }
            Ok(_) => {
                co.frames.pop();
            }
            Err(e) => return throw(co, e),
        }
        Step::Continue
    }

    pub(crate) fn execute_for(
        &mut self,
        co: &mut Coroutine,
        node: &Stmt,
        phase: ForPhase,
        scope: ScopeId,
    ) -> Step {
        let Stmt::For {
            init,
            test,
            update,
            body,
            ..
        } = node
        else {
            return throw(co, self.internal_error("for frame without for node"));
        };

        match phase {
            ForPhase::Init => {
                set_top_kind(
                    co,
                    FrameKind::For {
                        phase: ForPhase::Test,
                    },
                );
                if let Some(init) = init {
                    self.push_stmt(co, Arc::new((**init).clone()), scope);
                }
            }
            ForPhase::Test => {
                let proceed = match test {
                    Some(test) => {
                        let this = co.this_val.clone();
                        match self.eval_expr(test, scope, &this) {
                            Ok(v) => v.is_truthy(),
                            Err(e) => return throw(co, e),
                        }
                    }
                    None => true,
                };
                if proceed {
                    set_top_kind(
                        co,
                        FrameKind::For {
                            phase: ForPhase::Update,
                        },
                    );
                    self.push_stmt(co, Arc::new((**body).clone()), scope);
                } else {
                    co.frames.pop();
                }
            }
            ForPhase::Update => {
                set_top_kind(
                    co,
                    FrameKind::For {
                        phase: ForPhase::Test,
                    },
                );
                if let Some(update) = update {
                    self.push_stmt(co, Arc::new((**update).clone()), scope);
                }
            }
        }
        Step::Continue
    }

    pub(crate) fn execute_for_each(
        &mut self,
        co: &mut Coroutine,
        node: &Stmt,
        items: Option<Vec<Val>>,
        idx: usize,
        scope: ScopeId,
    ) -> Step {
        let Stmt::ForEach {
            loop_kind,
            decl,
            binding,
            iterable,
            body,
            ..
        } = node
        else {
            return throw(co, self.internal_error("for-each frame without for-each node"));
        };

        let items = match items {
            Some(items) => items,
            None => {
                let this = co.this_val.clone();
                let collection = match self.eval_expr(iterable, scope, &this) {
                    Ok(v) => v,
                    Err(e) => return throw(co, e),
                };
                let listed = match loop_kind {
                    ForLoopKind::Of => self.iterate_values(&collection),
                    ForLoopKind::In => Ok(self.iterate_keys(&collection)),
                };
                match listed {
                    Ok(items) => items,
                    Err(e) => return throw(co, e),
                }
            }
        };

        let Some(item) = items.get(idx).cloned() else {
            co.frames.pop();
            return Step::Continue;
        };

        set_top_kind(
            co,
            FrameKind::ForEach {
                items: Some(items),
                idx: idx + 1,
            },
        );

        // each iteration gets its own binding so closures capture the current item
        let iter_scope = self.heap.new_scope(Some(scope));
        if let Err(e) = self.declare_binding(iter_scope, binding, item, decl.is_mutable()) {
            return throw(co, e);
        }
        self.push_stmt(co, Arc::new((**body).clone()), iter_scope);
        Step::Continue
    }

    /* ===================== Try / Catch / Finally ===================== */

    pub(crate) fn execute_try(
        &mut self,
        co: &mut Coroutine,
        node: &Stmt,
        phase: TryPhase,
        pending: Option<Control>,
    ) -> Step {
        let Stmt::Try {
            body, finally_body, ..
        } = node
        else {
            return throw(co, self.internal_error("try frame without try node"));
        };
        let scope = co
            .frames
            .last()
            .map(|f| f.scope)
            .unwrap_or(co.function_scope);

        match phase {
            TryPhase::Enter => {
                set_top_kind(
                    co,
                    FrameKind::Try {
                        phase: TryPhase::Body,
                        pending: None,
                    },
                );
                self.push_stmt(co, Arc::new((**body).clone()), scope);
            }

            // body or catch finished normally
            TryPhase::Body | TryPhase::Catch => match finally_body {
                Some(finally_body) => {
                    set_top_kind(
                        co,
                        FrameKind::Try {
                            phase: TryPhase::Finally,
                            pending: None,
                        },
                    );
                    self.push_stmt(co, Arc::new((**finally_body).clone()), scope);
                }
                None => {
                    co.frames.pop();
                }
            },

            TryPhase::Finally => {
                co.frames.pop();
                if let Some(control) = pending {
                    co.control = control;
                }
            }
        }
        Step::Continue
    }
}
