//! Core execution loop
//!
//! `step()` processes one frame at a time, advancing execution phases and managing
//! the frame stack. `unwind()` handles break/continue/return/throw by popping
//! frames until something claims the control flow.

use std::sync::Arc;

use super::types::{Control, ForPhase, FrameKind, Stmt, TryPhase, Val};
use super::vm::{CoOutcome, Coroutine, Step};
use super::Interpreter;

impl Interpreter {
    /* ===================== Public API ===================== */

    /// Run a coroutine until it completes or suspends
    pub(crate) fn run(&mut self, co: &mut Coroutine) -> CoOutcome {
        loop {
            match self.step(co) {
                Step::Continue => continue,
                Step::Suspend => return CoOutcome::Suspended,
                Step::Done => break,
            }
        }

        match std::mem::replace(&mut co.control, Control::None) {
            Control::Return(v) => CoOutcome::Returned(v),
            Control::Throw(e) => CoOutcome::Threw(e),
            Control::None if co.is_program => {
                CoOutcome::Returned(std::mem::replace(&mut co.completion, Val::Undefined))
            }
            Control::None => CoOutcome::Returned(Val::Undefined),
            Control::Suspend => CoOutcome::Suspended,
            Control::Break | Control::Continue => {
                CoOutcome::Threw(self.make_error_val("SyntaxError", "Illegal break or continue"))
            }
        }
    }

    /// Execute one step of a coroutine
    pub(crate) fn step(&mut self, co: &mut Coroutine) -> Step {
        if co.control != Control::None {
            return self.unwind(co);
        }

        let Some(frame) = co.frames.last() else {
            return Step::Done;
        };
        let kind = frame.kind.clone();
        let scope = frame.scope;
        let node = frame.node.clone();

        match kind {
            FrameKind::Block { idx } => self.execute_block(co, &node, idx, scope),
            FrameKind::Simple { phase } => self.execute_simple(co, &node, phase, scope),
            FrameKind::If { phase } => self.execute_if(co, &node, phase, scope),
            FrameKind::While => self.execute_while(co, &node, scope),
            FrameKind::For { phase } => self.execute_for(co, &node, phase, scope),
            FrameKind::ForEach { items, idx } => self.execute_for_each(co, &node, items, idx, scope),
            FrameKind::Try { phase, pending } => self.execute_try(co, &node, phase, pending),
        }
    }

    /* ===================== Control Flow ===================== */

    /// Unwind the stack while control flow is active
    fn unwind(&mut self, co: &mut Coroutine) -> Step {
        loop {
            let Some(frame) = co.frames.last_mut() else {
                return Step::Done;
            };

            match (&co.control, &mut frame.kind) {
                (Control::Suspend, _) => return Step::Suspend,

                (
                    Control::Break,
                    FrameKind::While | FrameKind::For { .. } | FrameKind::ForEach { .. },
                ) => {
                    co.frames.pop();
                    co.control = Control::None;
                    return Step::Continue;
                }

                (Control::Continue, FrameKind::While | FrameKind::ForEach { .. }) => {
                    co.control = Control::None;
                    return Step::Continue;
                }

                (Control::Continue, FrameKind::For { phase }) => {
                    *phase = ForPhase::Update;
                    co.control = Control::None;
                    return Step::Continue;
                }

                (control, FrameKind::Try { phase, pending })
                    if matches!(phase, TryPhase::Body | TryPhase::Catch) =>
                {
                    let Stmt::Try {
                        catch_var,
                        catch_body,
                        finally_body,
                        ..
                    } = &*frame.node
                    else {
                        co.frames.pop();
                        continue;
                    };

                    // try body threw and there is a catch clause
                    if let (Control::Throw(error), TryPhase::Body, Some(catch_body)) =
                        (control, *phase, catch_body)
                    {
                        let error = error.clone();
                        let catch_body = Arc::new((**catch_body).clone());
                        let catch_var = catch_var.clone();
                        *phase = TryPhase::Catch;
                        let catch_scope = self.heap.new_scope(Some(frame.scope));
                        if let Some(name) = catch_var {
                            self.heap.declare_or_replace(catch_scope, &name, error);
                        }
                        co.control = Control::None;
                        self.push_stmt(co, catch_body, catch_scope);
                        return Step::Continue;
                    }

                    // run finally, then re-raise whatever was in flight
                    if let Some(finally_body) = finally_body {
                        let finally_body = Arc::new((**finally_body).clone());
                        let scope = frame.scope;
                        *pending = Some(std::mem::replace(&mut co.control, Control::None));
                        *phase = TryPhase::Finally;
                        self.push_stmt(co, finally_body, scope);
                        return Step::Continue;
                    }

                    co.frames.pop();
                }

                _ => {
                    co.frames.pop();
                }
            }
        }
    }
}
