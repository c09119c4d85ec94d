//! Promises and the job queue
//!
//! Settling a promise never runs script code directly: every reaction becomes a
//! [`Job`] on the interpreter's queue, and the queue only drains at the end of
//! `evaluate`/`execute`. That is what makes the host pump necessary.

use super::heap::{Object, ObjectKind};
use super::types::{CoId, Completion, Control, ObjId, Val};
use super::Interpreter;
use crate::error::EngineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseState {
    Pending,
    Fulfilled,
    Rejected,
}

/// Promise internals stored in the heap object
#[derive(Debug, Clone)]
pub struct PromiseSlot {
    pub state: PromiseState,
    pub value: Val,
    pub reactions: Vec<Reaction>,
}

/// What happens when a promise settles
#[derive(Debug, Clone)]
pub enum Reaction {
    /// Resume a coroutine parked on `await`
    Resume(CoId),
    /// A `then` registration feeding a derived promise
    Then {
        on_fulfilled: Option<Val>,
        on_rejected: Option<Val>,
        derived: ObjId,
    },
    /// Settle another promise the same way (promise resolved with a promise)
    Adopt(ObjId),
}

#[derive(Debug, Clone)]
pub struct Job {
    pub reaction: Reaction,
    pub completion: Completion,
}

impl Interpreter {
    pub(crate) fn new_promise(&mut self) -> ObjId {
        let proto = self.protos.promise;
        self.heap.alloc(Object::new(
            ObjectKind::Promise(PromiseSlot {
                state: PromiseState::Pending,
                value: Val::Undefined,
                reactions: Vec::new(),
            }),
            Some(proto),
        ))
    }

    pub(crate) fn promise_slot(&self, v: &Val) -> Option<&PromiseSlot> {
        match &self.heap.get(v.as_obj()?).kind {
            ObjectKind::Promise(slot) => Some(slot),
            _ => None,
        }
    }

    fn promise_slot_mut(&mut self, id: ObjId) -> Option<&mut PromiseSlot> {
        match &mut self.heap.get_mut(id).kind {
            ObjectKind::Promise(slot) => Some(slot),
            _ => None,
        }
    }

    /// Resolve: adopt the state of a promise value, otherwise fulfill
    pub(crate) fn resolve_promise(&mut self, id: ObjId, value: Val) {
        if let Val::Obj(inner) = &value {
            if *inner == id {
                let error = self.type_error("Chaining cycle detected for promise");
                self.reject_promise(id, error);
                return;
            }
            if self.promise_slot(&value).is_some() {
                self.add_reaction(*inner, Reaction::Adopt(id));
                return;
            }
        }
        self.settle(id, PromiseState::Fulfilled, value);
    }

    pub(crate) fn reject_promise(&mut self, id: ObjId, error: Val) {
        self.settle(id, PromiseState::Rejected, error);
    }

    fn settle(&mut self, id: ObjId, state: PromiseState, value: Val) {
        let Some(slot) = self.promise_slot_mut(id) else {
            return;
        };
        if slot.state != PromiseState::Pending {
            return;
        }
        slot.state = state;
        slot.value = value.clone();
        let reactions = std::mem::take(&mut slot.reactions);

        let completion = completion_for(state, value);
        for reaction in reactions {
            self.jobs.push_back(Job {
                reaction,
                completion: completion.clone(),
            });
        }
    }

    /// Register a reaction; queue it right away if the promise already settled
    pub(crate) fn add_reaction(&mut self, id: ObjId, reaction: Reaction) {
        let Some(slot) = self.promise_slot_mut(id) else {
            return;
        };
        if slot.state == PromiseState::Pending {
            slot.reactions.push(reaction);
            return;
        }
        let completion = completion_for(slot.state, slot.value.clone());
        self.jobs.push_back(Job {
            reaction,
            completion,
        });
    }

    /// `promise.then(on_fulfilled, on_rejected)`; returns the derived promise
    pub(crate) fn promise_then(
        &mut self,
        id: ObjId,
        on_fulfilled: Option<Val>,
        on_rejected: Option<Val>,
    ) -> ObjId {
        let derived = self.new_promise();
        self.add_reaction(
            id,
            Reaction::Then {
                on_fulfilled,
                on_rejected,
                derived,
            },
        );
        derived
    }

    /// Resolve/reject functions sharing one "already resolved" flag
    pub(crate) fn create_resolving_functions(&mut self, promise: ObjId) -> (Val, Val) {
        let flag = self.heap.new_flag();
        let proto = self.protos.function;
        let mut make = |reject: bool| {
            Val::Obj(self.heap.alloc(Object::new(
                ObjectKind::Resolver {
                    promise,
                    reject,
                    flag,
                },
                Some(proto),
            )))
        };
        let resolve = make(false);
        let reject = make(true);
        (resolve, reject)
    }

    /// Park coroutine `co` until `value` settles
    ///
    /// Non-promise values still resume through the queue, one job later.
    pub(crate) fn await_value(&mut self, co: CoId, value: Val) {
        match value.as_obj() {
            Some(id) if self.promise_slot(&value).is_some() => {
                self.add_reaction(id, Reaction::Resume(co));
            }
            _ => self.jobs.push_back(Job {
                reaction: Reaction::Resume(co),
                completion: Completion::Normal(value),
            }),
        }
    }

    /* ===================== Job Queue ===================== */

    /// Run queued jobs until the queue is empty (jobs may queue more jobs)
    pub(crate) fn run_jobs(&mut self) -> Result<(), EngineError> {
        while let Some(job) = self.jobs.pop_front() {
            self.run_job(job)?;
        }
        Ok(())
    }

    pub(crate) fn pending_jobs(&self) -> usize {
        self.jobs.len()
    }

    fn run_job(&mut self, job: Job) -> Result<(), EngineError> {
        match job.reaction {
            Reaction::Resume(co_id) => {
                let mut co = self.suspended.remove(&co_id).ok_or_else(|| {
                    EngineError::Internal(format!("no suspended coroutine {:?}", co_id))
                })?;
                co.control = Control::None;
                co.resume = Some(job.completion);

                self.mark_stack_base();
                self.depth += 1;
                let outcome = self.run(&mut co);
                self.depth = self.depth.saturating_sub(1);
                self.finish_coroutine(co, outcome);
            }

            Reaction::Then {
                on_fulfilled,
                on_rejected,
                derived,
            } => {
                let (handler, arg, fulfilled) = match job.completion {
                    Completion::Normal(v) => (on_fulfilled, v, true),
                    Completion::Throw(e) => (on_rejected, e, false),
                };
                match handler {
                    Some(handler) if self.is_callable_val(&handler) => {
                        match self.call_function(&handler, Val::Undefined, vec![arg]) {
                            Ok(v) => self.resolve_promise(derived, v),
                            Err(e) => self.reject_promise(derived, e),
                        }
                    }
                    // no handler for this outcome: pass it through
                    _ if fulfilled => self.resolve_promise(derived, arg),
                    _ => self.reject_promise(derived, arg),
                }
            }

            Reaction::Adopt(target) => match job.completion {
                Completion::Normal(v) => self.resolve_promise(target, v),
                Completion::Throw(e) => self.reject_promise(target, e),
            },
        }
        Ok(())
    }
}

fn completion_for(state: PromiseState, value: Val) -> Completion {
    match state {
        PromiseState::Rejected => Completion::Throw(value),
        _ => Completion::Normal(value),
    }
}
