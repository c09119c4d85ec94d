//! Coroutine state
//!
//! Every function activation runs as a coroutine with its own frame stack, so an
//! `await` can park the activation (frames intact) and resume it later from a
//! promise reaction.

use std::sync::Arc;

use super::types::{
    CoId, Completion, Control, ForPhase, Frame, FrameKind, IfPhase, ObjId, ScopeId, SimplePhase,
    Stmt, TryPhase, Val,
};
use super::Interpreter;

/* ===================== Coroutine ===================== */

#[derive(Debug)]
pub struct Coroutine {
    pub id: CoId,

    /// Stack of execution frames
    pub frames: Vec<Frame>,

    /// Current control flow state
    pub control: Control,

    pub this_val: Val,

    /// Scope receiving `var` declarations
    pub function_scope: ScopeId,

    /// Promise settled with the outcome (async functions only)
    pub promise: Option<ObjId>,

    /// Completion delivered by the reaction that resumed this coroutine
    pub resume: Option<Completion>,

    /// Value of the last top-level expression statement (scripts only)
    pub completion: Val,

    pub is_program: bool,
}

impl Coroutine {
    pub fn new(id: CoId, function_scope: ScopeId, this_val: Val) -> Self {
        Self {
            id,
            frames: Vec::new(),
            control: Control::None,
            this_val,
            function_scope,
            promise: None,
            resume: None,
            completion: Val::Undefined,
            is_program: false,
        }
    }

    pub fn program(id: CoId, scope: ScopeId) -> Self {
        Self {
            is_program: true,
            ..Self::new(id, scope, Val::Undefined)
        }
    }
}

/// How a coroutine run ended
#[derive(Debug, Clone, PartialEq)]
pub enum CoOutcome {
    Returned(Val),
    Threw(Val),
    Suspended,
}

/* ===================== Step Result ===================== */

/// Result of executing one step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Continue to next step
    Continue,
    /// Execution complete
    Done,
    /// Parked on an await
    Suspend,
}

/* ===================== Frame Management ===================== */

impl Interpreter {
    pub(crate) fn next_co_id(&mut self) -> CoId {
        self.next_co += 1;
        CoId(self.next_co)
    }

    /// Push a new frame for a statement onto the stack
    ///
    /// Blocks and C-style for loops get a fresh child scope; function declarations
    /// in a block are hoisted into its scope before the first statement runs.
    pub(crate) fn push_stmt(&mut self, co: &mut Coroutine, stmt: Arc<Stmt>, scope: ScopeId) {
        let (kind, scope) = match &*stmt {
            Stmt::Block { body, .. } => {
                let block_scope = self.heap.new_scope(Some(scope));
                self.hoist_functions(body, block_scope);
                (FrameKind::Block { idx: 0 }, block_scope)
            }
            Stmt::If { .. } => (
                FrameKind::If {
                    phase: IfPhase::Test,
                },
                scope,
            ),
            Stmt::While { .. } => (FrameKind::While, scope),
            Stmt::For { .. } => (
                FrameKind::For {
                    phase: ForPhase::Init,
                },
                self.heap.new_scope(Some(scope)),
            ),
            Stmt::ForEach { .. } => (FrameKind::ForEach { items: None, idx: 0 }, scope),
            Stmt::Try { .. } => (
                FrameKind::Try {
                    phase: TryPhase::Enter,
                    pending: None,
                },
                scope,
            ),
            _ => (
                FrameKind::Simple {
                    phase: SimplePhase::Eval,
                },
                scope,
            ),
        };

        co.frames.push(Frame {
            kind,
            scope,
            node: stmt,
        });
    }

    pub(crate) fn hoist_functions(&mut self, body: &[Stmt], scope: ScopeId) {
        for stmt in body {
            if let Stmt::Function { def, .. } = stmt {
                if let Some(name) = &def.name {
                    let closure = self.make_closure(def.clone(), scope, None);
                    self.heap.declare_or_replace(scope, name, closure);
                }
            }
        }
    }
}
