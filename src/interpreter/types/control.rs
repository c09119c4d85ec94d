//! Control flow and execution frame types

use std::sync::Arc;

use super::ast::Stmt;
use super::phase::{ForPhase, IfPhase, SimplePhase, TryPhase};
use super::values::{ScopeId, Val};

/* ===================== Control Flow ===================== */

/// Control flow state
///
/// When control is not `None` the coroutine unwinds its frames looking for a
/// handler. `Suspend` is different: the coroutine stops with its frames intact and
/// resumes later through a promise reaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Control {
    None,
    Break,
    Continue,
    Return(Val),
    Throw(Val),
    Suspend,
}

/// Outcome delivered to a suspended coroutine or a promise reaction
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    Normal(Val),
    Throw(Val),
}

impl Completion {
    pub fn from_result(result: Result<Val, Val>) -> Self {
        match result {
            Ok(v) => Completion::Normal(v),
            Err(e) => Completion::Throw(e),
        }
    }
}

/* ===================== Frames ===================== */

/// Frame kind - the type and state of a statement being executed
#[derive(Debug, Clone, PartialEq)]
pub enum FrameKind {
    Block { idx: usize },
    Simple { phase: SimplePhase },
    If { phase: IfPhase },
    While,
    For { phase: ForPhase },
    ForEach { items: Option<Vec<Val>>, idx: usize },
    Try { phase: TryPhase, pending: Option<Control> },
}

/// Execution frame - one per active statement
#[derive(Debug, Clone)]
pub struct Frame {
    /// The kind and state of this frame
    pub kind: FrameKind,

    /// Scope the statement runs in (blocks and loops own a child scope)
    pub scope: ScopeId,

    /// The statement this frame represents
    pub node: Arc<Stmt>,
}
