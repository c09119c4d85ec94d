//! # Interpreter - Resumable Stack-Driven Script Engine
//!
//! The built-in [`crate::adapter::ScriptEngine`] implementation: a small
//! JavaScript-flavoured language with promises and `async`/`await`.
//!
//! ## Core Principles
//!
//! 1. **Stack-driven execution**: each function activation is a coroutine whose
//!    state lives in `frames: Vec<Frame>`, so an `await` parks it with frames intact
//! 2. **Statement-level await**: `await` may only be the whole right-hand side of
//!    an expression, declaration, assignment or return statement
//! 3. **Centralized control flow**: `Control` manages break/continue/return/throw
//! 4. **Explicit job queue**: promise reactions are queued and only drained at the
//!    end of `evaluate`/`execute`, never after a bare `invoke`
//!
//! ## Execution Flow
//!
//! ```text
//! evaluate(src) -> parse -> program coroutine -> run() -> drain jobs -> completion
//!                                                  |
//!                         await on pending promise v
//!                                        suspended coroutines <- resumed by jobs
//! ```

pub mod calls;
pub mod convert;
pub mod engine;
pub mod exec_loop;
pub mod expressions;
pub mod heap;
pub mod objects;
pub mod parser;
pub mod promise;
pub mod statements;
pub mod stdlib;
pub mod types;
pub mod vm;

#[cfg(test)]
mod tests;

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::EngineError;

use heap::Heap;
use promise::Job;
use stdlib::Protos;
use types::{CoId, Frame, FrameKind, ScopeId, Stmt};
use vm::{CoOutcome, Coroutine};

// Re-export commonly used items
pub use expressions::EvalResult;
pub use types::Val;

/* ===================== Interpreter ===================== */

pub struct Interpreter {
    pub(crate) heap: Heap,

    /// Builtins and host intrinsics (immutable bindings)
    pub(crate) globals: ScopeId,

    /// Top-level `let`/`const`/`var` and functions, shared by every evaluation
    pub(crate) script_scope: ScopeId,

    pub(crate) protos: Protos,

    /// Queued promise reactions
    pub(crate) jobs: VecDeque<Job>,

    /// Async activations parked on an await
    pub(crate) suspended: HashMap<CoId, Coroutine>,

    /// Active script call frames
    pub(crate) depth: usize,

    /// Native stack address at the outermost active call
    pub(crate) stack_base: usize,

    pub(crate) next_co: u64,

    pub(crate) config: EngineConfig,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let mut heap = Heap::default();
        let protos = Protos::alloc(&mut heap);
        let globals = heap.new_scope(None);
        let script_scope = heap.new_scope(Some(globals));

        let mut interp = Self {
            heap,
            globals,
            script_scope,
            protos,
            jobs: VecDeque::new(),
            suspended: HashMap::new(),
            depth: 0,
            stack_base: 0,
            next_co: 0,
            config,
        };
        stdlib::install(&mut interp);
        interp
    }

    /// Parse and run a script, then drain the job queue
    ///
    /// Returns the value of the last top-level expression statement. A throw is
    /// reported only after the queue has drained.
    pub fn run_script(&mut self, source: &str) -> Result<Val, EngineError> {
        let body = parser::parse(source).map_err(|e| EngineError::Syntax(e.to_string()))?;

        let scope = self.script_scope;
        self.hoist_functions(&body, scope);
        let node = Arc::new(Stmt::Block {
            body,
            span: Default::default(),
        });

        let mut co = Coroutine::program(self.next_co_id(), scope);
        co.frames.push(Frame {
            kind: FrameKind::Block { idx: 0 },
            scope,
            node,
        });
        let outcome = self.run(&mut co);

        self.run_jobs()?;

        match outcome {
            CoOutcome::Returned(v) => Ok(v),
            CoOutcome::Threw(e) => Err(self.thrown(&e)),
            CoOutcome::Suspended => Err(EngineError::Internal(
                "top-level script suspended".to_string(),
            )),
        }
    }

    /// Engine error for a thrown script value
    pub(crate) fn thrown(&self, error: &Val) -> EngineError {
        EngineError::Thrown {
            message: self.display_val(error),
            payload: self.json_of(error).unwrap_or(serde_json::Value::Null),
        }
    }

    /// Number of coroutines parked on an await
    pub fn suspended_count(&self) -> usize {
        self.suspended.len()
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("objects", &self.heap.object_count())
            .field("jobs", &self.pending_jobs())
            .field("suspended", &self.suspended.len())
            .field("depth", &self.depth)
            .finish()
    }
}
