//! Script Engine Adapter Interface
//!
//! This module defines the stable API surface between the bridge and an embedded
//! script engine. The bridge, the intrinsics registry and the pump ONLY talk to the
//! engine through [`ScriptEngine`].
//!
//! ## Design Principles
//!
//! 1. **Single-threaded engine**: every method takes the engine by reference; callers
//!    serialize access through [`crate::runtime::ScriptRuntime`]
//! 2. **Typed placeholder access**: asynchronous placeholders are inspected through
//!    [`ScriptEngine::placeholder_status`] and [`ScriptEngine::placeholder_value`],
//!    never by poking at engine internals
//! 3. **Natives get the engine**: a [`NativeFn`] receives `&mut E` from whoever already
//!    holds the engine, so native code never has to lock it again

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::EngineError;
use crate::paired_future::PairedFuture;

/* ===================== Placeholder Status ===================== */

/// Status of a script-side asynchronous placeholder (a promise)
///
/// A placeholder moves from `Pending` to exactly one of the settled states and
/// never changes again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderStatus {
    Pending,
    Fulfilled,
    Rejected,
}

impl PlaceholderStatus {
    pub fn is_settled(self) -> bool {
        !matches!(self, PlaceholderStatus::Pending)
    }
}

impl fmt::Display for PlaceholderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlaceholderStatus::Pending => write!(f, "pending"),
            PlaceholderStatus::Fulfilled => write!(f, "fulfilled"),
            PlaceholderStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/* ===================== Native Callables ===================== */

/// Host function installable into a script engine
///
/// Arguments are `(engine, this, args)`. `Err` carries a script value that the
/// engine throws at the call site.
pub type NativeFn<E> = Arc<
    dyn Fn(
            &mut E,
            <E as ScriptEngine>::Value,
            Vec<<E as ScriptEngine>::Value>,
        ) -> Result<<E as ScriptEngine>::Value, <E as ScriptEngine>::Value>
        + Send
        + Sync,
>;

/* ===================== Engine Trait ===================== */

/// A single-threaded, cooperative script engine
pub trait ScriptEngine: Send + Sized + 'static {
    /// Script value handle
    type Value: Clone + fmt::Debug + Send + Sync + Unpin + 'static;

    /* ---------- evaluation ---------- */

    /// Evaluate source text and return its completion value
    ///
    /// Pending continuations are drained before returning.
    fn evaluate(&mut self, source: &str) -> Result<Self::Value, EngineError>;

    /// Execute source text for its side effects
    ///
    /// `execute("")` is the drain probe used by the pump: it runs no user code of
    /// its own but lets the engine advance its continuation queue.
    fn execute(&mut self, source: &str) -> Result<(), EngineError>;

    /* ---------- globals and natives ---------- */

    fn global(&self, name: &str) -> Option<Self::Value>;

    /// Install an immutable global binding
    ///
    /// Fails with [`EngineError::Redefinition`] if the name is already bound.
    fn define_global(&mut self, name: &str, value: Self::Value) -> Result<(), EngineError>;

    fn create_native(&mut self, name: &str, func: NativeFn<Self>) -> Self::Value;

    /* ---------- objects and calls ---------- */

    /// Look up a property (own or inherited); `Ok(None)` when absent
    fn get_property(
        &mut self,
        target: &Self::Value,
        key: &str,
    ) -> Result<Option<Self::Value>, EngineError>;

    fn is_object(&self, value: &Self::Value) -> bool;

    fn is_callable(&self, value: &Self::Value) -> bool;

    /// Invoke a callable without draining pending continuations afterwards
    fn invoke(
        &mut self,
        callable: &Self::Value,
        this: &Self::Value,
        args: Vec<Self::Value>,
    ) -> Result<Self::Value, EngineError>;

    /// Number of script call frames currently active
    fn call_depth(&self) -> usize;

    /// Return the call-stack bookkeeping to a clean baseline
    fn reset_call_stack(&mut self);

    /* ---------- asynchronous placeholders ---------- */

    fn is_placeholder(&self, value: &Self::Value) -> bool;

    fn placeholder_status(&self, value: &Self::Value) -> Result<PlaceholderStatus, EngineError>;

    /// Settled value (fulfilled) or error (rejected) of a placeholder
    fn placeholder_value(&self, value: &Self::Value) -> Result<Self::Value, EngineError>;

    /// Build a new pending placeholder together with its resolving functions
    fn create_paired_future(&mut self) -> Result<PairedFuture<Self::Value>, EngineError>;

    /* ---------- value conversions ---------- */

    fn undefined(&self) -> Self::Value;

    fn null(&self) -> Self::Value;

    fn make_array(&mut self, items: Vec<Self::Value>) -> Self::Value;

    /// Build a script error object (`name` is e.g. `"TypeError"`)
    fn make_error(&mut self, name: &str, message: &str) -> Self::Value;

    /// Textual representation, as the script's own string conversion would give
    fn display(&self, value: &Self::Value) -> String;

    fn to_json(&self, value: &Self::Value) -> JsonValue;

    fn from_json(&mut self, json: &JsonValue) -> Self::Value;

    fn as_number(&self, value: &Self::Value) -> Option<f64>;

    fn as_string(&self, value: &Self::Value) -> Option<String>;
}
