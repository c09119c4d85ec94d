//! Error types for the engine adapter and the invocation bridge

use serde_json::Value as JsonValue;
use thiserror::Error;

/* ===================== Engine Errors ===================== */

/// Failure reported by a [`crate::adapter::ScriptEngine`]
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// Source text could not be parsed
    #[error("syntax error: {0}")]
    Syntax(String),

    /// Script code threw; `payload` is the thrown value converted to JSON
    #[error("uncaught {message}")]
    Thrown { message: String, payload: JsonValue },

    /// A value did not have the shape the caller required
    #[error("unexpected value shape: {0}")]
    Shape(String),

    /// A global binding already exists
    #[error("global `{0}` is already defined")]
    Redefinition(String),

    /// Engine bookkeeping failed (e.g. a continuation could not be resumed)
    #[error("internal engine error: {0}")]
    Internal(String),
}

/* ===================== Bridge Errors ===================== */

/// Failure surfaced by [`crate::bridge::Bridge`] and its pump
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Script text failed to evaluate, or did not produce a controller object
    #[error("script evaluation failed: {message}")]
    ScriptEvaluation { message: String },

    #[error("method `{method}` not found on controller")]
    MethodNotFound { method: String },

    #[error("controller member `{method}` is not callable")]
    NotCallable { method: String },

    /// The invoked method threw before returning
    #[error("method `{method}` threw: {message}")]
    ScriptException {
        method: String,
        message: String,
        payload: JsonValue,
    },

    /// The placeholder settled as rejected; `payload` is the script error as JSON
    #[error("asynchronous call rejected: {message}")]
    AsyncRejection { message: String, payload: JsonValue },

    /// Draining the engine failed too many times in a row
    #[error("engine drain failed {attempts} consecutive times: {last_error}")]
    DrainFailed { attempts: u32, last_error: String },

    /// The placeholder could not be inspected
    #[error("asynchronous placeholder has an unexpected shape: {message}")]
    ReflectionShape { message: String },

    #[error("asynchronous call was cancelled")]
    Cancelled,

    #[error("asynchronous call timed out after {elapsed_ms}ms")]
    TimedOut { elapsed_ms: u64 },

    /// The pump task ended without settling the call
    #[error("pump task ended before the call settled")]
    PumpAborted,

    #[error("host intrinsics unavailable: {message}")]
    Intrinsics { message: String },

    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl BridgeError {
    /// True for failures that came from the asynchronous settlement path
    pub fn is_async_failure(&self) -> bool {
        matches!(
            self,
            BridgeError::AsyncRejection { .. }
                | BridgeError::DrainFailed { .. }
                | BridgeError::ReflectionShape { .. }
                | BridgeError::Cancelled
                | BridgeError::TimedOut { .. }
                | BridgeError::PumpAborted
        )
    }

    pub(crate) fn evaluation(err: EngineError) -> Self {
        let message = match err {
            EngineError::Thrown { message, .. } => message,
            other => other.to_string(),
        };
        BridgeError::ScriptEvaluation { message }
    }

    pub(crate) fn invocation(method: &str, err: EngineError) -> Self {
        match err {
            EngineError::Thrown { message, payload } => BridgeError::ScriptException {
                method: method.to_string(),
                message,
                payload,
            },
            other => BridgeError::Engine(other),
        }
    }

    pub(crate) fn shape(err: EngineError) -> Self {
        BridgeError::ReflectionShape {
            message: err.to_string(),
        }
    }
}

pub type BridgeResult<T> = Result<T, BridgeError>;
