//! script-bridge: call into a single-threaded script engine from tokio
//!
//! Scripts evaluate to a controller object whose methods the host calls through a
//! [`Bridge`]. Methods that return a promise are driven to completion by a pump
//! that interleaves engine drains with host yields, so no host thread blocks and
//! the engine is never entered concurrently.

pub mod adapter;
pub mod bridge;
pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod interpreter;
pub mod intrinsics;
pub mod paired_future;
pub mod pump;
pub mod runtime;
pub mod type_registry;

pub use adapter::{NativeFn, PlaceholderStatus, ScriptEngine};
pub use bridge::Bridge;
pub use config::Config;
pub use console::Console;
pub use error::{BridgeError, BridgeResult, EngineError};
pub use interpreter::Interpreter;
pub use paired_future::PairedFuture;
pub use pump::{PendingCall, PumpState};
pub use runtime::ScriptRuntime;
pub use type_registry::{TypeHandle, TypeRegistry};
