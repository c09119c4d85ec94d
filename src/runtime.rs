//! Script runtime: the single owner of an engine instance
//!
//! A [`ScriptRuntime`] is constructed explicitly and passed to whoever needs the
//! engine. It bundles the engine (behind a non-reentrant mutex) with the
//! configuration, the console used by `log`, the tokio handle timers and pumps
//! are spawned on, and the type registry behind `typeResolve`.
//!
//! The engine lock is only ever taken inside synchronous closures passed to
//! [`ScriptRuntime::with_engine`], so it is never held across an `.await`.
//! Natives installed into the engine receive `&mut E` from the caller that already
//! holds the lock and must not call `with_engine` themselves.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tracing::debug;

use crate::adapter::ScriptEngine;
use crate::config::Config;
use crate::console::Console;
use crate::error::{BridgeError, BridgeResult};
use crate::interpreter::Interpreter;
use crate::intrinsics;
use crate::type_registry::{TypeKey, TypeRegistry};

pub(crate) struct RuntimeInner<E: ScriptEngine> {
    engine: Mutex<E>,
    config: Config,
    console: Console,
    scheduler: Handle,
    types: TypeRegistry,
    /// Script objects handed out by `typeResolve`, one per type
    type_objects: Mutex<HashMap<TypeKey, E::Value>>,
}

/// Shared handle to one engine and its host services
pub struct ScriptRuntime<E: ScriptEngine> {
    inner: Arc<RuntimeInner<E>>,
}

impl<E: ScriptEngine> Clone for ScriptRuntime<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<E: ScriptEngine> std::fmt::Debug for ScriptRuntime<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptRuntime")
            .field("config", &self.inner.config)
            .field("primary_module", &self.inner.types.primary())
            .finish()
    }
}

impl<E: ScriptEngine> ScriptRuntime<E> {
    pub fn builder(engine: E) -> RuntimeBuilder<E> {
        RuntimeBuilder {
            engine,
            config: Config::default(),
            console: Console::default(),
            types: None,
            handle: None,
        }
    }

    /// Run `f` with exclusive access to the engine
    pub fn with_engine<R>(&self, f: impl FnOnce(&mut E) -> R) -> R {
        let mut engine = self.inner.engine.lock();
        f(&mut engine)
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn console(&self) -> &Console {
        &self.inner.console
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.inner.types
    }

    /// Handle of the tokio runtime that timers and pumps are spawned on
    pub fn scheduler(&self) -> &Handle {
        &self.inner.scheduler
    }

    /// Non-owning handle for natives and timer tasks
    pub fn downgrade(&self) -> WeakRuntime<E> {
        WeakRuntime(Arc::downgrade(&self.inner))
    }

    /// Cached script object for a type, creating it with `create` on first use
    pub(crate) fn type_object(&self, key: TypeKey, create: impl FnOnce() -> E::Value) -> E::Value {
        self.inner
            .type_objects
            .lock()
            .entry(key)
            .or_insert_with(create)
            .clone()
    }
}

impl ScriptRuntime<Interpreter> {
    /// Runtime around the built-in interpreter, configured from `config.engine`
    pub fn interpreter(config: Config) -> BridgeResult<Self> {
        let engine = Interpreter::with_config(config.engine.clone());
        Self::builder(engine).config(config).build()
    }
}

/// Weak counterpart of [`ScriptRuntime`]; does not keep the engine alive
pub struct WeakRuntime<E: ScriptEngine>(Weak<RuntimeInner<E>>);

impl<E: ScriptEngine> Clone for WeakRuntime<E> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<E: ScriptEngine> WeakRuntime<E> {
    pub fn upgrade(&self) -> Option<ScriptRuntime<E>> {
        self.0.upgrade().map(|inner| ScriptRuntime { inner })
    }
}

/* ===================== Builder ===================== */

pub struct RuntimeBuilder<E: ScriptEngine> {
    engine: E,
    config: Config,
    console: Console,
    types: Option<TypeRegistry>,
    handle: Option<Handle>,
}

impl<E: ScriptEngine> RuntimeBuilder<E> {
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    pub fn types(mut self, types: TypeRegistry) -> Self {
        self.types = Some(types);
        self
    }

    /// Spawn timers and pumps on `handle` instead of the current runtime
    pub fn handle(mut self, handle: Handle) -> Self {
        self.handle = Some(handle);
        self
    }

    /// Build the runtime and install the host intrinsics
    ///
    /// Without an explicit handle this must run inside a tokio runtime.
    pub fn build(self) -> BridgeResult<ScriptRuntime<E>> {
        let scheduler = match self.handle {
            Some(handle) => handle,
            None => Handle::try_current().map_err(|err| BridgeError::Intrinsics {
                message: format!("no tokio runtime to schedule timers on: {}", err),
            })?,
        };

        let runtime = ScriptRuntime {
            inner: Arc::new(RuntimeInner {
                engine: Mutex::new(self.engine),
                config: self.config,
                console: self.console,
                scheduler,
                types: self.types.unwrap_or_default(),
                type_objects: Mutex::new(HashMap::new()),
            }),
        };

        intrinsics::install(&runtime)?;
        debug!(primary_module = runtime.types().primary(), "script runtime ready");
        Ok(runtime)
    }
}
