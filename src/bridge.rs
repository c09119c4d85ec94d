//! Invocation bridge
//!
//! A [`Bridge`] owns one controller object (the value a script evaluates to) and
//! calls its methods from host code, either synchronously ([`Bridge::call`]) or
//! with asynchronous awareness ([`Bridge::call_async`]), where a returned promise
//! is driven to completion by a pump task.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::adapter::ScriptEngine;
use crate::error::{BridgeError, BridgeResult};
use crate::pump::{self, PendingCall};
use crate::runtime::ScriptRuntime;

pub struct Bridge<E: ScriptEngine> {
    runtime: ScriptRuntime<E>,
    controller: E::Value,
}

impl<E: ScriptEngine> std::fmt::Debug for Bridge<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bridge")
            .field("controller", &self.controller)
            .finish()
    }
}

/// Outcome of looking a method up on the controller
enum Lookup<V> {
    Found(V),
    Missing,
    NotCallable,
}

impl<E: ScriptEngine> Bridge<E> {
    /// Evaluate `source` and keep the resulting controller object
    pub fn new(runtime: &ScriptRuntime<E>, source: &str) -> BridgeResult<Self> {
        let controller = runtime.with_engine(|engine| {
            let value = engine.evaluate(source).map_err(BridgeError::evaluation)?;
            if !engine.is_object(&value) {
                return Err(BridgeError::ScriptEvaluation {
                    message: format!(
                        "script evaluated to `{}`, expected a controller object",
                        engine.display(&value)
                    ),
                });
            }
            Ok(value)
        })?;

        debug!("controller ready");
        Ok(Self {
            runtime: runtime.clone(),
            controller,
        })
    }

    pub fn controller(&self) -> &E::Value {
        &self.controller
    }

    pub fn runtime(&self) -> &ScriptRuntime<E> {
        &self.runtime
    }

    fn lookup(&self, engine: &mut E, method: &str) -> BridgeResult<Lookup<E::Value>> {
        let member = engine
            .get_property(&self.controller, method)
            .map_err(BridgeError::Engine)?;
        Ok(match member {
            None => Lookup::Missing,
            Some(value) if engine.is_callable(&value) => Lookup::Found(value),
            Some(_) => Lookup::NotCallable,
        })
    }

    /// Callable member `method`, or the lookup failure
    fn require(&self, engine: &mut E, method: &str) -> BridgeResult<E::Value> {
        match self.lookup(engine, method)? {
            Lookup::Found(func) => Ok(func),
            Lookup::Missing => Err(BridgeError::MethodNotFound {
                method: method.to_string(),
            }),
            Lookup::NotCallable => Err(BridgeError::NotCallable {
                method: method.to_string(),
            }),
        }
    }

    fn invoke(
        &self,
        engine: &mut E,
        method: &str,
        func: &E::Value,
        args: Vec<E::Value>,
    ) -> BridgeResult<E::Value> {
        debug!(method, "invoking controller method");
        engine
            .invoke(func, &self.controller, args)
            .map_err(|err| BridgeError::invocation(method, err))
    }

    /* ===================== Synchronous ===================== */

    /// Call `method` with `this` bound to the controller and return its raw result
    pub fn call(&self, method: &str, args: Vec<E::Value>) -> BridgeResult<E::Value> {
        self.runtime.with_engine(|engine| {
            let func = self.require(engine, method)?;
            self.invoke(engine, method, &func, args)
        })
    }

    /// Like [`Bridge::call`], but `Ok(None)` when the method is absent or not callable
    pub fn try_call(&self, method: &str, args: Vec<E::Value>) -> BridgeResult<Option<E::Value>> {
        self.runtime
            .with_engine(|engine| match self.lookup(engine, method)? {
                Lookup::Found(func) => self.invoke(engine, method, &func, args).map(Some),
                Lookup::Missing | Lookup::NotCallable => {
                    debug!(method, "lenient call skipped");
                    Ok(None)
                }
            })
    }

    /* ===================== Asynchronous ===================== */

    /// Call `method`; a returned promise is pumped to completion
    ///
    /// Lookup and invocation failures are returned right away. The returned
    /// [`PendingCall`] settles with the promise's outcome.
    pub fn call_async(&self, method: &str, args: Vec<E::Value>) -> BridgeResult<PendingCall<E::Value>> {
        self.call_async_with(method, args, CancellationToken::new())
    }

    /// [`Bridge::call_async`] with a token that cancels the pump
    pub fn call_async_with(
        &self,
        method: &str,
        args: Vec<E::Value>,
        cancel: CancellationToken,
    ) -> BridgeResult<PendingCall<E::Value>> {
        let (result, is_placeholder) = self.runtime.with_engine(|engine| -> BridgeResult<_> {
            let func = self.require(engine, method)?;
            let result = self.invoke(engine, method, &func, args)?;
            let is_placeholder = engine.is_placeholder(&result);
            Ok((result, is_placeholder))
        })?;

        if !is_placeholder {
            return Ok(PendingCall::ready(Ok(result)));
        }

        debug!(method, "method returned a pending placeholder, starting pump");
        Ok(pump::spawn(&self.runtime, result, cancel))
    }
}
