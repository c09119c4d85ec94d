//! Paired future: a script-visible placeholder plus its resolving functions
//!
//! The host keeps the [`PairedFuture`] and hands `future` to script code. Settling
//! consumes the handle, so the host side can settle it at most once; the engine's
//! resolving functions additionally share an "already resolved" flag, so a second
//! call of either from script code is a no-op too.

use crate::adapter::ScriptEngine;
use crate::error::EngineError;

#[derive(Debug, Clone)]
pub struct PairedFuture<V> {
    /// The placeholder shared with script code
    pub future: V,
    /// Callable that fulfills `future`
    pub resolve: V,
    /// Callable that rejects `future`
    pub reject: V,
}

impl<V: Clone> PairedFuture<V> {
    pub fn new(future: V, resolve: V, reject: V) -> Self {
        Self {
            future,
            resolve,
            reject,
        }
    }

    /// `[future, resolve, reject]`, the order script code receives them in
    pub fn into_triple(self) -> [V; 3] {
        [self.future, self.resolve, self.reject]
    }

    /// Fulfill the placeholder with `value`
    pub fn resolve<E>(self, engine: &mut E, value: V) -> Result<(), EngineError>
    where
        E: ScriptEngine<Value = V>,
    {
        let this = engine.undefined();
        engine.invoke(&self.resolve, &this, vec![value])?;
        Ok(())
    }

    /// Reject the placeholder with `error`
    pub fn reject<E>(self, engine: &mut E, error: V) -> Result<(), EngineError>
    where
        E: ScriptEngine<Value = V>,
    {
        let this = engine.undefined();
        engine.invoke(&self.reject, &this, vec![error])?;
        Ok(())
    }
}
