//! Host intrinsics installed into the script namespace
//!
//! | Global | Aliases |
//! |---|---|
//! | `typeResolve(name)` | `type`, `require` |
//! | `log(...args)` | |
//! | `scheduleDelayed(action, ms)` | `setTimeout` |
//! | `delayThenResolve(ms)` | `sleep` |
//! | `createPairedFuture()` | |
//!
//! Bindings are immutable. Installing a second time fails because the names are
//! already bound.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::adapter::{NativeFn, ScriptEngine};
use crate::config::DeferredErrorPolicy;
use crate::error::{BridgeError, BridgeResult, EngineError};
use crate::runtime::ScriptRuntime;

pub const TYPE_RESOLVE: &str = "typeResolve";
pub const LOG: &str = "log";
pub const SCHEDULE_DELAYED: &str = "scheduleDelayed";
pub const DELAY_THEN_RESOLVE: &str = "delayThenResolve";
pub const CREATE_PAIRED_FUTURE: &str = "createPairedFuture";

/// `(alias, intrinsic)` pairs bound to the same native
pub const ALIASES: &[(&str, &str)] = &[
    ("type", TYPE_RESOLVE),
    ("require", TYPE_RESOLVE),
    ("setTimeout", SCHEDULE_DELAYED),
    ("sleep", DELAY_THEN_RESOLVE),
];

/// Install every intrinsic (and its aliases) into the runtime's engine
pub fn install<E: ScriptEngine>(runtime: &ScriptRuntime<E>) -> BridgeResult<()> {
    let natives: Vec<(&str, NativeFn<E>)> = vec![
        (TYPE_RESOLVE, type_resolve(runtime)),
        (LOG, log(runtime)),
        (SCHEDULE_DELAYED, schedule_delayed(runtime)),
        (DELAY_THEN_RESOLVE, delay_then_resolve(runtime)),
        (CREATE_PAIRED_FUTURE, create_paired_future()),
    ];

    runtime
        .with_engine(|engine| -> Result<(), EngineError> {
            for (name, func) in natives {
                let native = engine.create_native(name, func);
                engine.define_global(name, native.clone())?;
                for (alias, _) in ALIASES.iter().filter(|(_, target)| *target == name) {
                    engine.define_global(alias, native.clone())?;
                }
            }
            Ok(())
        })
        .map_err(|err| BridgeError::Intrinsics {
            message: err.to_string(),
        })
}

/// Delay argument in milliseconds; missing, non-numeric or negative means zero
fn delay_arg<E: ScriptEngine>(engine: &E, value: Option<&E::Value>) -> Duration {
    value
        .and_then(|v| engine.as_number(v))
        .filter(|ms| ms.is_finite() && *ms > 0.0)
        .map(|ms| Duration::from_micros((ms * 1000.0) as u64))
        .unwrap_or(Duration::ZERO)
}

/// Box a closure as a [`NativeFn`] (the bound drives closure signature inference)
fn native<E, F>(func: F) -> NativeFn<E>
where
    E: ScriptEngine,
    F: Fn(&mut E, E::Value, Vec<E::Value>) -> Result<E::Value, E::Value> + Send + Sync + 'static,
{
    Arc::new(func)
}

/// Convert an adapter failure inside a native into a thrown script error
fn script_error<E: ScriptEngine>(engine: &mut E, err: EngineError) -> E::Value {
    engine.make_error("Error", &err.to_string())
}

/* ===================== typeResolve ===================== */

fn type_resolve<E: ScriptEngine>(runtime: &ScriptRuntime<E>) -> NativeFn<E> {
    let weak = runtime.downgrade();
    native(move |engine: &mut E, _this, args| {
        let Some(name) = args.first().and_then(|v| engine.as_string(v)) else {
            return Ok(engine.null());
        };
        let Some(runtime) = weak.upgrade() else {
            return Ok(engine.null());
        };
        match runtime.types().resolve(&name) {
            Some(handle) => {
                let described = handle.describe();
                Ok(runtime.type_object(handle.key(), || engine.from_json(&described)))
            }
            None => {
                debug!(type_name = %name, "type not found");
                Ok(engine.null())
            }
        }
    })
}

/* ===================== log ===================== */

fn log<E: ScriptEngine>(runtime: &ScriptRuntime<E>) -> NativeFn<E> {
    let console = runtime.console().clone();
    native(move |engine: &mut E, _this, args| {
        let line = args
            .iter()
            .map(|arg| engine.display(arg))
            .collect::<Vec<_>>()
            .join(", ");
        console.write_line(&line);
        Ok(engine.undefined())
    })
}

/* ===================== scheduleDelayed ===================== */

fn schedule_delayed<E: ScriptEngine>(runtime: &ScriptRuntime<E>) -> NativeFn<E> {
    let weak = runtime.downgrade();
    let scheduler = runtime.scheduler().clone();
    let policy = runtime.config().timers.deferred_error_policy;

    native(move |engine: &mut E, _this, args| {
        let action = match args.first() {
            Some(action) if engine.is_callable(action) => action.clone(),
            _ => {
                return Err(engine.make_error(
                    "TypeError",
                    "scheduleDelayed: action is not a function",
                ))
            }
        };
        let delay = delay_arg(engine, args.get(1));
        let weak = weak.clone();

        scheduler.spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(runtime) = weak.upgrade() else {
                debug!("runtime dropped before deferred call ran");
                return;
            };
            let result = runtime.with_engine(|engine| {
                let this = engine.undefined();
                engine.invoke(&action, &this, Vec::new())
            });
            if let Err(err) = result {
                match policy {
                    DeferredErrorPolicy::Log => {
                        error!(error = %err, "deferred call failed");
                    }
                    DeferredErrorPolicy::Propagate => {
                        panic!("deferred call failed: {}", err);
                    }
                }
            }
        });

        Ok(engine.undefined())
    })
}

/* ===================== delayThenResolve ===================== */

fn delay_then_resolve<E: ScriptEngine>(runtime: &ScriptRuntime<E>) -> NativeFn<E> {
    let weak = runtime.downgrade();
    let scheduler = runtime.scheduler().clone();

    native(move |engine: &mut E, _this, args| {
        let delay = delay_arg(engine, args.first());
        let paired = match engine.create_paired_future() {
            Ok(paired) => paired,
            Err(err) => return Err(script_error(engine, err)),
        };
        let future = paired.future.clone();
        let weak = weak.clone();

        scheduler.spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(runtime) = weak.upgrade() else {
                return;
            };
            let result = runtime.with_engine(|engine| {
                let value = engine.undefined();
                paired.resolve(engine, value)
            });
            if let Err(err) = result {
                warn!(error = %err, "failed to resolve delayed future");
            }
        });

        Ok(future)
    })
}

/* ===================== createPairedFuture ===================== */

fn create_paired_future<E: ScriptEngine>() -> NativeFn<E> {
    native(|engine: &mut E, _this, _args| {
        match engine.create_paired_future() {
            Ok(paired) => {
                let items = paired.into_triple().to_vec();
                Ok(engine.make_array(items))
            }
            Err(err) => Err(script_error(engine, err)),
        }
    })
}
