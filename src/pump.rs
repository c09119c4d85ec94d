//! Promise pump
//!
//! Drives a script-side placeholder to completion from the host side. The engine
//! only runs its continuation queue when someone enters it, so the pump loops:
//!
//! ```text
//! Invoking -> Polling -+-> yield / sleep (cancellation checked here)
//!                      +-> read status
//!                      |     Pending   -> drain with execute("") when no frames are active
//!                      |     Fulfilled -> Settled(Ok(value))
//!                      |     Rejected  -> Settled(Err(AsyncRejection))
//!                      +-> loop
//! ```
//!
//! The engine lock is taken once per iteration, inside a synchronous closure, and
//! released before the next suspension.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::adapter::{PlaceholderStatus, ScriptEngine};
use crate::config::PumpConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::runtime::ScriptRuntime;

/* ===================== State ===================== */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PumpState {
    /// The method has been invoked and returned a pending placeholder
    Invoking,
    /// Interleaving engine drains with host yields
    Polling,
    /// The outcome has been delivered
    Settled,
}

/// Counters shared between a pump task and its [`PendingCall`]
#[derive(Debug, Default)]
pub struct PumpStats {
    iterations: AtomicU64,
    drains: AtomicU64,
    drain_failures: AtomicU64,
}

impl PumpStats {
    /// Polling iterations completed
    pub fn iterations(&self) -> u64 {
        self.iterations.load(Ordering::Relaxed)
    }

    /// Drain attempts made
    pub fn drains(&self) -> u64 {
        self.drains.load(Ordering::Relaxed)
    }

    /// Drain attempts that failed (consecutive or not)
    pub fn drain_failures(&self) -> u64 {
        self.drain_failures.load(Ordering::Relaxed)
    }
}

/* ===================== Pump Task ===================== */

struct Pump<E: ScriptEngine> {
    call_id: Uuid,
    runtime: ScriptRuntime<E>,
    placeholder: E::Value,
    cancel: CancellationToken,
    stats: Arc<PumpStats>,
    config: PumpConfig,
    state: PumpState,
    consecutive_failures: u32,
}

impl<E: ScriptEngine> Pump<E> {
    async fn run(mut self) -> BridgeResult<E::Value> {
        self.transition(PumpState::Polling);
        let started = Instant::now();
        let timeout = (self.config.timeout_ms > 0).then(|| Duration::from_millis(self.config.timeout_ms));

        let outcome = loop {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break Err(BridgeError::Cancelled),
                _ = pause(self.config.poll_interval_ms) => {}
            }
            self.stats.iterations.fetch_add(1, Ordering::Relaxed);

            if let Some(outcome) = self.poll_once() {
                break outcome;
            }

            if let Some(limit) = timeout {
                let elapsed = started.elapsed();
                if elapsed >= limit {
                    break Err(BridgeError::TimedOut {
                        elapsed_ms: elapsed.as_millis() as u64,
                    });
                }
            }
        };

        self.transition(PumpState::Settled);
        outcome
    }

    fn transition(&mut self, next: PumpState) {
        debug!(call_id = %self.call_id, from = ?self.state, to = ?next, "pump state");
        self.state = next;
    }

    /// One status read (and drain, while pending); `Some` once the call settled
    fn poll_once(&mut self) -> Option<BridgeResult<E::Value>> {
        let runtime = self.runtime.clone();
        runtime.with_engine(|engine| {
            let status = match engine.placeholder_status(&self.placeholder) {
                Ok(status) => status,
                Err(err) => return Some(Err(BridgeError::shape(err))),
            };

            match status {
                PlaceholderStatus::Pending => self.drain(engine).map(Err),
                PlaceholderStatus::Fulfilled => Some(
                    engine
                        .placeholder_value(&self.placeholder)
                        .map_err(BridgeError::shape),
                ),
                PlaceholderStatus::Rejected => {
                    let reason = match engine.placeholder_value(&self.placeholder) {
                        Ok(reason) => reason,
                        Err(err) => return Some(Err(BridgeError::shape(err))),
                    };
                    let rejection = BridgeError::AsyncRejection {
                        message: engine.display(&reason),
                        payload: engine.to_json(&reason),
                    };
                    error!(call_id = %self.call_id, error = %rejection, "asynchronous call rejected");
                    Some(Err(rejection))
                }
            }
        })
    }

    /// Let the engine run pending continuations
    ///
    /// Skipped while script frames are active. Returns an error only once the
    /// consecutive-failure cap is reached.
    fn drain(&mut self, engine: &mut E) -> Option<BridgeError> {
        if engine.call_depth() != 0 {
            return None;
        }

        self.stats.drains.fetch_add(1, Ordering::Relaxed);
        match engine.execute("") {
            Ok(()) => {
                self.consecutive_failures = 0;
                None
            }
            Err(err) => {
                engine.reset_call_stack();
                self.consecutive_failures += 1;
                self.stats.drain_failures.fetch_add(1, Ordering::Relaxed);
                warn!(
                    call_id = %self.call_id,
                    attempt = self.consecutive_failures,
                    error = %err,
                    "engine drain failed"
                );

                let cap = self.config.max_consecutive_drain_failures;
                (cap > 0 && self.consecutive_failures >= cap).then(|| BridgeError::DrainFailed {
                    attempts: self.consecutive_failures,
                    last_error: err.to_string(),
                })
            }
        }
    }
}

async fn pause(poll_interval_ms: u64) {
    if poll_interval_ms == 0 {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(Duration::from_millis(poll_interval_ms)).await;
    }
}

/// Spawn a pump for `placeholder` on the runtime's scheduler
pub(crate) fn spawn<E: ScriptEngine>(
    runtime: &ScriptRuntime<E>,
    placeholder: E::Value,
    cancel: CancellationToken,
) -> PendingCall<E::Value> {
    let call_id = Uuid::new_v4();
    let stats = Arc::new(PumpStats::default());
    let (tx, rx) = oneshot::channel();

    let pump = Pump {
        call_id,
        runtime: runtime.clone(),
        placeholder,
        cancel,
        stats: stats.clone(),
        config: runtime.config().pump.clone(),
        state: PumpState::Invoking,
        consecutive_failures: 0,
    };

    runtime.scheduler().spawn(async move {
        let outcome = pump.run().await;
        // the caller may have dropped its PendingCall; the pump still ran to the end
        let _ = tx.send(outcome);
    });

    PendingCall {
        call_id,
        inner: PendingInner::Pumping(rx),
        stats,
    }
}

/* ===================== Host Awaitable ===================== */

enum PendingInner<V> {
    Ready(Option<BridgeResult<V>>),
    Pumping(oneshot::Receiver<BridgeResult<V>>),
}

/// Host-side awaitable for a script method call
///
/// Either already settled (the method returned a plain value) or fed by a pump
/// task. Dropping it does not stop the pump; cancel the token passed to
/// `call_async_with` for that.
pub struct PendingCall<V> {
    call_id: Uuid,
    inner: PendingInner<V>,
    stats: Arc<PumpStats>,
}

impl<V> PendingCall<V> {
    pub(crate) fn ready(result: BridgeResult<V>) -> Self {
        Self {
            call_id: Uuid::new_v4(),
            inner: PendingInner::Ready(Some(result)),
            stats: Arc::new(PumpStats::default()),
        }
    }

    pub fn call_id(&self) -> Uuid {
        self.call_id
    }

    /// True when no pump was needed
    pub fn is_ready(&self) -> bool {
        matches!(self.inner, PendingInner::Ready(_))
    }

    /// Pump iterations so far (zero for an already-settled call)
    pub fn iterations(&self) -> u64 {
        self.stats.iterations()
    }

    pub fn stats(&self) -> &PumpStats {
        &self.stats
    }
}

impl<V> std::fmt::Debug for PendingCall<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingCall")
            .field("call_id", &self.call_id)
            .field("ready", &self.is_ready())
            .field("stats", &self.stats)
            .finish()
    }
}

impl<V: Unpin> Future for PendingCall<V> {
    type Output = BridgeResult<V>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match &mut this.inner {
            PendingInner::Ready(slot) => {
                Poll::Ready(slot.take().unwrap_or(Err(BridgeError::PumpAborted)))
            }
            PendingInner::Pumping(rx) => Pin::new(rx)
                .poll(cx)
                .map(|received| received.unwrap_or(Err(BridgeError::PumpAborted))),
        }
    }
}
