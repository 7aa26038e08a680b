//! Abort signals and timer-backed cancellation.
//!
//! [`AbortController`] and [`AbortSignal`] mirror the host's cancellation
//! primitive: asserting the controller is observed through every clone of
//! its signal. [`TimeoutController`] turns a request's timeout into a
//! [`CancellationHandle`] whose host timer asserts the signal when it
//! elapses. Cancellation is cooperative; only the host networking primitive
//! looks at the signal.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Controller side of an abort signal.
#[derive(Debug)]
pub struct AbortController {
    tx: watch::Sender<bool>,
}

impl AbortController {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            rx: Some(self.tx.subscribe()),
        }
    }

    /// Assert the signal. Returns `true` only for the call that flipped it.
    pub fn abort(&self) -> bool {
        self.tx.send_if_modified(|aborted| {
            if *aborted {
                false
            } else {
                *aborted = true;
                true
            }
        })
    }

    pub fn is_aborted(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer side of an abort signal, passed to the host with each fetch.
#[derive(Debug, Clone)]
pub struct AbortSignal {
    rx: Option<watch::Receiver<bool>>,
}

impl AbortSignal {
    /// A signal with no controller. It never fires.
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_aborted(&self) -> bool {
        self.rx.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Completes once the signal is asserted. Pends forever if it never is,
    /// including when its controller is dropped unasserted.
    pub async fn aborted(&self) {
        if let Some(rx) = &self.rx {
            let mut rx = rx.clone();
            if rx.wait_for(|aborted| *aborted).await.is_ok() {
                return;
            }
        }
        std::future::pending::<()>().await
    }
}

/// A one-shot, timer-backed abort signal.
///
/// The timer is scheduled on the host executor when the handle is created
/// and asserts the signal once when it elapses. Dropping the handle cancels
/// the timer; a handle cannot be re-armed.
#[derive(Debug)]
pub struct CancellationHandle {
    signal: AbortSignal,
    timer: Option<JoinHandle<()>>,
    timeout: Option<Duration>,
}

impl CancellationHandle {
    /// A handle whose signal never fires.
    pub fn inert() -> Self {
        Self {
            signal: AbortSignal::never(),
            timer: None,
            timeout: None,
        }
    }

    /// Start a host timer that aborts after `timeout`.
    ///
    /// A timeout too large to express as a deadline on the host clock can
    /// never elapse, so it yields a handle that never fires.
    pub fn arm(host: &Handle, timeout: Duration) -> Self {
        let Some(deadline) = Instant::now().checked_add(timeout) else {
            tracing::debug!(
                timeout_ms = millis(timeout),
                "timeout beyond the host clock range, not arming timer"
            );
            return Self {
                signal: AbortSignal::never(),
                timer: None,
                timeout: Some(timeout),
            };
        };
        let controller = AbortController::new();
        let signal = controller.signal();
        let timer = host.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            if controller.abort() {
                tracing::debug!(
                    timeout_ms = millis(timeout),
                    "timeout elapsed, abort signal raised"
                );
            }
        });
        Self {
            signal,
            timer: Some(timer),
            timeout: Some(timeout),
        }
    }

    pub fn signal(&self) -> AbortSignal {
        self.signal.clone()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_some()
    }
}

impl Drop for CancellationHandle {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}

/// Whole milliseconds for log fields, saturating at `u64::MAX`.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Resolves per-request timeouts against the configured default.
#[derive(Debug, Clone)]
pub struct TimeoutController {
    host: Handle,
    default_timeout: Option<Duration>,
}

impl TimeoutController {
    pub fn new(host: Handle, default_timeout: Option<Duration>) -> Self {
        Self {
            host,
            default_timeout,
        }
    }

    /// The timeout that applies to a request.
    ///
    /// An explicit request timeout always wins, and an explicit zero
    /// disables cancellation even when a default is configured. The default
    /// only applies when the request names no timeout.
    pub fn effective_timeout(&self, requested: Option<Duration>) -> Option<Duration> {
        requested
            .or(self.default_timeout)
            .filter(|timeout| !timeout.is_zero())
    }

    /// Create the cancellation handle for one request. Never blocks.
    pub fn handle_for(&self, requested: Option<Duration>) -> CancellationHandle {
        match self.effective_timeout(requested) {
            Some(timeout) => CancellationHandle::arm(&self.host, timeout),
            None => CancellationHandle::inert(),
        }
    }
}
