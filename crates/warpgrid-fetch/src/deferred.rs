//! One-shot deferred values and the bridge that waits on them.
//!
//! The host hands out [`Deferred`] values for everything asynchronous: the
//! fetch call itself, body materialization and every stream pull. Each one
//! is paired with exactly one [`Resolver`], owned by host callback code,
//! which settles it once by value: `resolve` and `reject` consume the
//! resolver, so a second transition cannot be expressed.
//!
//! # Waiting without deadlocking the host
//!
//! The host runs on a single cooperative thread. [`DeferredBridge`] owns that
//! thread's executor (a current-thread tokio runtime) and waits on a
//! deferred by *driving* it: while the caller is blocked in
//! [`DeferredBridge::wait`], host timers fire and host tasks run, so the
//! callbacks that settle the deferred value get their turn. There is no poll
//! interval to tune.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use serde_json::Value;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::oneshot;

use crate::error::{FetchResult, Rejection};

/// Message used when a resolver is dropped without settling.
pub const ABANDONED_MESSAGE: &str = "deferred value dropped before settling";

type Settled<T> = Result<T, Option<Value>>;

/// Create a pending deferred value and the resolver that settles it.
pub fn deferred<T>() -> (Resolver<T>, Deferred<T>) {
    let (tx, rx) = oneshot::channel();
    (Resolver { tx }, Deferred { rx })
}

/// Producer half of a deferred value, held by host callback code.
#[derive(Debug)]
pub struct Resolver<T> {
    tx: oneshot::Sender<Settled<T>>,
}

impl<T> Resolver<T> {
    /// Settle with a value. A no-op if the consumer has gone away.
    pub fn resolve(self, value: T) {
        let _ = self.tx.send(Ok(value));
    }

    /// Settle with a raw host rejection payload, if the host supplied one.
    pub fn reject(self, payload: Option<Value>) {
        let _ = self.tx.send(Err(payload));
    }

    /// True once the consumer has dropped its [`Deferred`].
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer half of a deferred value.
///
/// Resolves to the settled value, or to a [`Rejection`] extracted from the
/// host payload. A resolver dropped without settling yields a rejection
/// carrying [`ABANDONED_MESSAGE`].
#[derive(Debug)]
pub struct Deferred<T> {
    rx: oneshot::Receiver<Settled<T>>,
}

impl<T> Deferred<T> {
    /// An already-resolved deferred value.
    pub fn resolved(value: T) -> Self {
        let (resolver, deferred) = deferred();
        resolver.resolve(value);
        deferred
    }

    /// An already-rejected deferred value.
    pub fn rejected(payload: Option<Value>) -> Self {
        let (resolver, deferred) = deferred();
        resolver.reject(payload);
        deferred
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T, Rejection>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.rx).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(Ok(value))) => Poll::Ready(Ok(value)),
            Poll::Ready(Ok(Err(payload))) => {
                Poll::Ready(Err(Rejection::from_payload(payload.as_ref())))
            }
            Poll::Ready(Err(_)) => Poll::Ready(Err(Rejection::new(ABANDONED_MESSAGE))),
        }
    }
}

/// Blocks the caller on deferred values while driving the host executor.
///
/// Cheap to clone; clones share the same host thread. Response bodies keep
/// a clone so they can pull from the host after
/// [`RequestExecutor::run`](crate::RequestExecutor::run) has returned.
///
/// `wait` must be called from ordinary blocking code, never from inside a
/// task running on the host executor.
#[derive(Clone)]
pub struct DeferredBridge {
    runtime: Arc<Runtime>,
}

impl DeferredBridge {
    /// Create a bridge over a fresh single-threaded host executor.
    pub fn new() -> FetchResult<Self> {
        let runtime = Builder::new_current_thread().enable_time().build()?;
        Ok(Self::from_runtime(runtime))
    }

    /// Wrap an existing runtime. It should be a current-thread runtime with
    /// the time driver enabled, or timeouts will never fire.
    pub fn from_runtime(runtime: Runtime) -> Self {
        Self {
            runtime: Arc::new(runtime),
        }
    }

    /// Handle for scheduling host-side work onto the bridge's executor.
    pub fn handle(&self) -> &Handle {
        self.runtime.handle()
    }

    /// Run `f` with the host executor as the ambient tokio context, so host
    /// code can `tokio::spawn` and use `tokio::time`.
    pub fn enter<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.runtime.enter();
        f()
    }

    /// Block until `deferred` settles.
    pub fn wait<T>(&self, deferred: Deferred<T>) -> Result<T, Rejection> {
        self.runtime.block_on(deferred)
    }

    /// Start a host operation inside the host context, then wait on it.
    pub fn call<T>(&self, start: impl FnOnce() -> Deferred<T>) -> Result<T, Rejection> {
        let deferred = self.enter(start);
        self.wait(deferred)
    }
}

impl std::fmt::Debug for DeferredBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredBridge").finish_non_exhaustive()
    }
}
