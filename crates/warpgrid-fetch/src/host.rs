//! The host surface the bridge consumes.
//!
//! A sandboxed host exposes networking only through deferred values: the
//! fetch call, body materialization and stream pulls all settle later, on
//! the host's own callback turns. These traits are that surface. Embedders
//! implement them over the real host bindings; tests implement them over
//! tokio tasks and timers.
//!
//! Every method is invoked with the bridge's host executor as the ambient
//! tokio context (see [`DeferredBridge::enter`](crate::DeferredBridge::enter)),
//! so implementations may `tokio::spawn` the work that later settles the
//! returned [`Deferred`].

use bytes::Bytes;

use crate::body::OutgoingStream;
use crate::deferred::Deferred;
use crate::header::HeaderMap;
use crate::timeout::AbortSignal;

/// Arguments for one host fetch call.
pub struct FetchInit {
    pub method: String,
    pub headers: HeaderMap,
    /// Observed by the host; an asserted signal should reject the call.
    pub signal: AbortSignal,
    /// Request body, pulled chunk by chunk. Always `None` for GET and HEAD.
    pub body: Option<OutgoingStream>,
}

impl std::fmt::Debug for FetchInit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchInit")
            .field("method", &self.method)
            .field("headers", &self.headers)
            .field("signal", &self.signal)
            .field("body", &self.body.is_some())
            .finish()
    }
}

/// The host networking primitive.
pub trait FetchHost {
    /// Start a fetch of `target`. Settles to a response object, or rejects
    /// with the host's error payload.
    fn fetch(&self, target: &str, init: FetchInit) -> Deferred<Box<dyn HostResponse>>;
}

/// A settled host response object.
pub trait HostResponse: Send {
    fn status(&self) -> u16;

    fn status_text(&self) -> String;

    /// Visit every header entry as `(name, value)`, in host order.
    fn for_each_header(&self, visit: &mut dyn FnMut(&str, &str));

    /// Materialize the full body as a sized blob.
    fn blob(&self) -> Deferred<Box<dyn HostBlob>>;
}

/// A fully materialized, size-known body.
pub trait HostBlob: Send {
    fn size(&self) -> u64;

    /// Open a fresh chunked reader over the blob.
    fn stream_reader(&self) -> Box<dyn HostStreamReader>;
}

/// Host-owned cursor over a chunked stream.
pub trait HostStreamReader: Send {
    /// Pull the next chunk.
    fn read(&mut self) -> Deferred<StreamRead>;
}

/// Outcome of one host stream pull: `{done: false, value}` or `{done: true}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamRead {
    Chunk(Bytes),
    Done,
}

impl<T: FetchHost + ?Sized> FetchHost for &T {
    fn fetch(&self, target: &str, init: FetchInit) -> Deferred<Box<dyn HostResponse>> {
        (**self).fetch(target, init)
    }
}

impl<T: FetchHost + ?Sized> FetchHost for std::sync::Arc<T> {
    fn fetch(&self, target: &str, init: FetchInit) -> Deferred<Box<dyn HostResponse>> {
        (**self).fetch(target, init)
    }
}
