//! WarpGrid guest fetch bridge.
//!
//! Lets blocking request/response code run inside a sandboxed,
//! single-threaded host whose only networking is asynchronous: a fetch call
//! returning a deferred value, an abortable timer, and chunked stream
//! readers. [`RequestExecutor::run`] takes a finished [`Request`] and
//! blocks until the host answers, returning a [`Response`] whose body is
//! read lazily from the host.
//!
//! # Bridging Model
//!
//! ```text
//! RequestExecutor::run(Request)
//!   ├── TimeoutController  → CancellationHandle (host timer + AbortSignal)
//!   ├── OutgoingStream     ← request body, pulled by the host in chunks
//!   ├── FetchHost::fetch   → Deferred<HostResponse>
//!   ├── DeferredBridge     waits, driving the host executor
//!   └── response_from_host → Response { IncomingBody (Read) }
//! ```
//!
//! Every host operation returns a one-shot [`Deferred`]. The
//! [`DeferredBridge`] waits on it by running the host's single cooperative
//! executor until it settles, so host callbacks, timers included, keep
//! getting their turns while the caller is blocked.
//!
//! # Memory Guarantee
//!
//! Request bodies are read one bounded chunk per host pull, and response
//! bodies hold at most the unread part of one host chunk. Neither direction
//! buffers a whole body unless the caller asks for it
//! ([`Response::into_bytes`]).

pub mod body;
pub mod config;
mod convert;
pub mod deferred;
mod error;
mod executor;
mod header;
pub mod host;
mod request;
mod response;
pub mod timeout;

pub use body::{DEFAULT_CHUNK_SIZE, IncomingBody, OutgoingStream};
pub use config::FetchConfig;
pub use deferred::{Deferred, DeferredBridge, Resolver, deferred};
pub use error::{FetchError, FetchResult, Rejection};
pub use executor::RequestExecutor;
pub use header::{Header, HeaderMap};
pub use host::{FetchHost, FetchInit, HostBlob, HostResponse, HostStreamReader, StreamRead};
pub use request::Request;
pub use response::Response;
pub use timeout::{AbortController, AbortSignal, CancellationHandle, TimeoutController};
