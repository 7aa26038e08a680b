//! Body adapters in both directions.
//!
//! [`OutgoingStream`] turns a blocking `Read` source into a chunked stream the
//! host pulls when it sends a request body. [`IncomingBody`] turns a host
//! stream reader into a blocking `Read` for the response body, bridging each
//! host pull through [`DeferredBridge`].
//!
//! # Memory Guarantee
//!
//! Both directions hold at most one chunk. The outgoing side reuses a single
//! `chunk_size` buffer across pulls and never reads ahead of the host; the
//! incoming side keeps only the unread tail of the last chunk it pulled.

use std::io::{self, ErrorKind, Read};
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Buf, Bytes};
use futures_core::stream::{FusedStream, Stream};

use crate::deferred::DeferredBridge;
use crate::error::FetchError;
use crate::host::{HostStreamReader, StreamRead};
use crate::timeout::CancellationHandle;

/// Default outgoing chunk size in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// A request body source exposed to the host as a pull-based chunk stream.
///
/// Each pull reads at most `chunk_size` bytes from the source and forwards
/// exactly what was read as one chunk. End of data or a read error closes the
/// stream for good; the source is never read again.
pub struct OutgoingStream {
    source: Box<dyn Read + Send>,
    buf: Box<[u8]>,
    done: bool,
}

impl OutgoingStream {
    pub fn new(source: impl Read + Send + 'static, chunk_size: usize) -> Self {
        Self::from_boxed(Box::new(source), chunk_size)
    }

    pub fn from_boxed(source: Box<dyn Read + Send>, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "chunk_size must be > 0");
        Self {
            source,
            buf: vec![0u8; chunk_size].into_boxed_slice(),
            done: false,
        }
    }

    /// A stream that closes on the first pull.
    pub fn empty() -> Self {
        Self::new(io::empty(), DEFAULT_CHUNK_SIZE)
    }

    pub fn chunk_size(&self) -> usize {
        self.buf.len()
    }

    /// Serve one host pull: `Some(chunk)` to enqueue, `None` to close.
    pub fn pull(&mut self) -> Option<Bytes> {
        if self.done {
            return None;
        }
        loop {
            match self.source.read(&mut self.buf) {
                Ok(0) => break,
                Ok(n) => return Some(Bytes::copy_from_slice(&self.buf[..n])),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::debug!(error = %e, "request body source failed, closing stream");
                    break;
                }
            }
        }
        self.done = true;
        None
    }
}

impl Stream for OutgoingStream {
    type Item = Bytes;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Poll::Ready(self.get_mut().pull())
    }
}

impl FusedStream for OutgoingStream {
    fn is_terminated(&self) -> bool {
        self.done
    }
}

/// The response body as a blocking reader.
///
/// Reads may be short: each one serves bytes from at most one host chunk.
/// A host chunk larger than the caller's buffer is carried over to the next
/// read. A rejected pull surfaces as an `io::Error` wrapping the
/// [`FetchError`].
pub struct IncomingBody {
    state: BodyState,
    // Keeps the request timeout armed while the body streams.
    _cancel: Option<CancellationHandle>,
}

enum BodyState {
    Empty,
    Streaming {
        reader: Box<dyn HostStreamReader>,
        bridge: DeferredBridge,
        pending: Bytes,
        done: bool,
    },
}

impl IncomingBody {
    /// A body that is exhausted from the start. No host stream exists.
    pub fn empty() -> Self {
        Self {
            state: BodyState::Empty,
            _cancel: None,
        }
    }

    /// A body backed by a host stream reader.
    pub fn streaming(reader: Box<dyn HostStreamReader>, bridge: DeferredBridge) -> Self {
        Self {
            state: BodyState::Streaming {
                reader,
                bridge,
                pending: Bytes::new(),
                done: false,
            },
            _cancel: None,
        }
    }

    pub(crate) fn with_cancellation(self, cancel: CancellationHandle) -> Self {
        Self {
            _cancel: Some(cancel),
            ..self
        }
    }

    /// Returns `true` if the body is backed by a host stream.
    pub fn is_streaming(&self) -> bool {
        matches!(self.state, BodyState::Streaming { .. })
    }
}

impl Read for IncomingBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let BodyState::Streaming {
            reader,
            bridge,
            pending,
            done,
        } = &mut self.state
        else {
            return Ok(0);
        };
        if buf.is_empty() {
            return Ok(0);
        }

        while pending.is_empty() {
            if *done {
                return Ok(0);
            }
            match bridge.call(|| reader.read()) {
                Ok(StreamRead::Chunk(chunk)) => {
                    tracing::trace!(len = chunk.len(), "pulled response body chunk");
                    *pending = chunk;
                }
                Ok(StreamRead::Done) => *done = true,
                Err(rejection) => {
                    tracing::debug!(error = %rejection, "response body pull rejected");
                    return Err(io::Error::other(FetchError::Rejected(rejection)));
                }
            }
        }

        let n = pending.len().min(buf.len());
        buf[..n].copy_from_slice(&pending[..n]);
        pending.advance(n);
        Ok(n)
    }
}

impl std::fmt::Debug for IncomingBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncomingBody")
            .field("streaming", &self.is_streaming())
            .finish()
    }
}
