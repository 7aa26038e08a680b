//! Mock host for executor integration tests.
//!
//! `MockHost` answers every fetch with one scripted reply after a delay,
//! on the bridge's host executor, and honours the abort signal the way a
//! real host does: an asserted signal rejects the pending fetch or body
//! pull with an `AbortError` payload.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;
use serde_json::{Value, json};

use warpgrid_fetch::{
    AbortSignal, Deferred, DeferredBridge, FetchHost, FetchInit, HeaderMap, HostBlob,
    HostResponse, HostStreamReader, StreamRead, deferred,
};

// ── Tracing setup ────────────────────────────────────────────────

static TRACING_INIT: Once = Once::new();

/// Initialize tracing subscriber for debug output in CI.
/// Controlled by `RUST_LOG` env var (e.g. `RUST_LOG=debug`).
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// A bridge whose host clock is paused and auto-advances when idle, so
/// delays and timeouts resolve deterministically and instantly.
pub fn paused_bridge() -> DeferredBridge {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .expect("build host runtime");
    DeferredBridge::from_runtime(runtime)
}

pub fn abort_payload() -> Value {
    json!({"name": "AbortError", "message": "The operation was aborted."})
}

// ── Scripted reply ───────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct MockReply {
    pub delay: Duration,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub chunks: Vec<Bytes>,
    pub chunk_delay: Duration,
    /// `Some(payload)` rejects the fetch; `Some(None)` rejects with no payload.
    pub reject: Option<Option<Value>>,
    pub blob_reject: Option<Value>,
}

impl MockReply {
    pub fn ok() -> Self {
        Self {
            delay: Duration::ZERO,
            status: 200,
            status_text: "OK".to_string(),
            headers: Vec::new(),
            chunks: Vec::new(),
            chunk_delay: Duration::ZERO,
            reject: None,
            blob_reject: None,
        }
    }

    pub fn status(self, status: u16, status_text: &str) -> Self {
        Self {
            status,
            status_text: status_text.to_string(),
            ..self
        }
    }

    pub fn delay(self, delay: Duration) -> Self {
        Self { delay, ..self }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn chunks(self, chunks: &[&'static str]) -> Self {
        Self {
            chunks: chunks.iter().map(|c| Bytes::from_static(c.as_bytes())).collect(),
            ..self
        }
    }

    pub fn chunk_delay(self, chunk_delay: Duration) -> Self {
        Self {
            chunk_delay,
            ..self
        }
    }

    pub fn reject(self, payload: Option<Value>) -> Self {
        Self {
            reject: Some(payload),
            ..self
        }
    }

    pub fn blob_reject(self, payload: Value) -> Self {
        Self {
            blob_reject: Some(payload),
            ..self
        }
    }
}

// ── Recorded calls ───────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub target: String,
    pub method: String,
    pub headers: HeaderMap,
    pub had_body: bool,
    pub body_chunks: Vec<Bytes>,
}

impl RecordedCall {
    pub fn body(&self) -> Vec<u8> {
        self.body_chunks.iter().flat_map(|c| c.iter().copied()).collect()
    }
}

#[derive(Default)]
pub struct Counters {
    pub blobs: AtomicUsize,
    pub readers: AtomicUsize,
    pub pulls: AtomicUsize,
}

// ── Host ─────────────────────────────────────────────────────────

pub struct MockHost {
    reply: MockReply,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    counters: Arc<Counters>,
}

impl MockHost {
    pub fn new(reply: MockReply) -> Self {
        Self {
            reply,
            calls: Arc::new(Mutex::new(Vec::new())),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }
}

impl FetchHost for MockHost {
    fn fetch(&self, target: &str, init: FetchInit) -> Deferred<Box<dyn HostResponse>> {
        let (resolver, deferred) = deferred();
        let reply = self.reply.clone();
        let calls = self.calls.clone();
        let counters = self.counters.clone();
        let target = target.to_string();

        tokio::spawn(async move {
            let FetchInit {
                method,
                headers,
                signal,
                body,
            } = init;
            let had_body = body.is_some();
            let body_chunks = match body {
                Some(stream) => stream.collect::<Vec<Bytes>>().await,
                None => Vec::new(),
            };
            calls.lock().unwrap().push(RecordedCall {
                target,
                method,
                headers,
                had_body,
                body_chunks,
            });

            tokio::select! {
                _ = tokio::time::sleep(reply.delay) => match reply.reject.clone() {
                    Some(payload) => resolver.reject(payload),
                    None => resolver.resolve(Box::new(MockResponse {
                        reply,
                        signal,
                        counters,
                    }) as Box<dyn HostResponse>),
                },
                _ = signal.aborted() => resolver.reject(Some(abort_payload())),
            }
        });
        deferred
    }
}

struct MockResponse {
    reply: MockReply,
    signal: AbortSignal,
    counters: Arc<Counters>,
}

impl HostResponse for MockResponse {
    fn status(&self) -> u16 {
        self.reply.status
    }

    fn status_text(&self) -> String {
        self.reply.status_text.clone()
    }

    fn for_each_header(&self, visit: &mut dyn FnMut(&str, &str)) {
        for (name, value) in &self.reply.headers {
            visit(name.as_str(), value.as_str());
        }
    }

    fn blob(&self) -> Deferred<Box<dyn HostBlob>> {
        self.counters.blobs.fetch_add(1, Ordering::SeqCst);
        if let Some(payload) = self.reply.blob_reject.clone() {
            return Deferred::rejected(Some(payload));
        }
        let (resolver, deferred) = deferred();
        let blob = MockBlob {
            chunks: self.reply.chunks.clone(),
            chunk_delay: self.reply.chunk_delay,
            signal: self.signal.clone(),
            counters: self.counters.clone(),
        };
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            resolver.resolve(Box::new(blob) as Box<dyn HostBlob>);
        });
        deferred
    }
}

struct MockBlob {
    chunks: Vec<Bytes>,
    chunk_delay: Duration,
    signal: AbortSignal,
    counters: Arc<Counters>,
}

impl HostBlob for MockBlob {
    fn size(&self) -> u64 {
        self.chunks.iter().map(|c| c.len() as u64).sum()
    }

    fn stream_reader(&self) -> Box<dyn HostStreamReader> {
        self.counters.readers.fetch_add(1, Ordering::SeqCst);
        Box::new(MockReader {
            chunks: self.chunks.iter().cloned().collect(),
            chunk_delay: self.chunk_delay,
            signal: self.signal.clone(),
            counters: self.counters.clone(),
        })
    }
}

struct MockReader {
    chunks: VecDeque<Bytes>,
    chunk_delay: Duration,
    signal: AbortSignal,
    counters: Arc<Counters>,
}

impl HostStreamReader for MockReader {
    fn read(&mut self) -> Deferred<StreamRead> {
        self.counters.pulls.fetch_add(1, Ordering::SeqCst);
        let next = match self.chunks.pop_front() {
            Some(chunk) => StreamRead::Chunk(chunk),
            None => StreamRead::Done,
        };
        let (resolver, deferred) = deferred();
        let delay = self.chunk_delay;
        let signal = self.signal.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => resolver.resolve(next),
                _ = signal.aborted() => resolver.reject(Some(abort_payload())),
            }
        });
        deferred
    }
}
