//! RequestExecutor — the blocking `run` entry point.

use std::io::{self, Read};

use crate::body::OutgoingStream;
use crate::config::FetchConfig;
use crate::convert::response_from_host;
use crate::deferred::DeferredBridge;
use crate::error::{FetchError, FetchResult};
use crate::host::{FetchHost, FetchInit};
use crate::request::{Request, method_allows_body};
use crate::response::Response;
use crate::timeout::{TimeoutController, millis};

/// Runs finished requests against a host networking primitive.
///
/// `run` blocks the caller until the host settles the fetch, driving the
/// host executor meanwhile (see [`DeferredBridge`]).
pub struct RequestExecutor<H> {
    host: H,
    bridge: DeferredBridge,
    timeouts: TimeoutController,
    config: FetchConfig,
}

impl<H: FetchHost> RequestExecutor<H> {
    pub fn new(host: H, bridge: DeferredBridge, config: FetchConfig) -> Self {
        let timeouts = TimeoutController::new(bridge.handle().clone(), config.default_timeout);
        Self {
            host,
            bridge,
            timeouts,
            config,
        }
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    pub fn bridge(&self) -> &DeferredBridge {
        &self.bridge
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Execute `request` and return the response, or the reason it failed.
    ///
    /// A request carrying a construction error fails without any host call.
    /// Host rejections, including those caused by the timeout firing, are
    /// returned as [`FetchError::Rejected`]. The response body is read
    /// lazily and may still fail on read.
    pub fn run(&self, request: Request) -> FetchResult<Response> {
        let Request {
            method,
            url,
            headers,
            body,
            timeout,
            error,
        } = request;

        if let Some(err) = error {
            tracing::debug!(%method, %url, error = %err, "request carries a construction error");
            return Err(err);
        }

        let cancel = self.bridge.enter(|| self.timeouts.handle_for(timeout));

        let body = method_allows_body(&method).then(|| {
            let source = body.unwrap_or_else(|| Box::new(io::empty()) as Box<dyn Read + Send>);
            OutgoingStream::from_boxed(source, self.config.chunk_size)
        });

        tracing::debug!(
            %method,
            %url,
            timeout_ms = cancel.timeout().map(millis),
            has_body = body.is_some(),
            "dispatching fetch"
        );

        let init = FetchInit {
            method: method.clone(),
            headers,
            signal: cancel.signal(),
            body,
        };
        let raw = self
            .bridge
            .call(|| self.host.fetch(&url, init))
            .map_err(|rejection| {
                tracing::warn!(%method, %url, error = %rejection, "fetch rejected");
                FetchError::Rejected(rejection)
            })?;

        let response = response_from_host(raw, &self.bridge, cancel)?;
        tracing::debug!(
            %method,
            %url,
            status = response.status(),
            size = response.content_length(),
            "fetch settled"
        );
        Ok(response)
    }
}

impl<H> std::fmt::Debug for RequestExecutor<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestExecutor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
