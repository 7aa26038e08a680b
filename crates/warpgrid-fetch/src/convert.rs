//! Conversion from settled host response objects to [`Response`].
//!
//! These functions are `pub(crate)`: the executor is the only caller. Host
//! response shapes stay behind the [`HostResponse`] trait, so only this
//! module changes when the host surface does.

use crate::body::IncomingBody;
use crate::deferred::DeferredBridge;
use crate::error::{FetchError, FetchResult};
use crate::header::HeaderMap;
use crate::host::HostResponse;
use crate::response::Response;
use crate::timeout::CancellationHandle;

/// Build a [`Response`] from a settled host response.
///
/// The body is materialized as a blob first so its size is known before any
/// streaming starts. A zero-size blob gets an exhausted body and no host
/// stream is opened. `cancel` travels with a streaming body so the request
/// timeout keeps covering body reads.
///
/// A blob that fails to materialize is reported as [`FetchError::Body`].
pub(crate) fn response_from_host(
    host: Box<dyn HostResponse>,
    bridge: &DeferredBridge,
    cancel: CancellationHandle,
) -> FetchResult<Response> {
    let status = host.status();
    let status_text = host.status_text();
    let headers = headers_from_host(host.as_ref());

    let blob = bridge.call(|| host.blob()).map_err(|rejection| {
        tracing::error!(status, error = %rejection, "settled response failed to materialize its body");
        FetchError::Body(rejection)
    })?;

    let size = blob.size();
    let body = if size == 0 {
        IncomingBody::empty()
    } else {
        let reader = bridge.enter(|| blob.stream_reader());
        IncomingBody::streaming(reader, bridge.clone()).with_cancellation(cancel)
    };

    Ok(Response::new(status, status_text, headers, size, body))
}

fn headers_from_host(host: &dyn HostResponse) -> HeaderMap {
    let mut headers = HeaderMap::new();
    host.for_each_header(&mut |name, value| headers.insert(name, value));
    headers
}
