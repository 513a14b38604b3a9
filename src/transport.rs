//! One cancellable round trip against the service.

use std::time::Duration;

use reqwest::{header, Method, Url};
use serde_json::Value;

use crate::{
    cancel::CancelHandle,
    classify::{classify, RawResponse, TransportFailure},
    request::CLIENT_APPLICATION_HEADER,
    QxError,
};

/// Sends one request and classifies the result.
///
/// The round trip races against the attempt's cancel handle; on cancel the
/// in-flight future is dropped, which closes the connection, and the outcome
/// is classified as cancelled.
pub(crate) async fn roundtrip(
    http: &reqwest::Client,
    method: Method,
    url: Url,
    body: Option<Vec<u8>>,
    client_application: &str,
    timeout: Duration,
    cancel: &CancelHandle,
) -> Result<Value, QxError> {
    let mut request = http
        .request(method, url.clone())
        .header(CLIENT_APPLICATION_HEADER, client_application)
        .timeout(timeout);
    if let Some(body) = body {
        request = request
            .header(header::CONTENT_TYPE, "application/json")
            .body(body);
    }

    let raw = tokio::select! {
        _ = cancel.cancelled() => Err(TransportFailure::Cancelled),
        exchanged = exchange(request) => exchanged,
    };
    classify(url.as_str(), raw)
}

async fn exchange(
    request: reqwest::RequestBuilder,
) -> Result<Option<RawResponse>, TransportFailure> {
    let response = request
        .send()
        .await
        .map_err(|err| TransportFailure::Other(format!("transport error: {err}")))?;

    let status = response.status().as_u16();
    let headers = response.headers().clone();
    let body = response
        .bytes()
        .await
        .map_err(|err| TransportFailure::Other(format!("transport error: {err}")))?;

    Ok(Some(RawResponse {
        status,
        headers,
        body: Some(body.to_vec()),
    }))
}
