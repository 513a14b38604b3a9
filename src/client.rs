use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde_json::{Map, Value};
use tokio::sync::oneshot;
use tokio::time::sleep;

use crate::{
    cancel::CancelHandle,
    credentials::Credentials,
    request::{compose_url, serialize_body, RequestDescriptor},
    transport, ClientConfig, QxError, Result,
};

/// HTTP client for the quantum computing cloud REST API.
///
/// Requests are issued with [`QxClient::get`], [`QxClient::post`] and
/// [`QxClient::put`]. Each call returns a [`RequestHandle`] immediately and
/// resolves to exactly one outcome, retrying transient failures up to the
/// configured budget and refreshing the access token once per attempt on a
/// 401.
#[derive(Clone)]
pub struct QxClient {
    http: reqwest::Client,
    credentials: Arc<Credentials>,
    config: Arc<ClientConfig>,
    retries: u32,
}

impl fmt::Debug for QxClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QxClient")
            .field("base_url", &self.config.base_url)
            .field("retries", &self.retries)
            .finish()
    }
}

/// Cancellable handle to one logical request.
///
/// The handle resolves to exactly one terminal outcome. Cancelling it stops
/// the in-flight attempt, any scheduled retry and any pending token refresh
/// as a unit; dropping the handle does not cancel the request.
pub struct RequestHandle {
    cancel: CancelHandle,
    outcome: oneshot::Receiver<Result<Value>>,
}

impl RequestHandle {
    /// Requests cancellation of the whole logical request.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns true once cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Clones the cancel handle, e.g. to aggregate several requests under
    /// one caller-owned cancellation scope.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Waits for the terminal outcome.
    pub async fn outcome(self) -> Result<Value> {
        self.outcome
            .await
            .unwrap_or_else(|_| Err(QxError::Internal("request task dropped".to_owned())))
    }
}

impl QxClient {
    /// Creates a client for the configured endpoint.
    ///
    /// `api_token` is the long-lived token used to mint session tokens; it
    /// may be omitted when no authenticated calls will be made. Fails if the
    /// configured retry budget is negative.
    pub fn new(api_token: Option<String>, config: ClientConfig) -> Result<Self> {
        if config.retries < 0 {
            return Err(QxError::InvalidConfiguration(format!(
                "retries must be non-negative, got {}",
                config.retries
            )));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            credentials: Arc::new(Credentials::new(api_token)),
            retries: config.retries as u32,
            config: Arc::new(config),
        })
    }

    /// Obtains an access token when none is present yet.
    pub async fn initialize(&self) -> Result<()> {
        self.credentials
            .initialize(&self.http, &self.config, &CancelHandle::new())
            .await
    }

    /// Snapshot of the current access token.
    pub fn access_token(&self) -> Option<String> {
        self.credentials.token()
    }

    /// Issues a GET request. `params` is an extra query-string fragment
    /// (`"&key=value"`) appended after the token parameter.
    pub fn get(&self, path: &str, params: &str, with_token: bool) -> RequestHandle {
        self.dispatch(RequestDescriptor {
            method: Method::GET,
            path: path.to_owned(),
            params: params.to_owned(),
            body: None,
            requires_token: with_token,
        })
    }

    /// Issues a POST request with a JSON object body.
    pub fn post(&self, path: &str, params: &str, body: Map<String, Value>) -> RequestHandle {
        self.dispatch(RequestDescriptor {
            method: Method::POST,
            path: path.to_owned(),
            params: params.to_owned(),
            body: Some(body),
            requires_token: true,
        })
    }

    /// Issues a PUT request with a JSON object body.
    pub fn put(&self, path: &str, params: &str, body: Map<String, Value>) -> RequestHandle {
        self.dispatch(RequestDescriptor {
            method: Method::PUT,
            path: path.to_owned(),
            params: params.to_owned(),
            body: Some(body),
            requires_token: true,
        })
    }

    fn dispatch(&self, descriptor: RequestDescriptor) -> RequestHandle {
        let cancel = CancelHandle::new();
        let (sender, receiver) = oneshot::channel();

        let client = self.clone();
        let root = cancel.clone();
        tokio::spawn(async move {
            let outcome = tokio::select! {
                _ = root.cancelled() => Err(QxError::RequestCancelled),
                outcome = client.run(&descriptor, &root) => outcome,
            };
            let _ = sender.send(outcome);
        });

        RequestHandle {
            cancel,
            outcome: receiver,
        }
    }

    /// Retry coordinator for one logical call.
    ///
    /// Build failures short-circuit before the first attempt; everything
    /// else flows through the fixed-delay retry loop until success,
    /// cancellation, a non-retryable failure or an exhausted budget.
    async fn run(&self, descriptor: &RequestDescriptor, cancel: &CancelHandle) -> Result<Value> {
        let body = descriptor.body.as_ref().map(serialize_body).transpose()?;

        let mut remaining = self.retries;
        loop {
            let outcome = self
                .attempt_with_refresh(descriptor, body.clone(), &cancel.child())
                .await;
            match outcome {
                Ok(value) => return Ok(value),
                Err(QxError::RequestCancelled) => return Err(QxError::RequestCancelled),
                Err(err) if remaining == 0 || !retryable(&err) => return Err(err),
                Err(_err) => {
                    remaining -= 1;

                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        "retrying request after {} ms ({} retries left)",
                        self.config.retry_delay_ms,
                        remaining
                    );

                    tokio::select! {
                        _ = cancel.cancelled() => return Err(QxError::RequestCancelled),
                        _ = sleep(Duration::from_millis(self.config.retry_delay_ms)) => {}
                    }
                }
            }
        }
    }

    /// One attempt wrapped in the auth-refresh guard.
    ///
    /// A 401 triggers one token refresh and one replay with the fresh
    /// token; the replay's outcome is returned as-is, even another 401. A
    /// failed refresh becomes this attempt's outcome with no replay.
    async fn attempt_with_refresh(
        &self,
        descriptor: &RequestDescriptor,
        body: Option<Vec<u8>>,
        cancel: &CancelHandle,
    ) -> Result<Value> {
        let token = self.credentials.token();
        let outcome = self
            .raw_attempt(descriptor, body.clone(), token.as_deref(), &cancel.child())
            .await;

        match outcome {
            Err(QxError::Http { status: 401, .. }) => {
                self.credentials
                    .refresh(&self.http, &self.config, token.as_deref(), &cancel.child())
                    .await?;
                let refreshed = self.credentials.token();
                self.raw_attempt(descriptor, body, refreshed.as_deref(), &cancel.child())
                    .await
            }
            other => other,
        }
    }

    async fn raw_attempt(
        &self,
        descriptor: &RequestDescriptor,
        body: Option<Vec<u8>>,
        token: Option<&str>,
        cancel: &CancelHandle,
    ) -> Result<Value> {
        let url = compose_url(&self.config.base_url, descriptor, token)?;
        transport::roundtrip(
            &self.http,
            descriptor.method.clone(),
            url,
            body,
            &self.config.client_application,
            Duration::from_millis(self.config.timeout_ms),
            cancel,
        )
        .await
    }
}

/// Build-time failures are terminal; transport and HTTP failures re-enter
/// the retry loop.
fn retryable(err: &QxError) -> bool {
    !matches!(
        err,
        QxError::MissingToken
            | QxError::InvalidUrl { .. }
            | QxError::InvalidConfiguration(_)
            | QxError::RequestCancelled
    )
}
