use std::sync::RwLock;
use std::time::Duration;

use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

use crate::{
    cancel::CancelHandle,
    request::{compose_url, serialize_body, RequestDescriptor},
    transport, ClientConfig, QxError,
};

/// Login endpoint exchanging a long-lived API token for a session token.
const LOGIN_PATH: &str = "users/loginWithToken";

#[derive(Debug, Deserialize)]
struct LoginReply {
    /// The freshly minted access token.
    id: String,
}

/// Shared credential state for one client session.
///
/// The access token is the only mutable state shared across concurrent
/// requests: readers take a lock-guarded snapshot and see either the old or
/// the new token, never a partial write. Refreshes are single-flight, so
/// concurrent 401s collapse into one login round trip.
pub(crate) struct Credentials {
    api_token: Option<String>,
    access_token: RwLock<Option<String>>,
    refresh_gate: tokio::sync::Mutex<()>,
}

impl Credentials {
    pub(crate) fn new(api_token: Option<String>) -> Self {
        Self {
            api_token,
            access_token: RwLock::new(None),
            refresh_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Snapshot of the current access token.
    pub(crate) fn token(&self) -> Option<String> {
        self.access_token
            .read()
            .expect("access token lock poisoned")
            .clone()
    }

    fn publish(&self, token: String) {
        *self
            .access_token
            .write()
            .expect("access token lock poisoned") = Some(token);
    }

    /// Obtains an access token when none is present yet.
    pub(crate) async fn initialize(
        &self,
        http: &reqwest::Client,
        config: &ClientConfig,
        cancel: &CancelHandle,
    ) -> Result<(), QxError> {
        if self.token().is_some() {
            return Ok(());
        }
        self.refresh(http, config, None, cancel).await
    }

    /// Mints a fresh access token from the long-lived API token.
    ///
    /// `stale` is the token the caller held when the service rejected it.
    /// If another request already replaced that token, the login round trip
    /// is skipped and the caller replays with the newer token.
    pub(crate) async fn refresh(
        &self,
        http: &reqwest::Client,
        config: &ClientConfig,
        stale: Option<&str>,
        cancel: &CancelHandle,
    ) -> Result<(), QxError> {
        let _gate = self.refresh_gate.lock().await;
        if self.token().as_deref() != stale {
            return Ok(());
        }
        let Some(api_token) = self.api_token.as_deref() else {
            return Err(QxError::MissingToken);
        };

        #[cfg(feature = "tracing")]
        tracing::debug!("refreshing access token");

        let descriptor = RequestDescriptor {
            method: Method::POST,
            path: LOGIN_PATH.to_owned(),
            params: String::new(),
            body: None,
            requires_token: false,
        };
        let url = compose_url(&config.base_url, &descriptor, None)?;
        let mut login = serde_json::Map::new();
        login.insert("apiToken".to_owned(), json!(api_token));
        let body = serialize_body(&login)?;

        let response = transport::roundtrip(
            http,
            Method::POST,
            url,
            Some(body),
            &config.client_application,
            Duration::from_millis(config.timeout_ms),
            cancel,
        )
        .await?;

        let reply: LoginReply = serde_json::from_value(response)
            .map_err(|err| QxError::Internal(format!("malformed login response: {err}")))?;
        self.publish(reply.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::Credentials;
    use crate::{cancel::CancelHandle, ClientConfig};

    #[test]
    fn token_starts_absent_and_publishes_atomically() {
        let credentials = Credentials::new(Some("api".to_owned()));
        assert!(credentials.token().is_none());
        credentials.publish("session".to_owned());
        assert_eq!(credentials.token().as_deref(), Some("session"));
    }

    #[tokio::test]
    async fn initialize_short_circuits_when_token_present() {
        let credentials = Credentials::new(None);
        credentials.publish("session".to_owned());

        // No API token and an unroutable base URL: reaching the network
        // here would fail loudly.
        let config = ClientConfig {
            base_url: "https://login.invalid/api/".to_owned(),
            ..ClientConfig::default()
        };
        credentials
            .initialize(&reqwest::Client::new(), &config, &CancelHandle::new())
            .await
            .expect("must not hit the network");
    }

    #[tokio::test]
    async fn refresh_without_api_token_is_missing_token() {
        let credentials = Credentials::new(None);
        let err = credentials
            .refresh(
                &reqwest::Client::new(),
                &ClientConfig::default(),
                None,
                &CancelHandle::new(),
            )
            .await
            .expect_err("must fail");
        assert!(matches!(err, crate::QxError::MissingToken));
    }

    #[tokio::test]
    async fn refresh_skips_login_when_token_already_replaced() {
        let credentials = Credentials::new(Some("api".to_owned()));
        credentials.publish("fresh".to_owned());

        // The caller saw "stale" fail; someone else already published
        // "fresh", so no login round trip happens.
        let config = ClientConfig {
            base_url: "https://login.invalid/api/".to_owned(),
            ..ClientConfig::default()
        };
        credentials
            .refresh(
                &reqwest::Client::new(),
                &config,
                Some("stale"),
                &CancelHandle::new(),
            )
            .await
            .expect("must skip the round trip");
        assert_eq!(credentials.token().as_deref(), Some("fresh"));
    }
}
