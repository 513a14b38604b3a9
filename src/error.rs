/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum QxError {
    /// The request needs an access token and none is available.
    #[error("missing access token")]
    MissingToken,
    /// Path and parameters did not resolve to a valid URL against the base.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// The string that failed to parse as an absolute URL.
        url: String,
    },
    /// The transport completed without producing a response.
    #[error("null response from {url}")]
    NullResponse { url: String },
    /// The response could not be interpreted as an HTTP response.
    #[error("invalid HTTP response from {url}")]
    InvalidHttpResponse { url: String },
    /// The response carried no body.
    #[error("null response data from {url}")]
    NullResponseData { url: String },
    /// Non-200 status code, with a diagnostic assembled from the server's
    /// error envelope when one was present.
    #[error("http error {status}: {message}")]
    Http { status: u16, message: String },
    /// The request was cancelled through its handle.
    #[error("request cancelled")]
    RequestCancelled,
    /// Transport or serialization failure.
    #[error("internal error: {0}")]
    Internal(String),
    /// The client was constructed with an invalid setting.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}
