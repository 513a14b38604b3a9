use reqwest::{Method, Url};
use serde_json::{Map, Value};

use crate::QxError;

/// Header carrying the client application identifier on every request.
pub(crate) const CLIENT_APPLICATION_HEADER: &str = "x-qx-client-application";

/// Everything needed to issue one wire request, minus the token snapshot.
///
/// A descriptor is built once per logical call and never mutated; only the
/// token substituted into the URL changes between attempts.
#[derive(Clone, Debug)]
pub(crate) struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    /// Extra query string appended verbatim after the token parameter.
    /// Callers pass `"&key=value"` fragments.
    pub params: String,
    pub body: Option<Map<String, Value>>,
    pub requires_token: bool,
}

/// Composes the absolute request URL from the descriptor and the current
/// token snapshot.
///
/// Authenticated requests carry the token as the leading `access_token`
/// query parameter; caller-supplied params follow it unmodified.
pub(crate) fn compose_url(
    base_url: &str,
    descriptor: &RequestDescriptor,
    token: Option<&str>,
) -> Result<Url, QxError> {
    let access_token = match (descriptor.requires_token, token) {
        (true, Some(token)) => format!("?access_token={token}"),
        (true, None) => return Err(QxError::MissingToken),
        (false, _) => String::new(),
    };
    let full_path = format!("{}{access_token}{}", descriptor.path, descriptor.params);

    let base = Url::parse(base_url).map_err(|_| QxError::InvalidUrl {
        url: format!("{base_url}{full_path}"),
    })?;
    base.join(&full_path).map_err(|_| QxError::InvalidUrl {
        url: format!("{base_url}{full_path}"),
    })
}

/// Serializes a request body. Runs once per logical call; the body cannot
/// change between attempts.
pub(crate) fn serialize_body(body: &Map<String, Value>) -> Result<Vec<u8>, QxError> {
    serde_json::to_vec(body)
        .map_err(|err| QxError::Internal(format!("body serialization failed: {err}")))
}
