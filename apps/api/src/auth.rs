//! Request gate in front of generation. A rejection is a message for the
//! user; the handler streams it instead of calling the model.

use axum::http::HeaderMap;

/// Header carrying the caller's access key.
pub const ACCESS_KEY_HEADER: &str = "x-cvtailor-key";

pub const MISSING_KEY_MESSAGE: &str = "Access key required. Please provide your access key.";
pub const INVALID_KEY_MESSAGE: &str = "Invalid access key. Please check your key and try again.";

/// Decides whether a request may trigger generation.
///
/// Carried in `AppState` as `Arc<dyn RequestValidator>`.
pub trait RequestValidator: Send + Sync {
    /// `None` lets the request through; `Some(message)` rejects it.
    fn validate(&self, headers: &HeaderMap) -> Option<String>;
}

/// Compares the access key header against one configured key.
/// With no key configured every request passes.
pub struct AccessKeyValidator {
    expected: Option<String>,
}

impl AccessKeyValidator {
    pub fn new(expected: Option<String>) -> Self {
        Self { expected }
    }
}

impl RequestValidator for AccessKeyValidator {
    fn validate(&self, headers: &HeaderMap) -> Option<String> {
        let expected = self.expected.as_deref()?;

        let provided = headers
            .get(ACCESS_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match provided {
            None => Some(MISSING_KEY_MESSAGE.to_string()),
            Some(key) if key == expected => None,
            Some(_) => Some(INVALID_KEY_MESSAGE.to_string()),
        }
    }
}
