use thiserror::Error;

/// Failure of a single call against the identity API.
///
/// Messages are already sanitized for display; response bodies are trimmed and
/// truncated before they land here.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Transport(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Response error: {0}")]
    Decode(String),
    #[error("Signing error: {0}")]
    Signing(String),
}

impl ClientError {
    /// Maps transport errors into `ClientError` variants with timeout detection.
    pub(crate) fn from_request(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout("Request timed out. Please try again.".to_string())
        } else if err.is_decode() {
            Self::Decode(format!("Failed to decode response: {err}"))
        } else {
            Self::Transport(format!("Unable to reach the server: {err}"))
        }
    }

    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
