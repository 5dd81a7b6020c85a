#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The backend answered the exchange with a non-success status.
    #[error("{operation} failed (status {status:?}): {detail}")]
    OAuth {
        operation: &'static str,
        status: Option<u16>,
        detail: String,
    },
    #[cfg(feature = "oauth")]
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Malformed response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Session store error: {0}")]
    Store(String),
    /// No complete credential set is available.
    #[error("Not authenticated")]
    Unauthenticated,
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<crate::store::StoreError> for Error {
    fn from(e: crate::store::StoreError) -> Self {
        Self::Store(e.to_string())
    }
}
