use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Errors raised by the callback listener.
#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    /// The login flow stopped listening for redirects.
    #[error("Login flow is no longer waiting for a redirect")]
    FlowClosed,

    /// Missing or invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl IntoResponse for CallbackError {
    fn into_response(self) -> Response {
        match self {
            Self::FlowClosed => (StatusCode::GONE, self.to_string()).into_response(),
            Self::Config(_) => {
                tracing::error!(error = %self, "Callback internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
            }
        }
    }
}
