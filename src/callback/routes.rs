use std::future::Future;

use axum::Router;
use axum::extract::{Query, State};
use axum::http::Uri;
use axum::response::{Html, Redirect};
use axum::routing::get;
use serde::Deserialize;
use tokio::sync::mpsc;

use super::config::{CallbackConfig, LOGIN_PATH};
use super::error::CallbackError;
use super::state::CallbackState;
use crate::capture::NavigationEvent;

/// Create the callback router.
///
/// - `GET /login` redirects the browser to Kakao.
/// - `GET <redirect_uri path>` forwards the redirect URL to the login flow.
pub fn callback_routes(config: &CallbackConfig, events: mpsc::Sender<NavigationEvent>) -> Router {
    let redirect_uri = config.client.config().redirect_uri().clone();
    let redirect_path = redirect_uri.path().to_string();

    let state = CallbackState {
        authorization_url: config.client.authorization_url(),
        redirect_uri,
        events,
        success_page: config.success_page.as_str().into(),
        failure_page: config.failure_page.as_str().into(),
    };

    Router::new()
        .route(LOGIN_PATH, get(login))
        .route(&redirect_path, get(redirect))
        .with_state(state)
}

/// Bind the configured address and serve the callback router until `shutdown` resolves.
///
/// # Errors
///
/// Returns the I/O error if the listener cannot bind or the server fails.
pub async fn serve<F>(
    config: CallbackConfig,
    events: mpsc::Sender<NavigationEvent>,
    shutdown: F,
) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "Callback listener ready");

    axum::serve(listener, callback_routes(&config, events))
        .with_graceful_shutdown(shutdown)
        .await
}

// ── Login ──────────────────────────────────────────────────────────

async fn login(State(state): State<CallbackState>) -> Redirect {
    Redirect::to(state.authorization_url.as_str())
}

// ── Redirect ───────────────────────────────────────────────────────

#[derive(Deserialize)]
struct RedirectParams {
    error: Option<String>,
    error_description: Option<String>,
}

async fn redirect(
    State(state): State<CallbackState>,
    Query(params): Query<RedirectParams>,
    uri: Uri,
) -> Result<Html<String>, CallbackError> {
    let provider_error = params.error.is_some();
    if let Some(error) = &params.error {
        let desc = params.error_description.as_deref().unwrap_or("Unknown error");
        tracing::warn!(error = %error, description = %desc, "Kakao returned an OAuth error");
    }

    let mut url = state.redirect_uri.clone();
    url.set_query(uri.query());

    state
        .events
        .send(NavigationEvent::Loaded(url.into()))
        .await
        .map_err(|_| CallbackError::FlowClosed)?;

    let page = if provider_error {
        &state.failure_page
    } else {
        &state.success_page
    };
    Ok(Html(page.to_string()))
}
