use std::net::SocketAddr;

use url::Url;

use super::error::CallbackError;
use crate::oauth::{AuthClient, ExchangeEndpoint, OAuthConfig};

const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

/// Path of the route that sends the browser to Kakao.
pub(super) const LOGIN_PATH: &str = "/login";

/// Callback listener configuration.
///
/// Use [`from_env()`](CallbackConfig::from_env) for convention-based setup,
/// or [`new()`](CallbackConfig::new) with `with_*` methods for full control.
pub struct CallbackConfig {
    pub(super) client: AuthClient,
    pub(super) listen_addr: SocketAddr,
    pub(super) success_page: String,
    pub(super) failure_page: String,
}

impl CallbackConfig {
    /// Create config around a configured `AuthClient`.
    ///
    /// # Errors
    ///
    /// Returns [`CallbackError::Config`] if the redirect URI path collides with
    /// the `/login` route.
    pub fn new(client: AuthClient) -> Result<Self, CallbackError> {
        if client.config().redirect_uri().path() == LOGIN_PATH {
            return Err(CallbackError::Config(format!(
                "OPT_REDIRECT_URI path must not be {LOGIN_PATH}"
            )));
        }
        Ok(Self {
            client,
            listen_addr: DEFAULT_LISTEN_ADDR.parse().expect("valid default address"),
            success_page: DEFAULT_SUCCESS_PAGE.to_string(),
            failure_page: DEFAULT_FAILURE_PAGE.to_string(),
        })
    }

    /// Create config from environment variables.
    ///
    /// # Required env vars
    /// - `OPT_KAKAO_CLIENT_ID`: Kakao REST API key
    /// - `OPT_REDIRECT_URI`: redirect URI registered with Kakao
    /// - `OPT_BASE_URL`: OPT backend root URL
    ///
    /// # Optional env vars
    /// - `OPT_KAKAO_AUTH_URL`: Override the Kakao authorize endpoint
    /// - `OPT_EXCHANGE_MODE`: `query` (default) or `json`
    /// - `OPT_LISTEN_ADDR`: Listener address (default `127.0.0.1:8080`)
    ///
    /// # Errors
    ///
    /// Returns [`CallbackError::Config`] if required env vars are missing, values are
    /// invalid, or the redirect URI path is `/login`.
    pub fn from_env() -> Result<Self, CallbackError> {
        let client_id = required("OPT_KAKAO_CLIENT_ID")?;
        let redirect_uri = parse_url("OPT_REDIRECT_URI", &required("OPT_REDIRECT_URI")?)?;
        let base_url = parse_url("OPT_BASE_URL", &required("OPT_BASE_URL")?)?;

        let mut config = OAuthConfig::new(client_id, redirect_uri, base_url);

        if let Ok(url_str) = std::env::var("OPT_KAKAO_AUTH_URL") {
            config = config.with_auth_url(parse_url("OPT_KAKAO_AUTH_URL", &url_str)?);
        }
        if let Ok(mode) = std::env::var("OPT_EXCHANGE_MODE") {
            let endpoint: ExchangeEndpoint = mode
                .parse()
                .map_err(|e| CallbackError::Config(format!("OPT_EXCHANGE_MODE: {e}")))?;
            config = config.with_exchange_endpoint(endpoint);
        }

        let mut callback = Self::new(AuthClient::new(config))?;
        if let Ok(addr) = std::env::var("OPT_LISTEN_ADDR") {
            let addr: SocketAddr = addr
                .parse()
                .map_err(|e| CallbackError::Config(format!("OPT_LISTEN_ADDR: {e}")))?;
            callback = callback.with_listen_addr(addr);
        }
        Ok(callback)
    }

    #[must_use]
    pub fn with_listen_addr(mut self, addr: SocketAddr) -> Self {
        self.listen_addr = addr;
        self
    }

    /// HTML shown in the browser once the redirect has been received.
    #[must_use]
    pub fn with_success_page(mut self, html: impl Into<String>) -> Self {
        self.success_page = html.into();
        self
    }

    /// HTML shown in the browser when Kakao redirected with an `error` parameter.
    #[must_use]
    pub fn with_failure_page(mut self, html: impl Into<String>) -> Self {
        self.failure_page = html.into();
        self
    }

    /// Backend client the listener builds the authorization URL from.
    #[must_use]
    pub fn client(&self) -> &AuthClient {
        &self.client
    }

    /// Address the listener binds.
    #[must_use]
    pub fn listen_addr(&self) -> SocketAddr {
        self.listen_addr
    }
}

fn required(name: &str) -> Result<String, CallbackError> {
    std::env::var(name).map_err(|_| CallbackError::Config(format!("{name} is required")))
}

fn parse_url(name: &str, value: &str) -> Result<Url, CallbackError> {
    value
        .parse()
        .map_err(|e| CallbackError::Config(format!("{name}: {e}")))
}

const DEFAULT_SUCCESS_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>OPT login</title></head>
<body style="font-family: sans-serif; text-align: center; margin-top: 4rem;">
  <h1>Kakao login received</h1>
  <p>You can close this window and return to OPT.</p>
</body>
</html>"#;

const DEFAULT_FAILURE_PAGE: &str = r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"><title>OPT login</title></head>
<body style="font-family: sans-serif; text-align: center; margin-top: 4rem;">
  <h1>Kakao login failed</h1>
  <p>Kakao did not grant access. Close this window and try again from OPT.</p>
</body>
</html>"#;
