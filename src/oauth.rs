use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Error;
use crate::session::SessionCredentials;
use crate::types::{AuthorizationCode, MemberId, Role};

/// Backend endpoint that performs the code-for-token exchange.
///
/// The backend exposes two contracts for the same exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExchangeEndpoint {
    /// `POST <base>/auth/kakao-front?code=<code>` with an empty body.
    #[default]
    Query,
    /// `POST <base>/auth/kakao` with body `{"code": "<code>"}`.
    JsonBody,
}

impl ExchangeEndpoint {
    fn path(self) -> [&'static str; 2] {
        match self {
            Self::Query => ["auth", "kakao-front"],
            Self::JsonBody => ["auth", "kakao"],
        }
    }
}

impl std::str::FromStr for ExchangeEndpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "query" | "front" => Ok(Self::Query),
            "json" => Ok(Self::JsonBody),
            other => Err(Error::Config(format!(
                "unknown exchange mode `{other}` (expected `query` or `json`)"
            ))),
        }
    }
}

/// Kakao login configuration for the OPT client.
///
/// Required fields are constructor parameters.
///
/// ```rust,ignore
/// use opt_auth::OAuthConfig;
///
/// let config = OAuthConfig::new(
///     "rest-api-key",
///     "http://localhost:8080/auth/kakao".parse()?,
///     "https://api.opt.example".parse()?,
/// )
/// .with_exchange_endpoint(ExchangeEndpoint::JsonBody);
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct OAuthConfig {
    pub(crate) client_id: String,
    pub(crate) auth_url: Url,
    pub(crate) redirect_uri: Url,
    pub(crate) base_url: Url,
    pub(crate) exchange_endpoint: ExchangeEndpoint,
}

impl OAuthConfig {
    /// Create a new configuration.
    ///
    /// `client_id` is the Kakao REST API key, `base_url` the OPT backend root.
    #[must_use]
    pub fn new(client_id: impl Into<String>, redirect_uri: Url, base_url: Url) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri,
            base_url,
            auth_url: "https://kauth.kakao.com/oauth/authorize"
                .parse()
                .expect("valid default URL"),
            exchange_endpoint: ExchangeEndpoint::default(),
        }
    }

    /// Override the Kakao authorization endpoint.
    #[must_use]
    pub fn with_auth_url(mut self, url: Url) -> Self {
        self.auth_url = url;
        self
    }

    /// Choose which backend exchange contract to call.
    #[must_use]
    pub fn with_exchange_endpoint(mut self, endpoint: ExchangeEndpoint) -> Self {
        self.exchange_endpoint = endpoint;
        self
    }

    /// Kakao REST API key (`OAuth2` client ID).
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Kakao authorize endpoint.
    #[must_use]
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    /// Redirect URI registered with Kakao.
    #[must_use]
    pub fn redirect_uri(&self) -> &Url {
        &self.redirect_uri
    }

    /// OPT backend root URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Backend exchange contract in use.
    #[must_use]
    pub fn exchange_endpoint(&self) -> ExchangeEndpoint {
        self.exchange_endpoint
    }

    /// Full URL of the configured exchange endpoint, without query.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the base URL cannot carry a path.
    pub fn exchange_url(&self) -> Result<Url, Error> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| Error::Config(format!("base URL `{}` cannot be a base", self.base_url)))?
            .pop_if_empty()
            .extend(self.exchange_endpoint.path());
        Ok(url)
    }
}

/// Session fields returned by the backend after a successful exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct ExchangeResponse {
    pub refresh_token: String,
    pub role: Role,
    pub email: String,
    pub id: MemberId,
}

impl From<ExchangeResponse> for SessionCredentials {
    fn from(r: ExchangeResponse) -> Self {
        Self {
            refresh_token: r.refresh_token,
            role: r.role,
            email: r.email,
            member_id: r.id,
        }
    }
}

#[derive(Serialize)]
struct CodeBody<'a> {
    code: &'a str,
}

/// Client for the OPT backend's Kakao login endpoints.
#[derive(Clone)]
pub struct AuthClient {
    config: OAuthConfig,
    http: reqwest::Client,
}

impl AuthClient {
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// URL the browsing surface loads to start the Kakao login.
    #[must_use]
    pub fn authorization_url(&self) -> Url {
        let mut url = self.config.auth_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("redirect_uri", self.config.redirect_uri.as_str());
        url
    }

    /// Same as [`authorization_url`](Self::authorization_url) with an OAuth
    /// `state` value appended.
    #[must_use]
    pub fn authorization_url_with_state(&self, state: &str) -> Url {
        let mut url = self.authorization_url();
        url.query_pairs_mut().append_pair("state", state);
        url
    }

    /// Hand an authorization code to the backend and receive session credentials.
    ///
    /// Exactly one request is sent. Nothing is retried.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure, [`Error::OAuth`] if the
    /// backend answers with a non-success status, or [`Error::Decode`] if the
    /// body lacks any of the four session fields.
    pub async fn exchange_code(
        &self,
        code: &AuthorizationCode,
    ) -> Result<SessionCredentials, Error> {
        let mut url = self.config.exchange_url()?;

        let request = match self.config.exchange_endpoint {
            ExchangeEndpoint::Query => {
                url.query_pairs_mut().append_pair("code", code.as_str());
                self.http.post(url)
            }
            ExchangeEndpoint::JsonBody => self.http.post(url).json(&CodeBody {
                code: code.as_str(),
            }),
        };

        let response = request.send().await?;
        let response = Self::ensure_success(response, "token exchange").await?;

        let bytes = response.bytes().await?;
        let body: ExchangeResponse = serde_json::from_slice(&bytes)?;
        Ok(body.into())
    }

    /// Checks HTTP response status; returns the response on success or an error with details.
    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, Error> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(Error::OAuth {
            operation,
            status: Some(status),
            detail: body,
        })
    }
}
