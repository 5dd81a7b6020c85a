use std::sync::Arc;

use tokio::sync::mpsc;

use crate::capture::{self, NavigationEvent, RedirectCapture};
use crate::error::Error;
use crate::extract::extract_code;
use crate::oauth::AuthClient;
use crate::session::{SessionContext, SessionCredentials};
use crate::store::KeyValueStore;

/// Where the flow stands. Failed exchanges leave it in `AwaitingRedirect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    AwaitingRedirect,
    TokenExchanged,
}

/// Result of handing one redirect URL to the flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// The URL carried no authorization code yet.
    NotRedirected,
    /// The code was exchanged and the session persisted.
    LoggedIn(SessionCredentials),
}

/// Kakao login handoff: redirect URL in, persisted session out.
///
/// There is no in-flight guard. Two redirects delivered back to back run two
/// exchanges, and the later one wins in the store.
pub struct LoginFlow<S> {
    client: Arc<AuthClient>,
    session: Arc<SessionContext<S>>,
    capture: RedirectCapture,
    state: LoginState,
}

impl<S: KeyValueStore> LoginFlow<S> {
    #[must_use]
    pub fn new(client: Arc<AuthClient>, session: Arc<SessionContext<S>>) -> Self {
        Self {
            client,
            session,
            capture: RedirectCapture::new(),
            state: LoginState::AwaitingRedirect,
        }
    }

    #[must_use]
    pub fn state(&self) -> LoginState {
        self.state
    }

    #[must_use]
    pub fn session(&self) -> &Arc<SessionContext<S>> {
        &self.session
    }

    /// Extract the code from `url`, exchange it, and persist the result.
    ///
    /// # Errors
    ///
    /// Any exchange or store failure. The store is left untouched whenever
    /// the exchange itself fails.
    pub async fn handle_redirect(&mut self, url: &str) -> Result<LoginOutcome, Error> {
        let Some(code) = extract_code(url) else {
            tracing::debug!("Redirect URL has no authorization code");
            return Ok(LoginOutcome::NotRedirected);
        };

        let credentials = self.client.exchange_code(&code).await?;
        self.session.establish(credentials.clone()).await?;
        self.state = LoginState::TokenExchanged;

        Ok(LoginOutcome::LoggedIn(credentials))
    }

    /// Feed one navigation event through capture and, if it fires, the exchange.
    ///
    /// # Errors
    ///
    /// See [`handle_redirect`](Self::handle_redirect).
    pub async fn observe(&mut self, event: &NavigationEvent) -> Result<LoginOutcome, Error> {
        match self.capture.observe(event) {
            Some(url) => self.handle_redirect(&url).await,
            None => Ok(LoginOutcome::NotRedirected),
        }
    }

    /// Drive the flow from a navigation event stream until a login succeeds.
    ///
    /// Failed exchanges are logged and abandoned; the flow keeps waiting for
    /// the next redirect. Returns `None` when the stream ends first, which is
    /// how closing the login screen abandons the flow.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<NavigationEvent>,
    ) -> Option<SessionCredentials> {
        while let Some(url) = capture::next_redirect(&mut self.capture, &mut events).await {
            match self.handle_redirect(&url).await {
                Ok(LoginOutcome::LoggedIn(credentials)) => {
                    tracing::info!(member_id = %credentials.member_id, "Kakao login successful");
                    return Some(credentials);
                }
                Ok(LoginOutcome::NotRedirected) => {}
                Err(e) => {
                    tracing::error!(error = %e, "Token exchange failed");
                }
            }
        }
        tracing::info!("Navigation stream closed before login completed");
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::OAuthConfig;
    use crate::store::MemoryStore;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn flow(base: &str) -> (LoginFlow<MemoryStore>, Arc<MemoryStore>) {
        let config = OAuthConfig::new(
            "test-key",
            "http://localhost:8080/auth/kakao".parse().unwrap(),
            base.parse().unwrap(),
        );
        let store = Arc::new(MemoryStore::new());
        let session = Arc::new(SessionContext::new(store.clone()));
        (LoginFlow::new(Arc::new(AuthClient::new(config)), session), store)
    }

    async fn mount_success(server: &MockServer, code: &str, expected_calls: u64) {
        Mock::given(method("POST"))
            .and(path("/auth/kakao-front"))
            .and(query_param("code", code))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "refreshToken": "r1",
                "role": "ROLE_USER",
                "email": "a@b.com",
                "id": 42
            })))
            .expect(expected_calls)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_url_without_code_never_calls_backend() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let (mut flow, store) = flow(&server.uri());
        let outcome = flow
            .handle_redirect("https://kauth.kakao.com/oauth/authorize?response_type=code")
            .await
            .unwrap();

        assert_eq!(outcome, LoginOutcome::NotRedirected);
        assert_eq!(flow.state(), LoginState::AwaitingRedirect);
        assert!(store.snapshot().await.is_empty());
    }

    #[tokio::test]
    async fn test_successful_redirect_persists_session() {
        let server = MockServer::start().await;
        mount_success(&server, "abc123", 1).await;

        let (mut flow, store) = flow(&server.uri());
        let outcome = flow
            .handle_redirect("https://app/auth?code=abc123&state=xyz")
            .await
            .unwrap();

        assert!(matches!(outcome, LoginOutcome::LoggedIn(_)));
        assert_eq!(flow.state(), LoginState::TokenExchanged);
        assert_eq!(store.snapshot().await["memberId"], "42");
    }

    #[tokio::test]
    async fn test_failed_exchange_leaves_store_untouched() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let (mut flow, store) = flow(&server.uri());
        store
            .multi_set(vec![("theme".into(), "dark".into())])
            .await
            .unwrap();

        let result = flow.handle_redirect("https://app/auth?code=abc123").await;

        assert!(matches!(result, Err(Error::OAuth { status: Some(500), .. })));
        assert_eq!(flow.state(), LoginState::AwaitingRedirect);
        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot["theme"], "dark");
    }

    #[tokio::test]
    async fn test_unreachable_backend_leaves_store_untouched() {
        let (mut flow, store) = flow("http://127.0.0.1:9");
        store
            .multi_set(vec![("refreshToken".into(), "old".into())])
            .await
            .unwrap();
        let before = store.snapshot().await;

        let result = flow.handle_redirect("https://app/auth?code=abc123").await;

        assert!(matches!(result, Err(Error::Http(_))));
        assert_eq!(flow.state(), LoginState::AwaitingRedirect);
        assert_eq!(store.snapshot().await, before);
        assert!(flow.session().current().await.is_none());
    }

    #[tokio::test]
    async fn test_observe_fires_once_per_page_load() {
        let server = MockServer::start().await;
        mount_success(&server, "abc123", 1).await;

        let (mut flow, _store) = flow(&server.uri());
        let url = "http://localhost:8080/auth/kakao?code=abc123";

        let first = flow.observe(&NavigationEvent::Loaded(url.into())).await.unwrap();
        let second = flow.observe(&NavigationEvent::UrlChanged(url.into())).await.unwrap();

        assert!(matches!(first, LoginOutcome::LoggedIn(_)));
        assert_eq!(second, LoginOutcome::NotRedirected);
    }

    #[tokio::test]
    async fn test_run_retries_on_next_redirect_after_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(query_param("code", "expired"))
            .respond_with(ResponseTemplate::new(400))
            .expect(1)
            .mount(&server)
            .await;
        mount_success(&server, "fresh", 1).await;

        let (flow, store) = flow(&server.uri());
        let (tx, rx) = mpsc::channel(8);
        for url in [
            "https://kauth.kakao.com/oauth/authorize?response_type=code",
            "http://localhost:8080/auth/kakao?code=expired",
            "http://localhost:8080/auth/kakao?code=fresh",
        ] {
            tx.send(NavigationEvent::Loaded(url.into())).await.unwrap();
        }

        let credentials = flow.run(rx).await.unwrap();
        assert_eq!(credentials.refresh_token, "r1");
        assert_eq!(store.snapshot().await.len(), 4);
    }

    #[tokio::test]
    async fn test_run_abandoned_when_stream_closes() {
        let (flow, store) = flow("http://127.0.0.1:9");
        let (tx, rx) = mpsc::channel(1);
        drop(tx);

        assert_eq!(flow.run(rx).await, None);
        assert!(store.snapshot().await.is_empty());
    }
}
