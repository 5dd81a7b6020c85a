//! Detects the provider redirect inside the browsing surface.

use tokio::sync::mpsc;

/// Substring that marks a redirect carrying an authorization code.
pub const CODE_MARKER: &str = "code=";

/// Navigation notification from the browsing surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    /// A page finished loading at this URL. Starts a new page load.
    Loaded(String),
    /// The URL changed without a new page load.
    UrlChanged(String),
}

impl NavigationEvent {
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::Loaded(url) | Self::UrlChanged(url) => url,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Watching,
    /// The current page load already delivered its redirect URL.
    Captured,
}

/// Emits a redirect URL at most once per page load.
#[derive(Debug, Default)]
pub struct RedirectCapture {
    state: CaptureState,
}

impl RedirectCapture {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn state(&self) -> CaptureState {
        self.state
    }

    /// Inspect a navigation event. Returns the full URL the first time a
    /// page load reaches a URL containing [`CODE_MARKER`].
    pub fn observe(&mut self, event: &NavigationEvent) -> Option<String> {
        if let NavigationEvent::Loaded(_) = event {
            self.state = CaptureState::Watching;
        }

        if self.state == CaptureState::Captured || !event.url().contains(CODE_MARKER) {
            return None;
        }

        self.state = CaptureState::Captured;
        tracing::debug!("Redirect with authorization code captured");
        Some(event.url().to_string())
    }
}

/// Wait for the next captured redirect URL.
///
/// Returns `None` once the sender side is dropped. There is no timeout: if the
/// provider never redirects, this never resolves.
pub async fn next_redirect(
    capture: &mut RedirectCapture,
    events: &mut mpsc::Receiver<NavigationEvent>,
) -> Option<String> {
    while let Some(event) = events.recv().await {
        if let Some(url) = capture.observe(&event) {
            return Some(url);
        }
    }
    None
}
