use std::sync::Arc;

use tokio::sync::mpsc;
use url::Url;

use crate::capture::NavigationEvent;

/// Shared state for callback route handlers.
#[derive(Clone)]
pub(super) struct CallbackState {
    pub(super) authorization_url: Url,
    pub(super) redirect_uri: Url,
    pub(super) events: mpsc::Sender<NavigationEvent>,
    pub(super) success_page: Arc<str>,
    pub(super) failure_page: Arc<str>,
}
