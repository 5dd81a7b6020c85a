use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::Error;
use crate::store::{KeyValueStore, keys};
use crate::types::{MemberId, Role};

/// Credentials produced by one successful login.
///
/// Written to the store as four string pairs and never mutated in place: a new
/// login overwrites all four, a logout removes all four.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCredentials {
    pub refresh_token: String,
    pub role: Role,
    pub email: String,
    pub member_id: MemberId,
}

impl SessionCredentials {
    /// The credentials as store pairs, in [`keys::SESSION`] order.
    #[must_use]
    pub fn to_pairs(&self) -> Vec<(String, String)> {
        vec![
            (keys::REFRESH_TOKEN.to_string(), self.refresh_token.clone()),
            (keys::ROLE.to_string(), self.role.to_string()),
            (keys::EMAIL.to_string(), self.email.clone()),
            (keys::MEMBER_ID.to_string(), self.member_id.to_string()),
        ]
    }

    /// Rebuild credentials from values read in [`keys::SESSION`] order.
    ///
    /// Returns `None` unless all four values are present.
    #[must_use]
    pub fn from_values(values: Vec<Option<String>>) -> Option<Self> {
        let mut values = values.into_iter();
        let refresh_token = values.next()??;
        let role = values.next()??;
        let email = values.next()??;
        let member_id = values.next()??;
        Some(Self {
            refresh_token,
            role: Role(role),
            email,
            member_id: MemberId(member_id),
        })
    }
}

/// Explicit handle on the signed-in session.
///
/// Screens that need authentication receive this instead of reading the store
/// directly. Lifecycle: [`restore`](Self::restore) at startup,
/// [`establish`](Self::establish) on login, [`clear`](Self::clear) on logout.
pub struct SessionContext<S> {
    store: Arc<S>,
    current: RwLock<Option<SessionCredentials>>,
}

impl<S: KeyValueStore> SessionContext<S> {
    #[must_use]
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            current: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Load the persisted session, if any, into this context.
    ///
    /// A store holding only some of the four keys is treated as signed out.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] if the store cannot be read.
    pub async fn restore(&self) -> Result<Option<SessionCredentials>, Error> {
        let values = self.store.multi_get(&keys::SESSION).await?;
        let present = values.iter().filter(|v| v.is_some()).count();
        let restored = SessionCredentials::from_values(values);

        if restored.is_none() && present > 0 {
            tracing::warn!(
                present,
                expected = keys::SESSION.len(),
                "Partial session in store, treating as signed out"
            );
        }

        *self.current.write().await = restored.clone();
        Ok(restored)
    }

    /// Persist a fresh login, replacing any previous session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] if the write fails; the context is unchanged then.
    pub async fn establish(&self, credentials: SessionCredentials) -> Result<(), Error> {
        self.store.multi_set(credentials.to_pairs()).await?;
        tracing::info!(
            member_id = %credentials.member_id,
            role = %credentials.role,
            "Session established"
        );
        *self.current.write().await = Some(credentials);
        Ok(())
    }

    /// Remove the session from the store and from this context.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Store`] if the removal fails.
    pub async fn clear(&self) -> Result<(), Error> {
        self.store.multi_remove(&keys::SESSION).await?;
        *self.current.write().await = None;
        tracing::info!("Session cleared");
        Ok(())
    }

    /// Cached credentials, without touching the store.
    pub async fn current(&self) -> Option<SessionCredentials> {
        self.current.read().await.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.current.read().await.is_some()
    }

    pub async fn role(&self) -> Option<Role> {
        self.current.read().await.as_ref().map(|c| c.role.clone())
    }

    /// Credentials for an authenticated call.
    ///
    /// Falls back to the store when nothing is cached yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`] when no complete session exists.
    pub async fn require(&self) -> Result<SessionCredentials, Error> {
        if let Some(credentials) = self.current().await {
            return Ok(credentials);
        }
        self.restore().await?.ok_or(Error::Unauthenticated)
    }

    /// Attach `Authorization: Bearer <refresh token>` to a backend request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthenticated`] when no complete session exists.
    #[cfg(feature = "oauth")]
    pub async fn authorize(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, Error> {
        let credentials = self.require().await.inspect_err(|_| {
            tracing::warn!("Authenticated request attempted without a session");
        })?;
        Ok(request.bearer_auth(credentials.refresh_token))
    }
}
