#![doc = include_str!("../README.md")]

#[cfg(feature = "callback")]
pub mod callback;
pub mod capture;
pub mod error;
pub mod extract;
#[cfg(feature = "oauth")]
pub mod login;
#[cfg(feature = "oauth")]
pub mod oauth;
pub mod session;
pub mod store;
pub mod types;

// Re-exports for convenient access
pub use capture::{NavigationEvent, RedirectCapture};
pub use error::Error;
pub use extract::extract_code;
#[cfg(feature = "oauth")]
pub use login::{LoginFlow, LoginOutcome, LoginState};
#[cfg(feature = "oauth")]
pub use oauth::{AuthClient, ExchangeEndpoint, ExchangeResponse, OAuthConfig};
pub use session::{SessionContext, SessionCredentials};
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use types::{AuthorizationCode, MemberId, Role};
