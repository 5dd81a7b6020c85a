//! Loopback redirect listener for the Kakao login.
//!
//! Stands in for the embedded browsing surface: the user's browser loads the
//! Kakao authorization page, Kakao redirects back to this listener, and every
//! redirect is forwarded to a [`LoginFlow`](crate::login::LoginFlow) as a
//! [`NavigationEvent`](crate::capture::NavigationEvent).
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use opt_auth::callback::{CallbackConfig, serve};
//!
//! let config = CallbackConfig::from_env()?;
//! let (tx, rx) = tokio::sync::mpsc::channel(8);
//! tokio::spawn(serve(config, tx, std::future::pending()));
//! let credentials = flow.run(rx).await;
//! ```

mod config;
mod error;
mod routes;
mod state;

pub use config::CallbackConfig;
pub use error::CallbackError;
pub use routes::{callback_routes, serve};
