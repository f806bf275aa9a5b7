//! alleasy-core - session client for the reqres.in demo API.
//!
//! This crate provides:
//! - `store`: pluggable async key-value persistence (file, OS keychain, memory)
//! - `api`: HTTP client that attaches the stored bearer token and clears the
//!   stored session on 401
//! - `auth`: login / registration calls
//! - `session`: `SessionManager`, the single owner of who is signed in
//! - `theme`: persisted light/dark preference
//! - `validation`: form checks run before credentials are submitted
//! - `config`: base URL, API key, timeout and storage backend selection
//!
//! Wiring is explicit: build a store, an `ApiClient` over it, an
//! `AuthService` over the client, and a `SessionManager` over both.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod session;
pub mod store;
pub mod theme;
pub mod validation;

use std::sync::Arc;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthService, LoginResponse, RegisterResponse};
pub use config::{Config, StoreBackend};
pub use error::{Error, ErrorKind, Result};
pub use session::{Session, SessionManager, PLACEHOLDER_USER_ID, SESSION_KEY};
pub use store::{FileStore, KeyValueStore, KeyringStore, MemoryStore, StoreError};
pub use theme::{ColorMode, ThemeStore};
pub use validation::{LoginForm, RegisterForm, ValidationError};

/// Build the client, auth service and session manager for `config` on top
/// of an existing store.
pub fn connect(config: &Config, store: Arc<dyn KeyValueStore>) -> anyhow::Result<SessionManager> {
    let api = ApiClient::new(config, store.clone())?;
    Ok(SessionManager::new(AuthService::new(api), store))
}
