//! Signed-in user state, in memory and in the persistent store.
//!
//! `Session` is the serialized shape; `SessionManager` is the single
//! authority that keeps the in-memory copy and the stored copy in step.

pub mod manager;

use serde::{Deserialize, Serialize};

pub use manager::SessionManager;

/// Store key the serialized session lives under
pub const SESSION_KEY: &str = "@AuthData:user";

/// Identifier used when the API does not return one (login never does)
pub const PLACEHOLDER_USER_ID: &str = "1";

/// Shown in place of the bearer token when a session is printed
pub const REDACTED_TOKEN: &str = "[redacted]";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub token: String,
}

impl Session {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Copy safe to print: the token is replaced, everything else is kept
    pub fn redacted(&self) -> Self {
        Self {
            token: REDACTED_TOKEN.to_string(),
            ..self.clone()
        }
    }

    /// Name to greet the user with, falling back to the email address
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.email)
    }
}
