use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, warn};

use crate::api::{ApiClient, ApiError};
use crate::session::SESSION_KEY;
use crate::store::{KeyValueStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterResponse {
    /// reqres.in sends a number here; other deployments send a string
    #[serde(default, deserialize_with = "deserialize_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub token: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Text(String),
    Number(i64),
}

fn deserialize_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<IdRepr>::deserialize(deserializer)?.map(|id| match id {
        IdRepr::Text(s) => s,
        IdRepr::Number(n) => n.to_string(),
    }))
}

/// Request body for both credential endpoints. Never stored.
#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

impl fmt::Debug for Credentials<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Stateless wrapper over the credential endpoints.
/// Failures are returned exactly as the client produced them; nothing is retried.
#[derive(Clone)]
pub struct AuthService {
    api: ApiClient,
}

impl AuthService {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    fn store(&self) -> &Arc<dyn KeyValueStore> {
        self.api.store()
    }

    /// `POST /login`
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = Credentials { email, password };
        debug!(credentials = ?body, "Sending login request");
        self.api.post_json("/login", &body).await
    }

    /// `POST /register`
    pub async fn register(&self, email: &str, password: &str) -> Result<RegisterResponse, ApiError> {
        let body = Credentials { email, password };
        debug!(credentials = ?body, "Sending registration request");
        self.api.post_json("/register", &body).await
    }

    /// Remove the stored session without going through a `SessionManager`
    pub async fn logout(&self) -> Result<(), StoreError> {
        self.store().remove(SESSION_KEY).await
    }

    /// Whether a non-empty session is stored. Store failures read as `false`.
    pub async fn is_authenticated(&self) -> bool {
        match self.store().get(SESSION_KEY).await {
            Ok(Some(stored)) => !stored.is_empty(),
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "Could not read session, treating as signed out");
                false
            }
        }
    }
}
