use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::api::ApiError;
use crate::auth::AuthService;
use crate::error::{Error, Result};
use crate::store::KeyValueStore;

use super::{Session, PLACEHOLDER_USER_ID, SESSION_KEY};

/// Holds `loading` true until dropped, so every exit path clears it
/// only after the awaited work has settled.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Single authority for who is signed in.
///
/// Every state-changing operation updates the store and the in-memory
/// session before it returns: the store is written first on sign-in and
/// registration, and the memory copy is cleared last on sign-out. Operations
/// on one instance are serialised, so concurrent calls queue rather than race.
///
/// A new manager reports `is_loading() == true` until its first operation
/// (normally `bootstrap`) settles.
pub struct SessionManager {
    auth: AuthService,
    store: Arc<dyn KeyValueStore>,
    current: RwLock<Option<Session>>,
    loading: AtomicBool,
    in_flight: Mutex<()>,
}

impl SessionManager {
    pub fn new(auth: AuthService, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            auth,
            store,
            current: RwLock::new(None),
            loading: AtomicBool::new(true),
            in_flight: Mutex::new(()),
        }
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    pub async fn current(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    pub async fn is_signed_in(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// Restore the stored session, if any. Run once at startup.
    pub async fn bootstrap(&self) -> Result<Option<Session>> {
        let _op = self.in_flight.lock().await;
        let _loading = LoadingGuard::start(&self.loading);

        let stored = self.store.get(SESSION_KEY).await?;
        let session = match stored.as_deref() {
            None | Some("") => {
                debug!("No stored session");
                return Ok(None);
            }
            Some(json) => Session::from_json(json).map_err(Error::CorruptSession)?,
        };

        info!(email = %session.email, "Restored stored session");
        *self.current.write().await = Some(session.clone());
        Ok(Some(session))
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        let _op = self.in_flight.lock().await;
        let _loading = LoadingGuard::start(&self.loading);

        let response = match self.auth.login(email, password).await {
            Ok(response) => response,
            Err(e) => {
                warn!(email = %email, error = %e, "Sign-in failed");
                return Err(self.rejected(e).await);
            }
        };

        let session = Session {
            id: PLACEHOLDER_USER_ID.to_string(),
            email: email.to_string(),
            name: None,
            token: response.token,
        };
        self.establish(session).await
    }

    /// `name` is kept on the session only; it is never sent to the API.
    pub async fn register_user(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<Session> {
        let _op = self.in_flight.lock().await;
        let _loading = LoadingGuard::start(&self.loading);

        let response = match self.auth.register(email, password).await {
            Ok(response) => response,
            Err(e) => {
                warn!(email = %email, error = %e, "Registration failed");
                return Err(self.rejected(e).await);
            }
        };

        let session = Session {
            id: response
                .id
                .unwrap_or_else(|| PLACEHOLDER_USER_ID.to_string()),
            email: email.to_string(),
            name: name.map(str::to_string),
            token: response.token,
        };
        self.establish(session).await
    }

    pub async fn sign_out(&self) -> Result<()> {
        let _op = self.in_flight.lock().await;
        let _loading = LoadingGuard::start(&self.loading);

        self.store.remove(SESSION_KEY).await?;
        if let Some(previous) = self.current.write().await.take() {
            info!(email = %previous.email, "Signed out");
        }
        Ok(())
    }

    /// Drop the in-memory session when `err` is a 401. The client has
    /// already cleared the stored copy by the time the error is returned.
    pub async fn expire_if_unauthorized(&self, err: &ApiError) -> bool {
        if !err.is_unauthorized() {
            return false;
        }
        let _op = self.in_flight.lock().await;
        self.drop_current().await
    }

    /// A 401 has already cleared the stored copy; clear memory to match.
    /// Caller holds `in_flight`.
    async fn rejected(&self, err: ApiError) -> Error {
        if err.is_unauthorized() {
            self.drop_current().await;
        }
        err.into()
    }

    async fn drop_current(&self) -> bool {
        let expired = self.current.write().await.take();
        if let Some(ref session) = expired {
            info!(email = %session.email, "Session rejected by server, signed out");
        }
        expired.is_some()
    }

    /// Persist first, then publish in memory
    async fn establish(&self, session: Session) -> Result<Session> {
        let json = session.to_json().map_err(|e| Error::Storage(e.into()))?;
        self.store.set(SESSION_KEY, &json).await?;
        *self.current.write().await = Some(session.clone());
        info!(email = %session.email, id = %session.id, "Session established");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loading_guard_clears_on_drop() {
        let flag = AtomicBool::new(false);
        {
            let _guard = LoadingGuard::start(&flag);
            assert!(flag.load(Ordering::SeqCst));
        }
        assert!(!flag.load(Ordering::SeqCst));
    }

    #[test]
    fn test_loading_guard_clears_on_early_return() {
        fn fails(flag: &AtomicBool) -> std::result::Result<(), ()> {
            let _guard = LoadingGuard::start(flag);
            let parsed: std::result::Result<u8, ()> = Err(());
            parsed?;
            Ok(())
        }

        let flag = AtomicBool::new(false);
        assert!(fails(&flag).is_err());
        assert!(!flag.load(Ordering::SeqCst));
    }
}
