//! Shared fixtures: an in-process stand-in for the demo API and a store
//! whose operations can be made to fail on demand.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use alleasy_core::{
    ApiClient, AuthService, Config, KeyValueStore, MemoryStore, SessionManager, StoreError,
};
use async_trait::async_trait;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

pub const EVE_EMAIL: &str = "eve.holt@reqres.in";
pub const EVE_PASSWORD: &str = "cityslicka";
pub const SYDNEY_EMAIL: &str = "sydney@fife";
pub const TOKEN: &str = "QpwL5tke4Pnpja7X4";

/// Email the stub answers 404 for
pub const UNKNOWN_EMAIL: &str = "nobody@reqres.in";
/// Password the stub answers 401 for
pub const EXPIRED_PASSWORD: &str = "expired-token";
/// Registration that succeeds without an id in the response
pub const NO_ID_EMAIL: &str = "anon@reqres.in";

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub api_key: Option<String>,
    pub accept: Option<String>,
    pub body: Value,
}

#[derive(Clone, Default)]
pub struct Recorder {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl Recorder {
    fn record(&self, path: &str, headers: &HeaderMap, body: Value) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.requests.lock().unwrap().push(RecordedRequest {
            path: path.to_string(),
            authorization: header("authorization"),
            api_key: header("x-api-key"),
            accept: header("accept"),
            body,
        });
    }

    pub fn all(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> RecordedRequest {
        self.all().pop().expect("no request recorded")
    }
}

async fn login(
    State(recorder): State<Recorder>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    recorder.record("/login", &headers, body.clone());
    let email = body["email"].as_str().unwrap_or_default();
    let password = body["password"].as_str().unwrap_or_default();

    if email == UNKNOWN_EMAIL {
        (StatusCode::NOT_FOUND, Json(json!({})))
    } else if password == EXPIRED_PASSWORD {
        (StatusCode::UNAUTHORIZED, Json(json!({"error": "token expired"})))
    } else if email == EVE_EMAIL && password == EVE_PASSWORD {
        (StatusCode::OK, Json(json!({"token": TOKEN})))
    } else if password.is_empty() {
        (StatusCode::BAD_REQUEST, Json(json!({"error": "Missing password"})))
    } else {
        (StatusCode::BAD_REQUEST, Json(json!({"error": "user not found"})))
    }
}

async fn register(
    State(recorder): State<Recorder>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    recorder.record("/register", &headers, body.clone());
    if body["password"].as_str() == Some(EXPIRED_PASSWORD) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"error": "token expired"})));
    }
    match body["email"].as_str().unwrap_or_default() {
        SYDNEY_EMAIL => (StatusCode::OK, Json(json!({"id": 4, "token": TOKEN}))),
        NO_ID_EMAIL => (StatusCode::OK, Json(json!({"token": TOKEN}))),
        _ => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Note: Only defined users succeed registration"})),
        ),
    }
}

/// Accepts only the token the stub hands out, 401 otherwise
async fn profile(State(recorder): State<Recorder>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    recorder.record("/users/me", &headers, Value::Null);
    let expected = format!("Bearer {}", TOKEN);
    match headers.get("authorization").and_then(|v| v.to_str().ok()) {
        Some(auth) if auth == expected => (
            StatusCode::OK,
            Json(json!({"data": {"id": 4, "email": EVE_EMAIL}})),
        ),
        _ => (StatusCode::UNAUTHORIZED, Json(json!({"error": "Unauthorized"}))),
    }
}

async fn expired(State(recorder): State<Recorder>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    recorder.record("/expired", &headers, Value::Null);
    (StatusCode::UNAUTHORIZED, Json(json!({"error": "token expired"})))
}

async fn broken(State(recorder): State<Recorder>, headers: HeaderMap) -> (StatusCode, Json<Value>) {
    recorder.record("/broken", &headers, Value::Null);
    (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({"error": "boom"})))
}

async fn garbage(State(recorder): State<Recorder>, headers: HeaderMap) -> (StatusCode, &'static str) {
    recorder.record("/garbage", &headers, Value::Null);
    (StatusCode::OK, "<html>not json</html>")
}

pub struct Stub {
    pub base_url: String,
    pub recorder: Recorder,
}

impl Stub {
    pub fn config(&self) -> Config {
        Config {
            base_url: self.base_url.clone(),
            timeout_secs: 5,
            ..Config::default()
        }
    }

    pub fn client(&self, store: Arc<dyn KeyValueStore>) -> ApiClient {
        ApiClient::new(&self.config(), store).unwrap()
    }

    pub fn manager(&self, store: Arc<dyn KeyValueStore>) -> SessionManager {
        SessionManager::new(AuthService::new(self.client(store.clone())), store)
    }
}

pub async fn spawn_stub() -> Stub {
    let recorder = Recorder::default();
    let app = Router::new()
        .route("/api/login", post(login))
        .route("/api/register", post(register))
        .route("/api/users/me", get(profile))
        .route("/api/expired", get(expired).post(expired))
        .route("/api/broken", get(broken))
        .route("/api/garbage", get(garbage))
        .with_state(recorder.clone());

    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0))
        .await
        .expect("bind 127.0.0.1:0");
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Stub {
        base_url: format!("http://{}/api", addr),
        recorder,
    }
}

/// Address nothing is listening on
pub async fn closed_base_url() -> String {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}/api", addr)
}

/// `MemoryStore` with switches that make individual operations fail
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    pub fail_get: AtomicBool,
    pub fail_set: AtomicBool,
    pub fail_remove: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_get(&self, fail: bool) {
        self.fail_get.store(fail, Ordering::SeqCst);
    }

    pub fn fail_set(&self, fail: bool) {
        self.fail_set.store(fail, Ordering::SeqCst);
    }

    pub fn fail_remove(&self, fail: bool) {
        self.fail_remove.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool, op: &str) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable(format!("{} failed", op)))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Self::check(&self.fail_get, "get")?;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        Self::check(&self.fail_set, "set")?;
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        Self::check(&self.fail_remove, "remove")?;
        self.inner.remove(key).await
    }
}
