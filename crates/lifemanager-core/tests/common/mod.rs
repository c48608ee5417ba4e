// Each test binary uses a different subset of the fake backend
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use lifemanager_core::{ApiClient, SessionManager, TokenStore};

pub const VALID_USERNAME: &str = "admin";
pub const VALID_PASSWORD: &str = "secret";
pub const ISSUED_TOKEN: &str = "T1";

#[derive(Debug, Clone)]
pub struct ReceivedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
pub struct ReceivedSubmission {
    pub json: Option<Value>,
    pub file: Option<ReceivedFile>,
}

/// In-process stand-in for the Life Manager backend.
#[derive(Clone, Default)]
pub struct FakeBackend {
    login_calls: Arc<AtomicUsize>,
    last_headers: Arc<Mutex<Option<HeaderMap>>>,
    submissions: Arc<Mutex<Vec<ReceivedSubmission>>>,
}

impl FakeBackend {
    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn last_headers(&self) -> HeaderMap {
        self.last_headers
            .lock()
            .unwrap()
            .clone()
            .expect("no request recorded")
    }

    pub fn submissions(&self) -> Vec<ReceivedSubmission> {
        self.submissions.lock().unwrap().clone()
    }

    fn record(&self, headers: &HeaderMap) {
        *self.last_headers.lock().unwrap() = Some(headers.clone());
    }
}

fn bearer_is_valid(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("Bearer {}", ISSUED_TOKEN))
        .unwrap_or(false)
}

async fn login(State(backend): State<FakeBackend>, Json(body): Json<Value>) -> impl IntoResponse {
    backend.login_calls.fetch_add(1, Ordering::SeqCst);
    if body["username"] == VALID_USERNAME && body["password"] == VALID_PASSWORD {
        (StatusCode::OK, Json(json!({ "token": ISSUED_TOKEN })))
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({})))
    }
}

async fn protected(State(backend): State<FakeBackend>, headers: HeaderMap) -> impl IntoResponse {
    backend.record(&headers);
    if bearer_is_valid(&headers) {
        (StatusCode::OK, "hello")
    } else {
        (StatusCode::UNAUTHORIZED, "")
    }
}

/// Accepts any request and records its headers.
async fn echo(State(backend): State<FakeBackend>, headers: HeaderMap) -> impl IntoResponse {
    backend.record(&headers);
    (StatusCode::OK, "ok")
}

async fn create_document(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> impl IntoResponse {
    backend.record(&headers);
    if !bearer_is_valid(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({})));
    }

    let mut submission = ReceivedSubmission::default();
    while let Ok(Some(field)) = multipart.next_field().await {
        match field.name().map(str::to_string).as_deref() {
            Some("json") => {
                let text = field.text().await.unwrap_or_default();
                submission.json = serde_json::from_str(&text).ok();
            }
            Some("file") => {
                let file_name = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
                submission.file = Some(ReceivedFile {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            _ => {}
        }
    }

    let Some(doc) = submission.json.clone() else {
        return (StatusCode::NOT_FOUND, Json(json!({})));
    };
    backend.submissions.lock().unwrap().push(submission);

    (
        StatusCode::CREATED,
        Json(json!({
            "id": doc["id"],
            "title": doc["title"],
            "content": doc["content"],
            "tags": []
        })),
    )
}

async fn create_note(
    State(backend): State<FakeBackend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    backend.record(&headers);
    if !bearer_is_valid(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({})));
    }
    (StatusCode::CREATED, Json(body))
}

pub fn router(backend: FakeBackend) -> Router {
    Router::new()
        .route("/api/v1/auth/login", post(login))
        .route("/api/v1/auth/protected", get(protected))
        .route("/api/v1/documents", post(create_document))
        .route("/api/v1/notes", post(create_note))
        .route("/x", get(echo).post(echo))
        .with_state(backend)
}

/// Backend whose login endpoint always fails with the given status.
pub fn failing_router(status: StatusCode) -> Router {
    Router::new().route(
        "/api/v1/auth/login",
        post(move || async move { (status, "backend exploded") }),
    )
}

/// Backend that accepts any login but forgets to send a token.
pub fn tokenless_router() -> Router {
    Router::new().route(
        "/api/v1/auth/login",
        post(|| async { Json(json!({ "session": "nope" })) }),
    )
}

/// Serve `router` on an ephemeral port, returning its base URL.
pub async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("fake backend");
    });
    format!("http://{}", addr)
}

/// Base URL of a port nothing listens on.
pub async fn unreachable_base() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test listener");
    let addr = listener.local_addr().expect("listener address");
    drop(listener);
    format!("http://{}", addr)
}

pub async fn spawn_backend() -> (FakeBackend, String) {
    let backend = FakeBackend::default();
    let base = spawn(router(backend.clone())).await;
    (backend, base)
}

pub fn api(base: &str) -> ApiClient {
    ApiClient::new(base, Duration::from_secs(5)).expect("api client")
}

pub fn manager(base: &str, store: TokenStore) -> SessionManager {
    SessionManager::new(api(base), store)
}
