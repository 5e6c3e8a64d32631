//! Shared test doubles: a scripted in-memory backend and a loopback HTTP
//! service that behaves like the real authentication server.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Json;
use axum::Router;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::{Value, json};

use crate::backend::SessionBackend;
use crate::error::SessionError;
use crate::user::{CurrentUser, UserDetails};

pub fn user(value: Value) -> CurrentUser {
    serde_json::from_value(value).expect("test user should be a JSON object")
}

pub fn alice() -> CurrentUser {
    user(json!({ "id": 1, "username": "alice" }))
}

// =============================================================================
// FakeBackend
// =============================================================================

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CallCounts {
    pub current: usize,
    pub login: usize,
    pub logout: usize,
    pub create: usize,
}

type Reply = Result<Option<CurrentUser>, SessionError>;

/// Scripted backend. Each endpoint pops its next queued reply; an empty
/// queue falls back to the endpoint default.
#[derive(Default)]
pub struct FakeBackend {
    current_replies: Mutex<VecDeque<Reply>>,
    login_replies: Mutex<VecDeque<Reply>>,
    logout_replies: Mutex<VecDeque<Result<(), SessionError>>>,
    create_replies: Mutex<VecDeque<Reply>>,
    current_delay: Mutex<Option<Duration>>,
    current: AtomicUsize,
    login: AtomicUsize,
    logout: AtomicUsize,
    create: AtomicUsize,
    last_login: Mutex<Option<(String, String)>>,
    last_details: Mutex<Option<UserDetails>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_current(&self, reply: Reply) {
        self.current_replies.lock().unwrap().push_back(reply);
    }

    pub fn push_login(&self, reply: Reply) {
        self.login_replies.lock().unwrap().push_back(reply);
    }

    pub fn push_logout(&self, reply: Result<(), SessionError>) {
        self.logout_replies.lock().unwrap().push_back(reply);
    }

    pub fn push_create(&self, reply: Reply) {
        self.create_replies.lock().unwrap().push_back(reply);
    }

    /// Delay every `current_user` call, to hold hydration in flight.
    pub fn delay_current(&self, delay: Duration) {
        *self.current_delay.lock().unwrap() = Some(delay);
    }

    pub fn counts(&self) -> CallCounts {
        CallCounts {
            current: self.current.load(Ordering::SeqCst),
            login: self.login.load(Ordering::SeqCst),
            logout: self.logout.load(Ordering::SeqCst),
            create: self.create.load(Ordering::SeqCst),
        }
    }

    pub fn last_login(&self) -> Option<(String, String)> {
        self.last_login.lock().unwrap().clone()
    }

    pub fn last_details(&self) -> Option<UserDetails> {
        self.last_details.lock().unwrap().clone()
    }
}

fn pop<T>(queue: &Mutex<VecDeque<T>>, default: T) -> T {
    queue.lock().unwrap().pop_front().unwrap_or(default)
}

#[async_trait]
impl SessionBackend for FakeBackend {
    async fn current_user(&self) -> Result<Option<CurrentUser>, SessionError> {
        self.current.fetch_add(1, Ordering::SeqCst);
        let delay = *self.current_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        pop(&self.current_replies, Ok(None))
    }

    async fn login(&self, username: &str, password: &str) -> Result<Option<CurrentUser>, SessionError> {
        self.login.fetch_add(1, Ordering::SeqCst);
        *self.last_login.lock().unwrap() = Some((username.to_owned(), password.to_owned()));
        pop(&self.login_replies, Ok(None))
    }

    async fn logout(&self) -> Result<(), SessionError> {
        self.logout.fetch_add(1, Ordering::SeqCst);
        pop(&self.logout_replies, Ok(()))
    }

    async fn create_user(&self, details: &UserDetails) -> Result<Option<CurrentUser>, SessionError> {
        self.create.fetch_add(1, Ordering::SeqCst);
        *self.last_details.lock().unwrap() = Some(details.clone());
        pop(&self.create_replies, Ok(None))
    }
}

// =============================================================================
// Loopback HTTP service
// =============================================================================

const SESSION_COOKIE: &str = "webquiz_session";

fn alb() -> Value {
    json!({ "username": "alb", "emailAddr": "alb@mail.com", "name": "Alberto Antunes" })
}

fn has_session(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .any(|pair| pair.trim() == format!("{SESSION_COOKIE}=alb"))
}

async fn login_handler(Json(body): Json<Value>) -> Response {
    if body["username"] == "alb" && body["password"] == "abc" {
        let cookie = format!("{SESSION_COOKIE}=alb; Path=/; HttpOnly; SameSite=Lax");
        return ([(header::SET_COOKIE, cookie)], Json(alb())).into_response();
    }
    Json(Value::Null).into_response()
}

async fn logout_handler() -> Response {
    let cookie = format!("{SESSION_COOKIE}=; Path=/; Max-Age=0");
    ([(header::SET_COOKIE, cookie)], "").into_response()
}

async fn current_handler(headers: HeaderMap) -> Json<Value> {
    if has_session(&headers) { Json(alb()) } else { Json(Value::Null) }
}

async fn create_handler(Json(body): Json<Value>) -> Response {
    match body["username"].as_str() {
        Some("taken") => Json(Value::Null).into_response(),
        Some(username) => {
            let cookie = format!("{SESSION_COOKIE}=alb; Path=/; HttpOnly");
            let mut created = body.clone();
            if let Some(obj) = created.as_object_mut() {
                obj.remove("password");
                obj.insert("username".into(), json!(username));
            }
            ([(header::SET_COOKIE, cookie)], Json(created)).into_response()
        }
        None => StatusCode::BAD_REQUEST.into_response(),
    }
}

/// Router mimicking the real service: `alb`/`abc` is the only valid login.
pub fn fake_service() -> Router {
    Router::new()
        .route("/user/login", post(login_handler).delete(logout_handler))
        .route("/user/current", get(current_handler).post(create_handler))
}

/// Router answering every request with `status`.
pub fn failing_service(status: StatusCode) -> Router {
    Router::new().fallback(move || async move { status })
}

/// Serve `app` on an ephemeral loopback port and return its base URL.
pub async fn spawn_service(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}
