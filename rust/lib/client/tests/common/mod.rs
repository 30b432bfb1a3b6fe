//! Fake portfolio backend for integration tests.
//!
//! One fallback handler records every request and answers from canned,
//! per-test replies. Counters stand in for "how many times did the client
//! hit the network".

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Request, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};

use folio_client::{ClientConfig, CredentialStore, Folio, MemoryCredentialStore, Transport};

pub const JWT_SECRET: &str = "folio-test-secret";
pub const PASSWORD: &str = "secret";
pub const USER_ID: i64 = 7;

/// Sign a token expiring `expire_secs` from now (negative = already expired).
pub fn sign_jwt(role: i64, expire_secs: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    encode(
        &Header::default(),
        &json!({
            "exp": now + expire_secs,
            "userid": USER_ID,
            "username": "andi",
            "role": role,
        }),
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

#[derive(Debug, Clone)]
pub enum RefreshReply {
    Accept { token: String, refresh_token: String },
    Reject(u16),
    /// 200 with a body that carries no token pair.
    Garbage,
}

/// One request as the backend saw it.
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub bearer: Option<String>,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Seen {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub struct Backend {
    pub refresh_calls: AtomicUsize,
    pub refresh_reply: Mutex<RefreshReply>,
    pub refresh_delay: Mutex<Duration>,
    pub list_reply: Mutex<(u16, Value)>,
    pub record_reply: Mutex<(u16, Value)>,
    /// Status for create/update/delete/logout. Non-2xx answers with a
    /// `{message}` body.
    pub mutation_status: Mutex<u16>,
    /// Canned update answer; `None` echoes the sent record under `data`,
    /// `Some(Value::Null)` answers with an empty body.
    pub update_reply: Mutex<Option<Value>>,
    pub seen: Mutex<Vec<Seen>>,
}

impl Default for Backend {
    fn default() -> Self {
        Self {
            refresh_calls: AtomicUsize::new(0),
            refresh_reply: Mutex::new(RefreshReply::Reject(401)),
            refresh_delay: Mutex::new(Duration::ZERO),
            list_reply: Mutex::new((200, json!([]))),
            record_reply: Mutex::new((200, json!({}))),
            mutation_status: Mutex::new(200),
            update_reply: Mutex::new(None),
            seen: Mutex::new(Vec::new()),
        }
    }
}

impl Backend {
    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn set_refresh(&self, reply: RefreshReply) {
        *self.refresh_reply.lock().unwrap() = reply;
    }

    pub fn set_refresh_delay(&self, delay: Duration) {
        *self.refresh_delay.lock().unwrap() = delay;
    }

    pub fn set_list(&self, status: u16, body: Value) {
        *self.list_reply.lock().unwrap() = (status, body);
    }

    pub fn set_record(&self, status: u16, body: Value) {
        *self.record_reply.lock().unwrap() = (status, body);
    }

    pub fn set_update_reply(&self, body: Option<Value>) {
        *self.update_reply.lock().unwrap() = body;
    }

    pub fn set_mutation_status(&self, status: u16) {
        *self.mutation_status.lock().unwrap() = status;
    }

    pub fn seen(&self) -> Vec<Seen> {
        self.seen.lock().unwrap().clone()
    }

    pub fn last(&self) -> Seen {
        self.seen().pop().expect("no request recorded")
    }
}

pub struct TestServer {
    /// API base, e.g. `http://127.0.0.1:PORT/api`.
    pub base_url: String,
    pub backend: Arc<Backend>,
}

impl TestServer {
    pub fn transport(&self) -> Transport {
        Transport::new(&self.base_url, Duration::from_secs(5)).unwrap()
    }

    pub fn config(&self) -> ClientConfig {
        ClientConfig {
            server: self.base_url.clone(),
            refresh_leeway_secs: 0,
            ..Default::default()
        }
    }

    /// A client over an in-memory store seeded with `store`.
    pub fn folio(&self, store: Arc<MemoryCredentialStore>) -> Folio {
        let store: Arc<dyn CredentialStore> = store;
        Folio::with_store(&self.config(), store, self.transport())
    }
}

pub async fn start_test_server() -> TestServer {
    let backend = Arc::new(Backend::default());
    let app = Router::new().fallback(handle).with_state(backend.clone());

    // Bind to random port.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("http://{addr}/api"),
        backend,
    }
}

async fn handle(State(backend): State<Arc<Backend>>, req: Request) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    // Headers are read in their own scope so no borrow of `req` lives
    // across the body await; the handler future must stay `Send`.
    let (bearer, content_type) = {
        let header_text = |name: header::HeaderName| {
            req.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        (
            header_text(header::AUTHORIZATION).and_then(|v| v.strip_prefix("Bearer ").map(str::to_string)),
            header_text(header::CONTENT_TYPE),
        )
    };
    let query = req.uri().query().map(str::to_string);
    let body = axum::body::to_bytes(req.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec();

    let seen = Seen {
        method: method.to_string(),
        path: path.clone(),
        query,
        bearer,
        content_type,
        body,
    };
    backend.seen.lock().unwrap().push(seen.clone());

    match (method, path.as_str()) {
        (Method::POST, "/api/Authentication/RefreshToken") => refresh(&backend).await,
        (Method::POST, "/api/Authentication/login") => login(&seen),
        (Method::DELETE, "/api/Authentication/Logout") => mutation(&backend, || "Logged out".into_response()),
        (Method::GET, "/api/Authentication/GetUser") => match seen.bearer {
            Some(_) => Json(json!({"status": 200, "data": {"username": "andi", "email": "andi@test"}})).into_response(),
            None => StatusCode::UNAUTHORIZED.into_response(),
        },
        (Method::GET, "/api/Authentication/CreateUser") => Json(json!({"message": "User created"})).into_response(),
        (Method::GET, p) if p.ends_with("/GetList") || p == "/api/Article/List" => {
            let (status, body) = backend.list_reply.lock().unwrap().clone();
            reply_status(status, body)
        }
        (Method::GET, p) if p.ends_with("/GetById") || p.starts_with("/api/Article/Detail/") => {
            let (status, body) = backend.record_reply.lock().unwrap().clone();
            reply_status(status, body)
        }
        (Method::POST, p) if p.ends_with("/Create") => mutation(&backend, || {
            let record = match seen.json() {
                Value::Object(mut map) => {
                    map.insert("id".into(), json!(99));
                    Value::Object(map)
                }
                // Multipart upload.
                _ => json!({"id": 100, "title": "uploaded", "coverImageUrl": "https://cdn.test/u.png"}),
            };
            Json(json!({"status": 201, "data": record})).into_response()
        }),
        (Method::PUT, _) => mutation(&backend, || {
            let canned = backend.update_reply.lock().unwrap().clone();
            match canned {
                Some(Value::Null) => StatusCode::OK.into_response(),
                Some(body) => Json(body).into_response(),
                None => Json(json!({"data": seen.json()})).into_response(),
            }
        }),
        (Method::DELETE, _) => mutation(&backend, || "Deleted".into_response()),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn refresh(backend: &Backend) -> Response {
    backend.refresh_calls.fetch_add(1, Ordering::SeqCst);
    let delay = *backend.refresh_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    let reply = backend.refresh_reply.lock().unwrap().clone();
    match reply {
        RefreshReply::Accept { token, refresh_token } => {
            Json(json!({"token": token, "refreshToken": refresh_token})).into_response()
        }
        RefreshReply::Reject(status) => reply_status(status, json!({"message": "Invalid refresh token"})),
        RefreshReply::Garbage => Json(json!({"status": "ok"})).into_response(),
    }
}

fn login(seen: &Seen) -> Response {
    let body = seen.json();
    if body["email"] == "andi@test" && body["password"] == PASSWORD {
        Json(json!({
            "status": 200,
            "message": "Login success",
            "data": {"token": sign_jwt(1, 600), "refreshToken": "r-login"},
        }))
        .into_response()
    } else {
        reply_status(401, json!({"message": "Invalid credentials"}))
    }
}

fn mutation(backend: &Backend, ok: impl FnOnce() -> Response) -> Response {
    let status = *backend.mutation_status.lock().unwrap();
    if (200..300).contains(&status) {
        ok()
    } else {
        reply_status(status, json!({"message": format!("refused with {status}")}))
    }
}

fn reply_status(status: u16, body: Value) -> Response {
    let status = StatusCode::from_u16(status).unwrap();
    (status, Json(body)).into_response()
}
