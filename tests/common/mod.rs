#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use base64::{Engine as _, engine::general_purpose};
use hosped::{AppState, Config, repositories::token::MemoryTokenStore};
use parking_lot::Mutex;
use serde_json::{Value, json};

pub const PASSWORD: &str = "segura123";
pub const DUPLICATE_EMAIL: &str = "dup@e.com";
pub const RECOVERY_CODE: &str = "123456";

pub fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as i64
}

/// An unsigned JWT whose payload is `{"sub": sub, "exp": exp}`.
pub fn jwt(sub: &str, exp: i64) -> String {
    let header = general_purpose::URL_SAFE_NO_PAD.encode(r#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = general_purpose::URL_SAFE_NO_PAD.encode(json!({ "sub": sub, "exp": exp }).to_string());
    format!("{header}.{payload}.signature")
}

pub fn jwt_expiring_in(seconds: i64) -> String {
    jwt("u@e.com", now() + seconds)
}

fn exp_of(token: &str) -> Option<i64> {
    let payload = token.split('.').nth(1)?;
    let bytes = general_purpose::URL_SAFE_NO_PAD.decode(payload).ok()?;
    let value: Value = serde_json::from_slice(&bytes).ok()?;
    value["exp"].as_i64()
}

/// One request as the mock backend saw it.
#[derive(Debug, Clone)]
pub struct Seen {
    pub path: &'static str,
    pub authorization: Option<String>,
    pub custom: Option<String>,
}

/// Mock Hosped backend state.
#[derive(Default)]
pub struct Backend {
    pub refresh_calls: AtomicUsize,
    /// Status the refresh endpoint answers with; 0 means 200.
    pub refresh_status: AtomicU16,
    pub rotate_refresh_token: AtomicBool,
    pub profile_always_unauthorized: AtomicBool,
    pub profile_missing: AtomicBool,
    pub issued: Mutex<Vec<String>>,
    pub seen: Mutex<Vec<Seen>>,
}

impl Backend {
    fn record(&self, path: &'static str, headers: &HeaderMap) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        self.seen.lock().push(Seen {
            path,
            authorization: header("authorization"),
            custom: header("x-custom"),
        });
    }

    pub fn seen_on(&self, path: &str) -> Vec<Seen> {
        self.seen
            .lock()
            .iter()
            .filter(|s| s.path == path)
            .cloned()
            .collect()
    }

    /// Paths in the order they were hit.
    pub fn order(&self) -> Vec<&'static str> {
        self.seen.lock().iter().map(|s| s.path).collect()
    }

    pub fn refreshes(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    fn bearer_is_valid(&self, headers: &HeaderMap) -> bool {
        if self.profile_always_unauthorized.load(Ordering::SeqCst) {
            return false;
        }
        headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .and_then(exp_of)
            .is_some_and(|exp| exp > now())
    }
}

fn auth_body(token: String, refresh: Option<&str>, email: &str, role: &str, message: &str) -> Value {
    let mut body = json!({
        "token": token,
        "email": email,
        "role": role,
        "message": message,
    });
    if let Some(refresh) = refresh {
        body["refreshToken"] = json!(refresh);
    }
    body
}

async fn login(State(b): State<Arc<Backend>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    b.record("login", &headers);
    let email = body["email"].as_str().unwrap_or_default().to_string();

    if body["password"] != PASSWORD {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "Credenciales inválidas" }))).into_response();
    }

    let role = if email.starts_with("host") { "ANFITRION" } else { "USUARIO" };
    Json(auth_body(jwt(&email, now() + 3600), Some("R1"), &email, role, "Login exitoso")).into_response()
}

async fn register(State(b): State<Arc<Backend>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    b.record("register", &headers);
    let email = body["email"].as_str().unwrap_or_default().to_string();

    if email == DUPLICATE_EMAIL {
        return (StatusCode::CONFLICT, Json(json!({ "message": "El email ya está registrado" }))).into_response();
    }
    if body["phone"] == "3000000000" {
        return (StatusCode::BAD_REQUEST, "El teléfono ya está registrado").into_response();
    }

    let role = body["role"].as_str().unwrap_or("USUARIO").to_string();
    (
        StatusCode::CREATED,
        Json(auth_body(jwt(&email, now() + 3600), Some("R1"), &email, &role, "Registro exitoso")),
    )
        .into_response()
}

async fn refresh(State(b): State<Arc<Backend>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    b.record("refresh", &headers);
    let n = b.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;

    let status = b.refresh_status.load(Ordering::SeqCst);
    if status != 0 && status != 200 {
        let status = StatusCode::from_u16(status).unwrap();
        return (status, Json(json!({ "message": "Refresh token inválido" }))).into_response();
    }
    if body["refreshToken"].as_str().is_none() {
        return (StatusCode::BAD_REQUEST, "refreshToken requerido").into_response();
    }

    let token = jwt(&format!("refreshed-{n}"), now() + 3600);
    b.issued.lock().push(token.clone());

    let mut response = json!({ "token": token });
    if b.rotate_refresh_token.load(Ordering::SeqCst) {
        response["refreshToken"] = json!(format!("R{}", n + 1));
    }
    Json(response).into_response()
}

fn user_json(name: &str, phone: &str) -> Value {
    json!({
        "id": 7,
        "name": name,
        "email": "u@e.com",
        "phone": phone,
        "role": "USUARIO",
        "active": true,
    })
}

async fn get_me(State(b): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    b.record("me", &headers);
    if !b.bearer_is_valid(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if b.profile_missing.load(Ordering::SeqCst) {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(user_json("Juan Pérez", "3001234567")).into_response()
}

async fn put_me(State(b): State<Arc<Backend>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    b.record("me", &headers);
    if !b.bearer_is_valid(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(user_json(
        body["name"].as_str().unwrap_or("Juan Pérez"),
        body["phone"].as_str().unwrap_or("3001234567"),
    ))
    .into_response()
}

async fn request_code(State(b): State<Arc<Backend>>, headers: HeaderMap, Json(_): Json<Value>) -> Response {
    b.record("recover", &headers);
    "Código enviado".into_response()
}

async fn reset(State(b): State<Arc<Backend>>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    b.record("reset", &headers);
    if body["codigo"] != RECOVERY_CODE || body["nuevaContrasena"].as_str().is_none() {
        return (StatusCode::BAD_REQUEST, "Código inválido o expirado").into_response();
    }
    "Contraseña actualizada".into_response()
}

/// Shared test context: a running mock backend and an app wired to it.
pub struct TestContext {
    pub backend: Arc<Backend>,
    pub base_url: String,
    pub state: AppState,
}

impl TestContext {
    pub async fn new() -> Self {
        let backend = Arc::new(Backend::default());
        let app = Router::new()
            .route("/api/auth/login", post(login))
            .route("/api/auth/register", post(register))
            .route("/api/auth/refresh", post(refresh))
            .route("/api/auth/recuperar-contrasena", post(request_code))
            .route("/api/auth/reset-contrasena", post(reset))
            .route("/api/usuarios/me", get(get_me).put(put_me))
            .with_state(backend.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let base_url = format!("http://{}/api", addr);
        let state = AppState::with_store(&Config::new(base_url.clone()), Arc::new(MemoryTokenStore::new())).unwrap();

        Self {
            backend,
            base_url,
            state,
        }
    }
}
