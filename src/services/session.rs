use std::sync::Arc;

use chrono::{DateTime, Utc};
use http::StatusCode;
use reqwest::Client;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::crypto::jwt;
use crate::error::{AppError, Result, SERVER_ERROR_MESSAGE, extract_message};
use crate::models::auth::{AuthResponse, LoginRequest, RefreshRequest, RegisterRequest};
use crate::models::session::{Profile, Role, Session};
use crate::repositories::token::{ACCESS_TOKEN_KEY, PROFILE_KEY, REFRESH_TOKEN_KEY, TokenStore};
use crate::services::http::{parse_json, read_body, with_json};

/// Default login failure message.
const INVALID_CREDENTIALS_MESSAGE: &str = "Credenciales incorrectas.";
/// Default registration failure message.
const REGISTER_FAILED_MESSAGE: &str = "Error al registrar usuario";

fn now() -> i64 {
    Utc::now().timestamp()
}

/// Owns the session lifecycle: login, registration, logout, token
/// inspection and refresh.
///
/// This is the only writer of the token store keys. The request pipeline and
/// the route guard read through it.
pub struct SessionService {
    store: Arc<dyn TokenStore>,
    http: Client,
    config: Config,
    refresh_lock: Mutex<()>,
}

impl SessionService {
    /// Creates a new `SessionService`.
    ///
    /// # Arguments
    ///
    /// * `store` - The token store holding the session.
    /// * `http` - The HTTP client used for the auth endpoints.
    /// * `config` - The application's configuration.
    pub fn new(store: Arc<dyn TokenStore>, http: Client, config: Config) -> Self {
        Self {
            store,
            http,
            config,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Logs in with email and password.
    ///
    /// On success the access token, the refresh token (if the server sent one)
    /// and the `{email, role}` profile are persisted.
    ///
    /// # Returns
    ///
    /// A `Result` containing the new `Session`.
    pub async fn login(&self, request: LoginRequest) -> Result<Session> {
        tracing::debug!("🔐 Login attempt for: {}", request.email);
        let email = request.email.clone();

        let req = with_json(self.http.post(self.config.endpoint("/auth/login")), &request)?;
        drop(request);
        let (status, body) = read_body(req.send().await?).await?;

        if !status.is_success() {
            if status.is_server_error() {
                return Err(AppError::ServerError(SERVER_ERROR_MESSAGE.to_string()));
            }
            let message = extract_message(&body);
            return Err(AppError::InvalidCredentials(if message.is_empty() {
                INVALID_CREDENTIALS_MESSAGE.to_string()
            } else {
                message
            }));
        }

        let response: AuthResponse = parse_json(&body)?;
        let session = self.establish(response, &email, Role::default());
        tracing::info!("✅ Logged in: {}", email);
        Ok(session)
    }

    /// Registers a new account and opens a session for it.
    ///
    /// Duplicate email or phone comes back as `AppError::Conflict` with the
    /// field discriminator set.
    pub async fn register(&self, request: RegisterRequest) -> Result<Session> {
        tracing::debug!("📝 Register attempt for: {}", request.email);
        let email = request.email.clone();
        let role = request.role;

        let req = with_json(self.http.post(self.config.endpoint("/auth/register")), &request)?;
        drop(request);
        let (status, body) = read_body(req.send().await?).await?;

        if !status.is_success() {
            return Err(AppError::from_status(status, &body, REGISTER_FAILED_MESSAGE));
        }

        let response: AuthResponse = parse_json(&body)?;
        let session = self.establish(response, &email, role);
        tracing::info!("✅ Registered: {}", email);
        Ok(session)
    }

    fn establish(&self, response: AuthResponse, email: &str, fallback_role: Role) -> Session {
        let role = match response.role.as_deref().map(Role::parse) {
            Some(Some(role)) => role,
            Some(None) => {
                tracing::warn!("⚠️ Unknown role in auth response, using {}", fallback_role.as_str());
                fallback_role
            }
            None => fallback_role,
        };
        let profile = Profile {
            email: response.email.unwrap_or_else(|| email.to_string()),
            role,
        };

        self.store.set(ACCESS_TOKEN_KEY, &response.token);
        match response.refresh_token.as_deref().filter(|t| !t.is_empty()) {
            Some(refresh) => self.store.set(REFRESH_TOKEN_KEY, refresh),
            None => self.store.remove(REFRESH_TOKEN_KEY),
        }
        match sonic_rs::to_string(&profile) {
            Ok(json) => self.store.set(PROFILE_KEY, &json),
            Err(e) => tracing::error!("Profile serialization failed: {}", e),
        }

        self.session()
    }

    /// Clears the access token, the refresh token and the profile.
    ///
    /// Idempotent and local: no network call is made.
    pub fn logout(&self) {
        self.store.remove(ACCESS_TOKEN_KEY);
        self.store.remove(REFRESH_TOKEN_KEY);
        self.store.remove(PROFILE_KEY);
        tracing::info!("👋 Session cleared");
    }

    /// Returns true iff a decodable access token with `exp` in the future is stored.
    ///
    /// An expired or undecodable access token is removed on the way out. The
    /// refresh token and profile are kept so a later refresh can still succeed.
    pub fn is_authenticated(&self) -> bool {
        let Some(token) = self.store.get(ACCESS_TOKEN_KEY) else {
            return false;
        };

        match jwt::expiry(&token) {
            Some(exp) if exp > now() => true,
            Some(exp) => {
                tracing::debug!("⌛ Access token expired at {}, clearing it", exp);
                self.store.remove(ACCESS_TOKEN_KEY);
                false
            }
            None => {
                tracing::warn!("⚠️ Stored access token does not decode, clearing it");
                self.store.remove(ACCESS_TOKEN_KEY);
                false
            }
        }
    }

    /// Returns the expiry of the stored access token.
    pub fn access_token_expiry(&self) -> Option<DateTime<Utc>> {
        let exp = jwt::expiry(&self.store.get(ACCESS_TOKEN_KEY)?)?;
        DateTime::from_timestamp(exp, 0)
    }

    /// Returns true iff an expiry exists and less than `threshold_seconds` remain.
    pub fn is_near_expiry(&self, threshold_seconds: i64) -> bool {
        self.access_token_expiry()
            .is_some_and(|exp| exp.timestamp() - now() < threshold_seconds)
    }

    /// `is_near_expiry` with the configured threshold.
    pub fn needs_refresh(&self) -> bool {
        self.is_near_expiry(self.config.near_expiry_seconds)
    }

    /// Exchanges the refresh token for a new access token.
    ///
    /// Refreshes are serialized. A caller that waited while another caller
    /// rotated the access token gets that result without a second call.
    ///
    /// Any outcome other than a usable success, transport failures included,
    /// ends the session before the error is returned.
    pub async fn refresh(&self) -> Result<Session> {
        let observed = self.store.get(ACCESS_TOKEN_KEY);
        let _guard = self.refresh_lock.lock().await;

        let current = self.store.get(ACCESS_TOKEN_KEY);
        if current.is_some() && current != observed {
            tracing::debug!("🔄 Access token already rotated by a concurrent refresh");
            return Ok(self.session());
        }

        let Some(refresh_token) = self.store.get(REFRESH_TOKEN_KEY) else {
            tracing::debug!("❌ Refresh requested without a refresh token");
            return Err(AppError::NoRefreshToken);
        };

        tracing::debug!("🔄 Refreshing with {}", jwt::redact(&refresh_token));
        let (status, body) = match self.exchange(&refresh_token).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("❌ Refresh request failed: {}, ending session", e);
                self.logout();
                return Err(e);
            }
        };

        if !status.is_success() {
            let message = extract_message(&body);
            tracing::warn!("❌ Refresh rejected with {}, ending session", status);
            self.logout();
            return Err(AppError::RefreshRejected(if message.is_empty() {
                status.to_string()
            } else {
                message
            }));
        }

        let response = match parse_json::<AuthResponse>(&body) {
            Ok(response) if !response.token.trim().is_empty() => response,
            _ => {
                tracing::warn!("❌ Refresh response carried no token, ending session");
                self.logout();
                return Err(AppError::RefreshRejected("Malformed refresh response".to_string()));
            }
        };

        self.store.set(ACCESS_TOKEN_KEY, &response.token);
        if let Some(rotated) = response.refresh_token.as_deref().filter(|t| !t.is_empty()) {
            self.store.set(REFRESH_TOKEN_KEY, rotated);
            tracing::debug!("🔁 Refresh token rotated");
        }

        tracing::info!("✅ Access token refreshed");
        Ok(self.session())
    }

    async fn exchange(&self, refresh_token: &str) -> Result<(StatusCode, String)> {
        let req = with_json(
            self.http.post(self.config.endpoint("/auth/refresh")),
            &RefreshRequest { refresh_token },
        )?;
        read_body(req.send().await?).await
    }

    /// Returns a snapshot of the stored session.
    pub fn session(&self) -> Session {
        let access_token = self.store.get(ACCESS_TOKEN_KEY);
        let access_expires_at = access_token.as_deref().and_then(jwt::expiry);

        Session {
            access_token,
            refresh_token: self.store.get(REFRESH_TOKEN_KEY),
            profile: self.profile(),
            access_expires_at,
        }
    }

    /// Returns the stored access token, expired or not.
    ///
    /// # Returns
    ///
    /// The raw token, or `None` when no token is stored.
    pub fn access_token(&self) -> Option<String> {
        self.store.get(ACCESS_TOKEN_KEY)
    }

    /// Returns the stored refresh token.
    pub fn refresh_token(&self) -> Option<String> {
        self.store.get(REFRESH_TOKEN_KEY)
    }

    /// Returns the stored profile. A corrupt entry reads as absent.
    pub fn profile(&self) -> Option<Profile> {
        let raw = self.store.get(PROFILE_KEY)?;
        match sonic_rs::from_str(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!("⚠️ Stored profile is unreadable: {}", e);
                None
            }
        }
    }

    /// Returns the role of the stored profile.
    ///
    /// # Returns
    ///
    /// The role, or `None` when no readable profile is stored.
    pub fn role(&self) -> Option<Role> {
        self.profile().map(|p| p.role)
    }

    /// Returns true when the stored profile belongs to a host.
    pub fn is_host(&self) -> bool {
        self.role() == Some(Role::Host)
    }

    /// Returns true when the stored profile belongs to an administrator.
    pub fn is_admin(&self) -> bool {
        self.role() == Some(Role::Admin)
    }
}
