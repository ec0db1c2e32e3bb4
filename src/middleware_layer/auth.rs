use std::sync::Arc;

use http::{
    StatusCode,
    header::{AUTHORIZATION, HeaderValue},
};
use reqwest::{Client, Request, RequestBuilder, Response};

use crate::{
    crypto::jwt,
    error::{AppError, Result},
    services::session::SessionService,
};

/// Path fragments of endpoints that never carry credentials.
pub const PUBLIC_PATHS: [&str; 5] = [
    "/auth/login",
    "/auth/register",
    "/auth/refresh",
    "/auth/recuperar-contrasena",
    "/auth/reset-contrasena",
];

/// Returns true when `path` belongs to a public endpoint.
pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.iter().any(|p| path.contains(p))
}

/// Derives a copy of `request`, carrying `Authorization: Bearer <token>`
/// when a token is given.
///
/// # Arguments
///
/// * `request` - The original request. It is never modified.
/// * `token` - The access token to attach, if any.
///
/// # Returns
///
/// The derived request, or an error if the body cannot be replayed.
fn authorize(request: &Request, token: Option<&str>) -> Result<Request> {
    let mut derived = request
        .try_clone()
        .ok_or_else(|| AppError::Internal("Request body cannot be replayed".to_string()))?;

    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|e| AppError::Internal(format!("Invalid access token header: {}", e)))?;
        value.set_sensitive(true);
        derived.headers_mut().insert(AUTHORIZATION, value);
    }

    Ok(derived)
}

/// Wraps every outbound call with bearer authorization.
///
/// Per call: public endpoints pass through untouched; otherwise the current
/// access token is attached, refreshed first when close to expiry. A 401
/// triggers one refresh and one retry, never more.
pub struct AuthPipeline {
    session: Arc<SessionService>,
    http: Client,
    near_expiry_seconds: i64,
}

impl AuthPipeline {
    /// Creates a new `AuthPipeline`.
    ///
    /// # Arguments
    ///
    /// * `session` - The session service owning the tokens.
    /// * `http` - The HTTP client that executes the derived requests.
    /// * `near_expiry_seconds` - The proactive refresh threshold.
    pub fn new(session: Arc<SessionService>, http: Client, near_expiry_seconds: i64) -> Self {
        Self {
            session,
            http,
            near_expiry_seconds,
        }
    }

    async fn forward(&self, request: Request) -> Result<Response> {
        Ok(self.http.execute(request).await?)
    }

    /// Builds the request and runs it through `execute`.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let request = builder.build()?;
        self.execute(&request).await
    }

    /// Sends `request`, handling authorization transparently.
    ///
    /// # Arguments
    ///
    /// * `request` - The outbound request. A derived copy is sent; the
    ///   original is left as it was.
    ///
    /// # Returns
    ///
    /// The backend's response, whatever its status, or the refresh failure
    /// when a required refresh did not succeed.
    pub async fn execute(&self, request: &Request) -> Result<Response> {
        let path = request.url().path();

        if is_public_path(path) {
            tracing::debug!("🌐 Public endpoint {} {}, forwarding unmodified", request.method(), path);
            return self.forward(authorize(request, None)?).await;
        }

        let token = match self.session.access_token() {
            None => {
                tracing::debug!("🔓 No access token for {} {}, forwarding unmodified", request.method(), path);
                None
            }
            Some(token) => {
                if self.session.refresh_token().is_some()
                    && self.session.is_near_expiry(self.near_expiry_seconds)
                {
                    tracing::info!("⌛ Access token near expiry, refreshing before {}", path);
                    self.session.refresh().await?;
                    self.session.access_token()
                } else {
                    Some(token)
                }
            }
        };

        if let Some(ref token) = token {
            tracing::debug!("🔑 Attaching {} to {} {}", jwt::redact(token), request.method(), path);
        }

        let response = self.forward(authorize(request, token.as_deref())?).await?;

        if response.status() != StatusCode::UNAUTHORIZED || self.session.refresh_token().is_none() {
            return Ok(response);
        }

        tracing::warn!("🔄 401 from {}, refreshing once and retrying", path);
        self.session.refresh().await?;

        // The retry's response is final, whatever its status.
        let token = self.session.access_token();
        self.forward(authorize(request, token.as_deref())?).await
    }
}
