use std::sync::Arc;

use http::StatusCode;
use reqwest::Client;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::middleware_layer::auth::AuthPipeline;
use crate::models::user::{ProfileUpdate, User};
use crate::services::http::{parse_json, read_body, with_json};

/// Maps a failed profile call to the message the profile page shows.
fn resolve_error(status: StatusCode, body: &str) -> AppError {
    match status {
        StatusCode::NOT_FOUND => AppError::NotFound("Usuario no encontrado.".to_string()),
        StatusCode::BAD_REQUEST => {
            AppError::from_status(status, body, "Datos inválidos. Revisa el formulario.")
        }
        _ => AppError::from_status(status, body, "Error inesperado."),
    }
}

/// Reads and edits the authenticated user's own profile.
pub struct UserService {
    pipeline: Arc<AuthPipeline>,
    http: Client,
    config: Config,
}

impl UserService {
    /// Creates a new `UserService`.
    ///
    /// # Arguments
    ///
    /// * `pipeline` - The authenticated pipeline every call goes through.
    /// * `http` - The HTTP client used to build requests.
    /// * `config` - The application's configuration.
    pub fn new(pipeline: Arc<AuthPipeline>, http: Client, config: Config) -> Self {
        Self {
            pipeline,
            http,
            config,
        }
    }

    /// Fetches `GET /usuarios/me`.
    pub async fn get_profile(&self) -> Result<User> {
        let req = self.http.get(self.config.endpoint("/usuarios/me"));
        let (status, body) = read_body(self.pipeline.send(req).await?).await?;

        if !status.is_success() {
            return Err(resolve_error(status, &body));
        }

        parse_json(&body)
    }

    /// Sends a partial record to `PUT /usuarios/me`.
    ///
    /// # Returns
    ///
    /// The updated user as the backend now stores it.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        let req = with_json(self.http.put(self.config.endpoint("/usuarios/me")), update)?;
        let (status, body) = read_body(self.pipeline.send(req).await?).await?;

        if !status.is_success() {
            return Err(resolve_error(status, &body));
        }

        tracing::info!("✅ Profile updated");
        parse_json(&body)
    }
}
