use std::sync::Arc;

use reqwest::Client;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::middleware_layer::auth::AuthPipeline;
use crate::models::auth::{PasswordResetRequest, RecoveryCodeRequest};
use crate::services::http::{read_body, with_json};

const REQUEST_CODE_FAILED: &str = "Error al enviar el código";
const RESET_FAILED: &str = "Error al restablecer la contraseña";

/// Password recovery: ask for a code by email, then reset with it.
///
/// Both endpoints are public, so the pipeline forwards them without credentials.
pub struct RecoveryService {
    pipeline: Arc<AuthPipeline>,
    http: Client,
    config: Config,
}

impl RecoveryService {
    /// Creates a new `RecoveryService`.
    ///
    /// # Arguments
    ///
    /// * `pipeline` - The pipeline both calls go through.
    /// * `http` - The HTTP client used to build requests.
    /// * `config` - The application's configuration.
    pub fn new(pipeline: Arc<AuthPipeline>, http: Client, config: Config) -> Self {
        Self {
            pipeline,
            http,
            config,
        }
    }

    /// Asks the backend to email a recovery code.
    ///
    /// # Returns
    ///
    /// The backend's plain-text confirmation.
    pub async fn request_code(&self, email: &str) -> Result<String> {
        tracing::debug!("📧 Recovery code requested for: {}", email);
        let req = with_json(
            self.http.post(self.config.endpoint("/auth/recuperar-contrasena")),
            &RecoveryCodeRequest { email },
        )?;
        let (status, body) = read_body(self.pipeline.send(req).await?).await?;

        if !status.is_success() {
            return Err(AppError::from_status(status, &body, REQUEST_CODE_FAILED));
        }

        Ok(body.trim().to_string())
    }

    /// Resets the password using the emailed code.
    ///
    /// # Returns
    ///
    /// The backend's plain-text confirmation.
    pub async fn reset_password(&self, request: PasswordResetRequest) -> Result<String> {
        tracing::debug!("🔑 Password reset for: {}", request.email);
        let req = with_json(
            self.http.post(self.config.endpoint("/auth/reset-contrasena")),
            &request,
        )?;
        drop(request);
        let (status, body) = read_body(self.pipeline.send(req).await?).await?;

        if !status.is_success() {
            return Err(AppError::from_status(status, &body, RESET_FAILED));
        }

        tracing::info!("✅ Password reset accepted");
        Ok(body.trim().to_string())
    }
}
