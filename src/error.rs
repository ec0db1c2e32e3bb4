use http::StatusCode;
use sonic_rs::JsonValueTrait;
use thiserror::Error;

/// Message shown when a protected call comes back with 401.
pub const SESSION_EXPIRED_MESSAGE: &str = "Sesión expirada. Por favor inicia sesión nuevamente.";
/// Message shown when the backend cannot be reached at all.
pub const UNREACHABLE_MESSAGE: &str = "No se puede conectar con el servidor.";
/// Message shown for any 5xx response.
pub const SERVER_ERROR_MESSAGE: &str = "Error interno del servidor. Intenta de nuevo más tarde.";

/// The form field a server-reported conflict belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictField {
    Email,
    Phone,
}

impl ConflictField {
    /// Returns the form field name the error should be attached to.
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictField::Email => "email",
            ConflictField::Phone => "phone",
        }
    }

    /// Infers the conflicting field from a backend message such as
    /// "El email ya está registrado".
    pub fn from_message(message: &str) -> Option<Self> {
        let lower = message.to_lowercase();
        if lower.contains("email") || lower.contains("correo") {
            Some(ConflictField::Email)
        } else if lower.contains("teléfono") || lower.contains("telefono") || lower.contains("phone") {
            Some(ConflictField::Phone)
        } else {
            None
        }
    }
}

/// A client-side validation failure on a single form field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// The field name, as declared on the form record.
    pub field: String,
    /// A human-readable description of the failure.
    pub message: String,
}

impl FieldError {
    /// Creates a `FieldError` for `field`.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// The error as the UI layer consumes it: one message, optionally bound to a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFacingError {
    pub message: String,
    pub field: Option<String>,
}

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// The backend refused the credentials.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// One or more form fields failed client-side validation.
    #[error("Validation failed on {} field(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// The backend reported a duplicate value.
    #[error("Conflict: {message}")]
    Conflict {
        field: Option<ConflictField>,
        message: String,
    },

    /// A refresh was requested but no refresh token is stored.
    #[error("No refresh token available")]
    NoRefreshToken,

    /// The backend rejected the refresh token. The session has been cleared.
    #[error("Refresh rejected: {0}")]
    RefreshRejected(String),

    /// The request never produced an HTTP status.
    #[error("Cannot reach server")]
    NetworkUnreachable,

    /// A 404 response.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// A 5xx response.
    #[error("Server error: {0}")]
    ServerError(String),

    /// A 401 response outside the refresh flow.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Any other 4xx response.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A transport error that did produce a connection.
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    /// A JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] sonic_rs::Error),

    /// An I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// An internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            AppError::NetworkUnreachable
        } else {
            AppError::Http(e)
        }
    }
}

/// Extracts a human-readable message from an error body.
///
/// JSON bodies are searched for `message`, then `error`. A body that is not
/// JSON is taken as plain text. Returns an empty string when nothing usable
/// is found.
pub fn extract_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    if let Ok(value) = sonic_rs::from_str::<sonic_rs::Value>(trimmed) {
        for key in ["message", "error"] {
            if let Some(msg) = value.get(key).and_then(|v| v.as_str()) {
                if !msg.trim().is_empty() {
                    return msg.trim().to_string();
                }
            }
        }
        if let Some(msg) = value.as_str() {
            return msg.trim().to_string();
        }
        return String::new();
    }

    trimmed.to_string()
}

fn or_default(message: String, fallback: &str) -> String {
    if message.is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

impl AppError {
    /// Normalizes a non-success response into the error taxonomy.
    ///
    /// # Arguments
    ///
    /// * `status` - The response status.
    /// * `body` - The raw response body.
    /// * `fallback` - The message used when the body carries none.
    pub fn from_status(status: StatusCode, body: &str, fallback: &str) -> Self {
        let message = extract_message(body);

        match status {
            StatusCode::UNAUTHORIZED => AppError::Unauthorized(SESSION_EXPIRED_MESSAGE.to_string()),
            StatusCode::NOT_FOUND => AppError::NotFound(or_default(message, fallback)),
            StatusCode::CONFLICT => AppError::Conflict {
                field: ConflictField::from_message(&message),
                message: or_default(message, fallback),
            },
            StatusCode::BAD_REQUEST if message.to_lowercase().contains("registrad") => {
                AppError::Conflict {
                    field: ConflictField::from_message(&message),
                    message,
                }
            }
            s if s.is_server_error() => AppError::ServerError(SERVER_ERROR_MESSAGE.to_string()),
            _ => AppError::BadRequest(or_default(message, fallback)),
        }
    }

    /// Returns the field discriminator the calling form should mark, if any.
    pub fn field(&self) -> Option<String> {
        match self {
            AppError::Conflict { field, .. } => field.map(|f| f.as_str().to_string()),
            AppError::Validation(errors) => errors.first().map(|e| e.field.clone()),
            _ => None,
        }
    }

    /// Converts the error into what the UI displays, logging it on the way.
    pub fn report(&self) -> UserFacingError {
        let message = match self {
            AppError::InvalidCredentials(msg) => {
                tracing::warn!("Login rejected: {}", msg);
                msg.clone()
            }

            AppError::Validation(errors) => {
                tracing::debug!("Validation errors: {:?}", errors);
                errors
                    .first()
                    .map(|e| e.message.clone())
                    .unwrap_or_else(|| "Datos inválidos. Revisa el formulario.".to_string())
            }

            AppError::Conflict { message, .. } => {
                tracing::debug!("Conflict reported by server: {}", message);
                message.clone()
            }

            AppError::NoRefreshToken => {
                tracing::debug!("No refresh token stored");
                SESSION_EXPIRED_MESSAGE.to_string()
            }

            AppError::RefreshRejected(msg) => {
                tracing::warn!("Refresh rejected: {}", msg);
                SESSION_EXPIRED_MESSAGE.to_string()
            }

            AppError::NetworkUnreachable => {
                tracing::error!("Backend unreachable");
                UNREACHABLE_MESSAGE.to_string()
            }

            AppError::NotFound(msg) => {
                tracing::debug!("Not found: {}", msg);
                msg.clone()
            }

            AppError::ServerError(msg) => {
                tracing::error!("Server error: {}", msg);
                msg.clone()
            }

            AppError::Unauthorized(msg) => {
                tracing::warn!("Unauthorized: {}", msg);
                msg.clone()
            }

            AppError::BadRequest(msg) => {
                tracing::debug!("Bad request: {}", msg);
                msg.clone()
            }

            AppError::Http(e) => {
                tracing::error!("HTTP error: {}", e);
                "Error inesperado.".to_string()
            }

            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                "Respuesta inválida del servidor.".to_string()
            }

            AppError::Io(e) => {
                tracing::error!("IO error: {}", e);
                "Error inesperado.".to_string()
            }

            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "Error inesperado.".to_string()
            }
        };

        UserFacingError {
            message,
            field: self.field(),
        }
    }
}
