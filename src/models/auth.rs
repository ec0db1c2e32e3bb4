use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::models::session::Role;

/// The request payload for login.
#[derive(Serialize, Zeroize, ZeroizeOnDrop)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// The request payload for registration.
#[derive(Serialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub birth_date: String,
    #[zeroize(skip)]
    pub role: Role,
}

/// The request payload for exchanging a refresh token.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest<'a> {
    pub refresh_token: &'a str,
}

/// The request payload for asking a recovery code.
#[derive(Serialize)]
pub struct RecoveryCodeRequest<'a> {
    pub email: &'a str,
}

/// The request payload for resetting a password with a recovery code.
#[derive(Serialize, Zeroize, ZeroizeOnDrop)]
pub struct PasswordResetRequest {
    pub email: String,
    #[serde(rename = "codigo")]
    pub code: String,
    #[serde(rename = "nuevaContrasena")]
    pub new_password: String,
}

/// The response payload of login, registration and refresh.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}
