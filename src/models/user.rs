use serde::{Deserialize, Serialize};

use crate::models::session::Role;

/// Represents a user as returned by `/usuarios/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The unique identifier for the user.
    #[serde(default)]
    pub id: Option<i64>,
    /// The user's full name.
    pub name: String,
    /// The user's email address.
    pub email: String,
    /// The user's phone number.
    #[serde(default)]
    pub phone: Option<String>,
    /// The user's birth date, `YYYY-MM-DD`.
    #[serde(default)]
    pub birth_date: Option<String>,
    /// The user's role.
    pub role: Role,
    /// A free-text description.
    #[serde(default)]
    pub description: Option<String>,
    /// A URL to the user's photo.
    #[serde(default)]
    pub photo: Option<String>,
    /// Whether the account is active.
    #[serde(default)]
    pub active: Option<bool>,
}

/// A partial user record sent to `PUT /usuarios/me`.
///
/// Absent fields are omitted from the payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}
