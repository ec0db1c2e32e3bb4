use serde::{Deserialize, Serialize};

/// A platform role, using the backend's wire names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[default]
    #[serde(rename = "USUARIO")]
    User,
    #[serde(rename = "ANFITRION")]
    Host,
    #[serde(rename = "ADMIN")]
    Admin,
}

impl Role {
    /// Returns the wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USUARIO",
            Role::Host => "ANFITRION",
            Role::Admin => "ADMIN",
        }
    }

    /// Returns the label shown to people.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "Huésped",
            Role::Host => "Anfitrión",
            Role::Admin => "Administrador",
        }
    }

    /// Parses a wire name, case-insensitively.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "USUARIO" => Some(Role::User),
            "ANFITRION" => Some(Role::Host),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

/// The minimal profile persisted next to the tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// The account email.
    pub email: String,
    /// The account role.
    pub role: Role,
}

/// Where a session stands in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No tokens at all.
    Anonymous,
    /// A usable access token is stored.
    Authenticated,
    /// The access token is gone or expired but a refresh token remains.
    AccessExpired,
}

/// Represents the client session.
///
/// This is a snapshot derived from the token store, not a record with an id.
/// Only `SessionService` writes the underlying fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// The signed access token.
    pub access_token: Option<String>,
    /// The opaque refresh token.
    pub refresh_token: Option<String>,
    /// The profile stored at login or registration.
    pub profile: Option<Profile>,
    /// The access token's `exp` claim, when it decodes.
    pub access_expires_at: Option<i64>,
}

impl Session {
    /// Derives the lifecycle state at `now` (seconds since epoch).
    pub fn state_at(&self, now: i64) -> SessionState {
        let access_valid = self.access_token.is_some()
            && self.access_expires_at.is_some_and(|exp| exp > now);

        if access_valid {
            SessionState::Authenticated
        } else if self.refresh_token.is_some() {
            SessionState::AccessExpired
        } else {
            SessionState::Anonymous
        }
    }

    /// Derives the lifecycle state now.
    pub fn state(&self) -> SessionState {
        self.state_at(chrono::Utc::now().timestamp())
    }
}
