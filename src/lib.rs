//! Client-side session core for the Hosped lodging platform.
//!
//! A `SessionService` owns the access/refresh token lifecycle, the
//! `AuthPipeline` wraps outbound calls with bearer authorization and
//! transparent refresh, and the `RouteGuard` gates protected views.

pub mod config;
pub mod error;
pub mod state;

pub mod crypto {
    pub mod jwt;
}

pub mod models {
    pub mod auth;
    pub mod session;
    pub mod user;
}

pub mod repositories {
    pub mod token;
}

pub mod services {
    pub mod http;
    pub mod recovery;
    pub mod session;
    pub mod users;
}

pub mod handlers {
    pub mod auth;
    pub mod profile;
}

pub mod middleware_layer {
    pub mod auth;
    pub mod guard;
}

pub mod validation {
    pub mod auth;
    pub mod profile;
}

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
