use std::sync::Arc;

use crate::services::session::SessionService;

/// Where a denied navigation should be sent.
pub const LOGIN_ROUTE: &str = "/login";

/// Gate evaluated before entering a protected view.
#[derive(Clone)]
pub struct RouteGuard {
    session: Arc<SessionService>,
}

impl RouteGuard {
    /// Creates a new `RouteGuard` reading through `session`.
    pub fn new(session: Arc<SessionService>) -> Self {
        Self { session }
    }

    /// Returns true when the session currently holds a valid access token.
    ///
    /// A false result is not navigation. The caller redirects to `LOGIN_ROUTE`.
    pub fn can_enter(&self) -> bool {
        let allowed = self.session.is_authenticated();
        if !allowed {
            tracing::debug!("🚫 Protected view denied, redirect to {}", LOGIN_ROUTE);
        }
        allowed
    }
}
