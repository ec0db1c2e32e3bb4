use std::sync::Arc;

use reqwest::Client;

use crate::config::Config;
use crate::error::Result;
use crate::middleware_layer::auth::AuthPipeline;
use crate::middleware_layer::guard::RouteGuard;
use crate::repositories::token::{FileTokenStore, TokenStore};
use crate::services::http::build_client;
use crate::services::recovery::RecoveryService;
use crate::services::session::SessionService;
use crate::services::users::UserService;

/// The application's state.
///
/// Owns the one `SessionService` every other component reads through.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration.
    pub config: Config,
    /// The shared HTTP client.
    pub http: Client,
    /// The token store.
    pub store: Arc<dyn TokenStore>,
    /// The session service.
    pub session: Arc<SessionService>,
    /// The authenticated request pipeline.
    pub pipeline: Arc<AuthPipeline>,
    /// The protected-view gate.
    pub guard: RouteGuard,
    /// The profile service.
    pub users: Arc<UserService>,
    /// The password-recovery service.
    pub recovery: Arc<RecoveryService>,
}

impl AppState {
    /// Creates a new `AppState` backed by the file store at `config.store_path`.
    ///
    /// # Arguments
    ///
    /// * `config` - The application's configuration.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `AppState`.
    pub fn new(config: &Config) -> Result<Self> {
        let store = Arc::new(FileTokenStore::open(&config.store_path));
        tracing::info!("✅ Token store ready at {}", config.store_path.display());
        Self::with_store(config, store)
    }

    /// Creates a new `AppState` over any token store.
    pub fn with_store(config: &Config, store: Arc<dyn TokenStore>) -> Result<Self> {
        let http = build_client(config)?;

        let session = Arc::new(SessionService::new(store.clone(), http.clone(), config.clone()));
        let pipeline = Arc::new(AuthPipeline::new(
            session.clone(),
            http.clone(),
            config.near_expiry_seconds,
        ));
        let guard = RouteGuard::new(session.clone());
        let users = Arc::new(UserService::new(pipeline.clone(), http.clone(), config.clone()));
        let recovery = Arc::new(RecoveryService::new(pipeline.clone(), http.clone(), config.clone()));
        tracing::debug!("✅ Services wired against {}", config.api_url);

        Ok(AppState {
            config: config.clone(),
            http,
            store,
            session,
            pipeline,
            guard,
            users,
            recovery,
        })
    }
}
