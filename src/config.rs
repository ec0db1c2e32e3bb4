use std::env;
use std::path::PathBuf;
use std::time::Duration;
use anyhow::{Context, Result};

/// The default base URL of the Hosped backend.
pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
/// The default location of the persisted session.
pub const DEFAULT_STORE_PATH: &str = ".hosped/session.json";
/// Remaining access-token validity below which a refresh is triggered.
pub const DEFAULT_NEAR_EXPIRY_SECONDS: i64 = 300;

/// The application's configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// The base URL every endpoint path is appended to.
    pub api_url: String,
    /// The file backing the durable token store.
    pub store_path: PathBuf,
    /// The proactive refresh threshold in seconds.
    pub near_expiry_seconds: i64,
    /// An optional timeout applied to every outbound request.
    pub request_timeout: Option<Duration>,
}

impl Config {
    /// Creates a `Config` pointing at `api_url` with every other setting at its default.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            near_expiry_seconds: DEFAULT_NEAR_EXPIRY_SECONDS,
            request_timeout: None,
        }
    }

    /// Creates a new `Config` from environment variables.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `Config`.
    pub fn from_env() -> Result<Self> {
        let near_expiry_seconds: i64 = env::var("HOSPED_NEAR_EXPIRY_SECONDS")
            .unwrap_or_else(|_| DEFAULT_NEAR_EXPIRY_SECONDS.to_string())
            .parse()
            .context("Invalid HOSPED_NEAR_EXPIRY_SECONDS")?;

        if near_expiry_seconds <= 0 {
            anyhow::bail!("HOSPED_NEAR_EXPIRY_SECONDS must be positive");
        }

        let request_timeout = match env::var("HOSPED_REQUEST_TIMEOUT_SECONDS") {
            Ok(raw) => Some(Duration::from_secs(
                raw.parse()
                    .context("Invalid HOSPED_REQUEST_TIMEOUT_SECONDS")?,
            )),
            Err(_) => None,
        };

        let api_url = env::var("HOSPED_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            store_path: env::var("HOSPED_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STORE_PATH)),
            near_expiry_seconds,
            request_timeout,
        })
    }

    /// Joins an endpoint path such as `/auth/login` onto the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }
}
