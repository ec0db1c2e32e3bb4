use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

/// Key of the stored access token.
pub const ACCESS_TOKEN_KEY: &str = "hosped_token";
/// Key of the stored refresh token.
pub const REFRESH_TOKEN_KEY: &str = "hosped_refresh_token";
/// Key of the stored `{email, role}` profile.
pub const PROFILE_KEY: &str = "hosped_user";

/// Durable key-value persistence for session material.
///
/// Operations never fail: an unavailable backing store reads as absent.
pub trait TokenStore: Send + Sync {
    /// Returns the value stored under `key`.
    fn get(&self, key: &str) -> Option<String>;
    /// Stores `value` under `key`.
    fn set(&self, key: &str, value: &str);
    /// Removes `key`. Removing a missing key is a no-op.
    fn remove(&self, key: &str);
}

/// Process-local token store.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.entries.lock().remove(key);
    }
}

/// Token store persisted as a JSON object in a file.
///
/// The file is read once when opened and rewritten on every mutation, so a
/// session survives process restarts.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileTokenStore {
    /// Opens the store at `path`.
    ///
    /// # Arguments
    ///
    /// * `path` - The JSON file. It need not exist yet.
    ///
    /// # Returns
    ///
    /// The store. A missing, unreadable or corrupt file yields an empty store.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = Self::load(&path);
        tracing::debug!("🗄️ Token store opened at {} ({} keys)", path.display(), entries.len());

        Self {
            path,
            entries: Mutex::new(entries),
        }
    }

    fn load(path: &Path) -> HashMap<String, String> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return HashMap::new(),
            Err(e) => {
                tracing::warn!("⚠️ Token store unreadable at {}: {}", path.display(), e);
                return HashMap::new();
            }
        };

        sonic_rs::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("⚠️ Token store corrupt at {}: {}", path.display(), e);
            HashMap::new()
        })
    }

    fn persist(&self, entries: &HashMap<String, String>) {
        let write = || -> crate::error::Result<()> {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            let content = sonic_rs::to_string(entries)?;
            std::fs::write(&self.path, content)?;
            Ok(())
        };

        if let Err(e) = write() {
            tracing::warn!("⚠️ Token store write failed at {}: {}", self.path.display(), e);
        }
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock();
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries);
    }

    fn remove(&self, key: &str) {
        let mut entries = self.entries.lock();
        if entries.remove(key).is_some() {
            self.persist(&entries);
        }
    }
}
