//! Persistent credential storage
//!
//! A narrow synchronous key-value contract over four fixed keys. The store
//! never interprets values; token expiry is decided by callers from token
//! contents. `MemoryStore` is the in-process store, `FileStore` persists a
//! JSON object with atomic temp-file + rename writes so a crash mid-write
//! never leaves a truncated file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use crate::error::{Error, Result};

/// Logical keys owned by the credential store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
    AccessToken,
    RefreshToken,
    OauthState,
    PkceCodeVerifier,
}

impl StorageKey {
    pub const ALL: [StorageKey; 4] = [
        StorageKey::AccessToken,
        StorageKey::RefreshToken,
        StorageKey::OauthState,
        StorageKey::PkceCodeVerifier,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StorageKey::AccessToken => "access_token",
            StorageKey::RefreshToken => "refresh_token",
            StorageKey::OauthState => "oauth_state",
            StorageKey::PkceCodeVerifier => "pkce_code_verifier",
        }
    }
}

/// Origin-scoped credential storage.
///
/// Implementations serialize their own mutation; callers never hold a lock
/// across an await point.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: StorageKey) -> Option<String>;

    fn set(&self, key: StorageKey, value: &str) -> Result<()>;

    fn remove(&self, key: StorageKey) -> Result<()>;

    /// Remove every session key. Keeps going after a failed removal and
    /// reports the first error.
    fn clear_session(&self) -> Result<()> {
        let mut first_error = None;
        for key in StorageKey::ALL {
            if let Err(e) = self.remove(key) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory store, lost when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<StorageKey, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.values).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: StorageKey) -> Option<String> {
        lock(&self.values).get(&key).cloned()
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<()> {
        lock(&self.values).insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: StorageKey) -> Result<()> {
        lock(&self.values).remove(&key);
        Ok(())
    }

    fn clear_session(&self) -> Result<()> {
        lock(&self.values).clear();
        Ok(())
    }
}

/// JSON-file store keyed by `StorageKey::as_str()`.
///
/// The whole map is held in memory and rewritten on every mutation. The file
/// is created `0600` on unix since it holds bearer tokens.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl FileStore {
    /// Load the store from `path`, creating an empty `{}` file on cold start.
    pub fn load(path: PathBuf) -> Result<Self> {
        let values = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| Error::storage(format!("reading credential file: {e}")))?;
            let values: HashMap<String, String> = serde_json::from_str(&contents)
                .map_err(|e| Error::storage(format!("parsing credential file: {e}")))?;
            info!(path = %path.display(), keys = values.len(), "loaded credential file");
            values
        } else {
            info!(path = %path.display(), "credential file not found, starting empty");
            let values = HashMap::new();
            write_atomic(&path, &values)?;
            values
        };

        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileStore {
    fn get(&self, key: StorageKey) -> Option<String> {
        lock(&self.values).get(key.as_str()).cloned()
    }

    fn set(&self, key: StorageKey, value: &str) -> Result<()> {
        let mut values = lock(&self.values);
        values.insert(key.as_str().to_string(), value.to_string());
        debug!(key = key.as_str(), "stored credential");
        write_atomic(&self.path, &values)
    }

    fn remove(&self, key: StorageKey) -> Result<()> {
        let mut values = lock(&self.values);
        if values.remove(key.as_str()).is_some() {
            debug!(key = key.as_str(), "removed credential");
            write_atomic(&self.path, &values)?;
        }
        Ok(())
    }

    /// One rewrite for all four keys, so the file never holds a half-cleared
    /// session.
    fn clear_session(&self) -> Result<()> {
        let mut values = lock(&self.values);
        let before = values.len();
        for key in StorageKey::ALL {
            values.remove(key.as_str());
        }
        if values.len() != before {
            debug!(removed = before - values.len(), "cleared session credentials");
            write_atomic(&self.path, &values)?;
        }
        Ok(())
    }
}

fn write_atomic(path: &Path, values: &HashMap<String, String>) -> Result<()> {
    let json = serde_json::to_string_pretty(values)
        .map_err(|e| Error::storage(format!("serializing credentials: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::storage("credential path has no parent directory"))?;

    let tmp_path = dir.join(format!(".credentials.tmp.{}", std::process::id()));

    std::fs::write(&tmp_path, json.as_bytes())
        .map_err(|e| Error::storage(format!("writing temp credential file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))
            .map_err(|e| Error::storage(format!("setting credential file permissions: {e}")))?;
    }

    std::fs::rename(&tmp_path, path)
        .map_err(|e| Error::storage(format!("renaming temp credential file: {e}")))?;

    debug!(path = %path.display(), "persisted credentials");
    Ok(())
}
