use keyring::Entry;
use serde::{Deserialize, Serialize};
use shared_types::User;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::config::{default_session_path, SessionBackend, SessionConfig};
use crate::error::SessionError;

const KEYRING_SERVICE: &str = "taskdeck";
const KEYRING_USER: &str = "session";

/// What survives between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub access_token: String,
    pub user: User,
}

pub trait SessionStorage: Send + Sync {
    fn load(&self) -> Result<Option<StoredSession>, SessionError>;
    fn save(&self, session: &StoredSession) -> Result<(), SessionError>;
    fn clear(&self) -> Result<(), SessionError>;
}

/// Build the storage selected in `[session]`.
pub fn storage_for(config: &SessionConfig) -> Box<dyn SessionStorage> {
    match config.backend {
        SessionBackend::File => {
            let path = config.path.clone().unwrap_or_else(default_session_path);
            Box::new(FileSessionStorage::new(path))
        }
        SessionBackend::Keyring => Box::new(KeyringSessionStorage),
    }
}

/// Session as a JSON file, by default next to `client.toml`.
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> Result<Option<StoredSession>, SessionError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&contents)?))
    }

    fn save(&self, session: &StoredSession) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(session)?)?;
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

/// Session serialized into a single OS keychain entry.
pub struct KeyringSessionStorage;

impl KeyringSessionStorage {
    fn entry() -> Result<Entry, SessionError> {
        Entry::new(KEYRING_SERVICE, KEYRING_USER).map_err(|e| {
            SessionError::Keyring(format!("Failed to create keychain entry: {}", e))
        })
    }
}

impl SessionStorage for KeyringSessionStorage {
    fn load(&self) -> Result<Option<StoredSession>, SessionError> {
        match Self::entry()?.get_password() {
            Ok(secret) => Ok(Some(serde_json::from_str(&secret)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(SessionError::Keyring(format!(
                "Failed to retrieve session: {}",
                e
            ))),
        }
    }

    fn save(&self, session: &StoredSession) -> Result<(), SessionError> {
        let secret = serde_json::to_string(session)?;
        Self::entry()?
            .set_password(&secret)
            .map_err(|e| SessionError::Keyring(format!("Failed to store session: {}", e)))
    }

    fn clear(&self) -> Result<(), SessionError> {
        match Self::entry()?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(SessionError::Keyring(format!(
                "Failed to delete session: {}",
                e
            ))),
        }
    }
}

/// Process-local storage; clones share the same slot.
#[derive(Clone, Default)]
pub struct MemorySessionStorage {
    slot: Arc<Mutex<Option<StoredSession>>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<StoredSession> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> Result<Option<StoredSession>, SessionError> {
        Ok(self.current())
    }

    fn save(&self, session: &StoredSession) -> Result<(), SessionError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}
