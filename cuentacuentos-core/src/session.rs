//! Client-side authentication state.
//!
//! A [`Session`] is set on login, cleared on logout, and cleared when the server
//! rejects an authenticated request. It is handed to the API client explicitly
//! as a [`SharedSession`]; persistence goes through a [`SessionStore`].

use crate::api::models::User;
use crate::config;
use crate::error::ClientError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, RwLock};
use time::OffsetDateTime;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    token: Option<String>,
    user: Option<User>,
}

pub type SharedSession = Arc<RwLock<Session>>;

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            user: None,
        }
    }

    pub fn into_shared(self) -> SharedSession {
        Arc::new(RwLock::new(self))
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// A new token invalidates whatever user was attached to the old one.
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
        self.user = None;
    }

    pub fn set_user(&mut self, user: User) {
        self.user = Some(user);
    }

    pub fn clear(&mut self) {
        self.token = None;
        self.user = None;
    }

    /// Value of the `Authorization` header, when a token is present.
    pub fn bearer(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("Bearer {}", t))
    }
}

/// Persistence for the session token between runs.
pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<String>, ClientError>;
    fn save(&self, token: &str) -> Result<(), ClientError>;
    fn clear(&self) -> Result<(), ClientError>;
}

#[derive(Serialize, Deserialize, Debug)]
struct SavedSession {
    token: String,
    saved_at: OffsetDateTime,
}

/// Stores the token as JSON in the platform data directory.
#[derive(Debug)]
pub struct FileSessionStore {
    session_file_path: PathBuf,
}

impl FileSessionStore {
    pub fn new() -> Result<Self, ClientError> {
        let dir = config::data_dir()?;
        Self::in_dir(&dir)
    }

    pub fn in_dir(dir: &Path) -> Result<Self, ClientError> {
        fs::create_dir_all(dir)
            .map_err(|e| ClientError::Session(format!("Failed to create data directory: {}", e)))?;

        Ok(FileSessionStore {
            session_file_path: dir.join("session.json"),
        })
    }

    pub fn path(&self) -> &Path {
        &self.session_file_path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<String>, ClientError> {
        if !self.session_file_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.session_file_path)
            .map_err(|e| ClientError::Session(format!("Failed to read session file: {}", e)))?;
        let saved: SavedSession = serde_json::from_str(&content)
            .map_err(|e| ClientError::Session(format!("Failed to parse session file: {}", e)))?;

        log::debug!("Loaded session saved at {}", saved.saved_at);
        Ok(Some(saved.token))
    }

    fn save(&self, token: &str) -> Result<(), ClientError> {
        let saved = SavedSession {
            token: token.to_string(),
            saved_at: OffsetDateTime::now_utc(),
        };

        let content = serde_json::to_string_pretty(&saved)
            .map_err(|e| ClientError::Session(format!("Failed to serialize session: {}", e)))?;
        fs::write(&self.session_file_path, content)
            .map_err(|e| ClientError::Session(format!("Failed to write session file: {}", e)))?;

        log::info!("Saved session to {}", self.session_file_path.display());
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        if self.session_file_path.exists() {
            fs::remove_file(&self.session_file_path)
                .map_err(|e| ClientError::Session(format!("Failed to remove session file: {}", e)))?;
        }
        Ok(())
    }
}

/// Keeps the token only for the lifetime of the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    token: Mutex<Option<String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<String>, ClientError> {
        self.token
            .lock()
            .map(|t| t.clone())
            .map_err(|_| ClientError::Session("Session store lock poisoned".to_string()))
    }

    fn save(&self, token: &str) -> Result<(), ClientError> {
        let mut guard = self
            .token
            .lock()
            .map_err(|_| ClientError::Session("Session store lock poisoned".to_string()))?;
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), ClientError> {
        let mut guard = self
            .token
            .lock()
            .map_err(|_| ClientError::Session("Session store lock poisoned".to_string()))?;
        *guard = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User {
            id: Some(1),
            username: "ana".to_string(),
            email: None,
        }
    }

    #[test]
    fn test_session_lifecycle() {
        let mut session = Session::new();
        assert!(!session.is_authenticated());
        assert_eq!(session.bearer(), None);

        session.set_token("abc");
        session.set_user(test_user());
        assert_eq!(session.bearer(), Some("Bearer abc".to_string()));
        assert_eq!(session.user().map(|u| u.username.as_str()), Some("ana"));

        session.set_token("def");
        assert!(session.user().is_none());

        session.clear();
        assert!(!session.is_authenticated());
        assert_eq!(session.token(), None);
    }

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemorySessionStore::new();
        assert_eq!(store.load().unwrap(), None);
        store.save("tok").unwrap();
        assert_eq!(store.load().unwrap(), Some("tok".to_string()));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_file_store_persists_token() {
        let dir = std::env::temp_dir().join(format!(
            "cuentacuentos-session-test-{}",
            std::process::id()
        ));
        let store = FileSessionStore::in_dir(&dir).unwrap();
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);

        store.save("persisted").unwrap();
        let reopened = FileSessionStore::in_dir(&dir).unwrap();
        assert_eq!(reopened.load().unwrap(), Some("persisted".to_string()));

        reopened.clear().unwrap();
        assert!(!reopened.path().exists());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = std::env::temp_dir().join(format!(
            "cuentacuentos-session-garbage-{}",
            std::process::id()
        ));
        let store = FileSessionStore::in_dir(&dir).unwrap();
        fs::write(store.path(), "not json").unwrap();
        assert!(matches!(store.load(), Err(ClientError::Session(_))));
        let _ = fs::remove_dir_all(&dir);
    }
}
