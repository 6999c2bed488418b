//! Session persistence backends

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::NamedTempFile;

use super::SessionResult;
use crate::models::Session;

/// Where the persisted `{user, token}` document is kept
pub trait SessionPersistence: Send + Sync {
    /// Read the persisted session; `None` when nothing is stored
    fn load(&self) -> SessionResult<Option<Session>>;

    /// Replace the persisted session in one step
    fn save(&self, session: &Session) -> SessionResult<()>;

    /// Remove the persisted session; removing nothing is not an error
    fn erase(&self) -> SessionResult<()>;
}

/// Session kept as a JSON file, replaced atomically on every save
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// File name used inside the data directory
    pub const FILE_NAME: &'static str = "session.json";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store `session.json` inside `dir`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(Self::FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionPersistence for FileSessionStore {
    fn load(&self) -> SessionResult<Option<Session>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let session: Session = serde_json::from_str(&content)?;
                Ok(Some(session.normalized()).filter(Session::is_authenticated))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, session: &Session) -> SessionResult<()> {
        let parent = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty());

        if let Some(dir) = parent {
            fs::create_dir_all(dir)?;
        }

        let contents = serde_json::to_string_pretty(session)?;
        let mut temp_file = match parent {
            Some(dir) => NamedTempFile::new_in(dir)?,
            None => NamedTempFile::new()?,
        };

        temp_file.write_all(contents.as_bytes())?;
        temp_file.as_file_mut().sync_all()?;
        temp_file.persist(&self.path)?;

        tracing::debug!(path = %self.path.display(), "Session persisted");
        Ok(())
    }

    fn erase(&self) -> SessionResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "Session erased");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Session kept in memory, lost when the process exits
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `session` already stored
    pub fn with_session(session: Session) -> Self {
        Self {
            slot: Mutex::new(Some(session)),
        }
    }
}

impl SessionPersistence for MemorySessionStore {
    fn load(&self) -> SessionResult<Option<Session>> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    fn save(&self, session: &Session) -> SessionResult<()> {
        *self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(session.clone());
        Ok(())
    }

    fn erase(&self) -> SessionResult<()> {
        *self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::User;
    use tempfile::tempdir;

    fn session() -> Session {
        Session::authenticated(User::new("1", "a@b.com", "a"), "tok-1")
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::in_dir(dir.path().join("nested"));

        assert!(store.load().unwrap().is_none());

        store.save(&session()).unwrap();
        assert_eq!(store.load().unwrap(), Some(session()));

        store.erase().unwrap();
        assert!(!store.path().exists());
        assert!(store.load().unwrap().is_none());

        // Erasing twice is fine
        store.erase().unwrap();
    }

    #[test]
    fn test_file_store_ignores_half_document() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::in_dir(dir.path());
        fs::write(store.path(), r#"{"token":"orphan"}"#).unwrap();

        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_file_store_corrupt_document_is_error() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::in_dir(dir.path());
        fs::write(store.path(), "not json").unwrap();

        assert!(matches!(
            store.load(),
            Err(crate::session::SessionError::Serialization(_))
        ));
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySessionStore::with_session(session());
        assert_eq!(store.load().unwrap(), Some(session()));

        store.erase().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}
