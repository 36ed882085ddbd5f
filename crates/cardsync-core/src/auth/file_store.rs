//! Session persistence in a JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use super::{AuthError, AuthResult, AuthSession, SessionPersistence};

/// Stores the session next to the local database, readable only by its owner
/// on unix.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionPersistence for FileSessionStore {
    fn load_session(&self) -> AuthResult<Option<AuthSession>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(error) => Err(AuthError::Storage(error.to_string())),
        }
    }

    fn save_session(&self, session: &AuthSession) -> AuthResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|error| AuthError::Storage(error.to_string()))?;
        }

        let raw = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, raw).map_err(|error| AuthError::Storage(error.to_string()))?;
        restrict_permissions(&self.path)
    }

    fn clear_session(&self) -> AuthResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(AuthError::Storage(error.to_string())),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> AuthResult<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .map_err(|error| AuthError::Storage(error.to_string()))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> AuthResult<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::auth::AuthUser;

    fn session() -> AuthSession {
        AuthSession {
            access_token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: 1_900_000_000,
            user: AuthUser {
                id: "user-1".to_string(),
                email: None,
            },
        }
    }

    #[test]
    fn save_load_and_clear() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path().join("nested").join("session.json"));

        assert!(store.load_session().unwrap().is_none());

        store.save_session(&session()).unwrap();
        assert_eq!(store.load_session().unwrap(), Some(session()));

        store.clear_session().unwrap();
        store.clear_session().unwrap();
        assert!(store.load_session().unwrap().is_none());
    }

    #[test]
    fn unreadable_session_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();

        let store = FileSessionStore::new(path);
        assert!(matches!(store.load_session(), Err(AuthError::Json(_))));
    }

    #[cfg(unix)]
    #[test]
    fn saved_session_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        store.save_session(&session()).unwrap();

        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
