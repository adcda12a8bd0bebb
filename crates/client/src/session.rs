//! Persisted "current user" session.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::ClientResult;
use crate::types::Session;

/// A single JSON file holding the signed-in session, if any.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    /// Store the session at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved session. A missing file means nobody is signed in; a
    /// corrupt one is discarded.
    pub async fn load(&self) -> ClientResult<Option<Session>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_slice(&bytes) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Discarding unreadable session");
                self.clear().await?;
                Ok(None)
            }
        }
    }

    /// Replace the saved session.
    pub async fn save(&self, session: &Session) -> ClientResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(session)?;
        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        debug!(user_id = %session.user.id, "Session saved");
        Ok(())
    }

    /// Forget the saved session. Clearing an empty store is fine.
    pub async fn clear(&self) -> ClientResult<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Role, UserProfile};

    fn temp_store() -> SessionStore {
        let dir = std::env::temp_dir().join(format!("cyberguard-session-{}", uuid::Uuid::new_v4()));
        SessionStore::new(dir.join("session.json"))
    }

    fn session() -> Session {
        Session {
            user: UserProfile {
                id: "CGTEST01".to_string(),
                name: "Asha Verma".to_string(),
                aadhaar_number: "XXXXXXXX1234".to_string(),
                phone_number: "9876543210".to_string(),
                address: "12 MG Road".to_string(),
                role: Role::Citizen,
                government_id: None,
                is_verified: true,
                has_password: true,
                last_login_at: None,
                created_at: "2024-01-01T00:00:00Z".to_string(),
            },
            token: "tok".to_string(),
        }
    }

    #[tokio::test]
    async fn test_save_load_clear() {
        let store = temp_store();
        assert!(store.load().await.unwrap().is_none());

        store.save(&session()).await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some(session()));

        store.clear().await.unwrap();
        assert!(store.load().await.unwrap().is_none());
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_is_discarded() {
        let store = temp_store();
        tokio::fs::create_dir_all(store.path().parent().unwrap())
            .await
            .unwrap();
        tokio::fs::write(store.path(), b"{not json").await.unwrap();

        assert!(store.load().await.unwrap().is_none());
        assert!(!store.path().exists());
    }
}
