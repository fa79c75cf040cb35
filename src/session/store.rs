use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AttendanceError, Result};
use crate::session::TokenCipher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

impl Role {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "student" => Some(Self::Student),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub role: Role,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"***")
            .field("role", &self.role)
            .finish()
    }
}

/// Same two keys the web client kept in local storage.
#[derive(Serialize, Deserialize, Default)]
struct StoredSession {
    token: Option<String>,
    #[serde(rename = "userType")]
    user_type: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    encrypted: bool,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
    cipher: Option<TokenCipher>,
}

impl SessionStore {
    pub fn new<P: AsRef<Path>>(path: P, cipher: Option<TokenCipher>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            cipher,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes token and role together: the file is staged next to the target
    /// and renamed over it, so readers see both values or neither.
    pub fn save(&self, session: &Session) -> Result<()> {
        let (token, encrypted) = match &self.cipher {
            Some(cipher) => (cipher.encrypt(&session.token)?, true),
            None => (session.token.clone(), false),
        };
        let stored = StoredSession {
            token: Some(token),
            user_type: Some(session.role.as_str().to_string()),
            encrypted,
        };
        let json = serde_json::to_string_pretty(&stored)
            .map_err(|e| AttendanceError::Storage(e.to_string()))?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| storage_error(parent, e))?;
            }
        }

        let staging = self.staging_path();
        fs::write(&staging, json).map_err(|e| storage_error(&staging, e))?;
        fs::rename(&staging, &self.path).map_err(|e| storage_error(&self.path, e))?;
        debug!(path = %self.path.display(), role = %session.role, "sesión guardada");
        Ok(())
    }

    pub fn load(&self) -> Option<Session> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "no se pudo leer la sesión");
                return None;
            }
        };

        let stored: StoredSession = match serde_json::from_str(&data) {
            Ok(stored) => stored,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "archivo de sesión inválido");
                return None;
            }
        };

        let raw_token = stored.token.filter(|t| !t.is_empty())?;
        let role = stored.user_type.as_deref().and_then(Role::parse)?;

        let token = if stored.encrypted {
            let Some(cipher) = &self.cipher else {
                warn!("token cifrado pero no hay clave configurada");
                return None;
            };
            match cipher.decrypt(&raw_token) {
                Ok(token) if !token.is_empty() => token,
                Ok(_) => return None,
                Err(e) => {
                    warn!(error = %e, "no se pudo descifrar el token");
                    return None;
                }
            }
        } else {
            raw_token
        };

        Some(Session { token, role })
    }

    pub fn clear(&self) -> Result<()> {
        for path in [self.path.clone(), self.staging_path()] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => return Err(storage_error(&path, e)),
            }
        }
        Ok(())
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn storage_error(path: &Path, err: std::io::Error) -> AttendanceError {
    AttendanceError::Storage(format!("{}: {}", path.display(), err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionKey;

    fn store_in(dir: &tempfile::TempDir) -> SessionStore {
        SessionStore::new(dir.path().join("session.json"), None)
    }

    fn student(token: &str) -> Session {
        Session {
            token: token.to_string(),
            role: Role::Student,
        }
    }

    #[test]
    fn load_is_absent_without_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store_in(&dir).load().is_none());
    }

    #[test]
    fn save_then_load_returns_both_values() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.save(&student("abc")).unwrap();

        let raw = fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains("\"userType\": \"student\""));
        assert_eq!(store.load(), Some(student("abc")));
        assert!(!store.staging_path().exists());
    }

    #[test]
    fn missing_or_unknown_values_count_as_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        fs::write(store.path(), r#"{"token":"abc"}"#).unwrap();
        assert!(store.load().is_none());

        fs::write(store.path(), r#"{"userType":"admin"}"#).unwrap();
        assert!(store.load().is_none());

        fs::write(store.path(), r#"{"token":"abc","userType":"tutor"}"#).unwrap();
        assert!(store.load().is_none());

        fs::write(store.path(), r#"{"token":"","userType":"admin"}"#).unwrap();
        assert!(store.load().is_none());

        fs::write(store.path(), "no es json").unwrap();
        assert!(store.load().is_none());
    }

    #[test]
    fn clear_removes_session_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store
            .save(&Session {
                token: "xyz".to_string(),
                role: Role::Admin,
            })
            .unwrap();

        store.clear().unwrap();
        assert!(store.load().is_none());
        assert!(!store.path().exists());
        store.clear().unwrap();
    }

    #[test]
    fn encrypted_token_is_not_stored_in_clear() {
        let dir = tempfile::tempdir().unwrap();
        let key = SessionKey {
            key: vec![9u8; 16],
            iv: vec![4u8; 16],
        };
        let path = dir.path().join("session.json");
        let store = SessionStore::new(&path, Some(TokenCipher::new(key)));
        store.save(&student("secreto")).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("secreto"));
        assert_eq!(store.load(), Some(student("secreto")));

        let without_key = SessionStore::new(&path, None);
        assert!(without_key.load().is_none());
    }

    #[test]
    fn debug_output_hides_token() {
        let rendered = format!("{:?}", student("abc"));
        assert!(!rendered.contains("abc"));
    }
}
