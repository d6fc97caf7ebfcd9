use serde::{Deserialize, Serialize};

use std::path::PathBuf;

use crate::error::ContextError;

/// The on-disk shape of a stored session.
#[derive(Debug, Serialize, Deserialize)]
struct SessionRecord {
    token: String,
}

/// A file-backed store for the session bearer token.
///
/// The store has a single owner per run of the program: login writes it,
/// logout clears it and the API client reads it when it is configured to
/// attach the authorization header. Nothing else touches the file.
#[derive(Debug, Clone)]
pub struct SessionStore {
    session_file_path: PathBuf,
}

impl SessionStore {
    /// Creates a store backed by the given file path.
    pub fn new(session_file_path: PathBuf) -> SessionStore {
        SessionStore { session_file_path }
    }

    /// Creates a store at the conventional location: `$INFORME_SESSION_FILE`
    /// if set, otherwise `.informe-session.json` in the user home directory.
    pub fn from_environment() -> Result<SessionStore, ContextError> {
        if let Ok(path) = std::env::var("INFORME_SESSION_FILE") {
            return Ok(SessionStore::new(PathBuf::from(path)));
        }
        let home_directory = std::env::var("HOME").map_err(|error| {
            ContextError::with_error(
                "Unable to resolve the home directory for the session file",
                &error,
            )
        })?;
        Ok(SessionStore::new(
            PathBuf::from(home_directory).join(".informe-session.json"),
        ))
    }

    /// Returns the stored bearer token, if a session exists.
    ///
    /// A file which is missing simply means no session; a file which exists but
    /// cannot be parsed is reported loudly, because it most likely got corrupted
    /// and logging in again is the only way out.
    pub fn load_token(&self) -> Option<String> {
        let session_content = match std::fs::read_to_string(&self.session_file_path) {
            Ok(session_content) => session_content,
            Err(_) => return None,
        };
        match serde_json::from_str::<SessionRecord>(&session_content) {
            Ok(record) => Some(record.token),
            Err(error) => {
                log::error!(
                    "The session file {:?} is not readable as a session: {}",
                    self.session_file_path,
                    error
                );
                None
            }
        }
    }

    /// Persists the bearer token obtained from a successful login.
    pub fn save_token(&self, token: &str) -> Result<(), ContextError> {
        let record = SessionRecord {
            token: token.to_string(),
        };
        let session_content = serde_json::to_string_pretty(&record).map_err(|error| {
            ContextError::with_error("Unable to serialize the session", &error)
        })?;
        std::fs::write(&self.session_file_path, session_content).map_err(|error| {
            ContextError::with_error(
                format!(
                    "Unable to write the session file {:?}",
                    self.session_file_path
                ),
                &error,
            )
        })
    }

    /// Removes the stored session, if any. Clearing an absent session is not
    /// an error.
    pub fn clear(&self) -> Result<(), ContextError> {
        match std::fs::remove_file(&self.session_file_path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(error) => Err(ContextError::with_error(
                format!(
                    "Unable to remove the session file {:?}",
                    self.session_file_path
                ),
                &error,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temporary_store(name: &str) -> SessionStore {
        let mut path = std::env::temp_dir();
        path.push(format!("informe-session-test-{name}-{}.json", std::process::id()));
        let _ = std::fs::remove_file(&path);
        SessionStore::new(path)
    }

    #[test]
    fn a_saved_token_round_trips() {
        let store = temporary_store("round-trip");
        store.save_token("abc123").unwrap();
        assert_eq!(store.load_token(), Some("abc123".to_string()));
        store.clear().unwrap();
    }

    #[test]
    fn a_missing_session_yields_no_token() {
        let store = temporary_store("missing");
        assert_eq!(store.load_token(), None);
    }

    #[test]
    fn clearing_twice_is_fine() {
        let store = temporary_store("clear-twice");
        store.save_token("abc123").unwrap();
        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.load_token(), None);
    }
}
