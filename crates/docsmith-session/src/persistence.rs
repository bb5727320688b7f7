use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use docsmith_core::models::session::Session;
use serde::{Deserialize, Serialize};

use crate::error::SessionError;

/// Current on-disk session version. Bump when the persisted shape changes.
const CURRENT_VERSION: u32 = 1;

/// Load/save hooks the session store calls at its boundary.
///
/// The store calls `save` after every transition and `load` only when
/// resuming. Implementations never interpret the session.
pub trait SessionPersistence {
    fn load(&self) -> Result<Option<Session>, SessionError>;
    fn save(&self, session: &Session) -> Result<(), SessionError>;
}

/// In-process persistence. Clones share the same slot.
#[derive(Debug, Clone, Default)]
pub struct MemoryPersistence {
    slot: Arc<Mutex<Option<Session>>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last saved session, if any.
    pub fn snapshot(&self) -> Option<Session> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl SessionPersistence for MemoryPersistence {
    fn load(&self) -> Result<Option<Session>, SessionError> {
        Ok(self.snapshot())
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(session.clone());
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    #[serde(default)]
    session_version: u32,
    #[serde(flatten)]
    session: Session,
}

/// JSON file persistence. Writes are atomic (temp file + rename).
#[derive(Debug, Clone)]
pub struct FileSessionPersistence {
    path: PathBuf,
}

impl FileSessionPersistence {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionPersistence for FileSessionPersistence {
    fn load(&self) -> Result<Option<Session>, SessionError> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no session file, starting empty");
            return Ok(None);
        }

        let contents = std::fs::read(&self.path)?;
        let json: serde_json::Value = serde_json::from_slice(&contents)?;
        let found = json
            .get("sessionVersion")
            .and_then(|v| v.as_u64())
            .map(|v| u32::try_from(v).unwrap_or(u32::MAX))
            .unwrap_or(0);
        if found > CURRENT_VERSION {
            return Err(SessionError::UnsupportedVersion {
                found,
                supported: CURRENT_VERSION,
            });
        }

        let stored: StoredSession = serde_json::from_value(json)?;
        tracing::debug!(path = %self.path.display(), "session loaded");
        Ok(Some(stored.session))
    }

    fn save(&self, session: &Session) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let stored = StoredSession {
            session_version: CURRENT_VERSION,
            session: session.clone(),
        };
        let json = serde_json::to_vec_pretty(&stored)?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &json)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
        }

        std::fs::rename(&tmp_path, &self.path)?;

        tracing::debug!(path = %self.path.display(), step = ?session.step, "session saved");
        Ok(())
    }
}
