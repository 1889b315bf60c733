use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, error, warn};

use super::state::AppState;
use crate::AuditFeeResult;

/// Key the wizard state is saved under unless configured otherwise.
pub const DEFAULT_STATE_KEY: &str = "audit_fee_calculator_data";

/// String-keyed local store: one JSON file per key inside a directory.
///
/// Every operation is best-effort. Failures are logged and reported as
/// `false`/`None`, never raised, so the caller carries on with in-memory
/// state.
#[derive(Debug, Clone)]
pub struct StateStore {
    dir: PathBuf,
    key: String,
}

impl StateStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self::with_key(dir, DEFAULT_STATE_KEY)
    }

    pub fn with_key(dir: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            key: key.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.key))
    }

    pub fn save(&self, state: &AppState) -> bool {
        match self.try_save(state) {
            Ok(()) => {
                debug!(path = %self.path().display(), "wizard state saved");
                true
            }
            Err(e) => {
                error!(path = %self.path().display(), error = %e, "error saving wizard state");
                false
            }
        }
    }

    /// `None` when nothing is stored or the stored blob cannot be read.
    pub fn load(&self) -> Option<AppState> {
        let path = self.path();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                error!(path = %path.display(), error = %e, "error reading wizard state");
                return None;
            }
        };
        match serde_json::from_str::<AppState>(&raw) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "stored wizard state is invalid, ignoring it");
                None
            }
        }
    }

    pub fn load_or_default(&self) -> AppState {
        self.load().unwrap_or_default()
    }

    pub fn clear(&self) -> bool {
        match fs::remove_file(self.path()) {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => {
                error!(path = %self.path().display(), error = %e, "error clearing wizard state");
                false
            }
        }
    }

    pub fn has_saved(&self) -> bool {
        self.path().is_file()
    }

    fn try_save(&self, state: &AppState) -> AuditFeeResult<()> {
        fs::create_dir_all(&self.dir)?;
        let json = serde_json::to_string(state)?;
        let tmp = self.dir.join(format!(".{}.json.tmp", self.key));
        fs::write(&tmp, json)?;
        fs::rename(&tmp, self.path())?;
        Ok(())
    }
}
