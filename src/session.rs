//! Current-user session for Gator.
//!
//! The logged-in user is kept in a small JSON file between invocations and
//! handed to commands through the CLI context.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{GatorError, Result};

/// Persisted session state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Name of the logged-in user, if any.
    #[serde(default)]
    pub current_user_name: Option<String>,

    #[serde(skip)]
    path: PathBuf,
}

impl Session {
    /// Load the session stored at `path`. A missing file is an empty session.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut session = if path.exists() {
            let content = std::fs::read_to_string(path)?;
            if content.trim().is_empty() {
                Session::default()
            } else {
                serde_json::from_str(&content).map_err(|e| {
                    GatorError::Config(format!("invalid session file {}: {e}", path.display()))
                })?
            }
        } else {
            Session::default()
        };
        session.path = path.to_path_buf();
        Ok(session)
    }

    /// Path of the session file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the logged-in user.
    pub fn current_user(&self) -> Option<&str> {
        self.current_user_name.as_deref()
    }

    /// Log in as `name` and persist.
    pub fn set_user(&mut self, name: impl Into<String>) -> Result<()> {
        self.current_user_name = Some(name.into());
        self.save()
    }

    /// Log out and persist.
    pub fn clear(&mut self) -> Result<()> {
        self.current_user_name = None;
        self.save()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| GatorError::Config(format!("failed to encode session: {e}")))?;
        std::fs::write(&self.path, content)?;
        debug!("Session saved to {:?}", self.path);
        Ok(())
    }
}
