use crate::error::Result;
use crate::paths;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// The logged-in user of a local workspace, persisted between commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: String,
    pub logged_in_at: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            logged_in_at: Utc::now(),
        }
    }

    /// Returns `None` when nobody is logged in.
    pub fn load(root: &Path) -> Result<Option<Self>> {
        crate::io::read_yaml(&paths::session_path(root))
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        crate::io::write_yaml(&paths::session_path(root), self)
    }

    pub fn clear(root: &Path) -> Result<()> {
        let path = paths::session_path(root);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }
}
