use crate::error::{Result, ValproError};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const VALPRO_DIR: &str = ".valpro";
pub const DATA_DIR: &str = ".valpro/data";

pub const CONFIG_FILE: &str = ".valpro/config.yaml";
pub const SESSION_FILE: &str = ".valpro/session.yaml";

pub const JOBS_FILE: &str = "jobs.yaml";
pub const USERS_FILE: &str = "users.yaml";
pub const PUSH_TOKENS_FILE: &str = "push_tokens.yaml";

pub fn valpro_dir(root: &Path) -> PathBuf {
    root.join(VALPRO_DIR)
}

pub fn data_dir(root: &Path) -> PathBuf {
    root.join(DATA_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn session_path(root: &Path) -> PathBuf {
    root.join(SESSION_FILE)
}

pub fn jobs_path(data_dir: &Path) -> PathBuf {
    data_dir.join(JOBS_FILE)
}

pub fn users_path(data_dir: &Path) -> PathBuf {
    data_dir.join(USERS_FILE)
}

pub fn push_tokens_path(data_dir: &Path) -> PathBuf {
    data_dir.join(PUSH_TOKENS_FILE)
}

// ---------------------------------------------------------------------------
// Id validation
// ---------------------------------------------------------------------------

static ID_RE: OnceLock<Regex> = OnceLock::new();

fn id_re() -> &'static Regex {
    ID_RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9\-]*[A-Za-z0-9]$|^[A-Za-z0-9]$").unwrap())
}

/// Job and user ids end up in file names and URL paths.
pub fn validate_id(id: &str) -> Result<()> {
    if id.is_empty() || id.len() > 64 || !id_re().is_match(id) {
        return Err(ValproError::InvalidId(id.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_ids() {
        for id in ["job-ABCDE", "user-1", "a", "job-12345"] {
            validate_id(id).unwrap_or_else(|_| panic!("expected valid: {id}"));
        }
    }

    #[test]
    fn invalid_ids() {
        for id in ["", "-job", "job-", "has space", "job/1", "a_b"] {
            assert!(validate_id(id).is_err(), "expected invalid: {id}");
        }
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/proj/.valpro/config.yaml")
        );
        assert_eq!(
            jobs_path(&data_dir(root)),
            PathBuf::from("/tmp/proj/.valpro/data/jobs.yaml")
        );
    }
}
