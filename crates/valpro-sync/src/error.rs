use thiserror::Error;
use valpro_core::ValproError;

/// Failure reported by a backend collaborator.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("not found on backend: {0}")]
    NotFound(String),

    #[error("rejected by backend: {0}")]
    Conflict(String),

    #[error("malformed backend response: {0}")]
    Decode(String),
}

impl BackendError {
    pub fn unavailable(e: impl std::fmt::Display) -> Self {
        BackendError::Unavailable(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    /// Rejected by the lifecycle engine or a model rule before any backend call.
    #[error(transparent)]
    Rejected(#[from] ValproError),

    #[error(transparent)]
    BackendUnavailable(#[from] BackendError),

    #[error("no user is logged in")]
    NotLoggedIn,

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("user not found: {0}")]
    UserNotFound(String),
}

impl SyncError {
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, SyncError::Rejected(e) if e.is_invalid_transition())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, SyncError::Rejected(e) if e.is_validation())
    }

    /// The mutation reached the backend and failed there; local state was
    /// reverted.
    pub fn is_backend(&self) -> bool {
        matches!(self, SyncError::BackendUnavailable(_))
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_core_rejections() {
        let err = SyncError::from(ValproError::invalid("place_bid", "new", "bidding is closed"));
        assert!(err.is_invalid_transition());
        assert!(!err.is_validation());
        assert!(err.to_string().contains("place_bid"));

        let err = SyncError::from(ValproError::Validation("amount must be positive".into()));
        assert!(err.is_validation());
    }

    #[test]
    fn backend_errors_are_non_fatal_kind() {
        let err = SyncError::from(BackendError::unavailable("connection refused"));
        assert!(err.is_backend());
        assert_eq!(
            err.to_string(),
            "backend unavailable: connection refused"
        );
    }
}
