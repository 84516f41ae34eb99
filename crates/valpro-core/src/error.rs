use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValproError {
    #[error("not initialized: run 'valpro init'")]
    NotInitialized,

    #[error("job not found: {0}")]
    JobNotFound(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("certification '{name}' not found for user {user_id}")]
    CertificationNotFound { user_id: String, name: String },

    #[error("invalid transition: {event} not allowed in status '{status}': {reason}")]
    InvalidTransition {
        event: String,
        status: String,
        reason: String,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid id '{0}': must be alphanumeric with hyphens")]
    InvalidId(String),

    #[error("unknown value '{value}' for {kind}")]
    UnknownValue { kind: &'static str, value: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl ValproError {
    pub fn invalid(
        event: impl Into<String>,
        status: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        ValproError::InvalidTransition {
            event: event.into(),
            status: status.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, ValproError::InvalidTransition { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ValproError::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, ValproError>;
