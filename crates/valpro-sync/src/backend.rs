//! The remote collaborator that owns the authoritative copy of jobs and users.

use crate::error::BackendError;
use crate::file::FileBackend;
use crate::http::HttpBackend;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use valpro_core::config::{BackendConfig, Config};
use valpro_core::{CertificationStatus, Job, User};

pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Data service the store writes through to.
///
/// Implementations do not re-check lifecycle rules; the store only sends
/// jobs the engine has already accepted.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn jobs_get_all(&self) -> BackendResult<Vec<Job>>;

    async fn jobs_create(&self, job: &Job) -> BackendResult<Job>;

    async fn jobs_update(&self, job: &Job) -> BackendResult<Job>;

    async fn users_get_all(&self) -> BackendResult<Vec<User>>;

    async fn users_update(&self, user: &User) -> BackendResult<User>;

    async fn users_update_certification_status(
        &self,
        user_id: &str,
        cert_name: &str,
        status: CertificationStatus,
    ) -> BackendResult<()>;

    async fn auth_logout(&self) -> BackendResult<()>;

    async fn notifications_register_push_token(&self, token: &str) -> BackendResult<()>;
}

/// Build the backend selected in the project configuration.
pub fn from_config(config: &Config, root: &Path) -> BackendResult<Arc<dyn Backend>> {
    match &config.backend {
        BackendConfig::Http {
            base_url,
            timeout_secs,
        } => Ok(Arc::new(HttpBackend::new(base_url, *timeout_secs)?)),
        file @ BackendConfig::File { .. } => {
            let dir = file
                .resolved_data_dir(root)
                .unwrap_or_else(|| valpro_core::paths::data_dir(root));
            Ok(Arc::new(FileBackend::new(dir)))
        }
    }
}
