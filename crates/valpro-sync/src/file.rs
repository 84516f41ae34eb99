//! Backend persisting YAML files under `.valpro/data/`.

use crate::backend::{Backend, BackendResult};
use crate::error::BackendError;
use crate::memory::Dataset;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;
use valpro_core::{io, paths, CertificationStatus, Job, User};

pub fn load_dataset(data_dir: &Path) -> valpro_core::Result<Dataset> {
    Ok(Dataset {
        jobs: io::read_yaml(&paths::jobs_path(data_dir))?.unwrap_or_default(),
        users: io::read_yaml(&paths::users_path(data_dir))?.unwrap_or_default(),
        push_tokens: io::read_yaml(&paths::push_tokens_path(data_dir))?.unwrap_or_default(),
    })
}

pub fn save_dataset(data_dir: &Path, data: &Dataset) -> valpro_core::Result<()> {
    io::write_yaml(&paths::jobs_path(data_dir), &data.jobs)?;
    io::write_yaml(&paths::users_path(data_dir), &data.users)?;
    io::write_yaml(&paths::push_tokens_path(data_dir), &data.push_tokens)
}

pub struct FileBackend {
    data_dir: PathBuf,
    // Serialises read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileBackend {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Write the demo dataset unless a jobs file already exists.
    /// Returns true if data was written.
    pub fn seed(data_dir: &Path) -> valpro_core::Result<bool> {
        if paths::jobs_path(data_dir).exists() {
            return Ok(false);
        }
        io::ensure_dir(data_dir)?;
        save_dataset(data_dir, &Dataset::seeded())?;
        Ok(true)
    }

    async fn read<T, F>(&self, f: F) -> BackendResult<T>
    where
        T: Send + 'static,
        F: FnOnce(Dataset) -> T + Send + 'static,
    {
        let dir = self.data_dir.clone();
        tokio::task::spawn_blocking(move || load_dataset(&dir).map(f))
            .await
            .map_err(BackendError::unavailable)?
            .map_err(BackendError::unavailable)
    }

    async fn modify<T, F>(&self, f: F) -> BackendResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Dataset) -> BackendResult<T> + Send + 'static,
    {
        let _guard = self.lock.lock().await;
        let dir = self.data_dir.clone();
        tokio::task::spawn_blocking(move || {
            let mut data = load_dataset(&dir).map_err(BackendError::unavailable)?;
            let out = f(&mut data)?;
            save_dataset(&dir, &data).map_err(BackendError::unavailable)?;
            debug!(dir = %dir.display(), "dataset saved");
            Ok(out)
        })
        .await
        .map_err(BackendError::unavailable)?
    }
}

#[async_trait]
impl Backend for FileBackend {
    async fn jobs_get_all(&self) -> BackendResult<Vec<Job>> {
        self.read(|d| d.jobs).await
    }

    async fn jobs_create(&self, job: &Job) -> BackendResult<Job> {
        let job = job.clone();
        self.modify(move |d| d.create_job(&job)).await
    }

    async fn jobs_update(&self, job: &Job) -> BackendResult<Job> {
        let job = job.clone();
        self.modify(move |d| d.update_job(&job)).await
    }

    async fn users_get_all(&self) -> BackendResult<Vec<User>> {
        self.read(|d| d.users).await
    }

    async fn users_update(&self, user: &User) -> BackendResult<User> {
        let user = user.clone();
        self.modify(move |d| d.update_user(&user)).await
    }

    async fn users_update_certification_status(
        &self,
        user_id: &str,
        cert_name: &str,
        status: CertificationStatus,
    ) -> BackendResult<()> {
        let (user_id, cert_name) = (user_id.to_string(), cert_name.to_string());
        self.modify(move |d| d.update_certification_status(&user_id, &cert_name, status))
            .await
    }

    async fn auth_logout(&self) -> BackendResult<()> {
        Ok(())
    }

    async fn notifications_register_push_token(&self, token: &str) -> BackendResult<()> {
        let token = token.to_string();
        self.modify(move |d| {
            d.register_push_token(&token);
            Ok(())
        })
        .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
