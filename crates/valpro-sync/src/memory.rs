//! In-process backend seeded from the demo dataset.

use crate::backend::{Backend, BackendResult};
use crate::error::BackendError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;
use valpro_core::{mock, CertificationStatus, Job, User};

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// The authoritative records a backend holds. Shared by the memory and
/// file backends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub push_tokens: Vec<String>,
}

impl Dataset {
    pub fn seeded() -> Self {
        Self {
            jobs: mock::jobs(),
            users: mock::users(),
            push_tokens: Vec::new(),
        }
    }

    pub fn create_job(&mut self, job: &Job) -> BackendResult<Job> {
        if self.jobs.iter().any(|j| j.id == job.id) {
            return Err(BackendError::Conflict(format!(
                "job {} already exists",
                job.id
            )));
        }
        self.jobs.push(job.clone());
        Ok(job.clone())
    }

    pub fn update_job(&mut self, job: &Job) -> BackendResult<Job> {
        let slot = self
            .jobs
            .iter_mut()
            .find(|j| j.id == job.id)
            .ok_or_else(|| BackendError::NotFound(format!("job {}", job.id)))?;
        if slot.client.id != job.client.id {
            return Err(BackendError::Conflict(format!(
                "client of job {} cannot change",
                job.id
            )));
        }
        *slot = job.clone();
        Ok(job.clone())
    }

    pub fn update_user(&mut self, user: &User) -> BackendResult<User> {
        let slot = self
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| BackendError::NotFound(format!("user {}", user.id)))?;
        user.check_update_of(slot)
            .map_err(|e| BackendError::Conflict(e.to_string()))?;
        *slot = user.clone();
        Ok(user.clone())
    }

    pub fn update_certification_status(
        &mut self,
        user_id: &str,
        cert_name: &str,
        status: CertificationStatus,
    ) -> BackendResult<()> {
        let user = self
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| BackendError::NotFound(format!("user {user_id}")))?;
        user.set_certification_status(cert_name, status)
            .map_err(|e| BackendError::Conflict(e.to_string()))
    }

    /// Returns false when the token was already registered.
    pub fn register_push_token(&mut self, token: &str) -> bool {
        if self.push_tokens.iter().any(|t| t == token) {
            return false;
        }
        self.push_tokens.push(token.to_string());
        true
    }
}

// ---------------------------------------------------------------------------
// MemoryBackend
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryBackend {
    data: Mutex<Dataset>,
    fail_next: AtomicUsize,
    offline: AtomicBool,
    writes: AtomicUsize,
    logouts: AtomicUsize,
}

impl MemoryBackend {
    pub fn new(data: Dataset) -> Self {
        Self {
            data: Mutex::new(data),
            ..Default::default()
        }
    }

    pub fn seeded() -> Self {
        Self::new(Dataset::seeded())
    }

    /// Make the next `n` write calls fail with `Unavailable`.
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    /// While offline every call, reads included, fails.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of write calls that reached the dataset.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn logouts(&self) -> usize {
        self.logouts.load(Ordering::SeqCst)
    }

    pub async fn dataset(&self) -> Dataset {
        self.data.lock().await.clone()
    }

    fn check_read(&self) -> BackendResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(BackendError::unavailable("memory backend is offline"));
        }
        Ok(())
    }

    fn check_write(&self) -> BackendResult<()> {
        self.check_read()?;
        let injected = self
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            return Err(BackendError::unavailable("injected failure"));
        }
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn jobs_get_all(&self) -> BackendResult<Vec<Job>> {
        self.check_read()?;
        Ok(self.data.lock().await.jobs.clone())
    }

    async fn jobs_create(&self, job: &Job) -> BackendResult<Job> {
        self.check_write()?;
        self.data.lock().await.create_job(job)
    }

    async fn jobs_update(&self, job: &Job) -> BackendResult<Job> {
        self.check_write()?;
        self.data.lock().await.update_job(job)
    }

    async fn users_get_all(&self) -> BackendResult<Vec<User>> {
        self.check_read()?;
        Ok(self.data.lock().await.users.clone())
    }

    async fn users_update(&self, user: &User) -> BackendResult<User> {
        self.check_write()?;
        self.data.lock().await.update_user(user)
    }

    async fn users_update_certification_status(
        &self,
        user_id: &str,
        cert_name: &str,
        status: CertificationStatus,
    ) -> BackendResult<()> {
        self.check_write()?;
        self.data
            .lock()
            .await
            .update_certification_status(user_id, cert_name, status)
    }

    async fn auth_logout(&self) -> BackendResult<()> {
        self.check_read()?;
        self.logouts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn notifications_register_push_token(&self, token: &str) -> BackendResult<()> {
        self.check_write()?;
        self.data.lock().await.register_push_token(token);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
