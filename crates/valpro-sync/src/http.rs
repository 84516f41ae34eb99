//! JSON-over-HTTP backend.

use crate::backend::{Backend, BackendResult};
use crate::error::BackendError;
use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::debug;
use valpro_core::{CertificationStatus, Job, User};

pub struct HttpBackend {
    base: Url,
    client: reqwest::Client,
}

impl HttpBackend {
    /// `timeout_secs = 0` disables the request timeout.
    pub fn new(base_url: &str, timeout_secs: u64) -> BackendResult<Self> {
        let base = Url::parse(base_url)
            .map_err(|e| BackendError::Unavailable(format!("invalid base url '{base_url}': {e}")))?;
        if base.cannot_be_a_base() {
            return Err(BackendError::Unavailable(format!(
                "invalid base url '{base_url}'"
            )));
        }
        let mut builder = reqwest::Client::builder();
        if timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(timeout_secs));
        }
        let client = builder.build().map_err(BackendError::unavailable)?;
        Ok(Self { base, client })
    }

    /// Append percent-encoded path segments to the base URL.
    fn url(&self, segments: &[&str]) -> BackendResult<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::Unavailable(format!("invalid base url '{}'", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, req: RequestBuilder) -> BackendResult<Response> {
        let resp = req.send().await.map_err(BackendError::unavailable)?;
        let status = resp.status();
        debug!(url = %resp.url(), %status, "backend response");
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        let detail = if body.trim().is_empty() {
            status.to_string()
        } else {
            format!("{status}: {}", body.trim())
        };
        Err(match status {
            StatusCode::NOT_FOUND => BackendError::NotFound(detail),
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => {
                BackendError::Conflict(detail)
            }
            _ => BackendError::Unavailable(detail),
        })
    }

    async fn fetch<T: DeserializeOwned>(&self, req: RequestBuilder) -> BackendResult<T> {
        self.send(req)
            .await?
            .json::<T>()
            .await
            .map_err(|e| BackendError::Decode(e.to_string()))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn jobs_get_all(&self) -> BackendResult<Vec<Job>> {
        let url = self.url(&["jobs"])?;
        self.fetch(self.client.get(url)).await
    }

    async fn jobs_create(&self, job: &Job) -> BackendResult<Job> {
        let url = self.url(&["jobs"])?;
        self.fetch(self.client.post(url).json(job)).await
    }

    async fn jobs_update(&self, job: &Job) -> BackendResult<Job> {
        let url = self.url(&["jobs", &job.id])?;
        self.fetch(self.client.put(url).json(job)).await
    }

    async fn users_get_all(&self) -> BackendResult<Vec<User>> {
        let url = self.url(&["users"])?;
        self.fetch(self.client.get(url)).await
    }

    async fn users_update(&self, user: &User) -> BackendResult<User> {
        let url = self.url(&["users", &user.id])?;
        self.fetch(self.client.put(url).json(user)).await
    }

    async fn users_update_certification_status(
        &self,
        user_id: &str,
        cert_name: &str,
        status: CertificationStatus,
    ) -> BackendResult<()> {
        let url = self.url(&["users", user_id, "certifications", cert_name])?;
        let body = json!({ "status": status });
        self.send(self.client.put(url).json(&body)).await?;
        Ok(())
    }

    async fn auth_logout(&self) -> BackendResult<()> {
        let url = self.url(&["auth", "logout"])?;
        self.send(self.client.post(url)).await?;
        Ok(())
    }

    async fn notifications_register_push_token(&self, token: &str) -> BackendResult<()> {
        let url = self.url(&["notifications", "push-token"])?;
        let body = json!({ "token": token });
        self.send(self.client.post(url).json(&body)).await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
