//! Routing of tapped notifications to a destination.

use crate::store::Store;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    JobDetail(String),
    Login,
    NotFound(String),
}

/// Pull the job id out of a notification action payload:
/// `{"notification": {"extra": {"jobId": "..."}}}`.
pub fn job_id_from_payload(payload: &Value) -> Option<String> {
    payload
        .pointer("/notification/extra/jobId")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Decide where a notification about `job_id` should take the user.
pub async fn route(store: &Store, job_id: &str) -> Route {
    if store.current_user().await.is_none() {
        return Route::Login;
    }
    match store.job(job_id).await {
        Some(job) => Route::JobDetail(job.id),
        None => Route::NotFound(job_id.to_string()),
    }
}
