use crate::job::Job;
use crate::types::JobStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Track record of one valuer, computed from the jobs they took on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuerPerformance {
    pub valuer_id: String,
    pub active_jobs: usize,
    pub completed_jobs: usize,
    pub open_bids: usize,
    pub reviews: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_rating: Option<f64>,
    pub total_earnings: u64,
}

pub fn valuer_performance(valuer_id: &str, jobs: &[Job]) -> ValuerPerformance {
    let assigned: Vec<&Job> = jobs
        .iter()
        .filter(|j| j.is_assigned_valuer(valuer_id))
        .collect();

    let completed_jobs = assigned
        .iter()
        .filter(|j| j.status == JobStatus::Completed)
        .count();
    let ratings: Vec<u8> = assigned
        .iter()
        .filter_map(|j| j.review.as_ref().map(|r| r.rating))
        .collect();
    let average_rating = if ratings.is_empty() {
        None
    } else {
        let sum: u32 = ratings.iter().map(|&r| u32::from(r)).sum();
        Some(f64::from(sum) / ratings.len() as f64)
    };
    let total_earnings = assigned
        .iter()
        .filter_map(|j| j.payout_info.as_ref())
        .filter(|p| p.paid)
        .map(|p| p.amount)
        .sum();
    let open_bids = jobs
        .iter()
        .filter(|j| j.status == JobStatus::OpenForBids && j.bid_from(valuer_id).is_some())
        .count();

    ValuerPerformance {
        valuer_id: valuer_id.to_string(),
        active_jobs: assigned.len() - completed_jobs,
        completed_jobs,
        open_bids,
        reviews: ratings.len(),
        average_rating,
        total_earnings,
    }
}

/// Number of jobs in each status, in lifecycle order, omitting empty ones.
pub fn status_counts<'a>(jobs: impl IntoIterator<Item = &'a Job>) -> Vec<(JobStatus, usize)> {
    let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
    for job in jobs {
        let idx = JobStatus::all()
            .iter()
            .position(|s| *s == job.status)
            .unwrap_or(0);
        *counts.entry(idx).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(idx, n)| (JobStatus::all()[idx], n))
        .collect()
}
