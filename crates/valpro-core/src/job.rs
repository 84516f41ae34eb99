use crate::types::{InspectionPoint, JobStatus, SignerRole};
use crate::user::{Party, User};
use crate::vehicle::Vehicle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Supporting records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bid {
    pub valuer_id: String,
    pub valuer_name: String,
    pub amount: u64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub user_id: String,
    pub user_name: String,
    pub signature_url: String,
    pub signed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Signatures {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<Signature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valuer: Option<Signature>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin: Option<Signature>,
}

impl Signatures {
    pub fn get(&self, role: SignerRole) -> Option<&Signature> {
        match role {
            SignerRole::Client => self.client.as_ref(),
            SignerRole::Valuer => self.valuer.as_ref(),
            SignerRole::Admin => self.admin.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, role: SignerRole) -> &mut Option<Signature> {
        match role {
            SignerRole::Client => &mut self.client,
            SignerRole::Valuer => &mut self.valuer,
            SignerRole::Admin => &mut self.admin,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.client.is_none() && self.valuer.is_none() && self.admin.is_none()
    }

    /// Roles that have signed, in signing order.
    pub fn signed_roles(&self) -> Vec<SignerRole> {
        [SignerRole::Client, SignerRole::Valuer, SignerRole::Admin]
            .into_iter()
            .filter(|r| self.get(*r).is_some())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentInfo {
    pub amount: u64,
    pub paid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoutInfo {
    pub amount: u64,
    pub paid: bool,
    pub paid_at: DateTime<Utc>,
    pub transaction_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// 1 to 5 stars.
    pub rating: u8,
    pub comment: String,
    pub client_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionTask {
    pub text: String,
    pub completed: bool,
}

/// What the valuer recorded against one point of the vehicle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InspectionPointData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    /// Produced by an external analysis service; carried through unchanged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub url: String,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    #[serde(default)]
    pub user_avatar_url: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

pub const DEFAULT_INSPECTION_TASKS: &[&str] = &[
    "Verify VIN matches registration documents",
    "Photograph all four sides of the vehicle",
    "Inspect bodywork for dents, scratches and rust",
    "Check tyre tread depth and condition",
    "Record odometer reading",
    "Inspect engine bay for leaks",
    "Test lights, indicators and electrics",
    "Inspect interior and upholstery",
    "Road test and note any mechanical issues",
];

pub fn default_inspection_tasks() -> Vec<InspectionTask> {
    DEFAULT_INSPECTION_TASKS
        .iter()
        .map(|t| InspectionTask {
            text: (*t).to_string(),
            completed: false,
        })
        .collect()
}

/// `job-` followed by eight hex digits.
pub fn new_job_id() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("job-{}", &hex[..8])
}

// ---------------------------------------------------------------------------
// NewJob
// ---------------------------------------------------------------------------

/// What a client submits to commission a valuation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJob {
    pub vehicle: Vehicle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photos: Vec<String>,
}

// ---------------------------------------------------------------------------
// Job
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub vehicle: Vehicle,
    pub client: Party,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valuer: Option<Party>,
    /// Cached projection of the other fields; see `lifecycle::derive_status`.
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub open_bidding: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_url: Option<String>,
    #[serde(default)]
    pub report_outdated: bool,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub videos: Vec<String>,
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub signatures: Signatures,
    #[serde(default)]
    pub bids: Vec<Bid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_info: Option<PaymentInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payout_info: Option<PayoutInfo>,
    #[serde(default)]
    pub inspection_tasks: Vec<InspectionTask>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub interactive_inspection: BTreeMap<InspectionPoint, InspectionPointData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damage_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_damage_report: Option<String>,
    #[serde(default)]
    pub comments: Vec<Comment>,
    #[serde(default)]
    pub next_comment_seq: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review: Option<Review>,
}

impl Job {
    pub fn is_paid(&self) -> bool {
        self.payment_info.as_ref().is_some_and(|p| p.paid)
    }

    pub fn is_client(&self, user_id: &str) -> bool {
        self.client.id == user_id
    }

    pub fn is_assigned_valuer(&self, user_id: &str) -> bool {
        self.valuer.as_ref().is_some_and(|v| v.id == user_id)
    }

    pub fn bid_from(&self, valuer_id: &str) -> Option<&Bid> {
        self.bids.iter().find(|b| b.valuer_id == valuer_id)
    }

    /// Append a comment and return its id. Ids come from a monotonic counter
    /// so they stay unique across edits.
    pub fn add_comment(
        &mut self,
        author: &User,
        text: impl Into<String>,
        at: DateTime<Utc>,
    ) -> String {
        self.next_comment_seq += 1;
        let id = format!("C{}", self.next_comment_seq);
        self.comments.push(Comment {
            id: id.clone(),
            user_id: author.id.clone(),
            user_name: author.name.clone(),
            user_avatar_url: author.avatar_url.clone(),
            text: text.into(),
            created_at: at,
        });
        id
    }

    /// "3/9 inspection tasks complete"
    pub fn inspection_summary(&self) -> String {
        let done = self.inspection_tasks.iter().filter(|t| t.completed).count();
        format!(
            "{done}/{} inspection tasks complete",
            self.inspection_tasks.len()
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
