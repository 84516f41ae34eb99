//! Job lifecycle state machine.
//!
//! Every change to a job's workflow goes through [`apply`]: it checks the
//! event against the job's current status and the acting user's role, and
//! returns a new [`Job`] with the status recomputed by [`derive_status`].
//! The input job is never modified; a rejected event leaves nothing behind.

use crate::error::{Result, ValproError};
use crate::job::{
    default_inspection_tasks, Bid, Document, Job, NewJob, PaymentInfo, PayoutInfo, Review,
    Signature, Signatures,
};
use crate::types::{InspectionPoint, JobStatus, SignerRole, UserType};
use crate::user::{Party, User};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    CapturePayment { open_bidding: bool },
    PlaceBid { amount: u64 },
    AcceptBid { valuer_id: String },
    AssignValuer { valuer: User },
    SubmitReport { report_url: String },
    RequestRevisions { note: Option<String> },
    /// `None` signs with the actor's stored signature image; an actor with
    /// no stored image must pass one.
    SignAsClient { signature_url: Option<String> },
    SignAsValuer { signature_url: Option<String> },
    SignAsAdmin { signature_url: Option<String> },
    IssuePayout { amount: u64, transaction_id: String },
    SubmitReview { rating: u8, comment: String },
    AddComment { text: String },
    CompleteInspectionTask { index: usize },
    /// Fields left as `None` keep what was recorded before.
    RecordInspectionPoint {
        point: InspectionPoint,
        notes: Option<String>,
        photo_url: Option<String>,
    },
    RecordDamageNotes { notes: String },
    AttachDocument { name: String, url: String },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::CapturePayment { .. } => "capture_payment",
            Event::PlaceBid { .. } => "place_bid",
            Event::AcceptBid { .. } => "accept_bid",
            Event::AssignValuer { .. } => "assign_valuer",
            Event::SubmitReport { .. } => "submit_report",
            Event::RequestRevisions { .. } => "request_revisions",
            Event::SignAsClient { .. } => "sign_as_client",
            Event::SignAsValuer { .. } => "sign_as_valuer",
            Event::SignAsAdmin { .. } => "sign_as_admin",
            Event::IssuePayout { .. } => "issue_payout",
            Event::SubmitReview { .. } => "submit_review",
            Event::AddComment { .. } => "add_comment",
            Event::CompleteInspectionTask { .. } => "complete_inspection_task",
            Event::RecordInspectionPoint { .. } => "record_inspection_point",
            Event::RecordDamageNotes { .. } => "record_damage_notes",
            Event::AttachDocument { .. } => "attach_document",
        }
    }
}

/// Who is acting, and when. The engine never reads the clock itself.
#[derive(Debug, Clone, Copy)]
pub struct EventContext<'a> {
    pub actor: &'a User,
    pub at: DateTime<Utc>,
}

impl<'a> EventContext<'a> {
    pub fn new(actor: &'a User, at: DateTime<Utc>) -> Self {
        Self { actor, at }
    }

    pub fn now(actor: &'a User) -> Self {
        Self::new(actor, Utc::now())
    }
}

// ---------------------------------------------------------------------------
// Status derivation
// ---------------------------------------------------------------------------

/// Compute the status implied by payment, assignment, report and signatures.
pub fn derive_status(job: &Job) -> JobStatus {
    if !job.is_paid() {
        return JobStatus::PendingPayment;
    }
    if job.valuer.is_none() {
        return if job.open_bidding {
            JobStatus::OpenForBids
        } else {
            JobStatus::New
        };
    }
    if job.report_url.is_none() {
        return JobStatus::InProgress;
    }
    if job.report_outdated {
        return JobStatus::RevisionsRequested;
    }
    let sigs = &job.signatures;
    match (sigs.client.is_some(), sigs.valuer.is_some(), sigs.admin.is_some()) {
        (_, _, true) => JobStatus::Completed,
        (true, true, false) => JobStatus::PendingFinalSignature,
        (true, false, false) => JobStatus::PendingValuerSignature,
        (false, true, false) => JobStatus::PendingClientSignature,
        (false, false, false) => JobStatus::ReportReady,
    }
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

/// Build a freshly commissioned job awaiting payment.
pub fn create_job(
    id: impl Into<String>,
    draft: NewJob,
    price: u64,
    ctx: &EventContext<'_>,
) -> Result<Job> {
    let id = id.into();
    crate::paths::validate_id(&id)?;
    if !ctx.actor.user_type.can_commission() {
        return Err(ValproError::invalid(
            "create_job",
            "unsubmitted",
            format!("a {} cannot commission a valuation", ctx.actor.user_type),
        ));
    }
    draft.vehicle.validate()?;
    if price == 0 {
        return Err(ValproError::Validation("job price must be positive".into()));
    }

    let mut job = Job {
        id,
        vehicle: draft.vehicle,
        client: Party::from(ctx.actor),
        valuer: None,
        status: JobStatus::PendingPayment,
        created_at: ctx.at,
        open_bidding: false,
        report_url: None,
        report_outdated: false,
        photos: draft.photos,
        videos: Vec::new(),
        documents: Vec::new(),
        signatures: Signatures::default(),
        bids: Vec::new(),
        notes: draft.notes.filter(|n| !n.trim().is_empty()),
        payment_info: Some(PaymentInfo {
            amount: price,
            paid: false,
            paid_at: None,
        }),
        payout_info: None,
        inspection_tasks: default_inspection_tasks(),
        interactive_inspection: BTreeMap::new(),
        damage_notes: None,
        ai_damage_report: None,
        comments: Vec::new(),
        next_comment_seq: 0,
        review: None,
    };
    job.status = derive_status(&job);
    Ok(job)
}

// ---------------------------------------------------------------------------
// Transitions
// ---------------------------------------------------------------------------

/// Apply one lifecycle event to `job`, returning the updated job.
///
/// Preconditions are checked against `job.status` as stored: the status the
/// caller last saw is the only status that matters.
pub fn apply(job: &Job, event: &Event, ctx: &EventContext<'_>) -> Result<Job> {
    let guard = Guard { job, event };
    let actor = ctx.actor;
    let mut next = job.clone();

    match event {
        Event::CapturePayment { open_bidding } => {
            guard.status(&[JobStatus::PendingPayment])?;
            guard.check(
                job.is_client(&actor.id) || actor.is_admin(),
                "only the client or an admin can capture payment",
            )?;
            let payment = next.payment_info.as_mut().ok_or_else(|| {
                ValproError::Validation(format!("job {} has no payment to capture", job.id))
            })?;
            guard.check(!payment.paid, "payment already captured")?;
            payment.paid = true;
            payment.paid_at = Some(ctx.at);
            next.open_bidding = *open_bidding;
        }

        Event::PlaceBid { amount } => {
            guard.status(&[JobStatus::OpenForBids])?;
            guard.check(
                actor.user_type == UserType::Valuer,
                format!("a {} cannot bid", actor.user_type),
            )?;
            guard.check(
                job.bid_from(&actor.id).is_none(),
                format!("{} has already bid on this job", actor.id),
            )?;
            positive(*amount, "bid amount")?;
            next.bids.push(Bid {
                valuer_id: actor.id.clone(),
                valuer_name: actor.name.clone(),
                amount: *amount,
                created_at: ctx.at,
            });
        }

        Event::AcceptBid { valuer_id } => {
            guard.status(&[JobStatus::OpenForBids])?;
            guard.check(
                job.is_client(&actor.id) || actor.is_admin(),
                "only the client or an admin can accept a bid",
            )?;
            let bid = job.bid_from(valuer_id).ok_or_else(|| {
                ValproError::invalid(
                    event.name(),
                    job.status,
                    format!("no bid from {valuer_id}"),
                )
            })?;
            next.valuer = Some(Party {
                id: bid.valuer_id.clone(),
                name: bid.valuer_name.clone(),
            });
        }

        Event::AssignValuer { valuer } => {
            guard.status(&[JobStatus::New])?;
            guard.check(actor.is_admin(), "only an admin can assign a valuer")?;
            guard.check(
                valuer.is_valuer(),
                format!("{} is a {}, not a valuer", valuer.id, valuer.user_type),
            )?;
            next.valuer = Some(Party::from(valuer));
        }

        Event::SubmitReport { report_url } => {
            guard.status(&[JobStatus::InProgress, JobStatus::RevisionsRequested])?;
            guard.check(
                job.is_assigned_valuer(&actor.id),
                "only the assigned valuer can submit the report",
            )?;
            required(report_url, "report url")?;
            next.report_url = Some(report_url.clone());
            next.report_outdated = false;
        }

        Event::RequestRevisions { note } => {
            guard.status(&[JobStatus::ReportReady])?;
            guard.check(
                job.is_client(&actor.id),
                "only the client can request revisions",
            )?;
            next.report_outdated = true;
            if let Some(text) = note.as_deref().filter(|t| !t.trim().is_empty()) {
                next.add_comment(actor, text, ctx.at);
            }
        }

        Event::SignAsClient { signature_url } => {
            guard.status(&[JobStatus::ReportReady, JobStatus::PendingClientSignature])?;
            guard.check(job.is_client(&actor.id), "only the client can sign as client")?;
            sign(&guard, &mut next, SignerRole::Client, signature_url, ctx)?;
        }

        Event::SignAsValuer { signature_url } => {
            guard.status(&[JobStatus::ReportReady, JobStatus::PendingValuerSignature])?;
            guard.check(
                job.is_assigned_valuer(&actor.id),
                "only the assigned valuer can sign as valuer",
            )?;
            sign(&guard, &mut next, SignerRole::Valuer, signature_url, ctx)?;
        }

        Event::SignAsAdmin { signature_url } => {
            guard.status(&[JobStatus::PendingFinalSignature])?;
            guard.check(
                job.signatures.client.is_some() && job.signatures.valuer.is_some(),
                "client and valuer must both sign first",
            )?;
            guard.check(actor.is_admin(), "only an admin can give the final signature")?;
            sign(&guard, &mut next, SignerRole::Admin, signature_url, ctx)?;
        }

        Event::IssuePayout {
            amount,
            transaction_id,
        } => {
            guard.status(&[JobStatus::Completed])?;
            guard.check(actor.is_admin(), "only an admin can issue a payout")?;
            guard.check(job.payout_info.is_none(), "payout already issued")?;
            positive(*amount, "payout amount")?;
            required(transaction_id, "transaction id")?;
            next.payout_info = Some(PayoutInfo {
                amount: *amount,
                paid: true,
                paid_at: ctx.at,
                transaction_id: transaction_id.clone(),
            });
        }

        Event::SubmitReview { rating, comment } => {
            guard.status(&[JobStatus::Completed])?;
            guard.check(job.is_client(&actor.id), "only the client can review")?;
            guard.check(job.review.is_none(), "job already reviewed")?;
            if !(1..=5).contains(rating) {
                return Err(ValproError::Validation(format!(
                    "rating must be between 1 and 5, got {rating}"
                )));
            }
            next.review = Some(Review {
                rating: *rating,
                comment: comment.trim().to_string(),
                client_name: actor.name.clone(),
                created_at: ctx.at,
            });
        }

        Event::AddComment { text } => {
            guard.check(
                job.is_client(&actor.id) || job.is_assigned_valuer(&actor.id) || actor.is_admin(),
                "only parties to the job can comment",
            )?;
            required(text, "comment text")?;
            next.add_comment(actor, text.trim(), ctx.at);
        }

        Event::CompleteInspectionTask { index } => {
            guard.status(&[JobStatus::InProgress, JobStatus::RevisionsRequested])?;
            guard.check(
                job.is_assigned_valuer(&actor.id),
                "only the assigned valuer can tick inspection tasks",
            )?;
            let task = next.inspection_tasks.get_mut(*index).ok_or_else(|| {
                ValproError::Validation(format!(
                    "inspection task {index} out of range (job has {})",
                    job.inspection_tasks.len()
                ))
            })?;
            task.completed = true;
        }

        Event::RecordInspectionPoint {
            point,
            notes,
            photo_url,
        } => {
            guard.status(&[JobStatus::InProgress, JobStatus::RevisionsRequested])?;
            guard.check(
                job.is_assigned_valuer(&actor.id),
                "only the assigned valuer can record inspection findings",
            )?;
            let notes = notes.as_deref().map(str::trim).filter(|n| !n.is_empty());
            let photo_url = photo_url.as_deref().map(str::trim).filter(|u| !u.is_empty());
            if notes.is_none() && photo_url.is_none() {
                return Err(ValproError::Validation(format!(
                    "nothing to record for {point}: give notes or a photo url"
                )));
            }
            let entry = next.interactive_inspection.entry(*point).or_default();
            if let Some(notes) = notes {
                entry.notes = Some(notes.to_string());
            }
            if let Some(url) = photo_url {
                entry.photo_url = Some(url.to_string());
            }
        }

        Event::RecordDamageNotes { notes } => {
            guard.status(&[JobStatus::InProgress, JobStatus::RevisionsRequested])?;
            guard.check(
                job.is_assigned_valuer(&actor.id),
                "only the assigned valuer can record damage notes",
            )?;
            required(notes, "damage notes")?;
            next.damage_notes = Some(notes.trim().to_string());
        }

        Event::AttachDocument { name, url } => {
            guard.check(
                job.status != JobStatus::Completed,
                "documents are closed once the job completes",
            )?;
            guard.check(
                job.is_client(&actor.id) || job.is_assigned_valuer(&actor.id),
                "only the client or the assigned valuer can attach documents",
            )?;
            required(name, "document name")?;
            required(url, "document url")?;
            next.documents.push(Document {
                name: name.trim().to_string(),
                url: url.clone(),
                uploaded_by: actor.name.clone(),
                uploaded_at: ctx.at,
            });
        }
    }

    next.status = derive_status(&next);
    check_invariants(job, &next)?;
    Ok(next)
}

/// Whether `event` would be accepted right now.
pub fn can_apply(job: &Job, event: &Event, ctx: &EventContext<'_>) -> bool {
    apply(job, event, ctx).is_ok()
}

/// Structural invariants that must hold between any job and its successor.
pub fn check_invariants(before: &Job, after: &Job) -> Result<()> {
    let violated = |what: &str| {
        Err(ValproError::Validation(format!(
            "invariant violated on {}: {what}",
            before.id
        )))
    };

    if after.status != derive_status(after) {
        return violated("status disagrees with job fields");
    }
    if after.id != before.id || after.client != before.client {
        return violated("job identity and client are immutable");
    }
    if after.vehicle != before.vehicle {
        return violated("vehicle is immutable");
    }
    if before.valuer.is_some() && after.valuer != before.valuer {
        return violated("assigned valuer cannot change");
    }
    for role in before.signatures.signed_roles() {
        if after.signatures.get(role) != before.signatures.get(role) {
            return violated("signatures are append-only");
        }
    }
    if before.is_paid() && after.payment_info != before.payment_info {
        return violated("captured payment is final");
    }
    if before.payout_info.is_some() && after.payout_info != before.payout_info {
        return violated("issued payout is final");
    }
    if !after.bids.starts_with(&before.bids) {
        return violated("bids are append-only");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Guard<'a> {
    job: &'a Job,
    event: &'a Event,
}

impl Guard<'_> {
    fn status(&self, allowed: &[JobStatus]) -> Result<()> {
        if allowed.contains(&self.job.status) {
            return Ok(());
        }
        let expected: Vec<&str> = allowed.iter().map(|s| s.as_str()).collect();
        Err(ValproError::invalid(
            self.event.name(),
            self.job.status,
            format!("requires status {}", expected.join(" or ")),
        ))
    }

    fn check(&self, ok: bool, reason: impl Into<String>) -> Result<()> {
        if ok {
            Ok(())
        } else {
            Err(ValproError::invalid(
                self.event.name(),
                self.job.status,
                reason,
            ))
        }
    }
}

fn sign(
    guard: &Guard<'_>,
    next: &mut Job,
    role: SignerRole,
    signature_url: &Option<String>,
    ctx: &EventContext<'_>,
) -> Result<()> {
    guard.check(
        guard.job.signatures.get(role).is_none(),
        format!("{role} has already signed"),
    )?;
    let url = signature_url
        .clone()
        .or_else(|| ctx.actor.signature_url.clone())
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ValproError::Validation("signature url is required".into()))?;
    *next.signatures.slot_mut(role) = Some(Signature {
        user_id: ctx.actor.id.clone(),
        user_name: ctx.actor.name.clone(),
        signature_url: url,
        signed_at: ctx.at,
    });
    Ok(())
}

fn positive(amount: u64, what: &str) -> Result<()> {
    if amount == 0 {
        return Err(ValproError::Validation(format!("{what} must be positive")));
    }
    Ok(())
}

fn required(value: &str, what: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ValproError::Validation(format!("{what} is required")));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
