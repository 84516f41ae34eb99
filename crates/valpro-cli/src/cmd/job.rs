use crate::output::{money, print_json, print_table};
use crate::workspace::Workspace;
use anyhow::{anyhow, Context};
use clap::Subcommand;
use std::path::Path;
use valpro_core::types::{CarType, InspectionPoint, JobStatus};
use valpro_core::vehicle::{Location, Vehicle};
use valpro_core::{Event, Job, NewJob, User, UserType};

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum JobSubcommand {
    /// List jobs visible to the logged-in user
    List {
        /// Filter by status (e.g. open_for_bids, in-progress)
        #[arg(long)]
        status: Option<String>,
        /// Only jobs you commissioned or are assigned to
        #[arg(long)]
        mine: bool,
    },

    /// Show full details for a job
    Show { id: String },

    /// Commission a new valuation
    Create {
        #[arg(long)]
        make: String,
        #[arg(long)]
        model: String,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        vin: String,
        /// Where the vehicle can be inspected
        #[arg(long)]
        address: String,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        lng: f64,
        /// Vehicle class: small or big (sets the fee)
        #[arg(long = "type", value_name = "TYPE")]
        car_type: Option<String>,
        #[arg(long, default_value = "")]
        image_url: String,
        #[arg(long)]
        notes: Option<String>,
        /// Photo URL; repeatable
        #[arg(long = "photo")]
        photos: Vec<String>,
    },

    /// Capture payment for a job
    Pay {
        id: String,
        /// Open the job to valuer bids
        #[arg(long, conflicts_with = "direct")]
        open_bidding: bool,
        /// Wait for an admin to assign a valuer
        #[arg(long)]
        direct: bool,
    },

    /// Bid on an open job (valuers)
    Bid { id: String, amount: u64 },

    /// Accept a valuer's bid
    Accept { id: String, valuer_id: String },

    /// Assign a valuer directly (admins)
    Assign { id: String, valuer_id: String },

    /// Submit the valuation report (assigned valuer)
    Report { id: String, url: String },

    /// Ask the valuer to revise the report
    Revise { id: String, note: Vec<String> },

    /// Sign the report in your role on the job
    Sign {
        id: String,
        /// Signature image; defaults to the one on your profile
        #[arg(long)]
        signature_url: Option<String>,
    },

    /// Pay the valuer out (admins)
    Payout {
        id: String,
        #[arg(long)]
        transaction_id: String,
        /// Defaults to the configured share of the client's payment
        #[arg(long)]
        amount: Option<u64>,
    },

    /// Review a completed job (client)
    Review {
        id: String,
        rating: u8,
        comment: Vec<String>,
    },

    /// Comment on a job
    Comment {
        id: String,
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Tick an inspection checklist item (numbered from 1)
    Task { id: String, number: usize },

    /// Record findings at a point on the vehicle (e.g. front-bumper, engine)
    Inspect {
        id: String,
        point: String,
        #[arg(long)]
        notes: Option<String>,
        #[arg(long)]
        photo_url: Option<String>,
    },

    /// Record overall damage notes (assigned valuer)
    Damage {
        id: String,
        #[arg(required = true)]
        notes: Vec<String>,
    },

    /// Attach a document to a job
    Attach { id: String, name: String, url: String },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: JobSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        JobSubcommand::List { status, mine } => list(root, status.as_deref(), mine, json),
        JobSubcommand::Show { id } => show(root, &id, json),
        JobSubcommand::Create {
            make,
            model,
            year,
            vin,
            address,
            lat,
            lng,
            car_type,
            image_url,
            notes,
            photos,
        } => {
            let car_type = car_type
                .as_deref()
                .map(str::parse::<CarType>)
                .transpose()?;
            let draft = NewJob {
                vehicle: Vehicle {
                    make,
                    model,
                    year,
                    vin: vin.to_uppercase(),
                    image_url,
                    car_type,
                    location: Location { lat, lng, address },
                },
                notes,
                photos,
            };
            create(root, draft, json)
        }
        JobSubcommand::Pay {
            id,
            open_bidding,
            direct,
        } => pay(root, &id, open_bidding, direct, json),
        JobSubcommand::Bid { id, amount } => apply(root, &id, Event::PlaceBid { amount }, json),
        JobSubcommand::Accept { id, valuer_id } => {
            apply(root, &id, Event::AcceptBid { valuer_id }, json)
        }
        JobSubcommand::Assign { id, valuer_id } => assign(root, &id, &valuer_id, json),
        JobSubcommand::Report { id, url } => {
            apply(root, &id, Event::SubmitReport { report_url: url }, json)
        }
        JobSubcommand::Revise { id, note } => {
            let note = Some(note.join(" ")).filter(|n| !n.trim().is_empty());
            apply(root, &id, Event::RequestRevisions { note }, json)
        }
        JobSubcommand::Sign { id, signature_url } => sign(root, &id, signature_url, json),
        JobSubcommand::Payout {
            id,
            transaction_id,
            amount,
        } => payout(root, &id, transaction_id, amount, json),
        JobSubcommand::Review {
            id,
            rating,
            comment,
        } => apply(
            root,
            &id,
            Event::SubmitReview {
                rating,
                comment: comment.join(" "),
            },
            json,
        ),
        JobSubcommand::Comment { id, text } => apply(
            root,
            &id,
            Event::AddComment {
                text: text.join(" "),
            },
            json,
        ),
        JobSubcommand::Task { id, number } => {
            let index = number
                .checked_sub(1)
                .ok_or_else(|| anyhow!("checklist items are numbered from 1"))?;
            apply(root, &id, Event::CompleteInspectionTask { index }, json)
        }
        JobSubcommand::Inspect {
            id,
            point,
            notes,
            photo_url,
        } => {
            let point: InspectionPoint = point.parse()?;
            apply(
                root,
                &id,
                Event::RecordInspectionPoint {
                    point,
                    notes,
                    photo_url,
                },
                json,
            )
        }
        JobSubcommand::Damage { id, notes } => apply(
            root,
            &id,
            Event::RecordDamageNotes {
                notes: notes.join(" "),
            },
            json,
        ),
        JobSubcommand::Attach { id, name, url } => {
            apply(root, &id, Event::AttachDocument { name, url }, json)
        }
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Clients see their own jobs, valuers see open jobs and their assignments,
/// admins see everything.
fn visible_to(job: &Job, user: &User) -> bool {
    match user.user_type {
        UserType::Admin => true,
        UserType::Client | UserType::Company => job.is_client(&user.id),
        UserType::Valuer => {
            job.is_assigned_valuer(&user.id) || job.status == JobStatus::OpenForBids
        }
    }
}

fn involves(job: &Job, user: &User) -> bool {
    job.is_client(&user.id) || job.is_assigned_valuer(&user.id)
}

fn list(root: &Path, status: Option<&str>, mine: bool, json: bool) -> anyhow::Result<()> {
    let status = status.map(str::parse::<JobStatus>).transpose()?;
    let ws = Workspace::signed_in(root)?;
    let user = ws.actor()?;
    let snapshot = ws.block_on(ws.store.snapshot());

    let jobs: Vec<&Job> = snapshot
        .jobs
        .iter()
        .filter(|j| visible_to(j, &user))
        .filter(|j| !mine || involves(j, &user))
        .filter(|j| status.map_or(true, |s| j.status == s))
        .collect();

    if json {
        return print_json(&jobs);
    }
    if jobs.is_empty() {
        println!("No jobs.");
        return Ok(());
    }
    let rows = jobs
        .iter()
        .map(|j| {
            vec![
                j.id.clone(),
                j.vehicle.title(),
                j.status.label().to_string(),
                j.client.name.clone(),
                j.valuer
                    .as_ref()
                    .map(|v| v.name.clone())
                    .unwrap_or_else(|| "-".into()),
                j.payment_info
                    .as_ref()
                    .map(|p| money(p.amount))
                    .unwrap_or_else(|| "-".into()),
            ]
        })
        .collect();
    print_table(&["ID", "VEHICLE", "STATUS", "CLIENT", "VALUER", "FEE"], rows);
    Ok(())
}

fn show(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::signed_in(root)?;
    let job = ws
        .block_on(ws.store.job(id))
        .ok_or_else(|| anyhow!("job '{id}' not found"))?;
    if json {
        return print_json(&job);
    }
    print_job(&job);
    Ok(())
}

fn print_job(job: &Job) {
    println!("{}  {}", job.id, job.vehicle.title());
    println!("status:    {}", job.status.label());
    println!("vin:       {}", job.vehicle.vin);
    println!("location:  {}", job.vehicle.location.address);
    println!("client:    {} ({})", job.client.name, job.client.id);
    if let Some(v) = &job.valuer {
        println!("valuer:    {} ({})", v.name, v.id);
    }
    if let Some(p) = &job.payment_info {
        let state = if p.paid { "paid" } else { "unpaid" };
        println!("fee:       KES {} ({state})", money(p.amount));
    }
    if let Some(url) = &job.report_url {
        let outdated = if job.report_outdated { " (outdated)" } else { "" };
        println!("report:    {url}{outdated}");
    }
    if let Some(notes) = &job.notes {
        println!("notes:     {notes}");
    }
    if !job.bids.is_empty() {
        println!("\nBids:");
        for b in &job.bids {
            println!("  {} ({}): KES {}", b.valuer_name, b.valuer_id, money(b.amount));
        }
    }
    if !job.inspection_tasks.is_empty() {
        println!("\nInspection ({}):", job.inspection_summary());
        for (i, t) in job.inspection_tasks.iter().enumerate() {
            let mark = if t.completed { "x" } else { " " };
            println!("  [{mark}] {}. {}", i + 1, t.text);
        }
    }
    for (point, data) in &job.interactive_inspection {
        let notes = data.notes.as_deref().unwrap_or("-");
        match &data.photo_url {
            Some(url) => println!("  {point}: {notes} [{url}]"),
            None => println!("  {point}: {notes}"),
        }
    }
    if let Some(notes) = &job.damage_notes {
        println!("damage:    {notes}");
    }
    if let Some(report) = &job.ai_damage_report {
        println!("analysis:  {report}");
    }
    let signed = job.signatures.signed_roles();
    if !signed.is_empty() {
        let roles: Vec<String> = signed.iter().map(|r| r.to_string()).collect();
        println!("\nSigned by: {}", roles.join(", "));
    }
    if let Some(p) = &job.payout_info {
        println!("payout:    KES {} ({})", money(p.amount), p.transaction_id);
    }
    if let Some(r) = &job.review {
        println!("review:    {}/5 {}", r.rating, r.comment);
    }
    if !job.documents.is_empty() {
        println!("\nDocuments:");
        for d in &job.documents {
            println!("  {}: {}", d.name, d.url);
        }
    }
    if !job.comments.is_empty() {
        println!("\nComments:");
        for c in &job.comments {
            println!("  [{}] {}: {}", c.id, c.user_name, c.text);
        }
    }
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

fn report(job: &Job, action: &str, json: bool) -> anyhow::Result<()> {
    if json {
        print_json(job)
    } else {
        println!("{}: {action} -> {}", job.id, job.status.label());
        Ok(())
    }
}

fn apply_in(ws: &Workspace, id: &str, event: Event, json: bool) -> anyhow::Result<()> {
    let action = event.name();
    let job = ws
        .block_on(ws.store.update_job(id, event))
        .with_context(|| format!("{action} failed for {id}"))?;
    report(&job, action, json)
}

fn apply(root: &Path, id: &str, event: Event, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::signed_in(root)?;
    apply_in(&ws, id, event, json)
}

fn create(root: &Path, draft: NewJob, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::signed_in(root)?;
    let job = ws
        .block_on(ws.store.create_job(draft))
        .context("create_job failed")?;
    report(&job, "created", json)
}

fn pay(root: &Path, id: &str, open_bidding: bool, direct: bool, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::signed_in(root)?;
    let open_bidding = if open_bidding || direct {
        open_bidding
    } else {
        ws.config.default_open_bidding
    };
    apply_in(&ws, id, Event::CapturePayment { open_bidding }, json)
}

fn assign(root: &Path, id: &str, valuer_id: &str, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::signed_in(root)?;
    let valuer = ws
        .block_on(ws.store.user(valuer_id))
        .ok_or_else(|| anyhow!("user '{valuer_id}' not found"))?;
    apply_in(&ws, id, Event::AssignValuer { valuer }, json)
}

/// Sign as client, valuer or admin depending on the actor's part in the job.
fn sign(root: &Path, id: &str, signature_url: Option<String>, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::signed_in(root)?;
    let actor = ws.actor()?;
    let job = ws
        .block_on(ws.store.job(id))
        .ok_or_else(|| anyhow!("job '{id}' not found"))?;
    let event = if job.is_client(&actor.id) {
        Event::SignAsClient { signature_url }
    } else if job.is_assigned_valuer(&actor.id) {
        Event::SignAsValuer { signature_url }
    } else if actor.is_admin() {
        Event::SignAsAdmin { signature_url }
    } else {
        anyhow::bail!("{} has no part in job {id}", actor.name);
    };
    apply_in(&ws, id, event, json)
}

fn payout(
    root: &Path,
    id: &str,
    transaction_id: String,
    amount: Option<u64>,
    json: bool,
) -> anyhow::Result<()> {
    let ws = Workspace::signed_in(root)?;
    let amount = match amount {
        Some(a) => a,
        None => {
            let job = ws
                .block_on(ws.store.job(id))
                .ok_or_else(|| anyhow!("job '{id}' not found"))?;
            let paid = job
                .payment_info
                .as_ref()
                .map(|p| p.amount)
                .ok_or_else(|| anyhow!("job {id} has no payment to pay out from"))?;
            ws.config.payout_for(paid)
        }
    };
    apply_in(
        &ws,
        id,
        Event::IssuePayout {
            amount,
            transaction_id,
        },
        json,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
