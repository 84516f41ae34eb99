use crate::output::print_json;
use crate::workspace::Workspace;
use anyhow::{anyhow, Context};
use clap::Subcommand;
use std::path::Path;
use valpro_sync::notify::{self, Route};

#[derive(Subcommand)]
pub enum NotifySubcommand {
    /// Resolve where a tapped notification leads
    Open {
        /// Job id carried by the notification
        job_id: Option<String>,
        /// Raw notification action payload (JSON)
        #[arg(long, conflicts_with = "job_id")]
        payload: Option<String>,
    },

    /// Register this device's push token
    Register { token: String },
}

pub fn run(root: &Path, subcmd: NotifySubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        NotifySubcommand::Open { job_id, payload } => open(root, job_id, payload, json),
        NotifySubcommand::Register { token } => register(root, &token, json),
    }
}

fn open(
    root: &Path,
    job_id: Option<String>,
    payload: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let job_id = match (job_id, payload) {
        (Some(id), _) => id,
        (None, Some(raw)) => {
            let value: serde_json::Value =
                serde_json::from_str(&raw).context("payload is not valid JSON")?;
            notify::job_id_from_payload(&value)
                .ok_or_else(|| anyhow!("payload carries no notification.extra.jobId"))?
        }
        (None, None) => anyhow::bail!("give a job id or --payload"),
    };

    let ws = Workspace::open(root)?;
    if let Some(session) = valpro_core::session::Session::load(root)? {
        // A stale session routes to login rather than failing.
        if let Err(e) = ws.block_on(ws.store.login_as(&session.user_id)) {
            tracing::warn!(error = %e, "could not resume session");
        }
    }
    let route = ws.block_on(notify::route(&ws.store, &job_id));

    if json {
        let value = match &route {
            Route::JobDetail(id) => serde_json::json!({ "route": "job_detail", "job_id": id }),
            Route::Login => serde_json::json!({ "route": "login", "job_id": job_id }),
            Route::NotFound(id) => serde_json::json!({ "route": "not_found", "job_id": id }),
        };
        return print_json(&value);
    }
    match route {
        Route::JobDetail(id) => println!("job detail: {id}"),
        Route::Login => println!("login required (then open {job_id})"),
        Route::NotFound(id) => println!("job {id} not found"),
    }
    Ok(())
}

fn register(root: &Path, token: &str, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::signed_in(root)?;
    let registered = ws
        .block_on(ws.store.register_push_token(token))
        .context("failed to register push token")?;
    if json {
        print_json(&serde_json::json!({ "registered": registered }))?;
    } else if registered {
        println!("Push token registered.");
    } else {
        println!("Not logged in; push token not registered.");
    }
    Ok(())
}
