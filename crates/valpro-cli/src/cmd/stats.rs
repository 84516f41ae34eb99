use crate::output::{money, print_json, print_table};
use crate::workspace::Workspace;
use clap::Subcommand;
use std::path::Path;
use valpro_core::stats;

#[derive(Subcommand)]
pub enum StatsSubcommand {
    /// Performance of a valuer (defaults to you)
    Valuer { id: Option<String> },

    /// Job counts by status
    Dashboard,
}

pub fn run(root: &Path, subcmd: StatsSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        StatsSubcommand::Valuer { id } => valuer(root, id, json),
        StatsSubcommand::Dashboard => dashboard(root, json),
    }
}

fn valuer(root: &Path, id: Option<String>, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::signed_in(root)?;
    let id = match id {
        Some(id) => id,
        None => ws.actor()?.id,
    };
    let snapshot = ws.block_on(ws.store.snapshot());
    let perf = stats::valuer_performance(&id, &snapshot.jobs);

    if json {
        return print_json(&perf);
    }
    println!("Valuer {id}");
    println!("  active jobs:     {}", perf.active_jobs);
    println!("  completed jobs:  {}", perf.completed_jobs);
    println!("  open bids:       {}", perf.open_bids);
    match perf.average_rating {
        Some(r) => println!("  average rating:  {r:.1} ({} reviews)", perf.reviews),
        None => println!("  average rating:  -"),
    }
    println!("  earnings:        KES {}", money(perf.total_earnings));
    Ok(())
}

fn dashboard(root: &Path, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::signed_in(root)?;
    let snapshot = ws.block_on(ws.store.snapshot());
    let counts = stats::status_counts(&snapshot.jobs);

    if json {
        let map: serde_json::Map<String, serde_json::Value> = counts
            .iter()
            .map(|(s, n)| (s.as_str().to_string(), serde_json::json!(n)))
            .collect();
        return print_json(&map);
    }
    let rows = counts
        .iter()
        .map(|(s, n)| vec![s.label().to_string(), n.to_string()])
        .collect();
    print_table(&["STATUS", "JOBS"], rows);
    Ok(())
}
