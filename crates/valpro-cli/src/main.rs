mod cmd;
mod output;
mod root;
mod workspace;

use clap::{Parser, Subcommand};
use cmd::{
    config::ConfigSubcommand, job::JobSubcommand, notify::NotifySubcommand,
    stats::StatsSubcommand, user::UserSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "valpro",
    about = "Vehicle valuation marketplace: commission, bid, report, sign and pay out",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .valpro/)
    #[arg(long, global = true, env = "VALPRO_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize valpro in the current directory
    Init {
        /// Do not seed the demo dataset
        #[arg(long)]
        empty: bool,
    },

    /// Log in as a user
    Login { user_id: String },

    /// End the current session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Commission and work valuation jobs
    Job {
        #[command(subcommand)]
        subcommand: JobSubcommand,
    },

    /// Browse users and review certifications
    User {
        #[command(subcommand)]
        subcommand: UserSubcommand,
    },

    /// Marketplace statistics
    Stats {
        #[command(subcommand)]
        subcommand: StatsSubcommand,
    },

    /// Notification routing and push registration
    Notify {
        #[command(subcommand)]
        subcommand: NotifySubcommand,
    },

    /// Inspect and validate the project configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init { empty } => cmd::init::run(&root, empty),
        Commands::Login { user_id } => cmd::session::login(&root, &user_id, cli.json),
        Commands::Logout => cmd::session::logout(&root, cli.json),
        Commands::Whoami => cmd::session::whoami(&root, cli.json),
        Commands::Job { subcommand } => cmd::job::run(&root, subcommand, cli.json),
        Commands::User { subcommand } => cmd::user::run(&root, subcommand, cli.json),
        Commands::Stats { subcommand } => cmd::stats::run(&root, subcommand, cli.json),
        Commands::Notify { subcommand } => cmd::notify::run(&root, subcommand, cli.json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
