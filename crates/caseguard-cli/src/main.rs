//! CaseGuard CLI
//!
//! Offline operator tool over the CaseGuard core.
//!
//! # Usage
//!
//! ```bash
//! caseguard authz check case update --roles roles.json --role investigator
//! caseguard authz permissions --roles roles.yaml --format json
//! caseguard email validate alice@acme.com
//! caseguard evidence check document --file report.pdf
//! caseguard ledger verify audit.json
//! caseguard ledger history audit.json case-42
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use caseguard_core::config::{CoreConfig, LoggingConfig};

mod commands;
mod config;
mod output;

#[derive(Parser)]
#[command(name = "caseguard")]
#[command(author = "CaseGuard")]
#[command(version = "0.1.0")]
#[command(about = "CaseGuard Command Line Interface", long_about = None)]
struct Cli {
    /// Output format (defaults to the configured format, then table)
    #[arg(long, short)]
    format: Option<output::OutputFormat>,

    /// Core configuration file (JSON)
    #[arg(long, env = "CASEGUARD_CONFIG")]
    config: Option<PathBuf>,

    /// Profile name from config file
    #[arg(long, short)]
    profile: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authorization checks against a role snapshot
    Authz {
        #[command(subcommand)]
        action: AuthzCommands,
    },
    /// Email validation
    Email {
        #[command(subcommand)]
        action: EmailCommands,
    },
    /// Password policy
    Password {
        #[command(subcommand)]
        action: PasswordCommands,
    },
    /// Evidence types and upload pre-checks
    Evidence {
        #[command(subcommand)]
        action: EvidenceCommands,
    },
    /// Audit ledger inspection
    Ledger {
        #[command(subcommand)]
        action: LedgerCommands,
    },
    /// Configure CLI
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum AuthzCommands {
    /// Decide whether the selected roles grant an action on a resource
    Check {
        resource: String,
        action: String,
        /// Role snapshot file (JSON or YAML)
        #[arg(long)]
        roles: Option<PathBuf>,
        /// Role names held by the actor; all roles when omitted
        #[arg(long = "role")]
        role_names: Vec<String>,
    },
    /// List the effective permissions of the selected roles
    Permissions {
        #[arg(long)]
        roles: Option<PathBuf>,
        #[arg(long = "role")]
        role_names: Vec<String>,
    },
    /// List roles in the snapshot
    Roles {
        #[arg(long)]
        roles: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum EmailCommands {
    /// Validate and normalize an address
    Validate { email: String },
}

#[derive(Subcommand)]
enum PasswordCommands {
    /// Check a password against the policy; reads stdin when omitted
    Check { password: Option<String> },
}

#[derive(Subcommand)]
enum EvidenceCommands {
    /// List evidence types and their upload limits
    Types,
    /// Pre-check a file for upload as the given evidence type
    Check {
        evidence_type: String,
        #[arg(long)]
        file: PathBuf,
        /// Size in bytes; read from the file when omitted
        #[arg(long)]
        size: Option<u64>,
    },
}

#[derive(Subcommand)]
enum LedgerCommands {
    /// Verify the hash chains of an exported ledger
    Verify {
        file: PathBuf,
        /// Verify a single aggregate, e.g. `case-42`
        #[arg(long)]
        aggregate: Option<String>,
    },
    /// Show the ordered history of an aggregate
    History { file: PathBuf, aggregate: String },
    /// Records primarily or secondarily about an aggregate
    Related { file: PathBuf, aggregate: String },
    /// Filter and re-export records
    Export {
        file: PathBuf,
        #[arg(long)]
        event: Option<String>,
        #[arg(long)]
        kind: Option<String>,
        #[arg(long)]
        actor: Option<u64>,
        #[arg(long)]
        csv: bool,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Set configuration value
    Set { key: String, value: String },
    /// Get configuration value
    Get { key: String },
    /// List all configuration
    List,
    /// Initialize configuration
    Init,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| logging.level.clone()),
    );
    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr)).init();
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = config::Config::load(cli.profile.as_deref()).unwrap_or_default();

    let core = match cli.config.clone().or_else(|| config.core_config.clone().map(PathBuf::from)) {
        Some(path) => CoreConfig::load(&path)
            .map_err(|e| anyhow::anyhow!("cannot load core config {}: {e}", path.display()))?,
        None => CoreConfig::default(),
    };
    init_tracing(&core.logging);

    let format = cli.format.unwrap_or_else(|| config.format());

    match cli.command {
        Commands::Authz { action } => commands::authz::handle(action, &config, format).await,
        Commands::Email { action } => commands::email::handle(action, &core, format),
        Commands::Password { action } => commands::password::handle(action, format),
        Commands::Evidence { action } => commands::evidence::handle(action, format).await,
        Commands::Ledger { action } => commands::ledger::handle(action, &core, format).await,
        Commands::Config { action } => commands::config::handle(action, cli.profile.as_deref()),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
