//! CLI definitions and entry point.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use url::Url;

use crate::config::OrgConfig;
use crate::confirm::{AssumeYes, ConfirmationGate, TerminalGate};
use crate::error::AppError;
use crate::notify::ConsoleNotifier;
use crate::reset::ResetOrchestrator;
use crate::salesforce::apex::ApexResetClient;
use crate::salesforce::build_http_client;
use crate::state::ResetState;

/// training-reset - Reset a Salesforce training environment
#[derive(Parser, Debug)]
#[command(
    name = "training-reset",
    version,
    about = "Reset a Salesforce training environment to its canned snapshot state",
    long_about = "Deletes the record types trainees create, tier by tier, then\n\
                  repopulates the canonical training records from static-resource\n\
                  snapshots. Asks for confirmation before touching anything."
)]
pub struct Cli {
    /// Salesforce instance URL (e.g. https://na1.salesforce.com)
    #[arg(long)]
    pub instance_url: Url,

    /// OAuth access token; falls back to $SALESFORCE_ACCESS_TOKEN
    #[arg(long)]
    pub access_token: Option<String>,

    /// Seconds between delete-job status polls
    #[arg(long, default_value_t = 1)]
    pub poll_interval_secs: u64,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// Parses arguments, wires the orchestrator, and runs one reset.
pub async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AppError::Internal(format!("Failed to set up logging: {}", e)))?;

    let config = OrgConfig::resolve(cli.instance_url, cli.access_token)?;
    let http = Arc::new(build_http_client()?);
    let backend = Arc::new(ApexResetClient::new(
        http,
        config.instance_url.clone(),
        config.access_token.clone(),
    ));

    let state = Arc::new(ResetState::new());
    let orchestrator = ResetOrchestrator::new(backend, Arc::new(ConsoleNotifier), state)
        .with_poll_interval(Duration::from_secs(cli.poll_interval_secs.max(1)));

    let gate: Box<dyn ConfirmationGate> = if cli.yes {
        Box::new(AssumeYes)
    } else {
        Box::new(TerminalGate)
    };

    // Run-level failures have already reached the notification sink; the
    // process only errors on startup problems.
    orchestrator.run(gate.as_ref()).await;

    Ok(())
}
