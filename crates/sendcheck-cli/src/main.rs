//! SendCheck
//!
//! Compliance-gated bulk email sender.
//!
//! Extracts the visible text of an HTML template, checks it against a
//! regulatory rule set, writes a report, and only when the template passes
//! sends one personalized copy per recipient.

use clap::{Args, Parser, Subcommand};
use sendcheck_campaign::Language;
use sendcheck_policy::EvaluatorStrategy;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::error;

mod commands;
mod config;
mod security;

#[derive(Parser, Debug)]
#[command(name = "sendcheck")]
#[command(about = "Compliance-gated bulk email sender", long_about = None, version)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "sendcheck.yaml", global = true)]
    pub config: String,

    /// Operator access key
    #[arg(long, env = "SENDCHECK_ACCESS_KEY", hide_env_values = true, global = true)]
    pub access_key: Option<String>,

    /// Rule set file, overriding the configured one
    #[arg(long, global = true)]
    pub rules: Option<String>,

    /// Evaluation strategy (keyword or delegated)
    #[arg(long, value_parser = parse_strategy, global = true)]
    pub strategy: Option<EvaluatorStrategy>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check a template and print its compliance report
    Check(CheckArgs),

    /// Check a template and show the first personalized message without sending
    Preview(PreviewArgs),

    /// Check a template and send it to every recipient
    Send(SendArgs),

    /// List the active rule set
    Rules,
}

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// HTML template file
    #[arg(short, long)]
    pub template: PathBuf,

    /// Write the report here (.pdf, .json, otherwise text)
    #[arg(long)]
    pub report: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct CampaignArgs {
    /// HTML template file
    #[arg(short, long)]
    pub template: PathBuf,

    /// Recipient CSV with `email` and `first_name` columns
    #[arg(short, long)]
    pub recipients: PathBuf,

    /// Subject line
    #[arg(short, long)]
    pub subject: Option<String>,

    /// Send language (en, hi, es, fr, de, it, pt)
    #[arg(short, long)]
    pub language: Option<Language>,
}

#[derive(Args, Debug)]
pub struct PreviewArgs {
    #[command(flatten)]
    pub campaign: CampaignArgs,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub campaign: CampaignArgs,

    /// Write the report here (.pdf, .json, otherwise text)
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Confirm that messages should really be sent
    #[arg(long)]
    pub confirm: bool,

    /// Run the whole pipeline but record messages instead of sending
    #[arg(long)]
    pub dry_run: bool,

    /// Deliveries in flight
    #[arg(long)]
    pub concurrency: Option<usize>,
}

fn parse_strategy(s: &str) -> Result<EvaluatorStrategy, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "keyword" => Ok(EvaluatorStrategy::Keyword),
        "delegated" => Ok(EvaluatorStrategy::Delegated),
        other => Err(format!(
            "unknown strategy '{}', expected keyword or delegated",
            other
        )),
    }
}

/// How a run ended, mapped onto the process exit code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Command completed
    Ok,
    /// Template failed compliance
    Blocked,
    /// Access key missing or not on the allow-list
    AccessDenied,
}

impl Status {
    /// Process exit code
    pub fn code(self) -> u8 {
        match self {
            Status::Ok => 0,
            Status::Blocked => 2,
            Status::AccessDenied => 3,
        }
    }
}

impl From<Status> for ExitCode {
    fn from(status: Status) -> Self {
        ExitCode::from(status.code())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_json);

    match commands::run(&cli).await {
        Ok(status) => status.into(),
        Err(e) => {
            error!(error = %format!("{:#}", e), "Command failed");
            eprintln!("error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("sendcheck=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sendcheck=info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
