mod commands;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use outreach_llm::{LlmClient, LlmConfig};
use outreach_sms::{SmsClient, SmsConfig};
use outreach_storage::StorageBackend;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "outreach")]
#[command(about = "Lead outreach scheduler: AI-generated SMS sequences", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API with the background scheduler loop
    Serve {
        #[arg(short, long, default_value = "37780")]
        port: u16,
        #[arg(short = 'H', long, default_value = "127.0.0.1")]
        host: String,
    },
    /// Run one scheduler pass and print its report
    Tick,
    /// Run one pipeline maintenance sweep and print its report
    Maintain,
    /// Print outbound pipeline health
    Health,
    /// Inspect or remediate a single lead
    Lead {
        #[command(subcommand)]
        action: LeadCommand,
    },
}

#[derive(Subcommand)]
enum LeadCommand {
    /// Print a lead and its recent messages
    Show {
        id: String,
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },
    /// Unpause a lead and make it due now
    Resume { id: String },
}

pub(crate) fn get_db_path() -> PathBuf {
    dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")).join("outreach").join("outreach.db")
}

pub(crate) fn ensure_db_dir(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// PostgreSQL when `DATABASE_URL` is set, otherwise the local SQLite file.
pub(crate) async fn open_storage() -> Result<Arc<StorageBackend>> {
    #[cfg(feature = "postgres")]
    if let Some(url) = std::env::var("DATABASE_URL").ok().filter(|u| !u.trim().is_empty()) {
        let backend = StorageBackend::new_postgres(&url).await?;
        tracing::info!("Using PostgreSQL storage");
        return Ok(Arc::new(backend));
    }
    open_local().map(Arc::new)
}

#[cfg(feature = "sqlite")]
fn open_local() -> Result<StorageBackend> {
    let db_path = get_db_path();
    ensure_db_dir(&db_path)?;
    let backend = StorageBackend::new_sqlite(&db_path)?;
    tracing::debug!(path = %db_path.display(), "Using SQLite storage");
    Ok(backend)
}

#[cfg(not(feature = "sqlite"))]
fn open_local() -> Result<StorageBackend> {
    anyhow::bail!("DATABASE_URL must be set when built without the sqlite feature")
}

pub(crate) fn build_llm() -> Result<LlmClient> {
    let config = LlmConfig::from_env()
        .ok_or_else(|| anyhow::anyhow!("OUTREACH_LLM_API_KEY environment variable must be set"))?;
    Ok(LlmClient::new(config)?)
}

pub(crate) fn build_sms() -> Result<SmsClient> {
    let config = SmsConfig::from_env().ok_or_else(|| {
        anyhow::anyhow!(
            "OUTREACH_SMS_ACCOUNT_SID, OUTREACH_SMS_AUTH_TOKEN and OUTREACH_SMS_FROM must be set"
        )
    })?;
    Ok(SmsClient::new(config)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, host } => commands::serve::run(port, host).await,
        Commands::Tick => commands::pipeline::run_tick().await,
        Commands::Maintain => commands::pipeline::run_maintain().await,
        Commands::Health => commands::pipeline::run_health().await,
        Commands::Lead { action } => match action {
            LeadCommand::Show { id, limit } => commands::lead::run_show(&id, limit).await,
            LeadCommand::Resume { id } => commands::lead::run_resume(&id).await,
        },
    }
}
