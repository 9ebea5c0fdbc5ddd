use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use tracing::info;

use gdpr_rs::export::ExportFormat;
use gdpr_rs::logging::init_logging;
use gdpr_rs::notify::LogNotifier;
use gdpr_rs::store::JsonFileStore;
use gdpr_rs::{ComplianceConfig, ComplianceEngine};

#[derive(Debug, Parser)]
#[command(name = "gdpr-rs", version, about = "GDPR/CCPA compliance data lifecycle manager")]
struct Cli {
    /// Path to the JSON store file
    #[arg(long, env = "GDPR_STORE", default_value = "gdpr-store.json")]
    store: PathBuf,

    /// Path to an explicit config file
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Export all data for a specific user (GDPR Article 20)
    ExportUserData {
        /// User email address
        email: String,
        /// Export format (json or csv)
        #[arg(long, default_value = "json")]
        format: String,
    },
    /// Clean up expired consent records and old data subject requests
    CleanupExpiredData {
        /// Show what would be deleted without actually deleting
        #[arg(long)]
        dry_run: bool,
        /// Number of days to retain data (default: 365)
        #[arg(long)]
        days: Option<i64>,
    },
    /// Generate privacy compliance report
    GeneratePrivacyReport {
        /// Report period in days (default: 30)
        #[arg(long, default_value_t = 30)]
        days: i64,
        /// Output format (json or text)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Notify users about expiring consent
    NotifyConsentExpiry {
        /// Notify X days before expiry (default: 30)
        #[arg(long)]
        days_ahead: Option<i64>,
    },
    /// Run the retention scheduler loops until interrupted
    Run,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ComplianceConfig::load(cli.config.as_deref())?;
    let _guard = init_logging(&config.log)?;

    let store = Arc::new(JsonFileStore::open(&cli.store)?);
    let engine = ComplianceEngine::new(config, store, Arc::new(LogNotifier::new()));

    match cli.command {
        Command::ExportUserData { email, format } => {
            let format: ExportFormat = format.parse()?;
            println!("{}", engine.export_user_data(&email, format).await?);
        }
        Command::CleanupExpiredData { dry_run, days } => {
            let outcome = engine.scheduler().run_daily_cleanup(dry_run, days).await?;
            if outcome.dry_run {
                println!(
                    "DRY RUN: Would delete {} expired consent records",
                    outcome.expired_consents
                );
                println!(
                    "DRY RUN: Would delete {} old data subject requests",
                    outcome.purged_requests
                );
            } else {
                println!(
                    "Successfully deleted {} expired consent records",
                    outcome.expired_consents
                );
                println!(
                    "Successfully deleted {} old data subject requests",
                    outcome.purged_requests
                );
            }
        }
        Command::GeneratePrivacyReport { days, format } => {
            let end = Utc::now();
            let start = end - Duration::days(days);
            let report = engine.reporter().generate_report(start, end).await?;
            match format.as_str() {
                "json" => println!("{}", report.to_json()?),
                "text" => print!("{}", report.render_text()),
                other => anyhow::bail!("unknown report format: {} (expected json or text)", other),
            }
        }
        Command::NotifyConsentExpiry { days_ahead } => {
            let outcome = engine
                .scheduler()
                .notify_expiring_consents(days_ahead)
                .await?;
            for email in &outcome.notified {
                println!("Notified {}", email);
            }
            for (identity, error) in &outcome.failed {
                println!("Failed to notify {}: {}", identity, error);
            }
        }
        Command::Run => {
            let handles = engine.start_scheduler();
            info!("retention scheduler running; press Ctrl-C to stop");
            tokio::signal::ctrl_c().await?;
            for handle in handles {
                handle.abort();
            }
        }
    }

    Ok(())
}
