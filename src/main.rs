use clap::Parser;
use miette::{IntoDiagnostic, Result};
use refund_engine::application::controller::RefundController;
use refund_engine::config::{GatewayConfig, GatewayMode};
use refund_engine::domain::money::Amount;
use refund_engine::domain::ports::{PaymentGatewayBox, RefundLedgerBox};
use refund_engine::domain::records::{CampaignId, Withdrawal, WithdrawalId, WithdrawalStatus};
use refund_engine::error::RefundError;
use refund_engine::infrastructure::in_memory::{InMemoryDonationDirectory, InMemoryLedger};
use refund_engine::infrastructure::notify::LogNotifier;
use refund_engine::infrastructure::razorpay::RazorpayGateway;
use refund_engine::infrastructure::simulated::SimulatedGateway;
use refund_engine::interfaces::csv::donation_reader::DonationReader;
use refund_engine::interfaces::csv::report_writer::ReportWriter;
use std::fs::File;
use std::io;
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input donations CSV file (columns: donation, donor, amount, payment_id)
    input: PathBuf,

    /// Campaign the donations belong to
    #[arg(long)]
    campaign: String,

    /// Rejected withdrawal being reversed
    #[arg(long)]
    withdrawal: String,

    /// Run against the live gateway (requires RAZORPAY_KEY_ID and
    /// RAZORPAY_KEY_SECRET). Defaults to simulated mode.
    #[arg(long)]
    live: bool,

    /// Re-attempt details that failed in a previous run
    #[arg(long)]
    retry_failed: bool,

    /// Path to persistent ledger database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,
}

fn build_ledger(db_path: Option<PathBuf>) -> Result<RefundLedgerBox> {
    #[cfg(feature = "storage-rocksdb")]
    if let Some(path) = db_path {
        let ledger = refund_engine::infrastructure::rocksdb::RocksDbLedger::open(path)
            .into_diagnostic()?;
        return Ok(Box::new(ledger));
    }
    #[cfg(not(feature = "storage-rocksdb"))]
    if db_path.is_some() {
        eprintln!(
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to In-Memory storage."
        );
    }
    Ok(Box::new(InMemoryLedger::new()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mode = if cli.live {
        GatewayMode::Live
    } else {
        GatewayMode::Simulated
    };
    let config = GatewayConfig::from_env(mode).into_diagnostic()?;
    let gateway: PaymentGatewayBox = match config.mode {
        GatewayMode::Live => Box::new(RazorpayGateway::new(config.clone()).into_diagnostic()?),
        GatewayMode::Simulated => Box::new(SimulatedGateway::new(config.clone())),
    };

    let ledger = build_ledger(cli.db_path)?;
    let directory = InMemoryDonationDirectory::new();

    let campaign_id = CampaignId::new(cli.campaign);
    let withdrawal_id = WithdrawalId::new(cli.withdrawal);

    // Seed the directory from the donations export.
    let file = File::open(cli.input).into_diagnostic()?;
    let reader = DonationReader::new(file);
    let mut total = rust_decimal::Decimal::ZERO;
    let mut count = 0usize;
    for row in reader.donations(campaign_id.clone()) {
        match row {
            Ok(donation) => {
                total += donation.amount.value();
                count += 1;
                directory.seed_donation(donation).await;
            }
            Err(e) => {
                warn!("Error reading donation: {e}");
            }
        }
    }
    if count == 0 {
        return Err(RefundError::Validation("no donations to refund".to_string()))
            .into_diagnostic();
    }

    directory
        .seed_withdrawal(Withdrawal {
            id: withdrawal_id.clone(),
            campaign_id: campaign_id.clone(),
            amount: Amount::new(total).into_diagnostic()?,
            status: WithdrawalStatus::Rejected,
            created_at: chrono::Utc::now(),
        })
        .await;

    let controller = RefundController::new(
        gateway,
        ledger,
        Box::new(directory),
        Box::new(LogNotifier::new()),
    )
    .with_call_timeout(config.call_timeout);

    // Reuse an existing batch when re-running against a persistent
    // ledger; otherwise create one for this withdrawal.
    let batch = match controller.find_by_withdrawal(&withdrawal_id).await.into_diagnostic()? {
        Some(existing) => existing,
        None => controller
            .create_batch_for_withdrawal(&withdrawal_id)
            .await
            .into_diagnostic()?,
    };
    let batch = controller
        .process(&batch.id, cli.retry_failed)
        .await
        .into_diagnostic()?;

    // Output final state
    let stdout = io::stdout();
    let mut writer = ReportWriter::new(stdout.lock());
    writer.write_batch(&batch).into_diagnostic()?;

    Ok(())
}
