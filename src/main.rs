use std::process::ExitCode;
use std::sync::Arc;

use lead_trigger::channels::{Dispatcher, OpenClawSender};
use lead_trigger::config::TriggerConfig;
use lead_trigger::ledger::FileLedgerStore;
use lead_trigger::pipeline::{LeadPipeline, spawn_trigger_loop};
use lead_trigger::source::{GoogleSheetsStore, SourceAdapter};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> lead_trigger::Result<()> {
    let config = TriggerConfig::from_env()?;

    eprintln!("🔄 Lead Trigger v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Sheet: {} (tab: {})", config.sheets.sheet_id, config.sheets.tab);
    eprintln!(
        "   Transport: {} --channel {}",
        config.transport.binary, config.transport.channel
    );
    eprintln!("   Ledger: {}", config.ledger_path.display());
    eprintln!("   Send delay: {:?}", config.pipeline.send_delay);

    // ── Collaborators ───────────────────────────────────────────────────
    let store = GoogleSheetsStore::new(config.sheets.clone())?;
    let source = SourceAdapter::new(Arc::new(store));
    let dispatcher = Dispatcher::new(Arc::new(OpenClawSender::new(&config.transport)));
    let ledger_store = Arc::new(FileLedgerStore::new(&config.ledger_path));

    let pipeline = LeadPipeline::new(source, dispatcher, ledger_store, config.pipeline.clone());

    // ── One-shot (external scheduler) or polling ────────────────────────
    let Some(interval) = config.poll_interval else {
        let report = pipeline.run().await?;
        eprintln!(
            "\n✅ Lead trigger completed: {} contacted, {} failed, {} skipped",
            report.contacted(),
            report.failed(),
            report.skipped()
        );
        return Ok(());
    };

    eprintln!("   Polling: every {}s (Ctrl-C to stop)\n", interval.as_secs());
    let (handle, shutdown) = spawn_trigger_loop(Arc::new(pipeline), interval);

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "Failed to listen for Ctrl-C, stopping now");
    }
    let _ = shutdown.send(true);
    if let Err(e) = handle.await {
        tracing::error!(error = %e, "Lead trigger task panicked");
    }

    Ok(())
}
