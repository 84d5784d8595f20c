//! Background trigger loop: runs the pipeline on a fixed interval.
//!
//! Runs are awaited one after another inside a single task, so two runs
//! never share the ledger file at the same time. Shutdown is only observed
//! between runs: a run in flight always finishes and saves its ledger.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::pipeline::runner::LeadPipeline;

/// Spawn a background task that runs the pipeline every `interval`.
///
/// The first run starts immediately. Returns a `JoinHandle` and a shutdown
/// sender; send `true` (or drop the sender) to stop after the current run.
pub fn spawn_trigger_loop(
    pipeline: Arc<LeadPipeline>,
    interval: Duration,
) -> (JoinHandle<()>, watch::Sender<bool>) {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        info!("Lead trigger started, polling every {:?}", interval);

        let mut tick = tokio::time::interval(interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = tick.tick() => {}
                _ = shutdown_rx.changed() => {
                    info!("Lead trigger shutting down");
                    return;
                }
            }

            if *shutdown_rx.borrow() {
                info!("Lead trigger shutting down");
                return;
            }

            match pipeline.run().await {
                Ok(report) => info!(
                    run_id = %report.run_id,
                    contacted = report.contacted(),
                    failed = report.failed(),
                    "Trigger tick complete"
                ),
                Err(e) => error!(error = %e, "Lead trigger run failed"),
            }
        }
    });

    (handle, shutdown_tx)
}
