//! Lead pipeline: one run of fetch → filter → dispatch → record.
//!
//! **Core invariant: a lead id in the ledger is never dispatched again.**
//! The source's `Status` column is only a mirror for humans; the ledger is
//! the authority.
//!
//! Per lead, strictly in order:
//! 1. `Processing` written upstream (best-effort)
//! 2. One transport send
//! 3. `Contacted` + ledger insert, or `Failed` with the reason
//! 4. Fixed delay before the next lead
//!
//! The ledger is saved once after the loop, even when the loop stops early.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use tracing::{Instrument, debug, error, info, info_span};
use uuid::Uuid;

use crate::channels::{DispatchOutcome, Dispatcher};
use crate::config::{LedgerPersistence, PipelineConfig};
use crate::error::PipelineError;
use crate::leads::{Lead, LeadStatus, select_eligible};
use crate::ledger::{Ledger, LedgerStore};
use crate::pipeline::types::{LeadResult, RunReport};
use crate::source::SourceAdapter;

/// Composes source, dispatcher and ledger into single runs.
pub struct LeadPipeline {
    source: SourceAdapter,
    dispatcher: Dispatcher,
    ledger_store: Arc<dyn LedgerStore>,
    config: PipelineConfig,
}

impl LeadPipeline {
    pub fn new(
        source: SourceAdapter,
        dispatcher: Dispatcher,
        ledger_store: Arc<dyn LedgerStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            dispatcher,
            ledger_store,
            config,
        }
    }

    /// Run the pipeline once.
    ///
    /// Per-lead failures are recorded in the report, not returned. The only
    /// error is a ledger that cannot be saved. Everything the run logs sits
    /// under a `lead_run` span carrying its `run_id`.
    pub async fn run(&self) -> Result<RunReport, PipelineError> {
        let report = RunReport::new(Uuid::new_v4());
        let span = info_span!("lead_run", run_id = %report.run_id);
        self.run_once(report).instrument(span).await
    }

    async fn run_once(&self, mut report: RunReport) -> Result<RunReport, PipelineError> {
        info!("Lead trigger run started");

        let mut ledger = self.ledger_store.load().await;

        let leads = self.source.fetch_leads().await;
        report.fetched = leads.len();
        if leads.is_empty() {
            info!("No new leads found");
            return Ok(report);
        }

        let eligible = select_eligible(leads, &ledger);
        report.eligible = eligible.len();
        if eligible.is_empty() {
            info!(skipped = report.skipped(), "No eligible leads");
            return Ok(report);
        }

        info!(count = eligible.len(), "Found new lead(s)");

        let loop_result = self.dispatch_all(&eligible, &mut ledger, &mut report).await;
        let save_result = self.ledger_store.save(&ledger).await;

        match (loop_result, save_result) {
            (Err(e), save) => {
                if let Err(save_err) = save {
                    error!(error = %save_err, "Final ledger save failed");
                }
                Err(e)
            }
            (Ok(()), Err(e)) => Err(e.into()),
            (Ok(()), Ok(())) => {
                info!(
                    contacted = report.contacted(),
                    failed = report.failed(),
                    skipped = report.skipped(),
                    ledger_size = ledger.len(),
                    "Lead trigger run completed"
                );
                Ok(report)
            }
        }
    }

    /// Dispatch every eligible lead sequentially, spaced by the send delay.
    async fn dispatch_all(
        &self,
        eligible: &[Lead],
        ledger: &mut Ledger,
        report: &mut RunReport,
    ) -> Result<(), PipelineError> {
        for (i, lead) in eligible.iter().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.send_delay).await;
            }

            let result = self.process_lead(lead).await;
            if result == LeadResult::Contacted {
                ledger.insert(lead.id.clone());
                if self.config.persistence == LedgerPersistence::AfterEachSend {
                    self.ledger_store.save(ledger).await?;
                }
            }
            debug!(lead_id = %lead.id, result = result.label(), "Lead finished");
            report.record(lead.id.clone(), result);
        }
        Ok(())
    }

    /// Processing → send → Contacted | Failed, for a single lead.
    async fn process_lead(&self, lead: &Lead) -> LeadResult {
        info!(lead_id = %lead.id, name = %lead.name, "Processing lead");

        self.source
            .update_status(
                lead,
                LeadStatus::Processing,
                &format!("Sending message via {}...", self.dispatcher.channel()),
            )
            .await;

        match self.dispatcher.send(lead).await {
            DispatchOutcome::Sent => {
                let notes = format!(
                    "Sent at {}",
                    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
                );
                self.source
                    .update_status(lead, LeadStatus::Contacted, &notes)
                    .await;
                LeadResult::Contacted
            }
            DispatchOutcome::Failed { reason } => {
                self.source
                    .update_status(lead, LeadStatus::Failed, &format!("Error: {reason}"))
                    .await;
                LeadResult::Failed { reason }
            }
        }
    }
}
