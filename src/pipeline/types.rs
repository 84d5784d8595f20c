//! Run bookkeeping for the lead pipeline.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::leads::LeadId;

/// Terminal state of a lead that reached dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeadResult {
    /// Sent, marked `Contacted`, added to the ledger.
    Contacted,
    /// Transport failed, marked `Failed`, left out of the ledger.
    Failed { reason: String },
}

impl LeadResult {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Contacted => "contacted",
            Self::Failed { .. } => "failed",
        }
    }
}

/// One dispatched lead and how it ended.
#[derive(Debug, Clone)]
pub struct LeadOutcome {
    pub lead_id: LeadId,
    pub result: LeadResult,
}

/// Summary of one pipeline run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Candidate leads returned by the source.
    pub fetched: usize,
    /// Leads that passed validation and were not in the ledger.
    pub eligible: usize,
    /// Outcomes for dispatched leads, in dispatch order.
    pub outcomes: Vec<LeadOutcome>,
}

impl RunReport {
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            started_at: Utc::now(),
            fetched: 0,
            eligible: 0,
            outcomes: Vec::new(),
        }
    }

    /// Leads dropped by validation or the ledger.
    pub fn skipped(&self) -> usize {
        self.fetched.saturating_sub(self.eligible)
    }

    pub fn contacted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.result == LeadResult::Contacted)
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.contacted()
    }

    pub fn record(&mut self, lead_id: LeadId, result: LeadResult) {
        self.outcomes.push(LeadOutcome { lead_id, result });
    }
}
