//! Tabular lead source: the rows we poll and the statuses we write back.
//!
//! `RowStore` is the raw I/O boundary (Google Sheets in production, fakes in
//! tests). `SourceAdapter` sits on top of it and owns the policy:
//! - fetch errors become "no leads this run"
//! - only rows with an empty or `New` status are candidates
//! - write-back is best-effort and never fails the caller

pub mod sheets;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use tracing::{debug, error, info, warn};

use crate::error::SourceError;
use crate::leads::model::columns;
use crate::leads::{Lead, LeadStatus, Row, RowRef};

pub use sheets::GoogleSheetsStore;

/// Raw row storage: pure I/O, no business logic.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Store name for logging (e.g. "google_sheets").
    fn name(&self) -> &str;

    /// Fetch every data row, in source order.
    async fn fetch_rows(&self) -> Result<Vec<Row>, SourceError>;

    /// Overwrite the given `(column, value)` cells on one row.
    async fn update_row(&self, row: RowRef, fields: &[(&str, String)]) -> Result<(), SourceError>;
}

/// Normalizes rows into leads and mirrors lead status back to the source.
pub struct SourceAdapter {
    store: Arc<dyn RowStore>,
}

impl SourceAdapter {
    pub fn new(store: Arc<dyn RowStore>) -> Self {
        Self { store }
    }

    /// Fetch candidate leads (status empty or `New`), in source order.
    ///
    /// Any fetch failure is logged and reported as zero leads.
    pub async fn fetch_leads(&self) -> Vec<Lead> {
        let rows = match self.store.fetch_rows().await {
            Ok(rows) => rows,
            Err(e) => {
                error!(source = self.store.name(), error = %e, "Failed to fetch rows");
                return Vec::new();
            }
        };

        let total = rows.len();
        let leads: Vec<Lead> = rows
            .iter()
            .filter_map(|row| {
                let lead = Lead::from_row(row);
                if lead.is_none() {
                    debug!(row = row.row_number, "Unrecognised status, skipping row");
                }
                lead
            })
            .filter(|lead| lead.status == LeadStatus::New)
            .collect();

        info!(
            source = self.store.name(),
            rows = total,
            candidates = leads.len(),
            "Fetched leads"
        );

        let positional = leads.iter().filter(|l| l.id.is_positional()).count();
        if positional > 0 {
            warn!(
                count = positional,
                "Leads without an ID column value are keyed by row number; \
                 inserting or deleting rows can remap them"
            );
        }
        leads
    }

    /// Write `status`, `notes` and a timestamp back to the lead's row.
    ///
    /// Best-effort: failures are logged and swallowed.
    pub async fn update_status(&self, lead: &Lead, status: LeadStatus, notes: &str) {
        let fields = [
            (columns::STATUS, status.as_str().to_string()),
            (columns::NOTES, notes.to_string()),
            (
                columns::LAST_UPDATED,
                Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
        ];

        match self.store.update_row(lead.source_ref, &fields).await {
            Ok(()) => debug!(lead_id = %lead.id, status = %status, "Updated source row"),
            Err(e) => warn!(
                lead_id = %lead.id,
                status = %status,
                error = %e,
                "Failed to update source row"
            ),
        }
    }
}
