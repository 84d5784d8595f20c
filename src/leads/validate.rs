//! Lead eligibility checks. Pure functions, no I/O.

use std::sync::LazyLock;

use regex::Regex;

use crate::leads::model::Lead;
use crate::ledger::Ledger;

/// E.164: `+`, a non-zero leading digit, at most 15 ASCII digits in total.
static E164: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+[1-9][0-9]{1,14}$").expect("valid E.164 regex"));

/// Check whether `phone` is an E.164 international number.
pub fn is_valid_e164(phone: &str) -> bool {
    E164.is_match(phone)
}

/// A lead can be dispatched if it has a name and a valid phone.
pub fn is_eligible(lead: &Lead) -> bool {
    !lead.name.trim().is_empty() && is_valid_e164(&lead.phone)
}

/// Keep leads that pass validation and are not in the ledger, in source order.
pub fn select_eligible(leads: Vec<Lead>, ledger: &Ledger) -> Vec<Lead> {
    leads
        .into_iter()
        .filter(|lead| {
            if ledger.contains(&lead.id) {
                tracing::debug!(lead_id = %lead.id, "Already in ledger, skipping");
                return false;
            }
            if !is_eligible(lead) {
                tracing::debug!(lead_id = %lead.id, "Incomplete or invalid lead, skipping");
                return false;
            }
            true
        })
        .collect()
}
