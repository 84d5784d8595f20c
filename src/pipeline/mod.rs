//! Lead processing pipeline.
//!
//! Every run flows through:
//! 1. `LedgerStore::load()`: ids already contacted
//! 2. `SourceAdapter::fetch_leads()`: candidate rows
//! 3. `select_eligible()`: validation + ledger dedupe
//! 4. `Dispatcher::send()`: one message per lead, spaced by a fixed delay
//! 5. `LedgerStore::save()`: once, after the loop

pub mod poller;
pub mod runner;
pub mod types;

pub use poller::spawn_trigger_loop;
pub use runner::LeadPipeline;
pub use types::{LeadOutcome, LeadResult, RunReport};
