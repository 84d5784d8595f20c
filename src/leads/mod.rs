//! Lead model and eligibility rules.

pub mod model;
pub mod validate;

pub use model::{Lead, LeadId, LeadStatus, Row, RowRef};
pub use validate::{is_eligible, is_valid_e164, select_eligible};
