//! Lead Trigger: polls a lead sheet and sends each new lead one message.

pub mod channels;
pub mod config;
pub mod error;
pub mod leads;
pub mod ledger;
pub mod pipeline;
pub mod source;
mod util;

pub use error::{Error, Result};
