//! Per-lead dispatch: render the outreach message and hand it to the transport.

use std::sync::Arc;

use tracing::{info, warn};

use crate::channels::MessageSender;
use crate::leads::Lead;

/// Outcome of one dispatch attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Sent,
    Failed { reason: String },
}

impl DispatchOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

/// Render the outreach message for a lead.
///
/// The interest clause is left out entirely when there is no interest.
pub fn compose_message(name: &str, interest: Option<&str>) -> String {
    let interest_clause = interest
        .map(str::trim)
        .filter(|i| !i.is_empty())
        .map(|i| format!(" in {i}"))
        .unwrap_or_default();

    format!(
        "Hi {name}! 👋\n\n\
         Thanks for your interest{interest_clause}. I'd love to help you learn more!\n\n\
         Do you have a few minutes to chat?"
    )
}

/// Sends one message per call through a `MessageSender`.
pub struct Dispatcher {
    sender: Arc<dyn MessageSender>,
}

impl Dispatcher {
    pub fn new(sender: Arc<dyn MessageSender>) -> Self {
        Self { sender }
    }

    pub fn channel(&self) -> &str {
        self.sender.channel()
    }

    /// Exactly one transport call; errors become `Failed`, nothing is retried.
    pub async fn send(&self, lead: &Lead) -> DispatchOutcome {
        let body = compose_message(&lead.name, lead.interest.as_deref());

        match self.sender.send_message(&lead.phone, &body).await {
            Ok(()) => {
                info!(
                    lead_id = %lead.id,
                    name = %lead.name,
                    phone = %lead.phone,
                    channel = self.sender.channel(),
                    "Message sent"
                );
                DispatchOutcome::Sent
            }
            Err(e) => {
                warn!(
                    lead_id = %lead.id,
                    phone = %lead.phone,
                    error = %e,
                    "Message send failed"
                );
                DispatchOutcome::Failed { reason: e.reason() }
            }
        }
    }
}
