//! Outbound transport abstraction.

use async_trait::async_trait;

use crate::error::ChannelError;

/// Delivers one message to one target. Implementations never retry.
#[async_trait]
pub trait MessageSender: Send + Sync {
    /// Channel identifier (e.g. "whatsapp").
    fn channel(&self) -> &str;

    /// Send `body` to `target` (an E.164 phone number).
    async fn send_message(&self, target: &str, body: &str) -> Result<(), ChannelError>;
}
