//! Outbound messaging: transport abstraction, the `openclaw` transport, and
//! the per-lead dispatcher.

pub mod dispatch;
pub mod openclaw;
pub mod sender;

pub use dispatch::{DispatchOutcome, Dispatcher, compose_message};
pub use openclaw::OpenClawSender;
pub use sender::MessageSender;
