//! `openclaw` CLI transport.
//!
//! Each send is one subprocess:
//!
//! ```text
//! openclaw message send --channel whatsapp --target +15550000001 --message "Hi Ann! ..."
//! ```
//!
//! Arguments are passed as an argv vector, never through a shell, so message
//! text needs no escaping.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::channels::MessageSender;
use crate::config::TransportConfig;
use crate::error::ChannelError;
use crate::util::truncate;

/// Cap on transport output carried into failure reasons.
const MAX_REASON_LEN: usize = 500;

/// Message sender that shells out to the `openclaw` CLI.
#[derive(Debug, Clone)]
pub struct OpenClawSender {
    binary: String,
    channel: String,
    timeout: Duration,
}

impl OpenClawSender {
    pub fn new(config: &TransportConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            channel: config.channel.clone(),
            timeout: config.timeout,
        }
    }

    fn command(&self, target: &str, body: &str) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .args(["message", "send", "--channel", self.channel.as_str()])
            .args(["--target", target, "--message", body])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl MessageSender for OpenClawSender {
    fn channel(&self) -> &str {
        &self.channel
    }

    async fn send_message(&self, target: &str, body: &str) -> Result<(), ChannelError> {
        let child = self
            .command(target, body)
            .spawn()
            .map_err(|e| ChannelError::StartupFailed {
                name: self.channel.clone(),
                reason: format!("failed to spawn {}: {e}", self.binary),
            })?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ChannelError::SendFailed {
                    name: self.channel.clone(),
                    reason: format!("transport I/O error: {e}"),
                });
            }
            Err(_) => {
                return Err(ChannelError::Timeout {
                    name: self.channel.clone(),
                    timeout: self.timeout,
                });
            }
        };

        if output.status.success() {
            debug!(channel = %self.channel, target = %target, "Transport accepted message");
            return Ok(());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        let reason = [stderr.trim(), stdout.trim()]
            .into_iter()
            .find(|s| !s.is_empty())
            .map(|s| truncate(s, MAX_REASON_LEN))
            .unwrap_or_else(|| format!("{} exited with {}", self.binary, output.status));

        Err(ChannelError::SendFailed {
            name: self.channel.clone(),
            reason,
        })
    }
}
