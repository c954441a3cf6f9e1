//! Local connection module
//!
//! Runs the Junos NETCONF server on the current host, for a provider that
//! executes on the device itself.

use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;

use super::{Connection, ConnectionResult, ProcessChannel};

/// Local connection to the device's own NETCONF server
#[derive(Debug)]
pub struct LocalConnection {
    channel: ProcessChannel,
}

impl LocalConnection {
    /// Start `cli xml-mode netconf need-trailer`
    pub fn spawn(read_timeout: Duration) -> ConnectionResult<Self> {
        let mut command = Command::new("cli");
        command.args(["xml-mode", "netconf", "need-trailer"]);
        Self::with_command("localhost", command, read_timeout)
    }

    /// Start a custom NETCONF peer command
    pub fn with_command(
        identifier: impl Into<String>,
        command: Command,
        read_timeout: Duration,
    ) -> ConnectionResult<Self> {
        let channel = ProcessChannel::spawn(identifier, command, read_timeout)?;
        Ok(Self { channel })
    }
}

#[async_trait]
impl Connection for LocalConnection {
    fn identifier(&self) -> &str {
        self.channel.identifier()
    }

    async fn send(&mut self, message: &str) -> ConnectionResult<()> {
        self.channel.write_message(message).await
    }

    async fn receive(&mut self) -> ConnectionResult<String> {
        self.channel.read_message().await
    }

    async fn close(&mut self) -> ConnectionResult<()> {
        self.channel.shutdown().await
    }
}
