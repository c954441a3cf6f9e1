//! NETCONF over the system OpenSSH client
//!
//! The device is reached with `ssh -s <host> netconf`, so keys, agents,
//! jump hosts and known hosts come from the user's OpenSSH setup.

use async_trait::async_trait;
use std::path::PathBuf;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use super::{
    Connection, ConnectionError, ConnectionResult, ProcessChannel, DEFAULT_NETCONF_PORT,
};

/// NETCONF SSH subsystem name
const NETCONF_SUBSYSTEM: &str = "netconf";

/// Options for an SSH NETCONF connection
#[derive(Debug, Clone)]
pub struct SshOptions {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub key_file: Option<PathBuf>,
    /// Seconds allowed to establish the TCP/SSH connection
    pub connect_timeout: u64,
    /// Seconds allowed to wait for one NETCONF message
    pub read_timeout: u64,
    pub host_key_checking: bool,
    /// Path to the ssh binary
    pub ssh_command: String,
}

impl SshOptions {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_NETCONF_PORT,
            username: None,
            key_file: None,
            connect_timeout: 30,
            read_timeout: 120,
            host_key_checking: true,
            ssh_command: "ssh".to_string(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_key_file(mut self, key_file: impl Into<PathBuf>) -> Self {
        self.key_file = Some(key_file.into());
        self
    }

    /// Arguments passed to the ssh binary
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-p".to_string(),
            self.port.to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", self.connect_timeout),
            "-o".to_string(),
            format!(
                "StrictHostKeyChecking={}",
                if self.host_key_checking { "yes" } else { "no" }
            ),
        ];
        if let Some(ref username) = self.username {
            args.push("-l".to_string());
            args.push(username.clone());
        }
        if let Some(ref key_file) = self.key_file {
            args.push("-i".to_string());
            args.push(key_file.display().to_string());
        }
        args.push("-s".to_string());
        args.push(self.host.clone());
        args.push(NETCONF_SUBSYSTEM.to_string());
        args
    }

    fn validate(&self) -> ConnectionResult<()> {
        if self.host.trim().is_empty() {
            return Err(ConnectionError::InvalidConfig(
                "device host is empty".to_string(),
            ));
        }
        if self.port == 0 {
            return Err(ConnectionError::InvalidConfig(
                "device port must not be 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// NETCONF session carried by an OpenSSH subprocess
#[derive(Debug)]
pub struct SshConnection {
    channel: ProcessChannel,
}

impl SshConnection {
    /// Start the ssh subsystem process
    pub fn connect(options: &SshOptions) -> ConnectionResult<Self> {
        options.validate()?;
        let identifier = format!("{}:{}", options.host, options.port);
        debug!(device = %identifier, "Opening NETCONF over SSH");

        let mut command = Command::new(&options.ssh_command);
        command.args(options.args());
        // Establishing the connection counts against the first read
        let read_timeout = Duration::from_secs(options.read_timeout.max(options.connect_timeout));
        let channel = ProcessChannel::spawn(identifier, command, read_timeout)?;
        Ok(Self { channel })
    }
}

#[async_trait]
impl Connection for SshConnection {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssh_args() {
        let options = SshOptions::new("192.0.2.1")
            .with_username("netconf")
            .with_key_file("/home/me/.ssh/id_ed25519");
        let args = options.args();

        assert_eq!(&args[0..2], &["-p".to_string(), "830".to_string()]);
        assert!(args.contains(&"BatchMode=yes".to_string()));
        assert!(args.contains(&"StrictHostKeyChecking=yes".to_string()));
        assert!(args.windows(2).any(|w| w == ["-l", "netconf"]));
        assert!(args
            .windows(2)
            .any(|w| w == ["-i", "/home/me/.ssh/id_ed25519"]));
        assert_eq!(
            &args[args.len() - 3..],
            &["-s".to_string(), "192.0.2.1".to_string(), "netconf".to_string()]
        );
    }

    #[test]
    fn test_ssh_options_validation() {
        assert!(SshConnection::connect(&SshOptions::new("  ")).is_err());
        assert!(SshConnection::connect(&SshOptions::new("192.0.2.1").with_port(0)).is_err());
    }
}
