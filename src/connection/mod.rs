//! Connection layer for device communication.
//!
//! A [`Connection`] carries NETCONF 1.0 messages (delimited by `]]>]]>`)
//! between the provider and one Junos device. Everything above it (hello
//! exchange, RPC building, reply parsing) lives in
//! [`crate::session::netconf`].
//!
//! # Supported Transports
//!
//! - **SSH** (`ssh` feature): the system OpenSSH client started as
//!   `ssh -s <host> netconf`, so authentication, ciphers and known hosts
//!   follow the user's OpenSSH configuration.
//! - **Local** (`local` feature): `cli xml-mode netconf need-trailer` started
//!   on the device itself, for on-box execution.
//!
//! Both transports run the peer as a child process and share the framing code
//! in [`process`].

pub mod process;

/// On-box NETCONF connection.
#[cfg(feature = "local")]
pub mod local;

/// NETCONF over the system OpenSSH client.
#[cfg(feature = "ssh")]
pub mod ssh;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[cfg(feature = "local")]
pub use local::LocalConnection;
pub use process::ProcessChannel;
#[cfg(feature = "ssh")]
pub use ssh::{SshConnection, SshOptions};

/// NETCONF 1.0 message delimiter (RFC 4742 end-of-message framing)
pub const NETCONF_1_0_DELIMITER: &str = "]]>]]>";

/// Default NETCONF port
pub const DEFAULT_NETCONF_PORT: u16 = 830;

/// Errors that can occur during connection operations.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Failed to establish initial connection to the device.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection or read timed out.
    #[error("Connection timeout after {0} seconds")]
    Timeout(u64),

    /// Configuration is invalid or incomplete.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// I/O error during connection operations.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Connection was closed unexpectedly.
    #[error("Connection closed{}", .0.as_deref().map(|s| format!(": {}", s)).unwrap_or_default())]
    ConnectionClosed(Option<String>),

    /// The requested transport is not compiled in.
    #[error("Unsupported transport: {0}")]
    UnsupportedTransport(String),
}

/// Result type for connection operations.
pub type ConnectionResult<T> = Result<T, ConnectionError>;

/// Transport used to reach the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// NETCONF over SSH (default)
    #[default]
    Ssh,
    /// NETCONF on the device itself
    Local,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Ssh => write!(f, "ssh"),
            TransportKind::Local => write!(f, "local"),
        }
    }
}

impl std::str::FromStr for TransportKind {
    type Err = ConnectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ssh" | "netconf" => Ok(TransportKind::Ssh),
            "local" | "on-box" => Ok(TransportKind::Local),
            _ => Err(ConnectionError::InvalidConfig(format!(
                "Unknown transport '{}'. Valid options: ssh, local",
                s
            ))),
        }
    }
}

/// A framed message channel to one device
#[async_trait]
pub trait Connection: Send {
    /// Get the connection identifier (usually the device address)
    fn identifier(&self) -> &str;

    /// Send one message; the implementation appends the delimiter
    async fn send(&mut self, message: &str) -> ConnectionResult<()>;

    /// Receive the next complete message, without its delimiter
    async fn receive(&mut self) -> ConnectionResult<String>;

    /// Close the connection
    async fn close(&mut self) -> ConnectionResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_kind_from_str() {
        assert_eq!("ssh".parse::<TransportKind>().unwrap(), TransportKind::Ssh);
        assert_eq!(
            "NETCONF".parse::<TransportKind>().unwrap(),
            TransportKind::Ssh
        );
        assert_eq!(
            "local".parse::<TransportKind>().unwrap(),
            TransportKind::Local
        );
        assert!("telnet".parse::<TransportKind>().is_err());
    }

    #[test]
    fn test_connection_closed_display() {
        assert_eq!(
            ConnectionError::ConnectionClosed(None).to_string(),
            "Connection closed"
        );
        assert_eq!(
            ConnectionError::ConnectionClosed(Some("Permission denied".into())).to_string(),
            "Connection closed: Permission denied"
        );
    }
}
