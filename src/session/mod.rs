//! Device sessions
//!
//! A [`DeviceSession`] is the set of primitives the transaction engine needs
//! from a Junos device: run a CLI command, load `set`/`delete` lines into the
//! candidate configuration, lock/unlock/clear the candidate and commit it.
//!
//! Implementations:
//! - [`NetconfSession`]: NETCONF RPCs over a [`crate::connection::Connection`]
//! - [`MemorySession`]: an in-memory device used by tests and dry runs
//!
//! [`SetFile`] is not a session: it receives the lines of fake operations.
//!
//! Sessions are opened per operation by a [`SessionFactory`] and always closed
//! explicitly by the caller.

pub mod memory;
pub mod netconf;
pub mod setfile;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub use memory::{MemoryDevice, MemorySession, Primitive, SessionCall};
pub use netconf::{NetconfSession, NetconfSessionFactory};
pub use setfile::SetFile;

/// Information the device reports about itself
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInformation {
    pub hardware_model: String,
    pub os_name: String,
    pub os_version: String,
    pub host_name: String,
}

impl SystemInformation {
    /// Whether the platform runs the security (flow) stack: SRX, vSRX, J-series.
    pub fn is_security_capable(&self) -> bool {
        let model = self.hardware_model.to_lowercase();
        model.starts_with("srx") || model.starts_with("vsrx") || model.starts_with('j')
    }
}

/// Options for configuration commit
#[derive(Debug, Clone, Default)]
pub struct CommitOptions {
    /// Comment for the commit log
    pub comment: Option<String>,
    /// Minutes until auto-rollback if not confirmed (1-65535)
    pub confirm_timeout: Option<u32>,
}

impl CommitOptions {
    /// Create new commit options
    pub fn new() -> Self {
        Self::default()
    }

    /// Set commit comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Set confirm timeout (minutes until auto-rollback)
    pub fn with_confirm_timeout(mut self, minutes: u32) -> Self {
        if (1..=65535).contains(&minutes) {
            self.confirm_timeout = Some(minutes);
        }
        self
    }
}

/// Primitives of one device session
#[async_trait]
pub trait DeviceSession: Send {
    /// Run an operational CLI command and return its raw text output
    async fn command(&mut self, command: &str) -> Result<String>;

    /// Load `set`/`delete` lines into the candidate configuration
    async fn config_set(&mut self, lines: &[String]) -> Result<()>;

    /// Take the exclusive candidate configuration lock
    async fn config_lock(&mut self) -> Result<()>;

    /// Release the candidate configuration lock
    async fn config_unlock(&mut self) -> Result<()>;

    /// Discard uncommitted candidate changes
    async fn config_clear(&mut self) -> Result<()>;

    /// Commit the candidate; returns the warnings reported by the device
    async fn commit_conf(&mut self, options: &CommitOptions) -> Result<Vec<String>>;

    /// Hardware and software details of the device
    async fn system_information(&mut self) -> Result<SystemInformation>;

    /// Close the session
    async fn close(&mut self) -> Result<()>;
}

/// Opens a fresh session for each provider operation
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn open(&self) -> Result<Box<dyn DeviceSession>>;
}
