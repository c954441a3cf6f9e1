//! The resource abstraction

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

use super::rules::ReadReport;
use crate::diagnostics::Diagnostics;
use crate::error::Result;

/// Configuration object a resource needs before it can be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prerequisite {
    /// Configuration path that must exist, e.g. `routing-instances blue`
    pub path: String,
    /// Error message when it does not
    pub message: String,
}

impl Prerequisite {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// One Junos resource type
///
/// Implementations are pure: they turn a configuration into lines and
/// device output back into a configuration. The [`Provider`] owns every
/// device interaction.
///
/// [`Provider`]: super::Provider
pub trait Resource: Send + Sync + 'static {
    /// Typed configuration of the resource
    type Config: Serialize + DeserializeOwned + Clone + Default + Debug + PartialEq + Send + Sync;

    /// Type name, e.g. `junos_security_zone`
    const TYPE_NAME: &'static str;

    /// Shape of the import identifier shown in errors
    const ID_FORMAT: &'static str;

    /// Number of components of the import identifier
    const ID_PARTS: usize = 1;

    /// Identifier derived from the key fields; empty when they are unset
    fn id(&self, config: &Self::Config) -> String;

    /// Record structural errors of `config` in `diags`
    fn validate(&self, config: &Self::Config, diags: &mut Diagnostics);

    /// Ordered `set` lines creating the configuration
    fn set_lines(&self, config: &Self::Config) -> Result<Vec<String>>;

    /// `delete` lines removing the managed configuration before an update
    fn delete_lines(&self, config: &Self::Config) -> Vec<String>;

    /// `delete` lines removing the resource entirely
    fn destroy_lines(&self, config: &Self::Config) -> Vec<String> {
        self.delete_lines(config)
    }

    /// Configuration path of the resource, as passed to `show configuration`
    fn show_path(&self, config: &Self::Config) -> String;

    /// Parse `display set relative` output for the resource keyed by `key`
    ///
    /// Returns a configuration with an empty [`id`](Resource::id) when the
    /// output holds nothing.
    fn read(&self, key: &Self::Config, output: &str) -> Result<(Self::Config, ReadReport)>;

    /// Key configuration from the components of an import identifier
    fn from_import_id(&self, parts: &[String]) -> Result<Self::Config>;

    /// Only SRX, vSRX and J-series devices can host the resource
    fn requires_security(&self) -> bool {
        false
    }

    /// Parent objects checked before creation
    fn prerequisites(&self, _config: &Self::Config) -> Vec<Prerequisite> {
        Vec::new()
    }

    /// Whether create checks that the resource is absent before and present after
    fn checks_existence(&self) -> bool {
        true
    }

    /// Copy fields not stored on the device from the prior state
    fn carry_over(&self, _prior: &Self::Config, _read: &mut Self::Config) {}
}
