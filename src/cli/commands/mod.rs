//! Subcommands module for junos-provider CLI
//!
//! `inspect` holds the offline commands, `lifecycle` the ones that open
//! sessions on a device.

pub mod inspect;
pub mod lifecycle;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::output::OutputFormatter;
use junos_provider::config::ProviderConfig;
use junos_provider::diagnostics::Diagnostic;
use junos_provider::engine::Provider;
use junos_provider::resources::{DynResource, Registry};
use junos_provider::session::{MemoryDevice, SessionFactory};

/// A resource type and a YAML or JSON file (`-` for stdin)
#[derive(Parser, Debug, Clone)]
pub struct ResourceFileArgs {
    /// Resource type, such as `junos_security_zone`
    pub resource: String,

    /// Configuration or state file
    pub file: PathBuf,
}

/// Common context shared between commands
pub struct CommandContext {
    /// Configuration
    pub config: ProviderConfig,
    /// Output formatter
    pub output: OutputFormatter,
    /// Resource types
    pub registry: Registry,
    /// In-memory device replacing the configured one
    pub memory: Option<MemoryDevice>,
    /// Verbosity level
    pub verbosity: u8,
}

impl CommandContext {
    /// Create a new command context from CLI arguments
    pub fn new(cli: &crate::cli::Cli, config: ProviderConfig) -> Result<Self> {
        let output = OutputFormatter::new(!cli.no_color, cli.is_json());

        let memory = if cli.memory {
            let device = MemoryDevice::new();
            Some(match cli.seed {
                Some(ref path) => {
                    let content = std::fs::read_to_string(path)
                        .with_context(|| format!("Failed to read seed file: {}", path.display()))?;
                    device.with_running(
                        content
                            .lines()
                            .map(str::trim)
                            .filter(|line| !line.is_empty() && !line.starts_with('#')),
                    )
                }
                None => device,
            })
        } else {
            None
        };

        Ok(Self {
            config,
            output,
            registry: Registry::with_builtins(),
            memory,
            verbosity: cli.verbosity(),
        })
    }

    /// Look up a resource type
    pub fn resource(&self, name: &str) -> Result<Arc<dyn DynResource>> {
        Ok(self.registry.get(name)?)
    }

    /// Provider for the configured device, or the in-memory one
    pub fn provider(&self) -> Result<Provider> {
        let sessions: Arc<dyn SessionFactory> = match self.memory {
            Some(ref device) => Arc::new(device.clone()),
            None => {
                if self.config.device.host.is_empty() {
                    anyhow::bail!("No device host configured (set device.host or JUNOS_HOST)");
                }
                Arc::new(self.config.session_factory())
            }
        };
        Ok(Provider::new(sessions).with_options(self.config.provider_options()?))
    }

    /// Show the running configuration of the in-memory device
    pub fn show_memory(&self) {
        if let Some(ref device) = self.memory {
            if self.verbosity >= 1 {
                self.output.section("Running configuration");
                let lines: Vec<String> = device
                    .running()
                    .into_iter()
                    .map(|line| format!("set {}", line))
                    .collect();
                self.output.lines(&lines);
            }
        }
    }

    /// Print diagnostics and turn them into a JSON array
    pub fn report(&self, diagnostics: &[Diagnostic]) -> Value {
        self.output.diagnostics(diagnostics);
        serde_json::to_value(diagnostics).unwrap_or(Value::Null)
    }
}

/// Read a YAML or JSON document; `-` reads stdin
pub fn read_document(path: &Path) -> Result<Value> {
    let content = if path == Path::new("-") {
        std::io::read_to_string(std::io::stdin()).context("Failed to read stdin")?
    } else {
        std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?
    };

    let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
    let value: Value = if is_json {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON: {}", path.display()))?
    } else {
        // YAML is a superset of JSON
        serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML: {}", path.display()))?
    };

    if !value.is_object() {
        anyhow::bail!("{} must contain a mapping", path.display());
    }
    Ok(value)
}

/// Current time for JSON documents
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
