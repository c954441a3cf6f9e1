//! CLI module for junos-provider
//!
//! This module provides the command-line interface: argument parsing and
//! subcommand dispatch over the resource registry.

pub mod commands;
pub mod diff;
pub mod output;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// junos-provider - Junos configuration resources over NETCONF
///
/// Renders, plans and applies typed resource configurations on a Junos
/// device with lock/commit/rollback transactions.
#[derive(Parser, Debug, Clone)]
#[command(name = "junos-provider")]
#[command(author = "junos-provider Contributors")]
#[command(version)]
#[command(about = "Junos configuration resources over NETCONF", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub output: OutputFormat,

    /// Path to configuration file
    #[arg(short = 'c', long, global = true, env = "JUNOS_PROVIDER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Work against an in-memory device instead of the configured one
    #[arg(long, global = true)]
    pub memory: bool,

    /// Running configuration of the in-memory device (`set` lines)
    #[arg(long, global = true, requires = "memory")]
    pub seed: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output with colors
    #[default]
    Human,
    /// JSON output for scripting
    Json,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List resource types
    Resources,

    /// Validate a resource configuration
    Validate(commands::ResourceFileArgs),

    /// Print the set lines of a resource configuration
    Render(commands::ResourceFileArgs),

    /// Print the lines an update would load
    Plan(commands::inspect::PlanArgs),

    /// Create a resource on the device
    Create(commands::ResourceFileArgs),

    /// Refresh a resource state from the device
    Read(commands::ResourceFileArgs),

    /// Replace a resource configuration on the device
    Update(commands::lifecycle::UpdateArgs),

    /// Remove a resource from the device
    Delete(commands::ResourceFileArgs),

    /// Build a resource state from the device by identifier
    Import(commands::lifecycle::ImportArgs),
}

impl Commands {
    /// Whether the command talks to a device
    pub fn needs_device(&self) -> bool {
        !matches!(
            self,
            Commands::Resources | Commands::Validate(_) | Commands::Render(_) | Commands::Plan(_)
        )
    }
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Get the effective verbosity level (0-3)
    pub fn verbosity(&self) -> u8 {
        self.verbose.min(3)
    }

    /// Check if JSON output is requested
    pub fn is_json(&self) -> bool {
        matches!(self.output, OutputFormat::Json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_render() {
        let cli = Cli::try_parse_from([
            "junos-provider",
            "render",
            "junos_static_route",
            "route.yaml",
        ])
        .unwrap();
        assert!(!cli.command.needs_device());
        match cli.command {
            Commands::Render(args) => {
                assert_eq!(args.resource, "junos_static_route");
                assert_eq!(args.file, PathBuf::from("route.yaml"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli = Cli::try_parse_from([
            "junos-provider",
            "import",
            "junos_bgp_neighbor",
            "192.0.2.2_-_master_-_peers",
            "--memory",
            "-vv",
            "--output",
            "json",
        ])
        .unwrap();
        assert!(cli.memory);
        assert!(cli.is_json());
        assert_eq!(cli.verbosity(), 2);
        assert!(cli.command.needs_device());
    }

    #[test]
    fn test_seed_requires_memory() {
        let result = Cli::try_parse_from([
            "junos-provider",
            "read",
            "junos_routing_options",
            "state.yaml",
            "--seed",
            "running.set",
        ]);
        assert!(result.is_err());
    }
}
