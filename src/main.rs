//! junos-provider - Junos configuration resources over NETCONF
//!
//! This is the main entry point for the junos-provider CLI.

mod cli;

use anyhow::Result;
use cli::commands::{inspect, CommandContext};
use cli::{Cli, Commands};
use junos_provider::config::{LogFormat, LoggingConfig, ProviderConfig};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Application version information
const VERSION: &str = env!("CARGO_PKG_VERSION");
const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Load configuration; offline commands can do without it
    let loaded = ProviderConfig::load(cli.config.as_deref());
    let logging = loaded
        .as_ref()
        .map(|config| config.logging.clone())
        .unwrap_or_default();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity(), &logging);

    // Display version if verbose
    if cli.verbosity() >= 2 {
        eprintln!("junos-provider v{} by {}", VERSION, AUTHORS);
    }

    let config = match loaded {
        Ok(config) => config,
        Err(e) if cli.command.needs_device() && !cli.memory => {
            return Err(e.context("Failed to load configuration"));
        }
        Err(e) => {
            if cli.verbosity() >= 1 {
                eprintln!("Warning: Failed to load config: {:#}", e);
            }
            ProviderConfig::default()
        }
    };

    // Create command context
    let ctx = CommandContext::new(&cli, config)?;

    // Execute the appropriate command
    let result = match &cli.command {
        Commands::Resources => inspect::resources(&ctx),
        Commands::Validate(args) => args.validate(&ctx),
        Commands::Render(args) => args.render(&ctx),
        Commands::Plan(args) => args.execute(&ctx),
        Commands::Create(args) => args.create(&ctx).await,
        Commands::Read(args) => args.read(&ctx).await,
        Commands::Update(args) => args.execute(&ctx).await,
        Commands::Delete(args) => args.delete(&ctx).await,
        Commands::Import(args) => args.execute(&ctx).await,
    };

    let exit_code = match result {
        Ok(code) => code,
        Err(e) => {
            ctx.output.error(&format!("{:#}", e));
            1
        }
    };

    std::process::exit(exit_code);
}

/// Initialize logging based on verbosity level
fn init_logging(verbosity: u8, logging: &LoggingConfig) {
    let filter = match verbosity {
        0 => logging.level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so stdout stays parseable
    match logging.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_target(verbosity >= 3)
                    .with_writer(std::io::stderr),
            )
            .with(env_filter)
            .init(),
    }
}
