use clap::Parser;
use mep_cli::cli::{Cli, Commands};
use mep_cli::config::load_mep_config;
use mep_cli::MepConfig;
use tracing::error;
use tracing_subscriber::EnvFilter;

mod commands;

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();

    let (config, config_error) = match load_mep_config() {
        Ok(config) => (config, None),
        Err(err) => (MepConfig::default(), Some(err)),
    };
    init_logging(cli.log_level.as_deref().unwrap_or(&config.logging.level));
    if let Some(err) = config_error {
        error!("ignoring configuration file: {err:#}");
    }

    let result = match &cli.command {
        Commands::Wire { command } => commands::wire::handle(command),
        Commands::Conduit { command } => commands::conduit::handle(command),
        Commands::Hierarchy { command } => commands::hierarchy::handle(command, &config),
        Commands::Survey { command } => commands::survey::handle(command, &config),
        Commands::Config { command } => commands::config::handle(command, &config),
    };

    if let Err(err) = result {
        error!("{err:?}");
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
