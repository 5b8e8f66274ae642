use anyhow::Result;
use mep_cli::cli::ConfigCommands;
use mep_cli::config::{init_mep_config, mep_config_path};
use mep_cli::MepConfig;

pub fn handle(command: &ConfigCommands, config: &MepConfig) -> Result<()> {
    match command {
        ConfigCommands::Init { force } => {
            let path = mep_config_path()?;
            if init_mep_config(*force)? {
                println!("Wrote default configuration to {}", path.display());
            } else {
                println!(
                    "Configuration already exists at {} (use --force to overwrite)",
                    path.display()
                );
            }
            Ok(())
        }
        ConfigCommands::Show => {
            print!("{}", toml::to_string_pretty(config)?);
            Ok(())
        }
        ConfigCommands::Path => {
            println!("{}", mep_config_path()?.display());
            Ok(())
        }
    }
}
