//! Config command implementation.

use crate::cli::{ConfigAction, ConfigArgs};
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use std::path::Path;

/// Execute the config command.
pub fn execute_config(args: ConfigArgs, config: &Config, path: &Path, formatter: &Formatter) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            println!("{}", formatter.info(&format!("Configuration file: {}", path.display())));
            let contents = toml::to_string_pretty(config)
                .map_err(|e| crate::error::CliError::Config(format!("Failed to serialize config: {}", e)))?;
            println!("{}", contents);
        }
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                println!(
                    "{}",
                    formatter.warning(&format!("{} already exists; use --force to overwrite", path.display()))
                );
                return Ok(());
            }
            config.save(path)?;
            println!("{}", formatter.success(&format!("Configuration written to {}", path.display())));
        }
    }
    Ok(())
}
