use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::{Parser, Subcommand};
use hy3_layout::common::config::{Config, config_file, default_config_text};
use hy3_layout::common::log;
use tracing::{debug, info};

#[derive(Parser)]
#[command(name = "hy3ctl", about = "Inspect hy3 layout configuration")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a configuration file parses and passes validation.
    CheckConfig {
        /// Path to the configuration file (defaults to the user config).
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,
    },
    /// Print the bundled default configuration.
    DefaultConfig,
}

fn main() {
    log::init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::CheckConfig { path } => check_config(path),
        Commands::DefaultConfig => {
            print!("{}", default_config_text());
            Ok(true)
        }
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(1),
        Err(e) => {
            eprintln!("{e:#}");
            process::exit(2);
        }
    }
}

fn check_config(path: Option<PathBuf>) -> anyhow::Result<bool> {
    let path = match path {
        Some(path) => path,
        None => config_file().context("no configuration directory on this system")?,
    };
    debug!(path = %path.display(), "checking config");

    let config = Config::read(&path)?;
    let issues = config.validate();
    if issues.is_empty() {
        info!(path = %path.display(), "config validation passed");
        println!("Config validation passed");
        return Ok(true);
    }

    println!("Config validation failed:");
    for issue in &issues {
        println!("  - {issue}");
    }
    Ok(false)
}
