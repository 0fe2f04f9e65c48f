//! Configuration management commands.
//!
//! Configuration is loaded from TOML files and merged with environment variables
//! prefixed with `BID_ADAPTER__`. For example, `BID_ADAPTER__ADAPTER__ENDPOINT`
//! will override `adapter.endpoint` in the TOML file.

use std::fs;
use std::path::Path;

use bid_adapter_common::settings::{Settings, ENVIRONMENT_PREFIX};

use crate::error::CliError;

/// Load settings from `file`, or the embedded defaults when no file is given.
///
/// Environment variables prefixed with `BID_ADAPTER__` override values either way.
pub(crate) fn load_settings(file: Option<&Path>, verbose: bool) -> Result<Settings, CliError> {
    let settings = match file {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            if verbose {
                log::info!("Loading config from: {}", path.display());
            }
            Settings::from_toml(&content)?
        }
        None => {
            if verbose {
                log::info!("Loading embedded default config");
            }
            Settings::new()?
        }
    };

    if verbose {
        log::info!("Environment variables with {ENVIRONMENT_PREFIX}__ prefix were merged");
    }

    Ok(settings)
}

/// Validate configuration file.
///
/// Validates TOML syntax, required fields, and merges with environment variables.
pub fn validate(file: &Path, verbose: bool) -> Result<(), CliError> {
    let settings = load_settings(Some(file), verbose)?;

    println!("Configuration is valid");
    println!("  File: {}", file.display());
    println!("  Bidder code: {}", settings.adapter.bidder_code);
    println!("  Endpoint: {}", settings.adapter.endpoint);

    if verbose {
        let merged_toml = settings.to_canonical_toml()?;
        let value: toml::Value = toml::from_str(&merged_toml)?;
        if let Some(table) = value.as_table() {
            println!("\nSections found:");
            for key in table.keys() {
                println!("  - [{}]", key);
            }
        }
    }

    Ok(())
}

/// Print the effective configuration after environment overrides.
pub fn show(file: Option<&Path>, verbose: bool) -> Result<(), CliError> {
    let settings = load_settings(file, verbose)?;
    print!("{}", settings.to_canonical_toml()?);
    Ok(())
}
