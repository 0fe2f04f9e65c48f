//! CLI error types.

use std::fmt;

use bid_adapter_common::error::BidAdapterError;
use error_stack::Report;

#[derive(Debug)]
pub enum CliError {
    /// Configuration file error
    Config(String),
    /// Fixture or output JSON error
    Json(String),
    /// Adapter failed to build or interpret
    Adapter(String),
    /// IO error
    Io(std::io::Error),
    /// TOML parsing error
    Toml(String),
    /// Logger could not be installed
    Logging(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Json(msg) => write!(f, "JSON error: {}", msg),
            CliError::Adapter(msg) => write!(f, "Adapter error: {}", msg),
            CliError::Io(err) => write!(f, "IO error: {}", err),
            CliError::Toml(msg) => write!(f, "TOML error: {}", msg),
            CliError::Logging(msg) => write!(f, "Logging error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io(err)
    }
}

impl From<toml::de::Error> for CliError {
    fn from(err: toml::de::Error) -> Self {
        CliError::Toml(err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Json(err.to_string())
    }
}

impl From<Report<BidAdapterError>> for CliError {
    fn from(report: Report<BidAdapterError>) -> Self {
        match report.current_context() {
            BidAdapterError::Configuration { .. } => CliError::Config(format!("{report:?}")),
            _ => CliError::Adapter(format!("{report:?}")),
        }
    }
}
