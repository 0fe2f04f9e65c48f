use std::str;

use config::{Config, Environment, File, FileFormat};
use error_stack::{Report, ResultExt};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::constants::{
    DEFAULT_BIDDER_CODE, DEFAULT_BUILD_ID, DEFAULT_CURRENCY, DEFAULT_PLACEHOLDER_TOKEN,
    DEFAULT_TTL_SECS,
};
use crate::error::BidAdapterError;

/// Prefix for environment variable overrides, e.g. `BID_ADAPTER__ADAPTER__ENDPOINT`.
pub const ENVIRONMENT_PREFIX: &str = "BID_ADAPTER";

/// Adapter configuration: where to send bids and how to default server replies.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct AdapterConfig {
    #[serde(default = "default_bidder_code")]
    #[validate(length(min = 1))]
    pub bidder_code: String,

    /// Ad server bid endpoint, without the build identifier.
    #[validate(url)]
    pub endpoint: String,

    /// Appended to the endpoint as the `v` query parameter.
    #[serde(default = "default_build_id")]
    #[validate(length(min = 1))]
    pub build_id: String,

    /// Seconds a bid stays valid when the server does not say.
    #[serde(default = "default_ttl")]
    #[validate(range(min = 1, max = 3600))]
    pub default_ttl: u32,

    #[serde(default = "default_currency")]
    #[validate(length(equal = 3))]
    pub default_currency: String,

    /// Literal token in creative markup that receives consent query parameters.
    #[serde(default = "default_placeholder_token")]
    #[validate(length(min = 1))]
    pub placeholder_token: String,
}

fn default_bidder_code() -> String {
    DEFAULT_BIDDER_CODE.to_string()
}

fn default_build_id() -> String {
    DEFAULT_BUILD_ID.to_string()
}

fn default_ttl() -> u32 {
    DEFAULT_TTL_SECS
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_placeholder_token() -> String {
    DEFAULT_PLACEHOLDER_TOKEN.to_string()
}

impl AdapterConfig {
    /// Configuration pointing at `endpoint` with every other field defaulted.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            bidder_code: default_bidder_code(),
            endpoint: endpoint.into(),
            build_id: default_build_id(),
            default_ttl: default_ttl(),
            default_currency: default_currency(),
            placeholder_token: default_placeholder_token(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct Settings {
    #[validate(nested)]
    pub adapter: AdapterConfig,
}

impl Settings {
    /// Load the settings embedded at build time, merged with environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded TOML is invalid or fails validation.
    pub fn new() -> Result<Self, Report<BidAdapterError>> {
        let toml_bytes = include_bytes!("../../../bid-adapter.toml");
        let toml_str = str::from_utf8(toml_bytes).change_context(BidAdapterError::Configuration {
            message: "embedded settings are not valid UTF-8".to_string(),
        })?;

        Self::from_toml(toml_str)
    }

    /// Parse settings from TOML, applying `BID_ADAPTER__` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML cannot be parsed, required keys are missing,
    /// or validation fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, Report<BidAdapterError>> {
        let environment = Environment::default()
            .prefix(ENVIRONMENT_PREFIX)
            .separator("__");

        let toml = File::from_str(toml_str, FileFormat::Toml);
        let config = Config::builder()
            .add_source(toml)
            .add_source(environment)
            .build()
            .change_context(BidAdapterError::Configuration {
                message: "failed to build configuration".to_string(),
            })?;

        let settings: Self =
            config
                .try_deserialize()
                .change_context(BidAdapterError::Configuration {
                    message: "failed to deserialize configuration".to_string(),
                })?;

        settings
            .validate()
            .change_context(BidAdapterError::Configuration {
                message: "settings validation failed".to_string(),
            })?;

        Ok(settings)
    }

    /// Serialize the effective settings back to TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be represented as TOML.
    pub fn to_canonical_toml(&self) -> Result<String, Report<BidAdapterError>> {
        toml::to_string_pretty(self).change_context(BidAdapterError::Configuration {
            message: "failed to serialize settings".to_string(),
        })
    }
}
