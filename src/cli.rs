//! Command-line interface parsing for the Pokedex CLI
//!
//! This module handles parsing of CLI arguments using clap and validates them
//! into a `StartupConfig` used to build the cache and API client.

use std::time::Duration;

use clap::Parser;
use reqwest::Url;
use thiserror::Error;

use crate::data::DEFAULT_BASE_URL;

/// Default lifetime of cached API responses, in seconds
pub const DEFAULT_CACHE_INTERVAL_SECS: u64 = 120;

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The cache interval must be at least one second
    #[error("Invalid cache interval: must be greater than 0 seconds")]
    InvalidInterval,

    /// The base URL is not an http(s) URL
    #[error("Invalid base URL: '{0}'. Expected an http or https URL")]
    InvalidBaseUrl(String),
}

/// Pokedex CLI - Explore the Pokemon world from your terminal
#[derive(Parser, Debug)]
#[command(name = "pokedex")]
#[command(about = "Interactive Pokedex backed by PokeAPI")]
#[command(version)]
pub struct Cli {
    /// How long API responses stay cached, in seconds
    #[arg(long, value_name = "SECONDS", default_value_t = DEFAULT_CACHE_INTERVAL_SECS)]
    pub cache_interval: u64,

    /// Base URL of the PokeAPI instance to query
    #[arg(long, value_name = "URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupConfig {
    /// Cache expiry interval and sweep period
    pub cache_interval: Duration,
    /// PokeAPI base URL
    pub base_url: Url,
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with validated settings
    /// * `Err(CliError)` if the interval is zero or the URL is not http(s)
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        if cli.cache_interval == 0 {
            return Err(CliError::InvalidInterval);
        }

        let url = Url::parse(&cli.base_url)
            .map_err(|_| CliError::InvalidBaseUrl(cli.base_url.clone()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(CliError::InvalidBaseUrl(cli.base_url.clone()));
        }

        Ok(StartupConfig {
            cache_interval: Duration::from_secs(cli.cache_interval),
            base_url: url,
        })
    }
}
