//! Pokedex CLI - Explore the Pokemon world from your terminal
//!
//! An interactive prompt that lists location areas, explores them, and lets
//! you catch and inspect pokemon using data from PokeAPI.

use std::io;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use pokedex_cli::cache::Cache;
use pokedex_cli::cli::{Cli, StartupConfig};
use pokedex_cli::data::PokeApiClient;
use pokedex_cli::repl::{self, Session};

/// Sends log output to stderr so it never mixes with the prompt on stdout
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let cli = Cli::parse();
    let config = match StartupConfig::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };
    tracing::info!(
        interval_secs = config.cache_interval.as_secs(),
        base_url = %config.base_url,
        "Starting Pokedex"
    );

    let cache = Cache::new(config.cache_interval)?;
    let client = PokeApiClient::with_base_url(config.base_url, cache.clone());
    let mut session = Session::new(client);

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = io::stdout();
    let result = repl::run(&mut session, stdin, &mut stdout).await;

    cache.close();
    result?;
    Ok(())
}
