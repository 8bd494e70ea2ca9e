//! CLI module for the OAuth client cache
//!
//! Provides subcommands for inspecting and maintaining cached client lookups:
//! - `keys`: print the cache keys a client maps to
//! - `find`: read a client through the cache
//! - `flush`: evict every entry written by the client cache

pub mod find;
pub mod flush;
pub mod keys;

use clap::{Parser, Subcommand};

use crate::config::AppConfig;
use crate::infrastructure::logging;

/// OAuth client cache - read-through caching for OAuth client lookups
#[derive(Parser)]
#[command(name = "oauth-client-cache")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the cache keys derived for a client
    Keys(keys::KeysArgs),

    /// Look up a client through the cache and print it as JSON
    Find(find::FindArgs),

    /// Evict every entry carrying the client cache tags
    Flush,
}

/// Loads `.env` and the layered configuration, then starts logging
fn bootstrap() -> AppConfig {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().unwrap_or_else(|e| {
        eprintln!("Failed to load configuration, using defaults: {}", e);
        AppConfig::default()
    });
    logging::init_logging(&config.logging);

    config
}
