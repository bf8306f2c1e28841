//! Configuration module for ton-harvest
//!
//! The crawler runs with hard-coded defaults (the TON seed list, depth 2, five
//! attempts per request). A TOML file may override any of them.
//!
//! # Example
//!
//! ```no_run
//! use ton_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, FetchConfig, OutputConfig, DEFAULT_MAX_DEPTH, DEFAULT_OUTPUT_DIR,
    DEFAULT_SEEDS, DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
