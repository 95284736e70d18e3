//! Gleaner: a rule-driven extraction engine for web crawlers
//!
//! This crate extracts structured fields and follow-links from parsed HTML
//! documents according to per-site declarative rule-sets, and decides which
//! discovered links represent new content versus pagination. Fetching,
//! storage and index mapping are left to the surrounding crawler.

pub mod config;
pub mod dom;
pub mod extract;
pub mod pagination;
pub mod rules;

use thiserror::Error;

/// Main error type for Gleaner operations
#[derive(Debug, Error)]
pub enum GleanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid path query '{query}': {message}")]
    Query { query: String, message: String },

    #[error("Malformed base URL: {url}")]
    MalformedBaseUrl { url: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read rule-set file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid regex '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },
}

/// Result type alias for Gleaner operations
pub type Result<T> = std::result::Result<T, GleanError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{load_rulesets, load_rulesets_with_hash, EngineConfig};
pub use dom::{DocumentView, HtmlDocument, NodeKind};
pub use extract::{
    process_document, ExtractionContext, ExtractionResult, Freshness, Metadata, Outlink,
    ProcessOutcome,
};
pub use rules::{FieldKind, FieldSpec, Rule, RuleSet};
