//! bookmeter-harvest: a reading-log harvester
//!
//! This crate discovers users through community member listings on a
//! social reading-tracking site and extracts each user's paginated
//! reading history into flat per-user tables.

pub mod config;
pub mod crawler;
pub mod model;
pub mod output;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Data integrity error: {0}")]
    DataIntegrity(#[from] DataIntegrityError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Table write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::CrawlPhase,
        to: state::CrawlPhase,
    },
}

/// Failures of a single page request
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport { url: String, source: reqwest::Error },

    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("page numbers start at 1, got {0}")]
    InvalidPage(u32),
}

impl FetchError {
    /// Whether another attempt at the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status == 429 || (500..600).contains(status),
            Self::InvalidPage(_) => false,
        }
    }
}

/// A document did not have the shape the parser expects
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("expected node not found: {selector}")]
    MissingNode { selector: String },

    #[error("invalid selector: {0}")]
    InvalidSelector(String),

    #[error("unreadable page count in pagination link: {href}")]
    Pagination { href: String },

    #[error("embedded JSON payload is malformed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Field lists extracted from the same page disagree in length
#[derive(Debug, Error)]
#[error("reading-log field counts differ: {dates} dates, {authors} authors, {titles} titles")]
pub struct DataIntegrityError {
    pub dates: usize,
    pub authors: usize,
    pub titles: usize,
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use model::{Author, Book, Community, ReadingLogEntry, UserId};
pub use output::CrawlReport;
pub use state::{CrawlPhase, UserOutcome};
