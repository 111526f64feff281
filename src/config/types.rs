use serde::Deserialize;

/// Main configuration structure
///
/// Every table is optional in the TOML file; missing tables and keys fall
/// back to the values the site has been crawled with historically.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub site: SiteConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// How positional reading-log field lists of unequal length are handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MismatchPolicy {
    /// Keep as many rows as the shortest list allows
    #[default]
    Truncate,
    /// Fail the page with a data integrity error
    Reject,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Worker pool size for community membership walks
    pub workers: u32,

    /// Number of users whose reading logs are extracted at once
    #[serde(rename = "log-workers")]
    pub log_workers: u32,

    /// Delay between successive page fetches of one walk (milliseconds)
    #[serde(rename = "page-delay-ms")]
    pub page_delay_ms: u64,

    /// Retries after the first failed attempt of a request
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Backoff before the first retry; doubled for each further retry (milliseconds)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,

    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Re-crawl users whose output directory already exists
    pub force: bool,

    #[serde(rename = "row-mismatch")]
    pub row_mismatch: MismatchPolicy,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            log_workers: 1,
            page_delay_ms: 500,
            max_retries: 3,
            retry_backoff_ms: 1000,
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            force: false,
            row_mismatch: MismatchPolicy::Truncate,
        }
    }
}

/// Source site endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Path and fixed query of the community listing, relative to the base URL
    #[serde(rename = "community-listing-path")]
    pub community_listing_path: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://bookmeter.com".to_string(),
            community_listing_path: "/communities?filter=none&sort=member_count".to_string(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "bookmeter-harvest".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://github.com/".to_string(),
            contact_email: "harvest@example.com".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory holding one sub-directory per harvested user
    #[serde(rename = "root-dir")]
    pub root_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            root_dir: "./data".to_string(),
        }
    }
}
