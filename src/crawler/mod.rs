//! Crawler module for discovering users and harvesting their reading logs
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - Document parsing for listings, member pages and reading logs
//! - The pagination walker shared by every paginated resource
//! - Overall crawl coordination

mod communities;
mod coordinator;
mod fetcher;
mod parser;
mod reading_log;
mod users;
mod walker;

pub use communities::enumerate_communities;
pub use coordinator::{run_crawl, Coordinator, CrawlRequest};
pub use fetcher::{build_http_client, fetch_page, PageFetcher};
pub use parser::{
    communities_from_listing, extract_log_records, extract_records, extract_user_ids,
    max_page_count, parse_community_listing, parse_page, parse_records, ParseContext, ParsedPage,
};
pub use reading_log::{extract_reading_log, ReadingLogWalk};
pub use users::{enumerate_users, merge_users};
pub use walker::{walk, PageWalker, WalkStats};
