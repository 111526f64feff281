//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: the orchestrator's phase (communities, users, logs, done)
//! - `UserOutcome`: the result of extracting one user's reading log

mod crawl_phase;
mod user_outcome;

// Re-export main types
pub use crawl_phase::CrawlPhase;
pub use user_outcome::UserOutcome;
