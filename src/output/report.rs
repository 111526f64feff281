//! End-of-crawl report
//!
//! Collects what happened to every community and user so a run can end with
//! a summary instead of stopping at the first failure.

use crate::model::UserId;
use crate::state::UserOutcome;
use chrono::{DateTime, Utc};

/// Summary of one orchestrator run
#[derive(Debug, Clone)]
pub struct CrawlReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    /// Communities found on the listing pages
    pub communities: usize,

    /// Listing pages that failed and were skipped
    pub community_pages_failed: u32,

    /// Communities whose member listing could not be walked, with the error
    pub failed_communities: Vec<(String, String)>,

    /// Size of the merged user set
    pub users_discovered: usize,

    /// Outcome per user, in processing order
    pub outcomes: Vec<(UserId, UserOutcome)>,
}

impl CrawlReport {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            finished_at: None,
            communities: 0,
            community_pages_failed: 0,
            failed_communities: Vec::new(),
            users_discovered: 0,
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, user_id: UserId, outcome: UserOutcome) {
        self.outcomes.push((user_id, outcome));
    }

    pub fn finish(&mut self, finished_at: DateTime<Utc>) {
        self.finished_at = Some(finished_at);
    }

    pub fn duration_seconds(&self) -> Option<i64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_seconds())
    }

    fn count(&self, predicate: impl Fn(&UserOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| predicate(o)).count()
    }

    pub fn users_skipped(&self) -> usize {
        self.count(|o| matches!(o, UserOutcome::Skipped))
    }

    pub fn users_completed(&self) -> usize {
        self.count(|o| matches!(o, UserOutcome::Completed { .. }))
    }

    pub fn users_partial(&self) -> usize {
        self.count(|o| matches!(o, UserOutcome::Partial { .. }))
    }

    pub fn users_failed(&self) -> usize {
        self.count(UserOutcome::is_failure)
    }

    /// Users whose tables were written during this run
    pub fn users_written(&self) -> usize {
        self.count(UserOutcome::is_persisted)
    }

    /// Users that caused at least one request
    pub fn users_visited(&self) -> usize {
        self.outcomes.len() - self.users_skipped()
    }

    pub fn entries_written(&self) -> usize {
        self.outcomes.iter().map(|(_, o)| o.entries()).sum()
    }

    /// Users that failed, with their error text
    pub fn failures(&self) -> impl Iterator<Item = (&UserId, &str)> {
        self.outcomes.iter().filter_map(|(id, outcome)| match outcome {
            UserOutcome::Failed { error } => Some((id, error.as_str())),
            _ => None,
        })
    }
}

/// Prints the report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Run:");
    println!("  Started: {}", report.started_at.to_rfc3339());
    if let Some(finished) = report.finished_at {
        println!("  Finished: {}", finished.to_rfc3339());
    }
    if let Some(seconds) = report.duration_seconds() {
        println!("  Duration: {}s", seconds);
    }
    println!();

    println!("Discovery:");
    println!("  Communities: {}", report.communities);
    println!("  Listing pages skipped: {}", report.community_pages_failed);
    println!("  Communities failed: {}", report.failed_communities.len());
    println!("  Unique users: {}", report.users_discovered);
    println!();

    println!("Extraction:");
    println!("  Completed: {}", report.users_completed());
    println!("  Partial: {}", report.users_partial());
    println!("  Skipped (already on disk): {}", report.users_skipped());
    println!("  Failed: {}", report.users_failed());
    println!("  Written this run: {}", report.users_written());
    println!("  Reading-log entries written: {}", report.entries_written());

    if !report.failed_communities.is_empty() {
        println!("\nFailed communities:");
        for (community, error) in &report.failed_communities {
            println!("  {}: {}", community, error);
        }
    }

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        println!("\nFailed users:");
        for (user_id, error) in failures {
            println!("  {}: {}", user_id, error);
        }
    }
}
