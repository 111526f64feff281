//! Crawl orchestrator
//!
//! Drives one harvest run through its phases:
//! - Community discovery on the listing pages
//! - User discovery across every community on a bounded worker pool
//! - Reading-log extraction and persistence per user
//!
//! Discovery fully completes before extraction starts. Failures of a single
//! community or user are recorded in the report instead of ending the run.

use crate::config::{validate, Config};
use crate::crawler::communities::enumerate_communities;
use crate::crawler::fetcher::PageFetcher;
use crate::crawler::reading_log::extract_reading_log;
use crate::crawler::users::{enumerate_users, merge_users};
use crate::model::{Community, UserId};
use crate::output::{CrawlReport, OutputTree};
use crate::state::{CrawlPhase, UserOutcome};
use crate::url::SiteUrls;
use crate::HarvestError;
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::Instrument;

/// Log a progress line after this many processed users
const PROGRESS_EVERY: usize = 10;

/// Which slice of the community listing to harvest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlRequest {
    /// First listing page, 1-based
    pub start_page: u32,

    /// Number of listing pages to read
    pub num_communities: u32,
}

impl Default for CrawlRequest {
    fn default() -> Self {
        Self {
            start_page: 1,
            num_communities: 1,
        }
    }
}

/// Main orchestrator structure
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: PageFetcher,
    site: SiteUrls,
    output: OutputTree,
    phase: CrawlPhase,
    span: tracing::Span,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The harvest configuration; validated here
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(HarvestError)` - The configuration is invalid, or the HTTP client could not be built
    pub fn new(config: Config) -> crate::Result<Self> {
        validate(&config)?;
        let site = SiteUrls::from_config(&config.site)?;
        let fetcher =
            PageFetcher::from_config(&config.user_agent, Arc::new(config.crawler.clone()))?;
        let output = OutputTree::new(&config.output.root_dir);

        Ok(Self {
            config: Arc::new(config),
            fetcher,
            site,
            output,
            phase: CrawlPhase::DiscoveringCommunities,
            span: tracing::info_span!("harvest"),
        })
    }

    /// Uses `span` as the parent of everything this run logs
    pub fn with_span(mut self, span: tracing::Span) -> Self {
        self.span = span;
        self
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn output(&self) -> &OutputTree {
        &self.output
    }

    fn advance(&mut self, next: CrawlPhase) -> crate::Result<()> {
        self.phase = self.phase.advance(next)?;
        tracing::info!("Entering phase: {}", self.phase);
        Ok(())
    }

    /// Runs every phase once
    ///
    /// A coordinator is single-use; running it again after `Done` is an
    /// invalid transition.
    pub async fn run(&mut self, request: CrawlRequest) -> crate::Result<CrawlReport> {
        if self.phase != CrawlPhase::DiscoveringCommunities {
            return Err(HarvestError::InvalidTransition {
                from: self.phase,
                to: CrawlPhase::DiscoveringCommunities,
            });
        }

        let span = self.span.clone();
        self.run_phases(request).instrument(span).await
    }

    async fn run_phases(&mut self, request: CrawlRequest) -> crate::Result<CrawlReport> {
        let mut report = CrawlReport::new(Utc::now());
        tracing::info!(
            "Starting harvest: {} listing page(s) from page {}",
            request.num_communities,
            request.start_page
        );

        let (communities, listing_stats) = enumerate_communities(
            &self.fetcher,
            &self.site,
            request.start_page,
            request.num_communities,
        )
        .await;
        report.communities = communities.len();
        report.community_pages_failed = listing_stats.pages_failed;
        tracing::info!("Found {} communities", communities.len());

        self.advance(CrawlPhase::DiscoveringUsers)?;
        let users = self.discover_users(communities, &mut report).await?;
        report.users_discovered = users.len();
        tracing::info!("Found {} unique users", users.len());

        self.advance(CrawlPhase::ExtractingLogs)?;
        self.extract_logs(users, &mut report).await?;

        self.advance(CrawlPhase::Done)?;
        report.finish(Utc::now());
        tracing::info!(
            "Harvest complete: {} completed, {} partial, {} skipped, {} failed",
            report.users_completed(),
            report.users_partial(),
            report.users_skipped(),
            report.users_failed()
        );

        Ok(report)
    }

    /// Walks every community's member listing on the worker pool
    ///
    /// Workers only return their lists; merging happens here once all of
    /// them have finished.
    async fn discover_users(
        &self,
        communities: Vec<Community>,
        report: &mut CrawlReport,
    ) -> crate::Result<BTreeSet<UserId>> {
        let permits = Arc::new(Semaphore::new(self.config.crawler.workers as usize));
        let mut tasks = JoinSet::new();

        for community in communities {
            let fetcher = self.fetcher.clone();
            let base = self.site.base().clone();
            let permits = Arc::clone(&permits);
            let span = tracing::info_span!(parent: &self.span, "community", id = %community.id);

            tasks.spawn(
                async move {
                    let _permit = permits.acquire_owned().await;
                    let result = enumerate_users(&fetcher, &base, &community).await;
                    (community.id, result)
                }
                .instrument(span),
            );
        }

        let mut lists = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            let (community_id, result) = joined?;
            match result {
                Ok((users, stats)) => {
                    if stats.pages_failed > 0 {
                        tracing::warn!(
                            "Community {}: {} of {} member pages skipped",
                            community_id,
                            stats.pages_failed,
                            stats.total_pages
                        );
                    }
                    lists.push(users);
                }
                Err(e) => {
                    tracing::warn!("Community {} failed: {}", community_id, e);
                    report.failed_communities.push((community_id, e.to_string()));
                }
            }
        }

        Ok(merge_users(lists))
    }

    /// Extracts and persists every user that is not already on disk
    async fn extract_logs(
        &self,
        users: BTreeSet<UserId>,
        report: &mut CrawlReport,
    ) -> crate::Result<()> {
        let force = self.config.crawler.force;
        let permits = Arc::new(Semaphore::new(self.config.crawler.log_workers as usize));
        let mut tasks = JoinSet::new();
        let mut queued = 0;

        for user_id in users {
            if !force && self.output.is_materialized(&user_id) {
                tracing::debug!("Skipping {}: already harvested", user_id);
                report.record(user_id, UserOutcome::Skipped);
                continue;
            }

            let fetcher = self.fetcher.clone();
            let site = self.site.clone();
            let output = self.output.clone();
            let permits = Arc::clone(&permits);
            let span = tracing::info_span!(parent: &self.span, "user", id = %user_id);
            queued += 1;

            tasks.spawn(
                async move {
                    let _permit = permits.acquire_owned().await;
                    let outcome = harvest_user(&fetcher, &site, &output, &user_id).await;
                    (user_id, outcome)
                }
                .instrument(span),
            );
        }

        if report.users_skipped() > 0 {
            tracing::info!(
                "{} users already harvested; {} to extract",
                report.users_skipped(),
                queued
            );
        }

        let start_time = std::time::Instant::now();
        let mut processed = 0;
        while let Some(joined) = tasks.join_next().await {
            let (user_id, outcome) = joined?;
            match &outcome {
                UserOutcome::Failed { error } => {
                    tracing::error!("User {} failed: {}", user_id, error)
                }
                UserOutcome::Partial { failed_pages, .. } => {
                    tracing::warn!("User {}: {} pages skipped", user_id, failed_pages)
                }
                _ => tracing::debug!("User {}: {}", user_id, outcome.as_str()),
            }
            report.record(user_id, outcome);

            processed += 1;
            if processed % PROGRESS_EVERY == 0 || processed == queued {
                let rate = processed as f64 / start_time.elapsed().as_secs_f64().max(0.001);
                tracing::info!(
                    "Progress: {}/{} users processed, {:.2} users/sec",
                    processed,
                    queued,
                    rate
                );
            }
        }

        Ok(())
    }
}

/// Extracts one user's reading log and writes their tables
///
/// Nothing is written when the first page fails, so the user is retried on
/// the next run.
async fn harvest_user(
    fetcher: &PageFetcher,
    site: &SiteUrls,
    output: &OutputTree,
    user_id: &UserId,
) -> UserOutcome {
    let walk = extract_reading_log(fetcher, site, user_id);
    tracing::debug!("Extracting {} from {}", walk.user_id(), walk.url());
    let (tables, stats) = match walk.collect_tables().await {
        Ok(collected) => collected,
        Err(e) => {
            return UserOutcome::Failed {
                error: e.to_string(),
            }
        }
    };

    if let Err(e) = output.write_user(user_id, &tables) {
        return UserOutcome::Failed {
            error: e.to_string(),
        };
    }

    if stats.pages_failed > 0 {
        UserOutcome::Partial {
            entries: tables.len(),
            failed_pages: stats.pages_failed,
        }
    } else {
        UserOutcome::Completed {
            entries: tables.len(),
        }
    }
}

/// Runs a complete harvest
///
/// # Example
///
/// ```no_run
/// use bookmeter_harvest::config::load_config;
/// use bookmeter_harvest::crawler::{run_crawl, CrawlRequest};
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let report = run_crawl(config, CrawlRequest::default()).await?;
/// println!("{} users harvested", report.users_completed());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: Config, request: CrawlRequest) -> crate::Result<CrawlReport> {
    let mut coordinator = Coordinator::new(config)?;
    coordinator.run(request).await
}
