//! Pagination walker
//!
//! Drives the fetcher and parser across every page of one paginated
//! resource. The page count is read once from page 1 and trusted for the
//! rest of the walk. Pages are fetched one after another with the
//! configured delay in between.

use crate::crawler::fetcher::PageFetcher;
use crate::crawler::parser::{parse_page, parse_records, ParseContext};
use crate::model::{Record, RecordKind};
use std::collections::VecDeque;
use url::Url;

/// Page accounting for one walk
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Page count reported by page 1
    pub total_pages: u32,
    pub pages_ok: u32,
    /// Pages after the first that failed to fetch or parse and were skipped
    pub pages_failed: u32,
}

/// Lazy, non-restartable walk over one paginated resource
///
/// Requests are only issued as pages are pulled. Walking the same resource
/// again means building a new walker.
pub struct PageWalker {
    fetcher: PageFetcher,
    site_base: Url,
    url: Url,
    kind: RecordKind,
    next_page: u32,
    stats: WalkStats,
    pending: VecDeque<Record>,
    finished: bool,
}

/// Starts a walk over `url`, extracting records of `kind` from each page
pub fn walk(fetcher: &PageFetcher, site_base: &Url, url: Url, kind: RecordKind) -> PageWalker {
    PageWalker {
        fetcher: fetcher.clone(),
        site_base: site_base.clone(),
        url,
        kind,
        next_page: 1,
        stats: WalkStats::default(),
        pending: VecDeque::new(),
        finished: false,
    }
}

impl PageWalker {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn stats(&self) -> WalkStats {
        self.stats
    }

    /// Pulls the records of the next page
    ///
    /// Page 1 failing (after retries) fails the walk. Later pages that fail
    /// are logged, counted in `WalkStats::pages_failed` and skipped.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(records))` - The next page's records, possibly empty
    /// * `Ok(None)` - Every page has been pulled
    /// * `Err(HarvestError)` - Page 1 could not be fetched or parsed
    pub async fn next_page(&mut self) -> crate::Result<Option<Vec<Record>>> {
        if self.finished {
            return Ok(None);
        }

        if self.next_page == 1 {
            let first = self.first_page().await;
            if first.is_err() {
                self.finished = true;
            }
            return first.map(Some);
        }

        let delay = self.fetcher.crawler().page_delay();
        let mismatch = self.fetcher.crawler().row_mismatch;

        while self.next_page <= self.stats.total_pages {
            let page = self.next_page;
            self.next_page += 1;

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            tracing::debug!("{} page: {}/{}", self.url, page, self.stats.total_pages);
            let body = match self.fetcher.fetch_with_retry(&self.url, page).await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!("Skipping page {} of {}: {}", page, self.url, e);
                    self.stats.pages_failed += 1;
                    continue;
                }
            };

            let ctx = ParseContext {
                base_url: &self.site_base,
                mismatch,
            };
            match parse_records(&body, self.kind, &ctx) {
                Ok(records) => {
                    self.stats.pages_ok += 1;
                    return Ok(Some(records));
                }
                Err(e) => {
                    tracing::warn!("Skipping page {} of {}: {}", page, self.url, e);
                    self.stats.pages_failed += 1;
                }
            }
        }

        self.finished = true;
        Ok(None)
    }

    /// Pulls the next record, fetching further pages as needed
    pub async fn next_record(&mut self) -> crate::Result<Option<Record>> {
        loop {
            if let Some(record) = self.pending.pop_front() {
                return Ok(Some(record));
            }
            match self.next_page().await? {
                Some(records) => self.pending.extend(records),
                None => return Ok(None),
            }
        }
    }

    /// Drains the walk into one vector, in page order
    pub async fn collect_all(mut self) -> crate::Result<(Vec<Record>, WalkStats)> {
        let mut records = Vec::new();
        while let Some(page) = self.next_page().await? {
            records.extend(page);
        }
        Ok((records, self.stats))
    }

    /// Fetches page 1, which also fixes the page count for the walk
    async fn first_page(&mut self) -> crate::Result<Vec<Record>> {
        let body = self.fetcher.fetch_with_retry(&self.url, 1).await?;
        let ctx = ParseContext {
            base_url: &self.site_base,
            mismatch: self.fetcher.crawler().row_mismatch,
        };
        let parsed = parse_page(&body, self.kind, &ctx)?;

        tracing::info!(
            "{} listing {}: {} pages",
            self.kind.as_str(),
            self.url,
            parsed.max_pages
        );
        self.stats.total_pages = parsed.max_pages;
        self.stats.pages_ok = 1;
        self.next_page = 2;
        Ok(parsed.records)
    }
}
