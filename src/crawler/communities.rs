//! Community enumerator
//!
//! The community listing reports its size in the embedded JSON metadata
//! rather than in a pagination control, so it is paged directly by page
//! number instead of through the generic walker.

use crate::crawler::fetcher::PageFetcher;
use crate::crawler::parser::{communities_from_listing, parse_community_listing};
use crate::crawler::walker::WalkStats;
use crate::model::{Community, CommunityListing};
use crate::url::SiteUrls;
use scraper::Html;

/// Fetches listing pages `[start_page, start_page + count)` and flattens their communities
///
/// Order is preserved: page order, then array order within a page. A page
/// that fails is logged and skipped. A page without any resources means the
/// listing is exhausted and ends the enumeration early.
///
/// # Returns
///
/// The communities found and page accounting (`total_pages` is the number
/// of pages requested).
pub async fn enumerate_communities(
    fetcher: &PageFetcher,
    site: &SiteUrls,
    start_page: u32,
    count: u32,
) -> (Vec<Community>, WalkStats) {
    let mut communities = Vec::new();
    let mut stats = WalkStats {
        total_pages: count,
        ..WalkStats::default()
    };
    let delay = fetcher.crawler().page_delay();

    for (index, page) in (start_page..start_page.saturating_add(count)).enumerate() {
        if index > 0 && !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        tracing::debug!("{} page: {}", site.community_listing(), page);
        let body = match fetcher.fetch_with_retry(site.community_listing(), page).await {
            Ok(body) => body,
            Err(e) => {
                tracing::warn!("Skipping community listing page {}: {}", page, e);
                stats.pages_failed += 1;
                continue;
            }
        };

        let (listing, found) = match decode_listing(&body, site) {
            Ok(decoded) => decoded,
            Err(e) => {
                tracing::warn!("Skipping community listing page {}: {}", page, e);
                stats.pages_failed += 1;
                continue;
            }
        };
        stats.pages_ok += 1;

        if index == 0 {
            if let Some(available) = listing.page_count() {
                tracing::info!("Community listing reports {} pages", available);
            }
        }

        if found.is_empty() {
            tracing::info!("Community listing page {} is empty; stopping", page);
            break;
        }

        tracing::info!("Community listing page {}: {} communities", page, found.len());
        communities.extend(found);
    }

    (communities, stats)
}

fn decode_listing(body: &str, site: &SiteUrls) -> crate::Result<(CommunityListing, Vec<Community>)> {
    let document = Html::parse_document(body);
    let listing = parse_community_listing(&document)?;
    let communities = communities_from_listing(&listing, site.base())?;
    Ok((listing, communities))
}
