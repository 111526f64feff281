//! URL handling module
//!
//! Helpers for building paginated request URLs and for pulling
//! identifiers out of link targets found on listing pages.

mod paging;
mod segments;

pub use paging::{child_url, with_page, PAGE_PARAM};
pub use segments::{trailing_segment, value_after_last_eq};

use crate::config::SiteConfig;
use url::Url;

/// Resolved endpoints of the source site
#[derive(Debug, Clone)]
pub struct SiteUrls {
    base: Url,
    community_listing: Url,
}

impl SiteUrls {
    /// Resolves the configured base URL and listing path
    pub fn from_config(site: &SiteConfig) -> Result<Self, url::ParseError> {
        let base = Url::parse(&site.base_url)?;
        let community_listing = base.join(&site.community_listing_path)?;
        Ok(Self {
            base,
            community_listing,
        })
    }

    /// Base URL that community paths are resolved against
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Community listing endpoint, without a page parameter
    pub fn community_listing(&self) -> &Url {
        &self.community_listing
    }

    /// Reading history endpoint of one user: `/users/{id}/books/read`
    pub fn reading_log(&self, user_id: &str) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .clear()
                .push("users")
                .push(user_id)
                .push("books")
                .push("read");
        }
        url
    }
}
