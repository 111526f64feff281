//! Community listing payloads
//!
//! The community listing is rendered client-side; the server embeds the
//! data as JSON shaped like:
//!
//! ```json
//! {"metadata": {"count": 1909, "limit": 20, "offset": 0, "order": "desc", "sort": "member_count"},
//!  "resources": [{"id": 331614, "path": "/communities/331614", "title": "...", "member_count": 5335,
//!                 "user": {"id": 116513, "name": "...", "path": "/users/116513"}}]}
//! ```

use serde::Deserialize;
use std::fmt;
use url::Url;

/// An identifier the site emits either as a number or as a string
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Number(u64),
    Text(String),
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Decoded payload of one community listing page
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommunityListing {
    pub metadata: Option<ListingMetadata>,
    pub resources: Option<Vec<CommunityResource>>,
}

impl CommunityListing {
    /// Number of listing pages the site reports, when metadata allows computing it
    pub fn page_count(&self) -> Option<u64> {
        let metadata = self.metadata.as_ref()?;
        let count = metadata.count?;
        let limit = metadata.limit.filter(|l| *l > 0)?;
        Some(count.div_ceil(limit))
    }

    /// Resources on this page; an absent array is treated as empty
    pub fn resources(&self) -> &[CommunityResource] {
        self.resources.as_deref().unwrap_or_default()
    }
}

/// Paging metadata of the community listing
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ListingMetadata {
    pub count: Option<u64>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub order: Option<String>,
    pub sort: Option<String>,
}

/// One community entry in the listing
#[derive(Debug, Clone, Deserialize)]
pub struct CommunityResource {
    pub id: ResourceId,
    /// Site-relative path, e.g. `/communities/331614`
    pub path: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub member_count: Option<u64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub user: Option<CommunityOwner>,
}

/// The user who administers a community
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommunityOwner {
    pub id: Option<ResourceId>,
    pub name: Option<String>,
    pub path: Option<String>,
    pub image: Option<String>,
}

/// A community resolved against the site's base URL
///
/// Only lives for the duration of user discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Community {
    pub id: String,
    pub title: Option<String>,
    pub url: Url,
    pub members_url: Url,
    pub member_count: Option<u64>,
}

impl Community {
    /// Builds a community from a listing resource
    pub fn from_resource(resource: &CommunityResource, base_url: &Url) -> Result<Self, url::ParseError> {
        let url = base_url.join(&resource.path)?;
        let members_url = crate::url::child_url(&url, "members");

        Ok(Self {
            id: resource.id.to_string(),
            title: resource.title.clone(),
            url,
            members_url,
            member_count: resource.member_count,
        })
    }
}
