//! User enumerator
//!
//! Walks a community's member listing and collects user handles.

use crate::crawler::fetcher::PageFetcher;
use crate::crawler::walker::{walk, WalkStats};
use crate::model::{Community, Record, RecordKind, UserId};
use std::collections::BTreeSet;
use url::Url;

/// Collects every member handle of one community, in listing order
///
/// May contain duplicates if the site lists a member twice; de-duplication
/// happens when lists from all communities are merged.
pub async fn enumerate_users(
    fetcher: &PageFetcher,
    site_base: &Url,
    community: &Community,
) -> crate::Result<(Vec<UserId>, WalkStats)> {
    let walker = walk(
        fetcher,
        site_base,
        community.members_url.clone(),
        RecordKind::User,
    );
    let (records, stats) = walker.collect_all().await?;

    let users = records
        .into_iter()
        .filter_map(|record| match record {
            Record::User(id) => Some(id),
            _ => None,
        })
        .collect::<Vec<_>>();

    tracing::debug!(
        "Community {} yielded {} members",
        community.id,
        users.len()
    );
    Ok((users, stats))
}

/// Merges per-community member lists into one set keyed by handle equality
///
/// A user listed in several communities appears once. Iteration order is
/// sorted by handle.
pub fn merge_users<I>(lists: I) -> BTreeSet<UserId>
where
    I: IntoIterator<Item = Vec<UserId>>,
{
    lists.into_iter().flatten().collect()
}
