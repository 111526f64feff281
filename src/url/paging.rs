use url::Url;

/// Name of the query parameter every paginated endpoint accepts
pub const PAGE_PARAM: &str = "page";

/// Returns `url` with its `page` query parameter set to `page`
///
/// Other query parameters keep their order; an existing `page` parameter
/// is replaced rather than duplicated.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use bookmeter_harvest::url::with_page;
///
/// let base = Url::parse("https://bookmeter.com/communities?filter=none&page=9").unwrap();
/// assert_eq!(
///     with_page(&base, 2).as_str(),
///     "https://bookmeter.com/communities?filter=none&page=2"
/// );
/// ```
pub fn with_page(url: &Url, page: u32) -> Url {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != PAGE_PARAM)
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut paged = url.clone();
    paged.set_query(None);
    {
        let mut query = paged.query_pairs_mut();
        for (key, value) in &kept {
            query.append_pair(key, value);
        }
        query.append_pair(PAGE_PARAM, &page.to_string());
    }
    paged
}

/// Appends one path segment to `url`, e.g. `/communities/1` → `/communities/1/members`
///
/// Query and fragment are dropped. URLs that cannot carry a path are
/// returned unchanged apart from that.
pub fn child_url(url: &Url, segment: &str) -> Url {
    let mut child = url.clone();
    child.set_query(None);
    child.set_fragment(None);
    if let Ok(mut segments) = child.path_segments_mut() {
        segments.pop_if_empty().push(segment);
    }
    child
}
