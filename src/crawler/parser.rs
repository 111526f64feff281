//! Document parser for listing pages
//!
//! This module turns one page of markup into typed records:
//! - Page count from the pagination control
//! - Communities from the embedded JSON payload of the community listing
//! - User handles from community member listings
//! - Reading-log rows from a user's reading history

use crate::config::MismatchPolicy;
use crate::model::{Author, Book, Community, CommunityListing, LogRecord, Record, RecordKind, UserId};
use crate::url::{trailing_segment, value_after_last_eq};
use crate::{DataIntegrityError, ParseError};
use scraper::{ElementRef, Html, Selector};
use url::Url;

const PAGINATION_LINK: &str = "a.bm-pagination__link";
const COMMUNITY_PAYLOAD: &str = "p";
const USERNAME: &str = ".item__username";
const LOG_ROW: &str = ".book__detail";
const LOG_DATE: &str = ".detail__date";
const LOG_TITLE: &str = ".detail__title";
const LOG_AUTHORS: &str = ".detail__authors";
const LINK: &str = "a[href]";

/// Settings the parser needs beyond the document itself
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    /// Base URL that community paths are resolved against
    pub base_url: &'a Url,
    /// What to do when positional reading-log lists differ in length
    pub mismatch: MismatchPolicy,
}

/// Everything extracted from one page
#[derive(Debug, Clone)]
pub struct ParsedPage {
    /// Page count reported by the pagination control (1 when absent)
    pub max_pages: u32,
    pub records: Vec<Record>,
}

/// Parses a page body once and extracts both its page count and records
///
/// The parsed document never outlives this call, so callers can hold the
/// result across `.await` points.
pub fn parse_page(body: &str, kind: RecordKind, ctx: &ParseContext<'_>) -> crate::Result<ParsedPage> {
    let document = Html::parse_document(body);
    let max_pages = max_page_count(&document)?;
    let records = extract_records(&document, kind, ctx)?;
    Ok(ParsedPage { max_pages, records })
}

/// Parses a page body for its records only
///
/// Used for every page after the first, whose page count is already known;
/// the pagination control of later pages is never read.
pub fn parse_records(body: &str, kind: RecordKind, ctx: &ParseContext<'_>) -> crate::Result<Vec<Record>> {
    let document = Html::parse_document(body);
    extract_records(&document, kind, ctx)
}

/// Reads the total page count from the pagination control
///
/// The last pagination link points at the final page (`...?page=N`). A
/// listing without a pagination control is a single page.
pub fn max_page_count(document: &Html) -> Result<u32, ParseError> {
    let links = selector(PAGINATION_LINK)?;
    let Some(last) = document.select(&links).last() else {
        return Ok(1);
    };

    let href = last.value().attr("href").unwrap_or_default();
    value_after_last_eq(href)
        .trim()
        .parse::<u32>()
        .map(|pages| pages.max(1))
        .map_err(|_| ParseError::Pagination {
            href: href.to_string(),
        })
}

/// Extracts the records of `kind` from a document
pub fn extract_records(
    document: &Html,
    kind: RecordKind,
    ctx: &ParseContext<'_>,
) -> crate::Result<Vec<Record>> {
    let records = match kind {
        RecordKind::Community => {
            let listing = parse_community_listing(document)?;
            communities_from_listing(&listing, ctx.base_url)?
                .into_iter()
                .map(Record::Community)
                .collect()
        }
        RecordKind::User => extract_user_ids(document)?
            .into_iter()
            .map(Record::User)
            .collect(),
        RecordKind::ReadingLog => extract_log_records(document, ctx.mismatch)?
            .into_iter()
            .map(Record::ReadingLog)
            .collect(),
    };
    Ok(records)
}

/// Decodes the JSON payload embedded in a community listing response
///
/// The payload is the text of the first `<p>` node. A bare JSON response
/// has no such node, in which case the whole document text is used.
pub fn parse_community_listing(document: &Html) -> Result<CommunityListing, ParseError> {
    let payload = selector(COMMUNITY_PAYLOAD)?;
    let text: String = match document.select(&payload).next() {
        Some(node) => node.text().collect(),
        None => document.root_element().text().collect(),
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(ParseError::MissingNode {
            selector: COMMUNITY_PAYLOAD.to_string(),
        });
    }

    Ok(serde_json::from_str(text)?)
}

/// Resolves every resource of a listing into a community, in array order
pub fn communities_from_listing(
    listing: &CommunityListing,
    base_url: &Url,
) -> Result<Vec<Community>, url::ParseError> {
    listing
        .resources()
        .iter()
        .map(|resource| Community::from_resource(resource, base_url))
        .collect()
}

/// Extracts user handles from a community member listing
///
/// The handle is the trailing path segment of the first link inside each
/// `.item__username` node.
pub fn extract_user_ids(document: &Html) -> Result<Vec<UserId>, ParseError> {
    let rows = selector(USERNAME)?;
    let link = selector(LINK)?;

    let ids = document
        .select(&rows)
        .filter_map(|row| row.select(&link).next())
        .filter_map(|anchor| anchor.value().attr("href"))
        .map(trailing_segment)
        .filter(|id| !id.is_empty())
        .map(UserId::from)
        .collect();

    Ok(ids)
}

/// Extracts reading-log rows from a user's reading history page
///
/// Each `.book__detail` node is one row holding the date, the title link
/// and the author links. Rows without a title or author link are dropped.
///
/// Pages without row containers fall back to three flat lists zipped by
/// position; when their lengths differ, `mismatch` decides between keeping
/// the shortest length and failing the page.
pub fn extract_log_records(
    document: &Html,
    mismatch: MismatchPolicy,
) -> crate::Result<Vec<LogRecord>> {
    let rows = selector(LOG_ROW)?;
    let date = selector(LOG_DATE)?;
    let title = selector(LOG_TITLE)?;
    let authors = selector(LOG_AUTHORS)?;
    let link = selector(LINK)?;

    let row_nodes: Vec<ElementRef<'_>> = document.select(&rows).collect();
    if !row_nodes.is_empty() {
        let mut records = Vec::with_capacity(row_nodes.len());
        let mut incomplete = 0;
        for row in row_nodes {
            let read_date = row.select(&date).next().map(element_text).unwrap_or_default();
            let title_link = row
                .select(&title)
                .next()
                .and_then(|node| node.select(&link).next());
            let author_link = row
                .select(&authors)
                .next()
                .and_then(|node| node.select(&link).next());

            match (title_link, author_link) {
                (Some(title_link), Some(author_link)) => {
                    records.push(log_record(read_date, title_link, author_link));
                }
                _ => incomplete += 1,
            }
        }
        if incomplete > 0 {
            tracing::warn!("Dropped {} reading-log rows missing a title or author", incomplete);
        }
        return Ok(records);
    }

    let dates: Vec<String> = document.select(&date).map(element_text).collect();
    let author_links: Vec<Option<ElementRef<'_>>> = document
        .select(&authors)
        .map(|node| node.select(&link).next())
        .collect();
    let title_links: Vec<Option<ElementRef<'_>>> = document
        .select(&title)
        .map(|node| node.select(&link).next())
        .collect();

    if dates.len() != author_links.len() || dates.len() != title_links.len() {
        let counts = DataIntegrityError {
            dates: dates.len(),
            authors: author_links.len(),
            titles: title_links.len(),
        };
        match mismatch {
            MismatchPolicy::Reject => return Err(counts.into()),
            MismatchPolicy::Truncate => {
                let kept = counts.dates.min(counts.authors).min(counts.titles);
                tracing::warn!("{}; keeping the first {} rows", counts, kept);
            }
        }
    }

    let records = dates
        .into_iter()
        .zip(author_links)
        .zip(title_links)
        .filter_map(|((read_date, author_link), title_link)| {
            Some(log_record(read_date, title_link?, author_link?))
        })
        .collect();

    Ok(records)
}

fn log_record(read_date: String, title_link: ElementRef<'_>, author_link: ElementRef<'_>) -> LogRecord {
    let title_href = title_link.value().attr("href").unwrap_or_default();
    let author_href = author_link.value().attr("href").unwrap_or_default();

    LogRecord {
        read_date,
        book: Book {
            id: trailing_segment(title_href).to_string(),
            title: element_text(title_link),
        },
        author: Author {
            id: value_after_last_eq(author_href).to_string(),
            name: element_text(author_link),
        },
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn selector(css: &str) -> Result<Selector, ParseError> {
    Selector::parse(css).map_err(|e| ParseError::InvalidSelector(format!("{}: {:?}", css, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HarvestError;

    fn base_url() -> Url {
        Url::parse("https://bookmeter.com").unwrap()
    }

    fn parse(body: &str, kind: RecordKind, mismatch: MismatchPolicy) -> crate::Result<ParsedPage> {
        let base = base_url();
        let ctx = ParseContext {
            base_url: &base,
            mismatch,
        };
        parse_page(body, kind, &ctx)
    }

    fn log_records(body: &str, mismatch: MismatchPolicy) -> crate::Result<Vec<LogRecord>> {
        extract_log_records(&Html::parse_document(body), mismatch)
    }

    #[test]
    fn test_no_pagination_is_one_page() {
        let html = Html::parse_document("<html><body><p>nothing here</p></body></html>");
        assert_eq!(max_page_count(&html).unwrap(), 1);
    }

    #[test]
    fn test_page_count_from_last_link() {
        let html = Html::parse_document(
            r#"<ul class="bm-pagination">
                <li><a class="bm-pagination__link" href="/users/1/books/read?page=2">2</a></li>
                <li><a class="bm-pagination__link" href="/users/1/books/read?page=3">3</a></li>
                <li><a class="bm-pagination__link" href="/users/1/books/read?page=42">last</a></li>
            </ul>"#,
        );
        assert_eq!(max_page_count(&html).unwrap(), 42);
    }

    #[test]
    fn test_unreadable_page_count() {
        let html = Html::parse_document(
            r#"<a class="bm-pagination__link" href="/members?page=last">last</a>"#,
        );
        assert!(matches!(
            max_page_count(&html),
            Err(ParseError::Pagination { .. })
        ));
    }

    #[test]
    fn test_extract_user_ids() {
        let body = r#"<html><body>
            <div class="item__username"><a href="/users/u1">Alice</a></div>
            <div class="item__username"><a href="/users/u2">Bob</a></div>
            <div class="item__username">no link</div>
        </body></html>"#;
        let page = parse(body, RecordKind::User, MismatchPolicy::Truncate).unwrap();
        assert_eq!(page.max_pages, 1);
        assert_eq!(
            page.records,
            vec![
                Record::User(UserId::from("u1")),
                Record::User(UserId::from("u2"))
            ]
        );
    }

    #[test]
    fn test_community_payload_in_paragraph() {
        let body = r#"<html><body><p>{"metadata": {"count": 2, "limit": 20},
            "resources": [{"id": 1, "path": "/communities/1", "title": "A"},
                          {"id": 2, "path": "/communities/2"}]}</p></body></html>"#;
        let page = parse(body, RecordKind::Community, MismatchPolicy::Truncate).unwrap();
        assert_eq!(page.records.len(), 2);
        match &page.records[1] {
            Record::Community(community) => {
                assert_eq!(community.id, "2");
                assert_eq!(
                    community.members_url.as_str(),
                    "https://bookmeter.com/communities/2/members"
                );
            }
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn test_bare_json_community_payload() {
        let body = r#"{"resources": [{"id": 5, "path": "/communities/5"}]}"#;
        let page = parse(body, RecordKind::Community, MismatchPolicy::Truncate).unwrap();
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.records[0].kind(), RecordKind::Community);
    }

    #[test]
    fn test_missing_community_payload() {
        let result = parse(
            "<html><body></body></html>",
            RecordKind::Community,
            MismatchPolicy::Truncate,
        );
        assert!(matches!(
            result,
            Err(HarvestError::Parse(ParseError::MissingNode { .. }))
        ));
    }

    #[test]
    fn test_malformed_community_payload() {
        let result = parse("<p>{not json</p>", RecordKind::Community, MismatchPolicy::Truncate);
        assert!(matches!(result, Err(HarvestError::Parse(ParseError::Json(_)))));
    }

    #[test]
    fn test_reading_log_rows() {
        let body = r#"<html><body><ul>
            <li class="group__book"><div class="book__detail">
                <div class="detail__date">2018/05/27</div>
                <div class="detail__title"><a href="/books/111">Kokoro</a></div>
                <ul class="detail__authors"><li><a href="/search?author=%E5%A4%8F%E7%9B%AE">Natsume Soseki</a></li></ul>
            </div></li>
            <li class="group__book"><div class="book__detail">
                <div class="detail__date">2018/05/20</div>
                <div class="detail__title"><a href="/books/222">Rashomon</a></div>
                <ul class="detail__authors"><li><a href="/search?author=Akutagawa">Akutagawa</a></li></ul>
            </div></li>
        </ul></body></html>"#;
        let records = log_records(body, MismatchPolicy::Reject).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].read_date, "2018/05/27");
        assert_eq!(records[0].book.id, "111");
        assert_eq!(records[0].book.title, "Kokoro");
        assert_eq!(records[0].author.id, "%E5%A4%8F%E7%9B%AE");
        assert_eq!(records[0].author.name, "Natsume Soseki");
        assert_eq!(records[1].book.id, "222");
        assert_eq!(records[1].author.id, "Akutagawa");
    }

    #[test]
    fn test_row_without_title_is_dropped() {
        let body = r#"
            <div class="book__detail">
                <div class="detail__date">2018/01/01</div>
                <ul class="detail__authors"><li><a href="/search?author=x">X</a></li></ul>
            </div>
            <div class="book__detail">
                <div class="detail__date">2018/01/02</div>
                <div class="detail__title"><a href="/books/9">Nine</a></div>
                <ul class="detail__authors"><li><a href="/search?author=y">Y</a></li></ul>
            </div>"#;
        let records = log_records(body, MismatchPolicy::Reject).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].book.id, "9");
    }

    const FLAT_MISMATCH: &str = r#"<html><body>
        <div class="detail__date">2018/03/03</div>
        <div class="detail__date">2018/02/02</div>
        <div class="detail__date">2018/01/01</div>
        <ul class="detail__authors"><li><a href="/search?author=a1">A1</a></li></ul>
        <ul class="detail__authors"><li><a href="/search?author=a2">A2</a></li></ul>
        <ul class="detail__authors"><li><a href="/search?author=a3">A3</a></li></ul>
        <div class="detail__title"><a href="/books/b1">B1</a></div>
        <div class="detail__title"><a href="/books/b2">B2</a></div>
    </body></html>"#;

    #[test]
    fn test_flat_lists_truncate_to_shortest() {
        let records = log_records(FLAT_MISMATCH, MismatchPolicy::Truncate).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].read_date, "2018/03/03");
        assert_eq!(records[0].book.id, "b1");
        assert_eq!(records[0].author.id, "a1");
        assert_eq!(records[1].read_date, "2018/02/02");
        assert_eq!(records[1].book.title, "B2");
    }

    #[test]
    fn test_flat_lists_reject_policy() {
        let result = log_records(FLAT_MISMATCH, MismatchPolicy::Reject);
        match result {
            Err(HarvestError::DataIntegrity(counts)) => {
                assert_eq!(counts.dates, 3);
                assert_eq!(counts.authors, 3);
                assert_eq!(counts.titles, 2);
            }
            other => panic!("expected data integrity error, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_reading_log_page() {
        let records = log_records("<html><body></body></html>", MismatchPolicy::Reject).unwrap();
        assert!(records.is_empty());
    }
}
