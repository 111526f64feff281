//! Reading-log extractor
//!
//! Walks one user's reading history and ties each row to that user.

use crate::crawler::fetcher::PageFetcher;
use crate::crawler::walker::{walk, PageWalker, WalkStats};
use crate::model::{ReadingLogRow, Record, RecordKind, UserId, UserTables};
use crate::url::SiteUrls;
use url::Url;

/// Lazy sequence of (book, author, entry) triples for one user
pub struct ReadingLogWalk {
    user_id: UserId,
    walker: PageWalker,
}

/// Starts extracting `user_id`'s reading history; no request is made yet
pub fn extract_reading_log(fetcher: &PageFetcher, site: &SiteUrls, user_id: &UserId) -> ReadingLogWalk {
    let url = site.reading_log(user_id.as_str());
    ReadingLogWalk {
        user_id: user_id.clone(),
        walker: walk(fetcher, site.base(), url, RecordKind::ReadingLog),
    }
}

impl ReadingLogWalk {
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    /// Reading history endpoint being walked
    pub fn url(&self) -> &Url {
        self.walker.url()
    }

    pub fn stats(&self) -> WalkStats {
        self.walker.stats()
    }

    /// Next triple in the site's native order (newest page first)
    pub async fn next_row(&mut self) -> crate::Result<Option<ReadingLogRow>> {
        while let Some(record) = self.walker.next_record().await? {
            if let Record::ReadingLog(log) = record {
                return Ok(Some(log.into_row(&self.user_id)));
            }
        }
        Ok(None)
    }

    /// Drains the walk into the three per-user tables
    pub async fn collect_tables(mut self) -> crate::Result<(UserTables, WalkStats)> {
        let mut tables = UserTables::default();
        while let Some(row) = self.next_row().await? {
            tables.push(row);
        }
        Ok((tables, self.stats()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CrawlerConfig, SiteConfig, UserAgentConfig};
    use std::sync::Arc;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn log_row(date: &str, book: &str, author: &str) -> String {
        format!(
            r#"<li class="group__book"><div class="book__detail">
                <div class="detail__date">{date}</div>
                <div class="detail__title"><a href="/books/{book}">Title {book}</a></div>
                <ul class="detail__authors"><li><a href="/search?author={author}">Name {author}</a></li></ul>
            </div></li>"#
        )
    }

    #[tokio::test]
    async fn test_rows_carry_user_and_shared_ids() {
        let server = MockServer::start().await;
        let page1 = format!(
            r#"<ul>{}{}</ul><a class="bm-pagination__link" href="/users/42/books/read?page=2">2</a>"#,
            log_row("2018/05/27", "b1", "a1"),
            log_row("2018/05/20", "b2", "a2")
        );
        let page2 = format!("<ul>{}</ul>", log_row("2017/12/31", "b3", "a1"));
        Mock::given(method("GET"))
            .and(path("/users/42/books/read"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page1))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/42/books/read"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_string(page2))
            .expect(1)
            .mount(&server)
            .await;

        let crawler = CrawlerConfig {
            page_delay_ms: 0,
            ..CrawlerConfig::default()
        };
        let fetcher =
            PageFetcher::from_config(&UserAgentConfig::default(), Arc::new(crawler)).unwrap();
        let site = SiteUrls::from_config(&SiteConfig {
            base_url: server.uri(),
            ..SiteConfig::default()
        })
        .unwrap();

        let walk = extract_reading_log(&fetcher, &site, &UserId::from("42"));
        let (tables, stats) = walk.collect_tables().await.unwrap();

        assert_eq!(tables.len(), 3);
        assert_eq!(stats.total_pages, 2);
        let book_ids: Vec<&str> = tables.books.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(book_ids, vec!["b1", "b2", "b3"]);
        assert_eq!(tables.authors[2].id, "a1");
        assert_eq!(tables.authors[2].name, "Name a1");
        for (entry, book) in tables.reading_logs.iter().zip(&tables.books) {
            assert_eq!(entry.user_id, "42");
            assert_eq!(entry.book_id, book.id);
        }
        assert_eq!(tables.reading_logs[2].read_date, "2017/12/31");
    }
}
