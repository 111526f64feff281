//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the site and tempfile for the
//! output tree, and drive the full harvest cycle end-to-end.

use bookmeter_harvest::config::{Config, CrawlerConfig, OutputConfig, SiteConfig};
use bookmeter_harvest::crawler::{Coordinator, CrawlRequest};
use bookmeter_harvest::output::{read_table, Table};
use bookmeter_harvest::{Author, Book, CrawlPhase, ReadingLogEntry, UserId, UserOutcome};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, root: &Path, force: bool) -> Config {
    Config {
        crawler: CrawlerConfig {
            workers: 2,
            page_delay_ms: 0,
            max_retries: 0,
            force,
            ..CrawlerConfig::default()
        },
        site: SiteConfig {
            base_url: base_url.to_string(),
            ..SiteConfig::default()
        },
        output: OutputConfig {
            root_dir: root.to_string_lossy().into_owned(),
        },
        ..Config::default()
    }
}

fn member_page(users: &[&str]) -> String {
    users
        .iter()
        .map(|u| format!(r#"<li><div class="item__username"><a href="/users/{u}">{u}</a></div></li>"#))
        .collect()
}

fn log_page(user: &str) -> String {
    format!(
        r#"<ul>
            <li class="group__book"><div class="book__detail">
                <div class="detail__date">2018/05/27</div>
                <div class="detail__title"><a href="/books/{user}-b1">Book of {user}</a></div>
                <ul class="detail__authors"><li><a href="/search?author=a1">Author One</a></li></ul>
            </div></li>
            <li class="group__book"><div class="book__detail">
                <div class="detail__date">2018/05/20</div>
                <div class="detail__title"><a href="/books/shared">Tabbed&#9;"Title"</a></div>
                <ul class="detail__authors"><li><a href="/search?author=a2">Author Two</a></li></ul>
            </div></li>
        </ul>"#
    )
}

/// Mounts a listing page with two communities sharing member u2
async fn mount_site(server: &MockServer, log_requests: u64) {
    Mock::given(method("GET"))
        .and(path("/communities"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><p>{"metadata":{"count":2,"limit":20,"offset":0},"resources":[
                {"id":101,"path":"/communities/101","title":"First","member_count":2},
                {"id":"202","path":"/communities/202","title":"Second","member_count":2}
            ]}</p></body></html>"#,
        ))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/communities/101/members"))
        .respond_with(ResponseTemplate::new(200).set_body_string(member_page(&["u1", "u2"])))
        .expect(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/communities/202/members"))
        .respond_with(ResponseTemplate::new(200).set_body_string(member_page(&["u2", "u3"])))
        .expect(1)
        .mount(server)
        .await;

    for user in ["u1", "u2", "u3"] {
        Mock::given(method("GET"))
            .and(path(format!("/users/{}/books/read", user)))
            .respond_with(ResponseTemplate::new(200).set_body_string(log_page(user)))
            .expect(log_requests)
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn test_full_harvest_merges_users_and_writes_tables() {
    let server = MockServer::start().await;
    mount_site(&server, 1).await;
    let dir = TempDir::new().unwrap();

    let mut coordinator =
        Coordinator::new(create_test_config(&server.uri(), dir.path(), false)).unwrap();
    let report = coordinator.run(CrawlRequest::default()).await.unwrap();

    assert_eq!(coordinator.phase(), CrawlPhase::Done);
    assert_eq!(report.communities, 2);
    assert_eq!(report.users_discovered, 3);
    assert_eq!(report.users_completed(), 3);
    assert_eq!(report.users_failed(), 0);
    assert_eq!(report.entries_written(), 6);

    for user in ["u1", "u2", "u3"] {
        let user_dir = dir.path().join(user);
        for table in Table::ALL {
            assert!(
                table.path_in(&user_dir, user).is_file(),
                "missing {}",
                table.file_name(user)
            );
        }
    }

    let u2 = dir.path().join("u2");
    let books: Vec<Book> = read_table(&Table::Books.path_in(&u2, "u2")).unwrap();
    assert_eq!(books.len(), 2);
    assert_eq!(books[0].id, "u2-b1");
    assert_eq!(books[1].id, "shared");
    assert_eq!(books[1].title, "Tabbed\t\"Title\"");

    let authors: Vec<Author> = read_table(&Table::Authors.path_in(&u2, "u2")).unwrap();
    assert_eq!(authors[1].id, "a2");
    assert_eq!(authors[1].name, "Author Two");

    let logs: Vec<ReadingLogEntry> = read_table(&Table::ReadingLogs.path_in(&u2, "u2")).unwrap();
    assert_eq!(logs[0].read_date, "2018/05/27");
    assert!(logs.iter().all(|entry| entry.user_id == "u2"));
}

#[tokio::test]
async fn test_rerun_skips_harvested_users_without_requests() {
    let dir = TempDir::new().unwrap();

    {
        let server = MockServer::start().await;
        mount_site(&server, 1).await;
        let mut coordinator =
            Coordinator::new(create_test_config(&server.uri(), dir.path(), false)).unwrap();
        coordinator.run(CrawlRequest::default()).await.unwrap();
    }

    let server = MockServer::start().await;
    mount_site(&server, 0).await;
    let mut coordinator =
        Coordinator::new(create_test_config(&server.uri(), dir.path(), false)).unwrap();
    let report = coordinator.run(CrawlRequest::default()).await.unwrap();

    assert_eq!(report.users_discovered, 3);
    assert_eq!(report.users_skipped(), 3);
    assert_eq!(report.users_visited(), 0);
}

#[tokio::test]
async fn test_force_reharvests_existing_users() {
    let server = MockServer::start().await;
    mount_site(&server, 1).await;
    let dir = TempDir::new().unwrap();

    let stale = dir.path().join("u1");
    std::fs::create_dir_all(&stale).unwrap();
    std::fs::write(stale.join("u1-books.tsv"), "id\ttitle\nold\tOld\n").unwrap();

    let mut coordinator =
        Coordinator::new(create_test_config(&server.uri(), dir.path(), true)).unwrap();
    let report = coordinator.run(CrawlRequest::default()).await.unwrap();

    assert_eq!(report.users_skipped(), 0);
    assert_eq!(report.users_completed(), 3);
    let books: Vec<Book> = read_table(&Table::Books.path_in(&stale, "u1")).unwrap();
    assert_eq!(books[0].id, "u1-b1");
}

#[tokio::test]
async fn test_failed_user_is_not_persisted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/communities"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<p>{"resources":[{"id":1,"path":"/communities/1"}]}</p>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/communities/1/members"))
        .respond_with(ResponseTemplate::new(200).set_body_string(member_page(&["good", "gone"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/good/books/read"))
        .respond_with(ResponseTemplate::new(200).set_body_string(log_page("good")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/gone/books/read"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut coordinator =
        Coordinator::new(create_test_config(&server.uri(), dir.path(), false)).unwrap();
    let report = coordinator.run(CrawlRequest::default()).await.unwrap();

    assert_eq!(report.users_completed(), 1);
    assert_eq!(report.users_failed(), 1);
    let failures: Vec<_> = report.failures().collect();
    assert_eq!(failures[0].0.as_str(), "gone");
    assert!(dir.path().join("good").is_dir());
    assert!(!dir.path().join("gone").exists());
    assert!(!dir.path().join(".gone.partial").exists());
}

#[tokio::test]
async fn test_skipped_log_page_marks_user_partial() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/communities"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<p>{"resources":[{"id":1,"path":"/communities/1"}]}</p>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/communities/1/members"))
        .respond_with(ResponseTemplate::new(200).set_body_string(member_page(&["reader"])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/reader/books/read"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"{}<a class="bm-pagination__link" href="/users/reader/books/read?page=2">last</a>"#,
            log_page("reader")
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/reader/books/read"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut coordinator =
        Coordinator::new(create_test_config(&server.uri(), dir.path(), false)).unwrap();
    let report = coordinator.run(CrawlRequest::default()).await.unwrap();

    assert_eq!(
        report.outcomes,
        vec![(
            UserId::from("reader"),
            UserOutcome::Partial {
                entries: 2,
                failed_pages: 1
            }
        )]
    );
    assert!(dir.path().join("reader").is_dir());
}
