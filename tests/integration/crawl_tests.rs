//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and drive the
//! recursive crawl end-to-end against a temporary output directory.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use ton_harvest::config::Config;
use ton_harvest::crawler::{run_crawl, Crawler};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing into `dir` with no retry delay
fn create_test_config(seeds: Vec<String>, dir: &Path, max_depth: u32) -> Config {
    let mut config = Config::default();
    config.seeds = seeds;
    config.crawler.max_depth = max_depth;
    config.fetch.max_attempts = 5;
    config.fetch.retry_delay_ms = 0;
    config.fetch.timeout_secs = 5;
    config.output.directory = dir.display().to_string();
    config
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

async fn mount_page(server: &MockServer, route: &str, body: &str, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(body))
        .expect(times)
        .mount(server)
        .await;
}

fn url_of(server: &MockServer, route: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), route)).expect("Failed to parse mock URL")
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    mount_page(
        &server,
        "/",
        r#"<h1>Home</h1>
           <a href="/page1">Page 1</a>
           <a href="page2">Page 2</a>
           <a href="/files/whitepaper.pdf">Whitepaper</a>
           <script>ignored()</script>"#,
        1,
    )
    .await;
    mount_page(&server, "/page1", "<p>Content 1</p>", 1).await;
    mount_page(&server, "/page2", "<p>Content 2</p>", 1).await;
    Mock::given(method("GET"))
        .and(path("/files/whitepaper.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 fake".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(vec![format!("{}/", server.uri())], tmp.path(), 2);
    let report = run_crawl(&config).await.expect("Crawl failed");

    assert_eq!(report.total_links, 3);
    assert_eq!(report.pages_saved, 3);
    assert_eq!(report.downloads_succeeded, 1);
    assert_eq!(report.failures, 0);
    assert!(report.finished_at.is_some());

    let home = std::fs::read_to_string(tmp.path().join("127_0_0_1_.txt")).unwrap();
    assert!(home.contains("Home"));
    assert!(!home.contains("ignored()"));

    let page1 = std::fs::read_to_string(tmp.path().join("127_0_0_1_page1.txt")).unwrap();
    assert_eq!(page1, "Content 1");

    let pdf = std::fs::read(tmp.path().join("whitepaper.pdf")).unwrap();
    assert_eq!(pdf, b"%PDF-1.4 fake");
}

#[tokio::test]
async fn test_each_url_fetched_at_most_once() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    // / and /a link to each other and to themselves, several times over
    mount_page(
        &server,
        "/",
        r#"<a href="/a">A</a><a href="/a#top">A again</a><a href="/">Home</a>"#,
        1,
    )
    .await;
    mount_page(
        &server,
        "/a",
        r#"<a href="/">Home</a><a href="/a">Self</a><a href="/b">B</a>"#,
        1,
    )
    .await;
    mount_page(&server, "/b", r#"<a href="/a">A</a><a href="/">Home</a>"#, 1).await;

    let config = create_test_config(vec![], tmp.path(), 10);
    let mut crawler = Crawler::new(&config).unwrap();
    crawler.crawl(&url_of(&server, "/"), 10).await;

    assert_eq!(crawler.visited().len(), 3);
    let report = crawler.into_report();
    assert_eq!(report.total_links, 3);
    assert!(report.duplicates_skipped >= 5);
}

#[tokio::test]
async fn test_same_document_downloaded_once() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    mount_page(
        &server,
        "/",
        r#"<a href="/guide.docx">Guide</a><a href="/other">Other</a>"#,
        1,
    )
    .await;
    mount_page(&server, "/other", r#"<a href="/guide.docx">Guide</a>"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/guide.docx"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"docx".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(vec![], tmp.path(), 2);
    let mut crawler = Crawler::new(&config).unwrap();
    crawler.crawl(&url_of(&server, "/"), 2).await;

    let report = crawler.into_report();
    assert_eq!(report.downloads_succeeded, 1);
    assert_eq!(report.duplicates_skipped, 1);
}

#[tokio::test]
async fn test_crawl_with_depth_limit() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    // Chain: / -> /hop1 -> /hop2 -> /hop3
    mount_page(&server, "/", r#"<a href="/hop1">1</a>"#, 1).await;
    mount_page(&server, "/hop1", r#"<a href="/hop2">2</a>"#, 1).await;
    mount_page(&server, "/hop2", r#"<a href="/hop3">3</a>"#, 0).await;
    mount_page(&server, "/hop3", "end", 0).await;

    let config = create_test_config(vec![], tmp.path(), 2);
    let mut crawler = Crawler::new(&config).unwrap();
    crawler.crawl(&url_of(&server, "/"), 2).await;

    let report = crawler.into_report();
    assert_eq!(report.total_links, 2);
    assert_eq!(report.depth_exhausted, 1);
    assert!(!tmp.path().join("127_0_0_1_hop2.txt").exists());
}

#[tokio::test]
async fn test_documents_downloaded_at_last_depth() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    // A document on a depth-1 page is still downloaded; its page links are not
    mount_page(&server, "/", r#"<a href="/leaf">Leaf</a>"#, 1).await;
    mount_page(
        &server,
        "/leaf",
        r#"<a href="/manual.pdf">Manual</a><a href="/deeper">Deeper</a>"#,
        1,
    )
    .await;
    mount_page(&server, "/deeper", "too deep", 0).await;
    Mock::given(method("GET"))
        .and(path("/manual.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"pdf".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(vec![format!("{}/", server.uri())], tmp.path(), 2);
    let report = run_crawl(&config).await.expect("Crawl failed");

    assert_eq!(report.downloads_succeeded, 1);
    assert!(tmp.path().join("manual.pdf").exists());
}

#[tokio::test]
async fn test_cross_domain_links_not_crawled() {
    let home = MockServer::start().await;
    let elsewhere = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    mount_page(
        &home,
        "/",
        &format!(
            r#"<a href="{0}/page">External page</a>
               <a href="{0}/paper.pdf">External paper</a>
               <a href="https://example.invalid/">Unreachable host</a>"#,
            elsewhere.uri()
        ),
        1,
    )
    .await;
    mount_page(&elsewhere, "/page", "never fetched", 0).await;
    Mock::given(method("GET"))
        .and(path("/paper.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"paper".to_vec()))
        .expect(1)
        .mount(&elsewhere)
        .await;

    let config = create_test_config(vec![], tmp.path(), 3);
    let mut crawler = Crawler::new(&config).unwrap();
    crawler.crawl(&url_of(&home, "/"), 3).await;

    let report = crawler.into_report();
    assert_eq!(report.total_links, 1);
    assert_eq!(report.external_ignored, 2);
    assert_eq!(report.downloads_succeeded, 1);
    assert_eq!(report.failures, 0);
}

#[tokio::test]
async fn test_download_succeeds_after_retries() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    mount_page(&server, "/", r#"<a href="/flaky.pdf">Flaky</a>"#, 1).await;
    Mock::given(method("GET"))
        .and(path("/flaky.pdf"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(3)
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"finally".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(vec![], tmp.path(), 1);
    let mut crawler = Crawler::new(&config).unwrap();
    crawler.crawl(&url_of(&server, "/"), 1).await;

    let report = crawler.into_report();
    assert_eq!(report.downloads_succeeded, 1);
    assert_eq!(report.failures, 0);
    assert_eq!(std::fs::read(tmp.path().join("flaky.pdf")).unwrap(), b"finally");
}

#[tokio::test]
async fn test_page_404_on_every_attempt_counts_one_failure() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(5)
        .mount(&server)
        .await;

    let config = create_test_config(vec![], tmp.path(), 2);
    let mut crawler = Crawler::new(&config).unwrap();
    crawler.crawl(&url_of(&server, "/missing"), 2).await;

    let report = crawler.into_report();
    assert_eq!(report.failures, 1);
    assert_eq!(report.total_links, 1);
    assert_eq!(report.pages_saved, 0);
}

#[tokio::test]
async fn test_download_404_leaves_no_file() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/gone.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .expect(5)
        .mount(&server)
        .await;

    let config = create_test_config(vec![], tmp.path(), 1);
    let mut crawler = Crawler::new(&config).unwrap();
    let target = tmp.path().join("gone.pdf");
    let ok = crawler.download(&url_of(&server, "/gone.pdf"), &target).await;

    assert!(!ok);
    assert!(!target.exists());
    let report = crawler.into_report();
    assert_eq!(report.failures, 1);
    assert_eq!(report.downloads_succeeded, 0);
}

#[tokio::test]
async fn test_failed_seed_does_not_stop_run() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(503))
        .expect(5)
        .mount(&server)
        .await;
    mount_page(&server, "/up", "<p>Alive</p>", 1).await;

    let config = create_test_config(
        vec![
            format!("{}/down", server.uri()),
            "not a url".to_string(),
            format!("{}/up", server.uri()),
        ],
        tmp.path(),
        2,
    );
    let report = run_crawl(&config).await.expect("Crawl failed");

    assert_eq!(report.failures, 2);
    assert_eq!(report.pages_saved, 1);
    assert!(tmp.path().join("127_0_0_1_up.txt").exists());
}

#[tokio::test]
async fn test_seed_linked_from_earlier_seed_fetched_once() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    mount_page(&server, "/first", r#"<a href="/second">Second</a>"#, 1).await;
    mount_page(&server, "/second", "<p>Second</p>", 1).await;

    let config = create_test_config(
        vec![
            format!("{}/first", server.uri()),
            format!("{}/second", server.uri()),
        ],
        tmp.path(),
        2,
    );
    let report = run_crawl(&config).await.expect("Crawl failed");

    assert_eq!(report.total_links, 2);
    assert_eq!(report.duplicates_skipped, 1);
}

#[tokio::test]
async fn test_links_resolve_against_redirect_target() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", "/docs/start"),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/docs/start", r#"<a href="next">Next</a>"#, 1).await;
    mount_page(&server, "/docs/next", "<p>Next</p>", 1).await;

    let config = create_test_config(vec![], tmp.path(), 2);
    let mut crawler = Crawler::new(&config).unwrap();
    crawler.crawl(&url_of(&server, "/old"), 2).await;

    let report = crawler.into_report();
    assert_eq!(report.pages_saved, 2);
    assert!(tmp.path().join("127_0_0_1_docs_start.txt").exists());
    assert!(!tmp.path().join("127_0_0_1_old.txt").exists());
}

#[tokio::test]
async fn test_redirect_target_fetched_once() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/new", r#"<a href="/new">Self</a><a href="/old">Old</a>"#, 1).await;

    let config = create_test_config(vec![], tmp.path(), 3);
    let mut crawler = Crawler::new(&config).unwrap();
    crawler.crawl(&url_of(&server, "/old"), 3).await;

    assert!(crawler.visited().contains(url_of(&server, "/new").as_str()));
    let report = crawler.into_report();
    assert_eq!(report.pages_saved, 1);
    assert_eq!(report.duplicates_skipped, 2);
}

#[tokio::test]
async fn test_redirect_to_visited_page_is_not_saved_again() {
    let server = MockServer::start().await;
    let tmp = tempfile::tempdir().unwrap();

    // The second request is the client following the redirect from /old
    mount_page(&server, "/new", "<p>New</p>", 2).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new"))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(
        vec![
            format!("{}/new", server.uri()),
            format!("{}/old", server.uri()),
        ],
        tmp.path(),
        2,
    );
    let report = run_crawl(&config).await.expect("Crawl failed");

    assert_eq!(report.pages_saved, 1);
    assert_eq!(report.duplicates_skipped, 1);
    assert_eq!(report.failures, 0);
}

/// Serves one response per connection: the first cuts the body short, the
/// rest send it whole. Returns the page URL and a request counter.
async fn spawn_truncating_server() -> (Url, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&hits);

    tokio::spawn(async move {
        let body = "<html><body><p>Recovered</p></body></html>";
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;

            let response = if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 100\r\n\
                 Connection: close\r\n\r\n<html><bo"
                    .to_string()
            } else {
                format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\
                     Connection: close\r\n\r\n{}",
                    body.len(),
                    body
                )
            };
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        }
    });

    let url = Url::parse(&format!("http://{}/page", addr)).unwrap();
    (url, hits)
}

#[tokio::test]
async fn test_truncated_body_is_retried() {
    let tmp = tempfile::tempdir().unwrap();
    let (url, hits) = spawn_truncating_server().await;

    let config = create_test_config(vec![], tmp.path(), 1);
    let mut crawler = Crawler::new(&config).unwrap();
    crawler.crawl(&url, 1).await;

    let report = crawler.into_report();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(report.failures, 0);
    assert_eq!(report.pages_saved, 1);
    let text = std::fs::read_to_string(tmp.path().join("127_0_0_1_page.txt")).unwrap();
    assert_eq!(text, "Recovered");
}
