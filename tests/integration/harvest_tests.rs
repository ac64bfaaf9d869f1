//! Integration tests for the harvester
//!
//! These tests use wiremock to stand up a fake library origin and run the
//! full harvest end-to-end: catalog walk, detail pages, text and image
//! downloads, and the JSON result file.

use std::path::Path;
use tempfile::TempDir;
use tululu_harvest::config::Config;
use tululu_harvest::crawler::{Harvester, SkipReason, WalkEnd};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock origin
fn create_test_config(base_url: &str, dest: &Path) -> Config {
    let mut config = Config::default();
    config.site.base_url = base_url.to_string();
    config.output.dest_folder = dest.to_path_buf();
    config.retry.max_attempts = 3;
    config.retry.first_delay_ms = 0;
    config.retry.later_delay_ms = 0;
    config.http.timeout_secs = 5;
    config
}

fn catalog_html(item_paths: &[&str]) -> String {
    let tables: String = item_paths
        .iter()
        .map(|p| {
            format!(
                r#"<table class="d_book"><tr><td><a href="{p}"><img src="/images/x.jpg"></a></td></tr></table>"#
            )
        })
        .collect();
    format!(
        r#"<html><head><meta charset="utf-8"></head><body>{}</body></html>"#,
        tables
    )
}

fn detail_html(title: &str, author: &str, image_src: &str) -> String {
    format!(
        r#"<html><head><meta charset="utf-8"></head><body>
        <h1>{title} &nbsp; :: &nbsp; {author}</h1>
        <div class="bookimage"><img src="{image_src}"></div>
        <span class="d_book">Жанр книги: <a href="/l55/">Научная фантастика</a></span>
        <div class="texts"><span class="black">Отличная книга</span></div>
        </body></html>"#
    )
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

async fn mount_redirect(server: &MockServer, page_path: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/"))
        .mount(server)
        .await;
}

async fn mount_text(server: &MockServer, id: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path("/txt.php"))
        .and(query_param("id", id))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_image(server: &MockServer, image_path: &str, bytes: &[u8]) {
    Mock::given(method("GET"))
        .and(path(image_path))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(bytes.to_vec()))
        .mount(server)
        .await;
}

/// Three catalog pages: books 1 and 2 on page 1, book 3 on page 2, page 3 redirects
async fn mount_catalog(server: &MockServer) {
    mount_page(server, "/l55/1/", catalog_html(&["/b1/", "/b2/"])).await;
    mount_page(server, "/l55/2/", catalog_html(&["/b3/"])).await;
    mount_redirect(server, "/l55/3/").await;

    mount_page(server, "/b1/", detail_html("Солярис", "Лем Станислав", "/shots/1.jpg")).await;
    mount_text(server, "1", "Текст первой книги").await;
    mount_image(server, "/shots/1.jpg", b"first-cover").await;

    mount_page(server, "/b2/", detail_html("Пикник", "Стругацкие", "/shots/2.jpg")).await;
    mount_text(server, "2", "Текст второй книги").await;
    mount_image(server, "/shots/2.jpg", b"second-cover").await;

    mount_page(server, "/b3/", detail_html("Дюна", "Герберт Фрэнк", "/images/nopic.gif")).await;
    mount_text(server, "3", "Текст третьей книги").await;
    mount_image(server, "/images/nopic.gif", b"GIF89a").await;
}

fn read_results(dest: &Path) -> serde_json::Value {
    let written = std::fs::read_to_string(dest.join("books_data.json"))
        .expect("results file should exist");
    serde_json::from_str(&written).expect("results file should be valid JSON")
}

#[tokio::test]
async fn test_full_harvest() {
    let server = MockServer::start().await;
    mount_catalog(&server).await;

    let dest = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dest.path());

    let harvester = Harvester::new(config).expect("Failed to create harvester");
    let report = harvester.run().await.expect("Harvest failed");

    assert_eq!(report.pages_walked, 2);
    assert!(matches!(report.walk_end, Some(WalkEnd::NotFound { page: 3 })));
    assert!(report.skipped.is_empty(), "unexpected skips: {:?}", report.skipped);

    let titles: Vec<&str> = report.books.iter().map(|b| b.record.title.as_str()).collect();
    assert_eq!(titles, vec!["Солярис", "Пикник", "Дюна"]);

    let text = std::fs::read_to_string(dest.path().join("books").join("1.Солярис.txt")).unwrap();
    assert_eq!(text, "Текст первой книги");
    assert_eq!(
        std::fs::read(dest.path().join("images").join("2.jpg")).unwrap(),
        b"second-cover"
    );
    // The placeholder keeps its reserved name instead of the book id
    assert!(dest.path().join("images").join("nopic.gif").exists());
    assert!(!dest.path().join("images").join("3.gif").exists());

    let json = read_results(dest.path());
    assert_eq!(json.as_array().unwrap().len(), 3);
    assert_eq!(json[0]["title"], "Солярис");
    assert_eq!(json[0]["author"], "Лем Станислав");
    assert_eq!(json[0]["comments"][0], "Отличная книга");
    assert_eq!(json[0]["genres"][0], "Научная фантастика");
    assert!(json[2]["img_src"].as_str().unwrap().ends_with("nopic.gif"));
}

#[tokio::test]
async fn test_end_page_limits_walk() {
    let server = MockServer::start().await;
    mount_page(&server, "/l55/1/", catalog_html(&["/b1/"])).await;
    mount_page(&server, "/b1/", detail_html("Солярис", "Лем", "/shots/1.jpg")).await;
    mount_text(&server, "1", "text").await;
    mount_image(&server, "/shots/1.jpg", b"img").await;

    Mock::given(method("GET"))
        .and(path("/l55/2/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(catalog_html(&["/b2/"])))
        .expect(0)
        .mount(&server)
        .await;

    let dest = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri(), dest.path());
    config.pages.end = Some(1);

    let report = Harvester::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.books.len(), 1);
    assert!(matches!(report.walk_end, Some(WalkEnd::EndPage)));
}

#[tokio::test]
async fn test_failed_items_do_not_stop_the_run() {
    let server = MockServer::start().await;
    mount_page(&server, "/l55/1/", catalog_html(&["/b1/", "/b2/", "/b3/", "/b4/"])).await;
    mount_redirect(&server, "/l55/2/").await;

    // Book 1 no longer exists
    mount_redirect(&server, "/b1/").await;

    // Book 2 fails with a fixed status and must not be retried
    Mock::given(method("GET"))
        .and(path("/b2/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    // Book 3 has no text (the text endpoint redirects)
    mount_page(&server, "/b3/", detail_html("Без текста", "Автор", "/shots/3.jpg")).await;
    Mock::given(method("GET"))
        .and(path("/txt.php"))
        .and(query_param("id", "3"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/"))
        .mount(&server)
        .await;

    // Book 4 is fine apart from a missing cover
    mount_page(&server, "/b4/", detail_html("Без обложки", "Автор", "/shots/4.jpg")).await;
    mount_text(&server, "4", "text four").await;
    Mock::given(method("GET"))
        .and(path("/shots/4.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dest = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dest.path());
    let report = Harvester::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.books.len(), 1);
    assert_eq!(report.books[0].record.title, "Без обложки");
    assert!(report.books[0].text.is_some());
    assert!(report.books[0].image.is_none());

    let reasons: Vec<&SkipReason> = report.skipped.iter().map(|s| &s.reason).collect();
    assert_eq!(reasons.len(), 3);
    assert!(matches!(reasons[0], SkipReason::NotFound));
    assert!(matches!(reasons[1], SkipReason::PermanentHttp { status: 500 }));
    assert!(matches!(reasons[2], SkipReason::TextUnavailable(_)));

    let json = read_results(dest.path());
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert!(json[0]["img_src"].is_null());
    assert!(json[0]["book_path"].is_string());
}

#[tokio::test]
async fn test_skip_flags() {
    let server = MockServer::start().await;
    mount_page(&server, "/l55/1/", catalog_html(&["/b1/"])).await;
    mount_redirect(&server, "/l55/2/").await;
    mount_page(&server, "/b1/", detail_html("Солярис", "Лем", "/shots/1.jpg")).await;

    Mock::given(method("GET"))
        .and(path("/txt.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string("text"))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/shots/1.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"img".to_vec()))
        .expect(0)
        .mount(&server)
        .await;

    let dest = TempDir::new().unwrap();
    let mut config = create_test_config(&server.uri(), dest.path());
    config.download.skip_text = true;
    config.download.skip_images = true;

    let report = Harvester::new(config).unwrap().run().await.unwrap();
    assert_eq!(report.books.len(), 1);

    let json = read_results(dest.path());
    assert!(json[0]["img_src"].is_null());
    assert!(json[0]["book_path"].is_null());
    assert!(!dest.path().join("books").exists());
}

#[tokio::test]
async fn test_missing_first_page_yields_empty_results() {
    let server = MockServer::start().await;
    mount_redirect(&server, "/l55/1/").await;

    let dest = TempDir::new().unwrap();
    let config = create_test_config(&server.uri(), dest.path());
    let report = Harvester::new(config).unwrap().run().await.unwrap();

    assert_eq!(report.pages_walked, 0);
    assert!(report.books.is_empty());
    assert_eq!(read_results(dest.path()), serde_json::json!([]));
}
