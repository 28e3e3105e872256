//! End-to-end resolver runs against a local mock site.

use bookhound::acquisition::http_client::HttpClient;
use bookhound::config::ResolverSettings;
use bookhound::extraction::resolver::{PdfResolver, ResolveStage};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PDF_SIZE: usize = 60 * 1024;

fn settings() -> ResolverSettings {
    ResolverSettings {
        max_wait: Duration::ZERO,
        poll_interval: Duration::from_millis(50),
        page_timeout: Duration::from_secs(5),
        probe_timeout: Duration::from_secs(5),
        ..ResolverSettings::default()
    }
}

fn resolver(settings: ResolverSettings) -> PdfResolver {
    PdfResolver::new(HttpClient::new(5_000), settings)
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body>{body}</body></html>"),
        "text/html; charset=utf-8",
    )
}

fn pdf(size: usize) -> ResponseTemplate {
    let mut bytes = b"%PDF-1.4\n".to_vec();
    bytes.resize(size, b'0');
    ResponseTemplate::new(200).set_body_raw(bytes, "application/pdf")
}

#[tokio::test]
async fn test_direct_pdf_url_needs_no_network() {
    let r = resolver(settings());
    let found = r
        .resolve("http://127.0.0.1:9/books/mother.pdf")
        .await
        .expect("direct link");
    assert_eq!(found.via, ResolveStage::Direct);
    assert_eq!(found.pdf_url, "http://127.0.0.1:9/books/mother.pdf");
}

#[tokio::test]
async fn test_anchor_on_book_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/book/1"))
        .respond_with(html(
            r#"<a href="/about">About</a><a class="btn" href="/files/book.pdf">تحميل</a>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(path("/files/book.pdf"))
        .respond_with(pdf(PDF_SIZE))
        .mount(&server)
        .await;

    let start = format!("{}/book/1", server.uri());
    let found = resolver(settings()).resolve(&start).await.expect("resolved");
    assert_eq!(found.via, ResolveStage::PageScan);
    assert_eq!(found.pdf_url, format!("{}/files/book.pdf", server.uri()));
    assert_eq!(found.referer, start);
}

#[tokio::test]
async fn test_small_file_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/book/2"))
        .respond_with(html(r#"<a href="/files/sample.pdf">sample</a>"#))
        .mount(&server)
        .await;
    Mock::given(path("/files/sample.pdf"))
        .respond_with(pdf(1024))
        .mount(&server)
        .await;

    let start = format!("{}/book/2", server.uri());
    assert!(resolver(settings()).resolve(&start).await.is_none());
}

#[tokio::test]
async fn test_download_form_is_submitted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/book/3"))
        .respond_with(html(
            r#"<form action="/get" method="post">
                 <input type="hidden" name="id" value="7">
                 <button type="submit">Download</button>
               </form>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/get"))
        .respond_with(html(r#"<a href="/files/form.pdf">here</a>"#))
        .mount(&server)
        .await;
    Mock::given(path("/files/form.pdf"))
        .respond_with(pdf(PDF_SIZE))
        .mount(&server)
        .await;

    let start = format!("{}/book/3", server.uri());
    let found = resolver(settings()).resolve(&start).await.expect("resolved");
    assert_eq!(found.pdf_url, format!("{}/files/form.pdf", server.uri()));
    assert_eq!(found.via, ResolveStage::PageScan);
}

#[tokio::test]
async fn test_countdown_page_is_polled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/book/4"))
        .respond_with(html("<p>يرجى الانتظار 5 ثوان</p>"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/book/4"))
        .respond_with(html(r#"<script>var link = "/files/late.pdf";</script><a href="/files/late.pdf">go</a>"#))
        .with_priority(2)
        .mount(&server)
        .await;
    Mock::given(path("/files/late.pdf"))
        .respond_with(pdf(PDF_SIZE))
        .mount(&server)
        .await;

    let mut s = settings();
    s.max_wait = Duration::from_millis(100);
    let start = format!("{}/book/4", server.uri());
    let found = resolver(s).resolve(&start).await.expect("resolved");
    assert_eq!(found.via, ResolveStage::Polling);
    assert!(found.pdf_url.ends_with("/files/late.pdf"));
}

#[tokio::test]
async fn test_redirect_onto_pdf() {
    let server = MockServer::start().await;
    Mock::given(path("/go/5"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/files/final.pdf", server.uri()).as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(path("/files/final.pdf"))
        .respond_with(pdf(PDF_SIZE))
        .mount(&server)
        .await;

    let start = format!("{}/go/5", server.uri());
    let found = resolver(settings()).resolve(&start).await.expect("resolved");
    assert_eq!(found.via, ResolveStage::Redirect);
    assert_eq!(found.pdf_url, format!("{}/files/final.pdf", server.uri()));
}

#[tokio::test]
async fn test_redirect_only_on_get() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .and(path("/go/7"))
        .respond_with(html("<p>landing</p>"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/go/7"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", format!("{}/files/gated.pdf", server.uri()).as_str()),
        )
        .mount(&server)
        .await;
    Mock::given(path("/files/gated.pdf"))
        .respond_with(pdf(PDF_SIZE))
        .mount(&server)
        .await;

    let start = format!("{}/go/7", server.uri());
    let found = resolver(settings()).resolve(&start).await.expect("resolved");
    assert_eq!(found.via, ResolveStage::Redirect);
    assert_eq!(found.pdf_url, format!("{}/files/gated.pdf", server.uri()));
    assert_eq!(found.referer, start);
}

#[tokio::test]
async fn test_nothing_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/book/6"))
        .respond_with(html("<p>لا يوجد ملف</p>"))
        .mount(&server)
        .await;

    let start = format!("{}/book/6", server.uri());
    let r = resolver(settings());
    assert!(!r.has_browser());
    assert!(r.resolve(&start).await.is_none());
}
