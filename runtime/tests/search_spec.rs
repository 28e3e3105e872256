//! Search backends against mock endpoints.

use bookhound::acquisition::http_client::HttpClient;
use bookhound::search::duckduckgo::DuckDuckGoSearch;
use bookhound::search::google::GoogleSearch;
use bookhound::search::SearchProvider;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_google_custom_search() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/customsearch/v1"))
        .and(query_param("key", "K"))
        .and(query_param("cx", "C"))
        .and(query_param("q", "ابن تيمية"))
        .and(query_param("num", "6"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [
                { "title": "مجموع <b>الفتاوى</b>", "link": "https://foulabook.com/b/1", "snippet": "تحميل &amp; قراءة" },
                { "title": "", "link": "https://archive.org/details/x" },
                { "title": "dup", "link": "https://foulabook.com/b/1" },
                { "title": "no link", "link": "" }
            ]
        })))
        .mount(&server)
        .await;

    let google = GoogleSearch::new(HttpClient::new(5_000), "K".into(), "C".into())
        .with_endpoint(format!("{}/customsearch/v1", server.uri()));
    let hits = google.search("ابن تيمية").await.unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(hits[0].title, "مجموع الفتاوى");
    assert_eq!(hits[0].snippet, "تحميل & قراءة");
    assert_eq!(hits[1].title, "https://archive.org/details/x");
}

#[tokio::test]
async fn test_google_without_items() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "kind": "customsearch#search" })))
        .mount(&server)
        .await;

    let google = GoogleSearch::new(HttpClient::new(5_000), "K".into(), "C".into())
        .with_endpoint(server.uri());
    assert!(google.search("x").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_google_error_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("quota exceeded"))
        .mount(&server)
        .await;

    let google = GoogleSearch::new(HttpClient::new(5_000), "K".into(), "C".into())
        .with_endpoint(server.uri());
    let err = google.search("x").await.unwrap_err();
    assert!(format!("{err:#}").contains("403"));
}

#[tokio::test]
async fn test_duckduckgo_html() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/html/"))
        .and(body_string_contains("filetype%3Apdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<div class="result"><a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fkotobati.com%2Fbook%2F5">كتاب</a>
               <a class="result__snippet">وصف</a></div>"#,
            "text/html",
        ))
        .mount(&server)
        .await;

    let ddg = DuckDuckGoSearch::new(HttpClient::new(5_000))
        .with_endpoint(format!("{}/html/", server.uri()));
    let hits = ddg.search("كتاب").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].link, "https://kotobati.com/book/5");
    assert_eq!(hits[0].snippet, "وصف");
}
