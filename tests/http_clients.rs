//! The HTTP archive client and article extractor against a local server.
//! Both clients are blocking, so the server runs on its own thread and
//! runtime and the tests themselves stay plain `#[test]`s.

mod common;

use axum::extract::Query;
use axum::http::{header, StatusCode};
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use common::BASE_TS;
use parking_lot::Mutex;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use subharvest::{
    aggregate_comments, fetch_submissions, scrape_content, ArchiveClient, ArticleExtractor, CommentQuery, Harvest,
    HtmlArticleExtractor, PushshiftClient, SubmissionQuery, TimeWindow, NOT_AVAILABLE,
};

const UA: &str = "subharvest-tests";

type Params = HashMap<String, String>;

/// Serve `app` on an ephemeral local port and return its base URL.
fn serve(app: Router) -> String {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });
    format!("http://{}", rx.recv().unwrap())
}

fn pages() -> Router {
    Router::new()
        .route(
            "/article",
            get(|| async {
                Html(
                    "<html><body><nav><p>Menu</p></nav>\
                     <article><p>First   paragraph.</p><p></p><p>Second\nparagraph.</p></article>\
                     </body></html>",
                )
            }),
        )
        .route("/report.pdf", get(|| async { ([(header::CONTENT_TYPE, "application/pdf")], b"%PDF-1.4".to_vec()) }))
        .route("/broken", get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, Html("<p>oops</p>")) }))
        .route("/empty", get(|| async { Html("<html><body><div>no paragraphs here</div></body></html>") }))
}

fn extractor() -> HtmlArticleExtractor {
    HtmlArticleExtractor::new(Duration::from_secs(5), UA).unwrap()
}

#[test]
fn html_article_text_is_extracted() {
    let base = serve(pages());
    let url = format!("{base}/article");
    let text = extractor().extract(&url).unwrap();
    assert_eq!(text, "First paragraph.\n\nSecond paragraph.");
    assert_eq!(scrape_content(&extractor(), &url), text);
}

#[test]
fn non_html_content_is_rejected() {
    let base = serve(pages());
    let url = format!("{base}/report.pdf");
    let err = extractor().extract(&url).unwrap_err();
    assert!(err.to_string().contains("content type application/pdf"), "{err:#}");
    assert_eq!(scrape_content(&extractor(), &url), NOT_AVAILABLE);
}

#[test]
fn error_status_and_missing_text_fall_back_to_the_sentinel() {
    let base = serve(pages());
    let broken = format!("{base}/broken");
    assert!(extractor().extract(&broken).is_err());
    assert_eq!(scrape_content(&extractor(), &broken), NOT_AVAILABLE);
    assert_eq!(scrape_content(&extractor(), &format!("{base}/empty")), NOT_AVAILABLE);
    assert_eq!(scrape_content(&extractor(), "  "), NOT_AVAILABLE);
    assert_eq!(scrape_content(&extractor(), &format!("{base}/missing")), NOT_AVAILABLE);
}

/// Archive serving two submissions and the comments of post `abc`, recording
/// every submission query string.
fn archive(seen: Arc<Mutex<Vec<Params>>>) -> Router {
    Router::new()
        .route(
            "/reddit/search/submission/",
            get(move |Query(params): Query<Params>| {
                let seen = seen.clone();
                async move {
                    let after: i64 = params.get("after").and_then(|s| s.parse().ok()).unwrap_or(0);
                    seen.lock().push(params);
                    let rows: Vec<_> = [
                        json!({
                            "id": "abc", "subreddit": "worldnews", "author": "alice",
                            "created_utc": (BASE_TS + 10) as f64, "domain": "example.com",
                            "url": "https://example.com/a", "title": "Hello", "num_comments": 4,
                            "selftext": "", "score": 12
                        }),
                        json!({ "id": "def", "created_utc": BASE_TS + 20, "title": "Sparse" }),
                    ]
                    .into_iter()
                    .filter(|row| row["created_utc"].as_f64().is_some_and(|ts| ts as i64 > after))
                    .collect();
                    Json(json!({ "data": rows }))
                }
            }),
        )
        .route(
            "/reddit/search/comment/",
            get(|Query(params): Query<Params>| async move {
                let data = if params.get("link_id").map(String::as_str) == Some("abc") {
                    json!([
                        { "author": "u1", "body": "first" },
                        { "author": "u2", "body": null },
                        { "author": "u3", "body": "third" },
                    ])
                } else {
                    json!([])
                };
                Json(json!({ "data": data }))
            }),
        )
        .route("/down/reddit/search/submission/", get(|| async { StatusCode::SERVICE_UNAVAILABLE }))
        .route("/bad/reddit/search/submission/", get(|| async { Json(json!({ "results": [] })) }))
}

fn client(base: &str) -> PushshiftClient {
    PushshiftClient::new(base, Duration::from_secs(5), UA).unwrap()
}

fn query() -> SubmissionQuery {
    Harvest::new().subreddits(["worldnews"]).window(TimeWindow::new(BASE_TS, BASE_TS + 3600)).submission_query()
}

#[test]
fn submission_search_decodes_the_data_envelope() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let base = serve(archive(seen.clone()));

    let rows = client(&base).search_submissions(&query()).unwrap();
    assert_eq!(rows.len(), 2);
    let first = &rows[0];
    assert_eq!(first.id.as_deref(), Some("abc"));
    assert_eq!(first.subreddit.as_deref(), Some("worldnews"));
    assert_eq!(first.author.as_deref(), Some("alice"));
    assert_eq!(first.created_utc, Some(BASE_TS + 10));
    assert_eq!(first.url.as_deref(), Some("https://example.com/a"));
    assert_eq!(first.num_comments, Some(4));
    assert_eq!(first.score, Some(12));
    assert_eq!(rows[1].created_utc, Some(BASE_TS + 20));
    assert_eq!(rows[1].author, None);

    let params = seen.lock()[0].clone();
    assert_eq!(params["subreddit"], "worldnews");
    assert_eq!(params["after"], (BASE_TS - 1).to_string());
    assert_eq!(params["sort"], "created_utc:asc");
}

#[test]
fn fetch_through_the_http_client_stops_on_a_short_page() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let base = serve(archive(seen.clone()));

    let records = fetch_submissions(&client(&base), &query()).unwrap().into_records();
    let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["abc", "def"]);
    assert_eq!(seen.lock().len(), 1);
}

#[test]
fn capped_fetch_asks_for_the_top_scores_once() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let base = serve(archive(seen.clone()));

    let query = query().with_size(Some(1));
    let records = fetch_submissions(&client(&base), &query).unwrap().into_records();
    assert_eq!(records.len(), 1);
    let seen = seen.lock();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0]["sort"], "score:desc");
    assert_eq!(seen[0]["size"], "1");
}

#[test]
fn comment_search_joins_bodies_from_the_archive() {
    let base = serve(archive(Arc::default()));
    let archive = client(&base);

    let raw = archive.search_comments(&CommentQuery::new("worldnews", "abc", 5)).unwrap();
    assert_eq!(raw.len(), 3);
    assert_eq!(raw[1].body, None);
    assert_eq!(aggregate_comments(&archive, "worldnews", "abc", 5, None).unwrap(), "first...third");
    assert_eq!(aggregate_comments(&archive, "worldnews", "zzz", 5, None).unwrap(), "");
}

#[test]
fn archive_errors_are_reported() {
    let base = serve(archive(Arc::default()));

    let err = client(&format!("{base}/down")).search_submissions(&query()).unwrap_err();
    assert!(format!("{err:#}").contains("archive rejected"), "{err:#}");

    let err = client(&format!("{base}/bad")).search_submissions(&query()).unwrap_err();
    assert!(format!("{err:#}").contains("decode response"), "{err:#}");
}
