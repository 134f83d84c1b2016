use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use std::sync::Arc;
use subharvest::api::{router, AppState, ErrorResponseBody};
use subharvest::store::MemoryStore;
use tower::ServiceExt;

fn app() -> Router {
    router(Arc::new(AppState::new(Arc::new(MemoryStore::new("test")))))
}

fn post_json(post_id: &str) -> Value {
    json!({
        "post_id": post_id,
        "title": "Rust 2024 ships",
        "subreddit": "news",
        "author": "alice",
        "created_utc": "2022-05-01 22:40:41",
        "domain": "nytimes.com",
        "url": "https://nytimes.com/a",
        "num_comments": 10,
        "selftext": "",
        "score": 10,
        "url_content": "Lorem ipsum"
    })
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Vec<u8>) {
    let mut req = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(v) => {
            req = req.header(header::CONTENT_TYPE, "application/json");
            Body::from(v.to_string())
        }
        None => Body::empty(),
    };
    let resp = app.clone().oneshot(req.body(body).unwrap()).await.unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn create_then_get_returns_the_same_post() {
    let app = app();
    let (status, body) = send(&app, Method::POST, "/posts/", Some(post_json("uj4z1w"))).await;
    assert_eq!(status, StatusCode::CREATED);
    let created: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(created["post_id"], "uj4z1w");
    assert!(created.get("_id").is_none());

    let (status, body) = send(&app, Method::GET, "/posts/uj4z1w", None).await;
    assert_eq!(status, StatusCode::OK);
    let fetched: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched["created_utc"], "2022-05-01T22:40:41Z");
    assert_eq!(fetched["num_comments"], 10);
}

#[tokio::test]
async fn get_is_idempotent() {
    let app = app();
    send(&app, Method::POST, "/posts", Some(post_json("a1"))).await;
    let (_, first) = send(&app, Method::GET, "/posts/a1", None).await;
    let (_, second) = send(&app, Method::GET, "/posts/a1", None).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn delete_then_get_is_not_found() {
    let app = app();
    send(&app, Method::POST, "/posts/", Some(post_json("gone"))).await;

    let (status, body) = send(&app, Method::DELETE, "/posts/gone", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());

    let (status, body) = send(&app, Method::GET, "/posts/gone", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let err: ErrorResponseBody = serde_json::from_slice(&body).unwrap();
    assert_eq!(err.code, 404);
    assert_eq!(err.error, "Not Found");
    assert_eq!(err.message, "Post with ID gone not found");

    let (status, _) = send(&app, Method::DELETE, "/posts/gone", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_is_capped() {
    let app = app();
    for i in 0..105 {
        let (status, _) = send(&app, Method::POST, "/posts/", Some(post_json(&format!("p{i}")))).await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (status, body) = send(&app, Method::GET, "/posts/", None).await;
    assert_eq!(status, StatusCode::OK);
    let posts: Vec<Value> = serde_json::from_slice(&body).unwrap();
    assert_eq!(posts.len(), 100);
    assert_eq!(posts[0]["post_id"], "p0");
}

#[tokio::test]
async fn empty_store_lists_nothing() {
    let (status, body) = send(&app(), Method::GET, "/posts", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Vec<Value>>(&body).unwrap(), Vec::<Value>::new());
}

#[tokio::test]
async fn malformed_payloads_are_rejected_without_storing() {
    let app = app();

    let mut missing = post_json("x1");
    missing.as_object_mut().unwrap().remove("title");
    let (status, body) = send(&app, Method::POST, "/posts/", Some(missing)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let err: ErrorResponseBody = serde_json::from_slice(&body).unwrap();
    assert_eq!(err.code, 422);
    assert!(err.message.contains("title"), "{}", err.message);

    let mut bad_count = post_json("x2");
    bad_count["score"] = json!("lots");
    let (status, _) = send(&app, Method::POST, "/posts/", Some(bad_count)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let req = Request::post("/posts/").header(header::CONTENT_TYPE, "application/json").body(Body::from("{not json")).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = send(&app, Method::GET, "/posts/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(serde_json::from_slice::<Vec<Value>>(&body).unwrap().len(), 0);
}

#[tokio::test]
async fn quoted_counts_are_accepted() {
    let app = app();
    let mut p = post_json("q1");
    p["num_comments"] = json!("12");
    let (status, body) = send(&app, Method::POST, "/posts/", Some(p)).await;
    assert_eq!(status, StatusCode::CREATED);
    let created: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(created["num_comments"], 12);
}

#[tokio::test]
async fn root_redirects_to_docs() {
    let app = app();
    let resp = app.clone().oneshot(Request::get("/").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(resp.headers()[header::LOCATION], "/docs");

    let (status, body) = send(&app, Method::GET, "/docs", None).await;
    assert_eq!(status, StatusCode::OK);
    let docs: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(docs["routes"].as_array().unwrap().len(), 4);
}
