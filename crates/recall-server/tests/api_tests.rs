//! API integration tests
//!
//! Drives the axum router directly with `tower::ServiceExt::oneshot` over a
//! throwaway store.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use recall_core::{Card, Scheduler, Store};
use recall_server::api::build_router;

struct TestApp {
    router: axum::Router,
    store: Arc<Store>,
    _dir: TempDir,
}

fn test_app() -> TestApp {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(Store::open(Some(dir.path().join("recall.db"))).unwrap());
    let scheduler = Arc::new(Scheduler::default());
    let router = build_router(store.clone(), scheduler, dir.path().join("repos"));
    TestApp {
        router,
        store,
        _dir: dir,
    }
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(path: &str) -> Request<Body> {
    Request::builder().uri(path).body(Body::empty()).unwrap()
}

fn post_json(path: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_reports_version() {
    let app = test_app();
    let response = app.router.oneshot(get("/api/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], recall_core::VERSION);
}

#[tokio::test]
async fn empty_deck_has_no_due_cards() {
    let app = test_app();
    let response = app.router.clone().oneshot(get("/api/deck")).await.unwrap();
    let body = json_body(response).await;
    assert_eq!(body["totalCards"], 0);
    assert_eq!(body["hasDueCards"], false);

    let response = app.router.oneshot(get("/api/review/next")).await.unwrap();
    let body = json_body(response).await;
    assert!(body["card"].is_null());
}

#[tokio::test]
async fn review_flow_updates_card() {
    let app = test_app();
    let card = Card::new("What is a borrow?", "A temporary reference.");
    app.store.insert_card(&card, None).unwrap();
    let hash = card.hash();

    // The new card is served for review, question only
    let response = app
        .router
        .clone()
        .oneshot(get("/api/review/next"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["card"]["hash"], hash.as_str());
    assert_eq!(body["card"]["question"], "What is a borrow?");
    assert!(body["card"].get("answer").is_none());

    // Grading it moves the due date into the future
    let response = app
        .router
        .clone()
        .oneshot(post_json(
            &format!("/api/reviews/{hash}"),
            serde_json::json!({ "grade": 3 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["rating"], "good");
    assert_eq!(body["stability"], 2.5);

    let response = app.router.oneshot(get("/api/review/next")).await.unwrap();
    let body = json_body(response).await;
    assert!(body["card"].is_null(), "reviewed card should no longer be due");
}

#[tokio::test]
async fn invalid_grade_is_rejected() {
    let app = test_app();
    let card = Card::new("q", "a");
    app.store.insert_card(&card, None).unwrap();

    let response = app
        .router
        .oneshot(post_json(
            &format!("/api/reviews/{}", card.hash()),
            serde_json::json!({ "grade": 9 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reviewing_unknown_card_is_not_found() {
    let app = test_app();
    let response = app
        .router
        .oneshot(post_json(
            "/api/reviews/0000000000000000000000000000000000000000000000000000000000000000",
            serde_json::json!({ "grade": 3 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn card_detail_includes_answer_and_retrievability() {
    let app = test_app();
    let card = Card::new("q", "the answer");
    app.store.insert_card(&card, None).unwrap();

    let response = app
        .router
        .oneshot(get(&format!("/api/cards/{}", card.hash())))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["answer"], "the answer");
    assert_eq!(body["isNew"], true);
    assert_eq!(body["retrievability"], 1.0);
}

#[tokio::test]
async fn source_management_round_trip() {
    let app = test_app();

    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/api/sources",
            serde_json::json!({ "path": "https://example.com/me/notes.git" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["kind"], "git");
    let id = body["id"].as_i64().unwrap();

    // Duplicate registration conflicts
    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/api/sources",
            serde_json::json!({ "path": "https://example.com/me/notes.git" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .router
        .clone()
        .oneshot(get("/api/sources"))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["sources"].as_array().unwrap().len(), 1);

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/sources/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.router.oneshot(get("/api/sources")).await.unwrap();
    let body = json_body(response).await;
    assert!(body["sources"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn empty_source_path_is_bad_request() {
    let app = test_app();
    let response = app
        .router
        .oneshot(post_json("/api/sources", serde_json::json!({ "path": "  " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
