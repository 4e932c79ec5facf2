//! Viewer server tests
//!
//! Requests go straight to the router with `tower::ServiceExt::oneshot`;
//! the manifest is read from a temporary public directory.

mod common;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use racecard::config::{Config, TransportKind};
use racecard::server::ViewerServer;
use tempfile::TempDir;
use tower::ServiceExt;

use common::{write_public_file, LEGACY_JSON, RACES_JSON};

fn router_for(public: &TempDir) -> Router {
    let mut config = Config::default();
    config.source.transport = TransportKind::File;
    config.source.public_dir = public.path().to_path_buf();
    ViewerServer::new(config).unwrap().build_router()
}

async fn get(router: Router, uri: &str) -> (StatusCode, String) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

#[tokio::test]
async fn test_page_selects_race_from_query() {
    let public = tempfile::tempdir().unwrap();
    write_public_file(public.path(), "data/races.json", RACES_JSON);

    let (status, html) = get(router_for(&public), "/?raceId=r2&foo=bar").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(r#"<option value="r2" data-fragment="/fragments/r2.html" selected>"#));
    assert!(html.contains(r#"data-race-id="r2""#));
    assert!(html.contains("オークス"));
}

#[tokio::test]
async fn test_page_unknown_key_shows_first_race() {
    let public = tempfile::tempdir().unwrap();
    write_public_file(public.path(), "data/races.json", RACES_JSON);

    let (status, html) = get(router_for(&public), "/?raceId=missing").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(r#"data-race-id="r1""#));
    assert!(html.contains(r#"<object data="/pdf/r1.pdf" type="application/pdf">"#));
}

#[tokio::test]
async fn test_page_without_data_shows_empty_message() {
    let public = tempfile::tempdir().unwrap();

    let (status, html) = get(router_for(&public), "/").await;

    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(&Config::default().site.empty_message));
    assert!(!html.contains("race-select"));
}

#[tokio::test]
async fn test_page_falls_back_to_legacy_predictions() {
    let public = tempfile::tempdir().unwrap();
    write_public_file(public.path(), "data/predictions.json", LEGACY_JSON);

    let (_, html) = get(router_for(&public), "/").await;

    assert!(html.contains(r#"data-race-id="202405021211""#));
    assert!(html.contains("ドウデュース"));
    assert!(html.contains("勝率 23.4%"));
}

#[tokio::test]
async fn test_fragment_routes() {
    let public = tempfile::tempdir().unwrap();
    write_public_file(public.path(), "data/races.json", RACES_JSON);
    let router = router_for(&public);

    let (status, html) = get(router.clone(), "/fragments/r2.html").await;
    assert_eq!(status, StatusCode::OK);
    assert!(html.contains(r#"data-race-id="r2""#));
    assert!(!html.contains("<html"));

    let (status, _) = get(router.clone(), "/fragments/missing.html").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(router, "/fragments/r2").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_api_races_reports_source() {
    let public = tempfile::tempdir().unwrap();
    write_public_file(public.path(), "data/races.json", RACES_JSON);

    let (status, body) = get(router_for(&public), "/api/races").await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["source"], "/data/races.json");
    assert_eq!(json["data"]["races"]["races"][1]["id"], "r2");
}

#[tokio::test]
async fn test_api_selection() {
    let public = tempfile::tempdir().unwrap();
    write_public_file(public.path(), "data/races.json", RACES_JSON);
    let router = router_for(&public);

    let request = Request::builder()
        .method("POST")
        .uri("/api/selection")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"query": "?raceId=r1&foo=bar", "race_id": "r2"}"#))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["data"]["search"], "?raceId=r2&foo=bar");
    assert_eq!(json["data"]["changed"], true);
    assert_eq!(json["data"]["fragment"], "/fragments/r2.html");

    let request = Request::builder()
        .method("POST")
        .uri("/api/selection")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"race_id": "r9"}"#))
        .unwrap();
    let response = router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_static_assets_served_from_public_dir() {
    let public = tempfile::tempdir().unwrap();
    write_public_file(public.path(), "pdf/r1.pdf", "%PDF-1.4");

    let (status, body) = get(router_for(&public), "/pdf/r1.pdf").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "%PDF-1.4");
}

#[tokio::test]
async fn test_health_check() {
    let public = tempfile::tempdir().unwrap();

    let (status, body) = get(router_for(&public), "/api/health").await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "healthy");
}
