//! HTTP routes exercised in-process with `tower::ServiceExt::oneshot`.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{payload, sample_order, service_with_store};
use http_body_util::BodyExt;
use order_service::{create_router, AppState, InMemoryStore, OrderService};
use serde_json::Value;
use tower::ServiceExt;

fn app(service: OrderService) -> axum::Router {
    create_router(AppState {
        service,
        static_dir: None,
    })
}

async fn get(router: axum::Router, uri: &str) -> (StatusCode, Option<String>, Vec<u8>) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, body.to_vec())
}

async fn seeded() -> (OrderService, InMemoryStore, Vec<u8>) {
    let (service, store) = service_with_store();
    let raw = payload(&sample_order("b563feb7b2b84b6test"));
    service.process_incoming(&raw).await.unwrap();
    (service, store, raw)
}

#[tokio::test]
async fn get_order_returns_canonical_json() {
    let (service, _store, raw) = seeded().await;

    let (status, content_type, body) = get(app(service), "/orders/b563feb7b2b84b6test").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("application/json"));
    assert_eq!(body, normalizer::normalize(&raw).unwrap());
}

#[tokio::test]
async fn get_order_from_store_on_cold_cache() {
    let (service, store) = service_with_store();
    let raw = payload(&sample_order("cold"));
    store.insert_raw("cold", raw.clone()).await;

    let (status, _, body) = get(app(service), "/orders/cold").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, normalizer::normalize(&raw).unwrap());
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let (service, _store) = service_with_store();

    let (status, _, body) = get(app(service), "/orders/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert!(value["error"].as_str().unwrap().contains("missing"));
}

#[tokio::test]
async fn missing_id_is_bad_request() {
    let (service, _store) = service_with_store();

    for uri in ["/orders", "/orders/"] {
        let (status, _, body) = get(app(service.clone()), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        let value: Value = serde_json::from_slice(&body).unwrap();
        assert!(value["error"].is_string());
    }
}

#[tokio::test]
async fn whitespace_id_is_looked_up() {
    let (service, _store) = service_with_store();

    let (status, _, _) = get(app(service), "/orders/%20").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn storage_failure_is_internal_error() {
    let (service, store) = service_with_store();
    store.set_fail_reads(true);

    let (status, _, body) = get(app(service), "/orders/any").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["error"], "internal error");
}

#[tokio::test]
async fn cached_order_survives_storage_outage() {
    let (service, store, _raw) = seeded().await;
    store.set_fail_reads(true);

    let (status, _, _) = get(app(service), "/orders/b563feb7b2b84b6test").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn health_reports_store_state() {
    let (service, store) = service_with_store();

    let (status, _, body) = get(app(service.clone()), "/health").await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["status"], "ok");
    assert_eq!(value["store"], "memory");

    store.set_fail_reads(true);
    let (status, _, _) = get(app(service), "/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn stats_reports_cache_counters() {
    let (service, _store, _raw) = seeded().await;
    let router = app(service);

    get(router.clone(), "/orders/b563feb7b2b84b6test").await;
    get(router.clone(), "/orders/missing").await;

    let (status, _, body) = get(router, "/stats").await;
    assert_eq!(status, StatusCode::OK);
    let value: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["cache"]["entries"], 1);
    assert_eq!(value["cache"]["hits"], 1);
    assert_eq!(value["cache"]["misses"], 1);
    assert_eq!(value["store"], "memory");
}
