//! Ingestion and read-through behavior of `OrderService` over the in-memory store.

mod common;

use bytes::Bytes;
use common::{payload, sample_order, service_with_store};
use order_service::Error;

#[tokio::test]
async fn ingest_then_lookup_served_from_cache() {
    let (service, store) = service_with_store();
    let raw = payload(&sample_order("order-1"));

    let uid = service.process_incoming(&raw).await.unwrap();
    assert_eq!(uid, "order-1");
    assert_eq!(store.writes(), 1);

    let body = service.get_by_id("order-1").await.unwrap().unwrap();
    assert_eq!(body, Bytes::from(normalizer::normalize(&raw).unwrap()));
    assert_eq!(store.reads(), 0);
}

#[tokio::test]
async fn cold_cache_lookup_populates_cache() {
    let (service, store) = service_with_store();
    let raw = payload(&sample_order("order-2"));
    store.insert_raw("order-2", raw.clone()).await;

    assert!(service.cache().get("order-2").is_none());

    let first = service.get_by_id("order-2").await.unwrap().unwrap();
    assert_eq!(store.reads(), 1);

    let second = service.get_by_id("order-2").await.unwrap().unwrap();
    assert_eq!(store.reads(), 1);
    assert_eq!(first, second);
    assert_eq!(first, Bytes::from(normalizer::normalize(&raw).unwrap()));
}

#[tokio::test]
async fn absent_order_is_not_cached() {
    let (service, store) = service_with_store();

    assert!(service.get_by_id("nope").await.unwrap().is_none());
    assert!(service.get_by_id("nope").await.unwrap().is_none());

    assert_eq!(store.reads(), 2);
    assert!(service.cache().is_empty());
}

#[tokio::test]
async fn missing_identifier_is_rejected_without_writes() {
    let (service, store) = service_with_store();
    let err = service
        .process_incoming(&payload(&sample_order("")))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingIdentifier));
    assert!(err.is_rejection());

    let err = service
        .process_incoming(br#"{"track_number":"123"}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingIdentifier));

    assert_eq!(store.writes(), 0);
    assert!(service.cache().is_empty());
}

#[tokio::test]
async fn invalid_payload_is_rejected_without_writes() {
    let (service, store) = service_with_store();

    let err = service.process_incoming(b"{not json").await.unwrap_err();
    assert!(matches!(err, Error::InvalidFormat(_)));

    let err = service
        .process_incoming(br#"{"order_uid":"x","sm_id":"ninety"}"#)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidFormat(_)));

    assert_eq!(store.writes(), 0);
    assert!(service.cache().is_empty());
}

#[tokio::test]
async fn redelivery_overwrites_previous_version() {
    let (service, store) = service_with_store();
    let mut order = sample_order("order-3");
    service.process_incoming(&payload(&order)).await.unwrap();

    order["track_number"] = "UPDATED".into();
    order["items"] = serde_json::json!([]);
    service.process_incoming(&payload(&order)).await.unwrap();

    assert_eq!(store.len().await, 1);
    let stored = store.stored_order("order-3").await.unwrap();
    assert_eq!(stored.track_number, "UPDATED");
    assert!(stored.items.is_empty());

    let body = service.get_by_id("order-3").await.unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(value["track_number"], "UPDATED");
}

#[tokio::test]
async fn storage_failure_leaves_cache_untouched() {
    let (service, store) = service_with_store();
    store.set_fail_writes(true);

    let err = service
        .process_incoming(&payload(&sample_order("order-4")))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Storage(_)));
    assert!(!err.is_rejection());
    assert!(service.cache().get("order-4").is_none());
}

#[tokio::test]
async fn storage_read_failure_surfaces_as_error() {
    let (service, store) = service_with_store();
    store.set_fail_reads(true);

    let err = service.get_by_id("order-5").await.unwrap_err();
    assert!(matches!(err, Error::Storage(_)));
}

#[tokio::test]
async fn warm_cache_loads_canonical_form_and_skips_corrupt_records() {
    let (service, store) = service_with_store();
    let good = payload(&sample_order("good"));
    store.insert_raw("good", good.clone()).await;
    store.insert_raw("corrupt", "{\"order_uid\":").await;
    store.insert_raw("anonymous", r#"{"track_number":"T"}"#).await;

    let loaded = service.warm_cache().await.unwrap();
    assert_eq!(loaded, 1);
    assert_eq!(service.cache().len(), 1);
    assert_eq!(
        service.cache().get("good"),
        Some(Bytes::from(normalizer::normalize(&good).unwrap()))
    );

    let reads = store.reads();
    service.get_by_id("good").await.unwrap().unwrap();
    assert_eq!(store.reads(), reads);
}

#[tokio::test]
async fn warm_cache_failure_is_reported() {
    let (service, store) = service_with_store();
    store.set_fail_reads(true);
    assert!(service.warm_cache().await.is_err());
    assert!(service.cache().is_empty());
}

#[tokio::test]
async fn concurrent_ingestion_of_distinct_orders() {
    let (service, store) = service_with_store();

    let mut handles = Vec::new();
    for i in 0..20 {
        let service = service.clone();
        handles.push(tokio::spawn(async move {
            let raw = payload(&sample_order(&format!("order-{i}")));
            service.process_incoming(&raw).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(store.writes(), 20);
    assert_eq!(service.cache().len(), 20);
}
