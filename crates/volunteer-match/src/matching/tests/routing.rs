use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::matching::domain::{Person, Preference};
use crate::matching::router::{matching_router, person_handler, submit_handler};

fn post_json(uri: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&payload).expect("serialize payload")))
        .expect("request")
}

#[tokio::test]
async fn submit_handler_accepts_valid_preferences() {
    let service = Arc::new(build_service());
    let person = Person::ranked(7u64, "Ada", ["Media", "Medical"]);

    let response = submit_handler(State(Arc::clone(&service)), axum::Json(person)).await;

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let payload = read_json_body(response).await;
    assert_eq!(payload, json!({ "status": "received", "id": "7" }));
    assert_eq!(service.snapshot().len(), 1);
}

#[tokio::test]
async fn submit_handler_rejects_invalid_preferences() {
    let service = Arc::new(build_service());
    let person = Person::new(
        "p1",
        "Pat",
        vec![Preference::new("Media", 1), Preference::new("Nowhere", 2)],
    );

    let response = submit_handler(State(Arc::clone(&service)), axum::Json(person)).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let payload = read_json_body(response).await;
    assert!(payload
        .get("error")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .contains("Nowhere"));
    assert!(service.snapshot().is_empty());
}

#[tokio::test]
async fn person_handler_returns_not_found_for_unknown_ids() {
    let service = Arc::new(build_service());
    let response = person_handler(State(service), Path("ghost".to_string())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn preferences_route_accepts_client_payloads() {
    let service = Arc::new(build_service());
    let router = matching_router(Arc::clone(&service));

    let response = router
        .clone()
        .oneshot(post_json(
            "/preferences",
            json!({
                "id": 12,
                "name": "Grace",
                "preferences": [
                    { "serviceName": "Security", "priority": 2 },
                    { "serviceName": "Reception", "priority": 1 }
                ]
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/preferences/12")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["preferences"][0]["serviceName"], json!("Reception"));
    assert_eq!(payload["preferences"][0]["priority"], json!(1));
}

#[tokio::test]
async fn empty_preference_lists_are_rejected() {
    let service = Arc::new(build_service());
    let router = matching_router(Arc::clone(&service));

    let response = router
        .oneshot(post_json(
            "/preferences",
            json!({ "id": "p9", "name": "Empty", "preferences": [] }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(service.snapshot().is_empty());
}

#[tokio::test]
async fn optimize_route_starts_a_run_and_publishes() {
    let service = Arc::new(build_service());
    for person in event_roster() {
        service.submit_preferences(person).expect("valid submission");
    }
    let mut subscription = service.subscribe();
    let router = matching_router(Arc::clone(&service));

    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/optimize")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let payload = read_json_body(response).await;
    assert_eq!(payload, json!({ "status": "started", "run": 1 }));

    let batch = tokio::time::timeout(Duration::from_secs(10), subscription.recv())
        .await
        .expect("run publishes in time")
        .expect("subscription open");
    assert_eq!(batch.len(), 20);
}

#[tokio::test]
async fn catalog_route_lists_services() {
    let router = matching_router(Arc::new(build_service()));

    let response = router
        .oneshot(
            Request::builder()
                .uri("/api/v1/catalog")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let services = payload.as_array().expect("array payload");
    assert_eq!(services.len(), 10);
    assert_eq!(services[0], json!({ "name": "Reception", "capacity": 4 }));
}

#[tokio::test]
async fn assignments_route_requires_a_websocket_upgrade() {
    let router = matching_router(Arc::new(build_service()));

    let response = router
        .oneshot(
            Request::builder()
                .uri("/assignments")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("route executes");

    assert!(response.status().is_client_error());
}
