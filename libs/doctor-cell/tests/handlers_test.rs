// libs/doctor-cell/tests/handlers_test.rs

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    Json,
};
use tower::ServiceExt;

use doctor_cell::handlers::*;
use doctor_cell::models::{AvailabilityQuery, SetAvailabilityRequest};
use doctor_cell::router::doctor_routes;
use doctor_cell::services::AvailabilityStore;
use shared_config::AppConfig;
use shared_models::AppError;
use shared_utils::test_utils::{date, test_clock, time};

fn create_test_store() -> Arc<AvailabilityStore> {
    Arc::new(AvailabilityStore::new(&AppConfig::default(), test_clock()))
}

fn morning_request(name: &str) -> SetAvailabilityRequest {
    SetAvailabilityRequest {
        provider_name: name.to_string(),
        date: date(2025, 6, 10),
        start_time: time(9, 0),
        end_time: time(10, 0),
    }
}

#[tokio::test]
async fn test_set_availability_handler_returns_created_window() {
    let store = create_test_store();

    let (status, Json(body)) = set_availability(
        State(store.clone()),
        Path("D001".to_string()),
        Json(morning_request("Dr. Lim")),
    )
    .await
    .expect("handler should succeed");

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["provider"]["id"], "D001");
    assert_eq!(body["start_time"], "09:00:00");
    assert!(store.get_window("D001", date(2025, 6, 10)).is_some());
}

#[tokio::test]
async fn test_set_availability_handler_rejects_invalid_range() {
    let store = create_test_store();
    let mut request = morning_request("Dr. Lim");
    request.end_time = time(8, 0);

    let result = set_availability(State(store.clone()), Path("D001".to_string()), Json(request)).await;

    match result {
        Err(AppError::ValidationError(message)) => assert!(message.contains("must be after")),
        other => panic!("expected validation error, got {:?}", other.map(|(s, _)| s)),
    }
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_list_available_providers_handler() {
    let store = create_test_store();
    let (lim, _) = set_availability(State(store.clone()), Path("D001".to_string()), Json(morning_request("Dr. Lim")))
        .await
        .unwrap();
    let (aziz, _) = set_availability(State(store.clone()), Path("D002".to_string()), Json(morning_request("Dr. Aziz")))
        .await
        .unwrap();
    assert_eq!((lim, aziz), (StatusCode::CREATED, StatusCode::CREATED));

    let Json(response) = list_available_providers(
        State(store),
        Query(AvailabilityQuery { date: date(2025, 6, 10) }),
    )
    .await
    .unwrap();

    let names: Vec<_> = response.providers.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Dr. Aziz", "Dr. Lim"]);
}

#[tokio::test]
async fn test_remove_availability_handler_reports_missing_window() {
    let store = create_test_store();

    let missing = remove_availability(
        State(store.clone()),
        Path(("D001".to_string(), date(2025, 6, 10))),
    )
    .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));

    let (created, Json(window)) =
        set_availability(State(store.clone()), Path("D001".to_string()), Json(morning_request("Dr. Lim")))
            .await
            .unwrap();
    assert_eq!(created, StatusCode::CREATED);
    assert_eq!(window["date"], "2025-06-10");
    let removed = remove_availability(State(store), Path(("D001".to_string(), date(2025, 6, 10))))
        .await
        .unwrap();
    assert_eq!(removed, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_router_serves_provider_availability() {
    let store = create_test_store();
    store
        .set_availability(
            shared_models::Provider::new("D001", "Dr. Lim"),
            date(2025, 6, 10),
            time(9, 0),
            time(10, 0),
        )
        .unwrap();

    let response = doctor_routes(store)
        .oneshot(
            Request::builder()
                .uri("/D001/availability")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
