// libs/appointment-cell/tests/handlers_test.rs

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    Json,
};
use tower::ServiceExt;

use appointment_cell::handlers::*;
use appointment_cell::models::{
    AppointmentSearchQuery, AppointmentStatus, BookAppointmentRequest, RecordOutcomeRequest,
    RescheduleAppointmentRequest, SlotQuery, UpdateStatusRequest,
};
use appointment_cell::router::appointment_routes;
use appointment_cell::services::{AppointmentBookingService, AppointmentRegistry};
use doctor_cell::services::AvailabilityStore;
use shared_config::AppConfig;
use shared_models::{AppError, Prescription};
use shared_utils::test_utils::{date, test_clock, time, TestUsers};

fn create_test_service() -> Arc<AppointmentBookingService> {
    let config = AppConfig::default();
    let clock = test_clock();
    let availability = Arc::new(AvailabilityStore::new(&config, clock.clone()));
    availability
        .set_availability(TestUsers::default().provider(), date(2025, 6, 10), time(9, 0), time(10, 0))
        .unwrap();

    Arc::new(AppointmentBookingService::new(
        &config,
        availability,
        Arc::new(AppointmentRegistry::new()),
        clock,
    ))
}

fn book_request(hour: u32, minute: u32) -> BookAppointmentRequest {
    BookAppointmentRequest {
        patient: TestUsers::default().patient(),
        provider_id: "D001".to_string(),
        date: date(2025, 6, 10),
        start_time: time(hour, minute),
    }
}

#[tokio::test]
async fn test_book_appointment_handler_creates_pending_appointment() {
    let service = create_test_service();

    let (status, Json(appointment)) = book_appointment(State(service.clone()), Json(book_request(9, 0)))
        .await
        .expect("booking should succeed");

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(appointment.status, AppointmentStatus::PendingApproval);
    assert_eq!(appointment.provider.name, "Dr. Lim");

    let again = book_appointment(State(service), Json(book_request(9, 0))).await;
    assert!(matches!(again, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_book_appointment_handler_rejects_unoffered_time() {
    let service = create_test_service();

    let result = book_appointment(State(service.clone()), Json(book_request(9, 15))).await;

    assert!(matches!(result, Err(AppError::BadRequest(_))));
    assert!(service.get_all_appointments().is_empty());
}

#[tokio::test]
async fn test_slot_listing_handler_excludes_booked_slots() {
    let service = create_test_service();
    let (status, _) = book_appointment(State(service.clone()), Json(book_request(9, 30)))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::CREATED);

    let Json(body) = get_available_slots(
        State(service),
        Query(SlotQuery {
            provider_id: "D001".to_string(),
            date: date(2025, 6, 10),
        }),
    )
    .await
    .unwrap();

    assert_eq!(body["total"], 1);
    assert_eq!(body["slots"][0]["start_time"], "09:00:00");
}

#[tokio::test]
async fn test_status_reschedule_and_outcome_handlers() {
    let service = create_test_service();
    let (_, Json(booked)) = book_appointment(State(service.clone()), Json(book_request(9, 0)))
        .await
        .unwrap();
    let id = booked.id.unwrap();

    let Json(moved) = reschedule_appointment(
        State(service.clone()),
        Path(id.clone()),
        Json(RescheduleAppointmentRequest {
            date: date(2025, 6, 10),
            start_time: time(9, 30),
        }),
    )
    .await
    .unwrap();
    assert_eq!(moved.date_time.time(), time(9, 30));

    let Json(confirmed) = update_appointment_status(
        State(service.clone()),
        Path(id.clone()),
        Json(UpdateStatusRequest {
            status: AppointmentStatus::Confirmed,
        }),
    )
    .await
    .unwrap();
    assert_eq!(confirmed.status, AppointmentStatus::Confirmed);

    let Json(completed) = record_outcome(
        State(service.clone()),
        Path(id.clone()),
        Json(RecordOutcomeRequest {
            service_type: "Consultation".to_string(),
            prescriptions: vec![Prescription::new("Amoxicillin", 14)],
            notes: "Review in a week".to_string(),
        }),
    )
    .await
    .unwrap();
    assert_eq!(completed.status, AppointmentStatus::Completed);

    let cancel = cancel_appointment(State(service), Path(id)).await;
    assert!(matches!(cancel, Err(AppError::Conflict(_))));
}

#[tokio::test]
async fn test_search_handler_filters_by_status() {
    let service = create_test_service();
    let (_, Json(first)) = book_appointment(State(service.clone()), Json(book_request(9, 0)))
        .await
        .unwrap();
    let (_, Json(second)) = book_appointment(State(service.clone()), Json(book_request(9, 30)))
        .await
        .unwrap();
    let Json(cancelled) = cancel_appointment(State(service.clone()), Path(first.id.unwrap()))
        .await
        .unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

    let Json(body) = search_appointments(
        State(service),
        Query(AppointmentSearchQuery {
            status: Some(AppointmentStatus::PendingApproval),
            ..Default::default()
        }),
    )
    .await
    .unwrap();

    assert_eq!(body["total"], 1);
    assert_eq!(body["appointments"][0]["id"], second.id.unwrap());
    assert_eq!(body["appointments"][0]["status"], "PENDING_APPROVAL");
}

#[tokio::test]
async fn test_router_returns_not_found_for_unknown_appointment() {
    let service = create_test_service();

    let response = appointment_routes(service)
        .oneshot(
            Request::builder()
                .uri("/A00042")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_router_serves_slot_listing() {
    let service = create_test_service();

    let response = appointment_routes(service)
        .oneshot(
            Request::builder()
                .uri("/slots?provider_id=D001&date=2025-06-10")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}
