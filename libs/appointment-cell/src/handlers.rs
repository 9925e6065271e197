// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::debug;

use shared_models::AppError;

use crate::models::{
    Appointment, AppointmentSearchQuery, BookAppointmentRequest, RecordOutcomeRequest,
    RescheduleAppointmentRequest, SlotQuery, UpdateStatusRequest,
};
use crate::services::booking::AppointmentBookingService;

// ==============================================================================
// SLOT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn get_available_slots(
    State(service): State<Arc<AppointmentBookingService>>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    let slots = service.get_available_slots(query.date, &query.provider_id);

    Ok(Json(json!({
        "provider_id": query.provider_id,
        "date": query.date,
        "slots": slots,
        "total": slots.len()
    })))
}

#[axum::debug_handler]
pub async fn get_next_available_slot(
    State(service): State<Arc<AppointmentBookingService>>,
    Path(provider_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let slot = service.get_next_available_slot(&provider_id).ok_or_else(|| {
        AppError::NotFound(format!("No free slot for provider {} in the lookahead period", provider_id))
    })?;

    Ok(Json(json!(slot)))
}

// ==============================================================================
// APPOINTMENT HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn book_appointment(
    State(service): State<Arc<AppointmentBookingService>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    let slot = service
        .find_slot(&request.provider_id, request.date, request.start_time)
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "Provider {} offers no slot at {} {}",
                request.provider_id, request.date, request.start_time
            ))
        })?;

    let appointment = service.schedule_appointment(request.patient, slot.provider.clone(), &slot)?;

    Ok((StatusCode::CREATED, Json(appointment)))
}

#[axum::debug_handler]
pub async fn search_appointments(
    State(service): State<Arc<AppointmentBookingService>>,
    Query(query): Query<AppointmentSearchQuery>,
) -> Result<Json<Value>, AppError> {
    let appointments = service.search_appointments(&query);
    debug!("Appointment search matched {} records", appointments.len());

    Ok(Json(json!({
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(service): State<Arc<AppointmentBookingService>>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Appointment>, AppError> {
    Ok(Json(service.get_appointment(&appointment_id)?))
}

#[axum::debug_handler]
pub async fn reschedule_appointment(
    State(service): State<Arc<AppointmentBookingService>>,
    Path(appointment_id): Path<String>,
    Json(request): Json<RescheduleAppointmentRequest>,
) -> Result<Json<Appointment>, AppError> {
    let current = service.get_appointment(&appointment_id)?;

    let slot = service
        .find_slot(&current.provider.id, request.date, request.start_time)
        .ok_or_else(|| {
            AppError::BadRequest(format!(
                "Provider {} offers no slot at {} {}",
                current.provider.id, request.date, request.start_time
            ))
        })?;

    Ok(Json(service.reschedule_appointment(&appointment_id, &slot)?))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(service): State<Arc<AppointmentBookingService>>,
    Path(appointment_id): Path<String>,
) -> Result<Json<Appointment>, AppError> {
    Ok(Json(service.cancel_appointment(&appointment_id)?))
}

#[axum::debug_handler]
pub async fn update_appointment_status(
    State(service): State<Arc<AppointmentBookingService>>,
    Path(appointment_id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Appointment>, AppError> {
    Ok(Json(service.update_appointment_status(&appointment_id, request.status)?))
}

#[axum::debug_handler]
pub async fn record_outcome(
    State(service): State<Arc<AppointmentBookingService>>,
    Path(appointment_id): Path<String>,
    Json(request): Json<RecordOutcomeRequest>,
) -> Result<Json<Appointment>, AppError> {
    if request.service_type.trim().is_empty() {
        return Err(AppError::ValidationError("service_type is required".to_string()));
    }

    let appointment = service.record_appointment_outcome(
        &appointment_id,
        &request.service_type,
        request.prescriptions,
        &request.notes,
    )?;

    Ok(Json(appointment))
}
