use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use tracing::debug;

use shared_models::{AppError, Provider};

use crate::models::{AvailabilityQuery, AvailableProvidersResponse, SetAvailabilityRequest};
use crate::services::AvailabilityStore;

// ==============================================================================
// AVAILABILITY HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn set_availability(
    State(store): State<Arc<AvailabilityStore>>,
    Path(provider_id): Path<String>,
    Json(request): Json<SetAvailabilityRequest>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let provider = Provider::new(provider_id, request.provider_name);

    let window = store.set_availability(
        provider,
        request.date,
        request.start_time,
        request.end_time,
    )?;

    Ok((StatusCode::CREATED, Json(json!(window))))
}

#[axum::debug_handler]
pub async fn get_provider_availability(
    State(store): State<Arc<AvailabilityStore>>,
    Path(provider_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let windows = store.list_by_provider(&provider_id);
    debug!("Provider {} has {} availability windows", provider_id, windows.len());

    Ok(Json(json!({
        "provider_id": provider_id,
        "windows": windows,
        "total": windows.len()
    })))
}

#[axum::debug_handler]
pub async fn remove_availability(
    State(store): State<Arc<AvailabilityStore>>,
    Path((provider_id, date)): Path<(String, NaiveDate)>,
) -> Result<StatusCode, AppError> {
    if store.remove_availability(&provider_id, date) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound(format!(
            "No availability for provider {} on {}",
            provider_id, date
        )))
    }
}

#[axum::debug_handler]
pub async fn list_available_providers(
    State(store): State<Arc<AvailabilityStore>>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailableProvidersResponse>, AppError> {
    let providers = store.list_available_providers(query.date);

    Ok(Json(AvailableProvidersResponse {
        date: query.date,
        providers,
    }))
}
