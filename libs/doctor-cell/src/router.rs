use std::sync::Arc;

use axum::{
    Router,
    routing::{get, delete},
};

use crate::handlers;
use crate::services::AvailabilityStore;

pub fn doctor_routes(store: Arc<AvailabilityStore>) -> Router {
    Router::new()
        .route("/available", get(handlers::list_available_providers))
        .route(
            "/{provider_id}/availability",
            get(handlers::get_provider_availability).post(handlers::set_availability),
        )
        .route("/{provider_id}/availability/{date}", delete(handlers::remove_availability))
        .with_state(store)
}
