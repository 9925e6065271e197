use std::sync::Arc;

use axum::{
    Router,
    routing::get,
};

use appointment_cell::router::appointment_routes;
use appointment_cell::services::AppointmentBookingService;
use doctor_cell::router::doctor_routes;
use doctor_cell::services::AvailabilityStore;

pub fn create_router(
    availability: Arc<AvailabilityStore>,
    booking: Arc<AppointmentBookingService>,
) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic scheduler API is running!" }))
        .nest("/doctors", doctor_routes(availability))
        .nest("/appointments", appointment_routes(booking))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use appointment_cell::services::AppointmentRegistry;
    use shared_config::AppConfig;
    use shared_utils::test_utils::test_clock;

    fn app() -> Router {
        let config = AppConfig::default();
        let clock = test_clock();
        let availability = Arc::new(AvailabilityStore::new(&config, clock.clone()));
        let booking = Arc::new(AppointmentBookingService::new(
            &config,
            availability.clone(),
            Arc::new(AppointmentRegistry::new()),
            clock,
        ));
        create_router(availability, booking)
    }

    async fn status_of(uri: &str) -> StatusCode {
        app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn liveness_and_nested_routes_respond() {
        assert_eq!(status_of("/").await, StatusCode::OK);
        assert_eq!(status_of("/doctors/available?date=2025-06-10").await, StatusCode::OK);
        assert_eq!(status_of("/appointments/slots?provider_id=D001&date=2025-06-10").await, StatusCode::OK);
        assert_eq!(status_of("/appointments/A00001").await, StatusCode::NOT_FOUND);
    }
}
