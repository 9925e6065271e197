use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{CorsLayer, Any};
use tower_http::trace::{self, TraceLayer};
use tracing::{Level, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::services::{AppointmentBookingService, AppointmentRegistry};
use doctor_cell::services::AvailabilityStore;
use shared_config::AppConfig;
use shared_utils::{Clock, SystemClock};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting clinic scheduler API server");

    let config = AppConfig::from_env();
    info!(
        "Slot duration {} min, next-slot lookahead {} days",
        config.slot_duration_minutes, config.next_slot_lookahead_days
    );

    // Create shared state
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let availability = Arc::new(AvailabilityStore::new(&config, Arc::clone(&clock)));
    let registry = Arc::new(AppointmentRegistry::new());
    let booking = Arc::new(AppointmentBookingService::new(
        &config,
        Arc::clone(&availability),
        registry,
        clock,
    ));
    booking.purge_expired_cancellations();

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = router::create_router(availability, booking)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new()
                    .level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new()
                    .level(Level::INFO)),
        )
        .layer(cors);

    let addr: SocketAddr = format!("{}:{}", config.api_host, config.api_port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.api_host, config.api_port))?;
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
