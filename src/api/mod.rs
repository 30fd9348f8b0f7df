pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::Settings, payments::PaymentGateway, service::ServiceContext};
use state::AppState;

pub fn create_app(
    services: Arc<ServiceContext>,
    gateway: Arc<dyn PaymentGateway>,
    settings: Arc<Settings>,
) -> Router {
    let app_state = AppState::new(services, gateway, settings);

    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))
        // API routes
        .nest("/api", api_routes(app_state.clone()))
        // OpenAPI document + Swagger UI
        .merge(SwaggerUi::new("/api/docs").url("/api/openapi.json", docs::ApiDoc::openapi()))
        // Add state to the router
        .with_state(app_state)
        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive()) // Configure properly for production
        .layer(TraceLayer::new_for_http())
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/bookings", booking_routes(state))
        .nest("/payments", payment_routes())
}

fn booking_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::bookings::create))
        .route("/", get(handlers::bookings::list))
        .route("/:id", get(handlers::bookings::get))
        .route("/:id/accept", post(handlers::bookings::accept))
        .route("/:id/start", post(handlers::bookings::start))
        .route("/:id/complete", post(handlers::bookings::complete))
        .route("/:id/cancel", post(handlers::bookings::cancel))
        .route("/:id/receipt", get(handlers::bookings::receipt))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_auth,
        ))
}

fn payment_routes() -> Router<AppState> {
    Router::new()
        // Public webhook endpoint (no auth; verified by signature)
        .route("/webhook/stripe", post(handlers::payments::stripe_webhook))
}
