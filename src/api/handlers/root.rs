use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "name": "Waypoint API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Two-sided services marketplace booking and payments backend",
        "status": "operational",
        "endpoints": {
            "health": "/health",
            "bookings": "/api/bookings",
            "docs": "/api/docs"
        }
    }))
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}
