//! HTTP surface: auth gate, response envelopes, and stable error codes.

mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use common::{auth_token, spawn_test_app};
use tower::ServiceExt;
use waypoint::{api, config::Settings, payments::PaymentGateway};

async fn app_and_fixtures() -> anyhow::Result<(axum::Router, common::TestApp, String)> {
    let test_app = spawn_test_app().await?;
    let gateway: Arc<dyn PaymentGateway> = test_app.gateway.clone();
    let router = api::create_app(test_app.services.clone(), gateway, Arc::new(Settings::default()));
    let token = auth_token(&test_app.services, &test_app.consumer).await?;
    Ok((router, test_app, token))
}

fn create_body(listing_id: uuid::Uuid, scheduled_at: &str) -> String {
    serde_json::json!({
        "listingId": listing_id,
        "scheduledAt": scheduled_at,
        "dropoffAddress": "1265 Griswold St",
        "distanceMiles": 3.0,
        "durationMinutes": 10.0
    })
    .to_string()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn booking_creation_requires_a_session() -> anyhow::Result<()> {
    let (router, app, _token) = app_and_fixtures().await?;

    let request = Request::builder()
        .method("POST")
        .uri("/api/bookings")
        .header("content-type", "application/json")
        .body(Body::from(create_body(app.listing.id, "2026-09-01T10:30:00Z")))
        .unwrap();

    let response = router.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let json = body_json(response).await;
    assert!(json["data"].is_null());
    assert_eq!(json["error"]["code"], "AUTHENTICATION_REQUIRED");

    Ok(())
}

#[tokio::test]
async fn booking_creation_returns_envelope_with_client_secret() -> anyhow::Result<()> {
    let (router, app, token) = app_and_fixtures().await?;

    let request = Request::builder()
        .method("POST")
        .uri("/api/bookings")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(create_body(app.listing.id, "2026-09-01T10:30:00Z")))
        .unwrap();

    let response = router.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    assert!(json["data"]["id"].is_string());
    assert_eq!(json["data"]["clientSecret"], "pi_fake_1_secret");

    Ok(())
}

#[tokio::test]
async fn invalid_schedule_maps_to_stable_code() -> anyhow::Result<()> {
    let (router, app, token) = app_and_fixtures().await?;

    let request = Request::builder()
        .method("POST")
        .uri("/api/bookings")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(create_body(app.listing.id, "next tuesday")))
        .unwrap();

    let response = router.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert!(json["data"].is_null());
    assert_eq!(json["error"]["code"], "INVALID_SCHEDULE");

    Ok(())
}

#[tokio::test]
async fn unknown_listing_maps_to_not_found() -> anyhow::Result<()> {
    let (router, _app, token) = app_and_fixtures().await?;

    let request = Request::builder()
        .method("POST")
        .uri("/api/bookings")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(create_body(uuid::Uuid::new_v4(), "2026-09-01T10:30:00Z")))
        .unwrap();

    let response = router.oneshot(request).await?;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["error"]["code"], "RESOURCE_NOT_FOUND");

    Ok(())
}

#[tokio::test]
async fn booking_detail_round_trips_through_the_api() -> anyhow::Result<()> {
    let (router, app, token) = app_and_fixtures().await?;

    let create = Request::builder()
        .method("POST")
        .uri("/api/bookings")
        .header("content-type", "application/json")
        .header("authorization", format!("Bearer {token}"))
        .body(Body::from(create_body(app.listing.id, "2026-09-01T10:30:00Z")))
        .unwrap();
    let response = router.clone().oneshot(create).await?;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    let id = created["data"]["id"].as_str().unwrap().to_string();

    let get = Request::builder()
        .method("GET")
        .uri(format!("/api/bookings/{id}"))
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let response = router.oneshot(get).await?;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["id"], id.as_str());
    assert_eq!(json["data"]["status"], "pending");
    assert_eq!(json["data"]["paymentStatus"], "pending");
    assert_eq!(json["data"]["totalPrice"], 21.0);

    Ok(())
}
