use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::{
    api::state::AppState,
    payments::{PaymentEvent, PaymentGateway, WebhookRejection},
};

/// Payment processor webhook endpoint.
///
/// Takes the raw body bytes: the signature covers the exact bytes the
/// processor sent, so the payload must never be parsed and re-serialized
/// before verification. A 400 tells the processor to retry; everything after
/// a verified signature is acknowledged with a 200 so non-transient
/// application problems do not cause a retry storm.
pub async fn stripe_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let Some(signature) = headers.get("stripe-signature").and_then(|v| v.to_str().ok()) else {
        tracing::warn!("webhook delivery missing stripe-signature header");
        return rejected();
    };

    let Ok(payload) = std::str::from_utf8(&body) else {
        tracing::warn!("webhook delivery body is not valid UTF-8");
        return rejected();
    };

    let event = match state.gateway.verify_event(payload, signature) {
        Ok(event) => event,
        Err(WebhookRejection::Unintelligible(err)) => {
            tracing::warn!(error = %err, "authentic webhook payload did not parse, acknowledging");
            return received();
        }
        Err(WebhookRejection::BadSignature(err)) => {
            tracing::warn!(error = %err, "webhook signature verification failed");
            return rejected();
        }
    };

    let Some(payment_event) = PaymentEvent::from_stripe(&event) else {
        tracing::debug!(event_type = ?event.type_, "ignoring unhandled webhook event type");
        return received();
    };

    match state.services.reconciler.apply(payment_event).await {
        Ok(outcome) => {
            tracing::debug!(?outcome, event_id = %event.id, "webhook event processed");
        }
        Err(e) => {
            // Still a 200: a redelivery would hit the same application state.
            tracing::error!(event_id = %event.id, error = ?e, "failed to apply webhook event");
        }
    }

    received()
}

fn received() -> Response {
    (StatusCode::OK, Json(json!({"received": true}))).into_response()
}

fn rejected() -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({"received": false}))).into_response()
}
