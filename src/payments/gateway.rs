use std::collections::HashMap;

use async_trait::async_trait;
use stripe::{
    CancelPaymentIntent, Client, CreatePaymentIntent, Currency, Event, Expandable, PaymentIntent,
    PaymentIntentCancellationReason, PaymentIntentCaptureMethod, PaymentIntentId, Webhook,
    WebhookError,
};
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Inputs for a payment authorization. The booking id lands in the
/// authorization metadata and is the primary correlation key for webhook
/// events coming back.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub booking_id: Uuid,
    pub consumer_id: Uuid,
    pub listing_id: Uuid,
    pub amount_cents: i64,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct PaymentAuthorization {
    /// Processor-side reference, persisted on the booking row.
    pub reference: String,
    /// Handed to the client to complete payment on the hosted flow.
    pub client_secret: Option<String>,
}

/// Why an inbound webhook request was not turned into an event.
#[derive(Debug)]
pub enum WebhookRejection {
    /// Signature missing, malformed, or not valid for the raw body. The
    /// processor should retry (400).
    BadSignature(String),
    /// Authenticated but the payload did not parse as a known event shape.
    /// Retrying will not help; acknowledge with a 200.
    Unintelligible(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an uncaptured hold for `amount_cents`, tagged with the booking id.
    async fn create_authorization(&self, request: AuthorizationRequest) -> Result<PaymentAuthorization>;

    /// Release a hold created by `create_authorization`.
    async fn cancel_authorization(&self, reference: &str) -> Result<()>;

    /// Receipt URL for the latest charge on an authorization, if any.
    async fn receipt_url(&self, reference: &str) -> Result<Option<String>>;

    /// Verify a webhook delivery against the raw, unparsed body bytes.
    fn verify_event(&self, payload: &str, signature: &str)
        -> std::result::Result<Event, WebhookRejection>;
}

pub struct StripeGateway {
    client: Client,
    webhook_secret: String,
}

impl StripeGateway {
    pub fn new(api_key: String, webhook_secret: String) -> Self {
        Self { client: Client::new(api_key), webhook_secret }
    }

    fn parse_reference(reference: &str) -> Result<PaymentIntentId> {
        reference
            .parse::<PaymentIntentId>()
            .map_err(|e| AppError::Payment(format!("Invalid payment reference {reference}: {e}")))
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_authorization(&self, request: AuthorizationRequest) -> Result<PaymentAuthorization> {
        let mut params = CreatePaymentIntent::new(request.amount_cents, Currency::USD);
        // Hold only; funds are captured when the provider completes the job.
        params.capture_method = Some(PaymentIntentCaptureMethod::Manual);
        params.description = Some(&request.description);

        let mut metadata = HashMap::new();
        metadata.insert("booking_id".to_string(), request.booking_id.to_string());
        metadata.insert("consumer_id".to_string(), request.consumer_id.to_string());
        metadata.insert("listing_id".to_string(), request.listing_id.to_string());
        params.metadata = Some(metadata);

        let intent = PaymentIntent::create(&self.client, params)
            .await
            .map_err(|e| AppError::Payment(format!("Failed to create authorization: {e}")))?;

        Ok(PaymentAuthorization {
            reference: intent.id.to_string(),
            client_secret: intent.client_secret,
        })
    }

    async fn cancel_authorization(&self, reference: &str) -> Result<()> {
        let id = Self::parse_reference(reference)?;
        let mut params = CancelPaymentIntent::default();
        params.cancellation_reason = Some(PaymentIntentCancellationReason::Abandoned);

        PaymentIntent::cancel(&self.client, &id, params)
            .await
            .map_err(|e| AppError::Payment(format!("Failed to cancel authorization {reference}: {e}")))?;

        Ok(())
    }

    async fn receipt_url(&self, reference: &str) -> Result<Option<String>> {
        let id = Self::parse_reference(reference)?;
        let intent = PaymentIntent::retrieve(&self.client, &id, &["latest_charge"])
            .await
            .map_err(|e| AppError::Payment(format!("Failed to retrieve {reference}: {e}")))?;

        let url = match intent.latest_charge {
            Some(Expandable::Object(charge)) => charge.receipt_url,
            _ => None,
        };

        Ok(url)
    }

    fn verify_event(
        &self,
        payload: &str,
        signature: &str,
    ) -> std::result::Result<Event, WebhookRejection> {
        Webhook::construct_event(payload, signature, &self.webhook_secret).map_err(|e| match e {
            // Signature already checked out; the body is just a shape this
            // SDK does not know.
            WebhookError::BadParse(err) => WebhookRejection::Unintelligible(err.to_string()),
            other => WebhookRejection::BadSignature(other.to_string()),
        })
    }
}

#[cfg(any(test, feature = "test-utils"))]
pub use fake::FakeStripeGateway;

#[cfg(any(test, feature = "test-utils"))]
mod fake {
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Mutex;

    use super::*;

    /// In-memory gateway for tests: hands out predictable references and
    /// records every call. `fail_next_authorization` forces the intake
    /// failure path.
    #[derive(Default)]
    pub struct FakeStripeGateway {
        counter: AtomicU64,
        pub fail_next_authorization: AtomicBool,
        pub authorizations: Mutex<Vec<AuthorizationRequest>>,
        pub cancelled: Mutex<Vec<String>>,
    }

    impl FakeStripeGateway {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn last_reference(&self) -> Option<String> {
            let count = self.counter.load(Ordering::SeqCst);
            if count == 0 {
                None
            } else {
                Some(format!("pi_fake_{count}"))
            }
        }
    }

    #[async_trait]
    impl PaymentGateway for FakeStripeGateway {
        async fn create_authorization(
            &self,
            request: AuthorizationRequest,
        ) -> Result<PaymentAuthorization> {
            if self.fail_next_authorization.swap(false, Ordering::SeqCst) {
                return Err(AppError::Payment("card declined".to_string()));
            }
            let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
            self.authorizations.lock().unwrap().push(request);
            Ok(PaymentAuthorization {
                reference: format!("pi_fake_{n}"),
                client_secret: Some(format!("pi_fake_{n}_secret")),
            })
        }

        async fn cancel_authorization(&self, reference: &str) -> Result<()> {
            self.cancelled.lock().unwrap().push(reference.to_string());
            Ok(())
        }

        async fn receipt_url(&self, reference: &str) -> Result<Option<String>> {
            Ok(Some(format!("https://pay.example.com/receipts/{reference}")))
        }

        fn verify_event(
            &self,
            _payload: &str,
            _signature: &str,
        ) -> std::result::Result<Event, WebhookRejection> {
            Err(WebhookRejection::BadSignature("fake gateway rejects all signatures".to_string()))
        }
    }
}
