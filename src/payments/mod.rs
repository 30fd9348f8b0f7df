pub mod gateway;
pub mod reconciler;

pub use gateway::{
    AuthorizationRequest, PaymentAuthorization, PaymentGateway, StripeGateway, WebhookRejection,
};
pub use reconciler::{BookingRef, PaymentEvent, PaymentEventKind, PaymentReconciler, ReconcileOutcome};

#[cfg(any(test, feature = "test-utils"))]
pub use gateway::FakeStripeGateway;
