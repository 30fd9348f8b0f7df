//! Payment event reconciliation: idempotency, correlation fallback,
//! monotonic transitions, and the guarded confirmation emails.

mod common;

use common::{booking_request, spawn_test_app, TestApp};
use stripe::EventType;
use waypoint::{
    domain::PaymentStatus,
    payments::{BookingRef, PaymentEvent, PaymentEventKind, ReconcileOutcome},
    repository::BookingRepository,
};

async fn created_booking(app: &TestApp) -> anyhow::Result<uuid::Uuid> {
    let created = app
        .services
        .booking_service
        .create_booking(&app.consumer, booking_request(app.listing.id))
        .await?;
    Ok(created.id)
}

fn succeeded_by_id(id: uuid::Uuid) -> PaymentEvent {
    PaymentEvent { kind: PaymentEventKind::PaymentSucceeded, booking: BookingRef::ById(id) }
}

#[tokio::test]
async fn payment_succeeded_is_idempotent() -> anyhow::Result<()> {
    let app = spawn_test_app().await?;
    let booking_id = created_booking(&app).await?;
    let intake_emails = app.mailer.sent().len();

    let outcome = app.services.reconciler.apply(succeeded_by_id(booking_id)).await?;
    assert_eq!(
        outcome,
        ReconcileOutcome::Applied { from: PaymentStatus::Pending, to: PaymentStatus::Paid }
    );

    let booking = app.services.booking_repo.find_by_id(booking_id).await?.unwrap();
    assert_eq!(booking.payment_status, PaymentStatus::Paid);

    // Exactly one confirmation pair for the flip.
    assert_eq!(app.mailer.sent().len(), intake_emails + 2);

    // Redelivery: same status, no more email.
    let outcome = app.services.reconciler.apply(succeeded_by_id(booking_id)).await?;
    assert_eq!(outcome, ReconcileOutcome::AlreadyCurrent);

    let booking = app.services.booking_repo.find_by_id(booking_id).await?.unwrap();
    assert_eq!(booking.payment_status, PaymentStatus::Paid);
    assert_eq!(app.mailer.sent().len(), intake_emails + 2);

    Ok(())
}

#[tokio::test]
async fn correlation_falls_back_to_payment_reference() -> anyhow::Result<()> {
    let app = spawn_test_app().await?;
    let booking_id = created_booking(&app).await?;

    let reference = app
        .services
        .booking_repo
        .find_by_id(booking_id)
        .await?
        .unwrap()
        .payment_intent_id
        .unwrap();

    let outcome = app
        .services
        .reconciler
        .apply(PaymentEvent {
            kind: PaymentEventKind::PaymentSucceeded,
            booking: BookingRef::ByPaymentRef(reference),
        })
        .await?;

    assert_eq!(
        outcome,
        ReconcileOutcome::Applied { from: PaymentStatus::Pending, to: PaymentStatus::Paid }
    );

    let booking = app.services.booking_repo.find_by_id(booking_id).await?.unwrap();
    assert_eq!(booking.payment_status, PaymentStatus::Paid);

    Ok(())
}

#[tokio::test]
async fn refunded_never_flips_back_to_paid() -> anyhow::Result<()> {
    let app = spawn_test_app().await?;
    let booking_id = created_booking(&app).await?;

    app.services.reconciler.apply(succeeded_by_id(booking_id)).await?;

    let outcome = app
        .services
        .reconciler
        .apply(PaymentEvent {
            kind: PaymentEventKind::ChargeRefunded,
            booking: BookingRef::ById(booking_id),
        })
        .await?;
    assert_eq!(
        outcome,
        ReconcileOutcome::Applied { from: PaymentStatus::Paid, to: PaymentStatus::Refunded }
    );

    // A late or replayed success event must not resurrect the payment.
    let outcome = app.services.reconciler.apply(succeeded_by_id(booking_id)).await?;
    assert_eq!(
        outcome,
        ReconcileOutcome::DisallowedEdge { from: PaymentStatus::Refunded, to: PaymentStatus::Paid }
    );

    let booking = app.services.booking_repo.find_by_id(booking_id).await?.unwrap();
    assert_eq!(booking.payment_status, PaymentStatus::Refunded);

    Ok(())
}

#[tokio::test]
async fn failed_payment_stays_failed() -> anyhow::Result<()> {
    let app = spawn_test_app().await?;
    let booking_id = created_booking(&app).await?;
    let intake_emails = app.mailer.sent().len();

    let outcome = app
        .services
        .reconciler
        .apply(PaymentEvent {
            kind: PaymentEventKind::PaymentFailed,
            booking: BookingRef::ById(booking_id),
        })
        .await?;
    assert_eq!(
        outcome,
        ReconcileOutcome::Applied { from: PaymentStatus::Pending, to: PaymentStatus::Failed }
    );

    // A retried payment gets a fresh authorization, so failed -> paid is not
    // an edge this reconciler will take.
    let outcome = app.services.reconciler.apply(succeeded_by_id(booking_id)).await?;
    assert_eq!(
        outcome,
        ReconcileOutcome::DisallowedEdge { from: PaymentStatus::Failed, to: PaymentStatus::Paid }
    );

    // No confirmation emails ever fired.
    assert_eq!(app.mailer.sent().len(), intake_emails);

    Ok(())
}

#[tokio::test]
async fn capture_and_charge_events_mark_paid_without_email() -> anyhow::Result<()> {
    let app = spawn_test_app().await?;
    let booking_id = created_booking(&app).await?;
    let intake_emails = app.mailer.sent().len();

    let outcome = app
        .services
        .reconciler
        .apply(PaymentEvent {
            kind: PaymentEventKind::ChargeCaptured,
            booking: BookingRef::ById(booking_id),
        })
        .await?;
    assert_eq!(
        outcome,
        ReconcileOutcome::Applied { from: PaymentStatus::Pending, to: PaymentStatus::Paid }
    );

    // Only the payment-succeeded kind carries the confirmation side effect.
    assert_eq!(app.mailer.sent().len(), intake_emails);

    Ok(())
}

#[tokio::test]
async fn unknown_booking_is_acknowledged() -> anyhow::Result<()> {
    let app = spawn_test_app().await?;

    let outcome = app
        .services
        .reconciler
        .apply(succeeded_by_id(uuid::Uuid::new_v4()))
        .await?;
    assert_eq!(outcome, ReconcileOutcome::BookingNotFound);

    Ok(())
}

#[test]
fn unhandled_event_types_map_to_nothing() {
    // Valid processor events outside the closed set are ignored, never
    // rejected.
    assert!(PaymentEventKind::from_event_type(&EventType::PaymentIntentCreated).is_none());
    assert!(PaymentEventKind::from_event_type(&EventType::CustomerCreated).is_none());
    assert!(PaymentEventKind::from_event_type(&EventType::InvoicePaid).is_none());

    assert_eq!(
        PaymentEventKind::from_event_type(&EventType::CheckoutSessionCompleted),
        Some(PaymentEventKind::CheckoutCompleted)
    );
    assert_eq!(
        PaymentEventKind::from_event_type(&EventType::ChargeRefunded),
        Some(PaymentEventKind::ChargeRefunded)
    );
}

#[test]
fn transition_table_matches_event_kinds() {
    use PaymentEventKind::*;
    for kind in [CheckoutCompleted, PaymentSucceeded, ChargeCaptured, ChargeSucceeded] {
        assert_eq!(kind.target_status(), PaymentStatus::Paid);
    }
    for kind in [PaymentFailed, PaymentCanceled] {
        assert_eq!(kind.target_status(), PaymentStatus::Failed);
    }
    for kind in [ChargeRefunded, ChargeRefundUpdated] {
        assert_eq!(kind.target_status(), PaymentStatus::Refunded);
    }
}

#[tokio::test]
async fn end_to_end_pay_then_refund() -> anyhow::Result<()> {
    let app = spawn_test_app().await?;

    // Create: $21.00 authorized, booking pending/pending.
    let created = app
        .services
        .booking_service
        .create_booking(&app.consumer, booking_request(app.listing.id))
        .await?;
    let booking = app.services.booking_repo.find_by_id(created.id).await?.unwrap();
    assert_eq!(booking.total_price, 21.00);
    let reference = booking.payment_intent_id.clone().unwrap();

    // Processor reports success with our booking id in metadata.
    app.services.reconciler.apply(succeeded_by_id(created.id)).await?;
    let booking = app.services.booking_repo.find_by_id(created.id).await?.unwrap();
    assert_eq!(booking.payment_status, PaymentStatus::Paid);

    // Exactly one confirmation email per party.
    let confirmations: Vec<_> = app
        .mailer
        .sent()
        .into_iter()
        .filter(|e| e.subject.starts_with("Payment confirmed") || e.subject.starts_with("Booking paid"))
        .collect();
    assert_eq!(confirmations.len(), 2);

    // The refund arrives correlated only by reference.
    app.services
        .reconciler
        .apply(PaymentEvent {
            kind: PaymentEventKind::ChargeRefunded,
            booking: BookingRef::ByPaymentRef(reference),
        })
        .await?;
    let booking = app.services.booking_repo.find_by_id(created.id).await?.unwrap();
    assert_eq!(booking.payment_status, PaymentStatus::Refunded);

    Ok(())
}
