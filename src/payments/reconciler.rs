use std::sync::Arc;

use stripe::{Charge, CheckoutSession, Event, EventObject, EventType, Expandable, PaymentIntent};
use uuid::Uuid;

use crate::{
    domain::{Booking, PaymentStatus},
    error::Result,
    notifications::Notifier,
    repository::{BookingRepository, ListingRepository, ProfileRepository, ProviderRepository},
};

/// The closed set of processor notifications the reconciler understands.
/// Everything else is acknowledged and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEventKind {
    CheckoutCompleted,
    PaymentSucceeded,
    PaymentFailed,
    PaymentCanceled,
    ChargeCaptured,
    ChargeSucceeded,
    ChargeRefunded,
    ChargeRefundUpdated,
}

impl PaymentEventKind {
    /// Event types that map to a kind regardless of object payload.
    /// `charge.updated` is absent here: it only becomes an event when the
    /// charge carries the refunded flag, which needs the object.
    pub fn from_event_type(event_type: &EventType) -> Option<Self> {
        match event_type {
            EventType::CheckoutSessionCompleted => Some(PaymentEventKind::CheckoutCompleted),
            EventType::PaymentIntentSucceeded => Some(PaymentEventKind::PaymentSucceeded),
            EventType::PaymentIntentPaymentFailed => Some(PaymentEventKind::PaymentFailed),
            EventType::PaymentIntentCanceled => Some(PaymentEventKind::PaymentCanceled),
            EventType::ChargeCaptured => Some(PaymentEventKind::ChargeCaptured),
            EventType::ChargeSucceeded => Some(PaymentEventKind::ChargeSucceeded),
            EventType::ChargeRefunded => Some(PaymentEventKind::ChargeRefunded),
            _ => None,
        }
    }

    pub fn target_status(&self) -> PaymentStatus {
        match self {
            PaymentEventKind::CheckoutCompleted
            | PaymentEventKind::PaymentSucceeded
            | PaymentEventKind::ChargeCaptured
            | PaymentEventKind::ChargeSucceeded => PaymentStatus::Paid,
            PaymentEventKind::PaymentFailed | PaymentEventKind::PaymentCanceled => {
                PaymentStatus::Failed
            }
            PaymentEventKind::ChargeRefunded | PaymentEventKind::ChargeRefundUpdated => {
                PaymentStatus::Refunded
            }
        }
    }
}

/// Correlation key carried by an event: the booking id when the processor
/// echoed our metadata back, otherwise the authorization reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingRef {
    ById(Uuid),
    ByPaymentRef(String),
}

/// A processor notification reduced to what the reconciler needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentEvent {
    pub kind: PaymentEventKind,
    pub booking: BookingRef,
}

impl PaymentEvent {
    /// Reduce a verified processor event. `None` means the event is not one
    /// of ours (unknown kind, mismatched payload, or no correlation key) and
    /// must be acknowledged without side effects.
    pub fn from_stripe(event: &Event) -> Option<PaymentEvent> {
        match (&event.type_, &event.data.object) {
            (EventType::CheckoutSessionCompleted, EventObject::CheckoutSession(session)) => {
                Some(PaymentEvent {
                    kind: PaymentEventKind::CheckoutCompleted,
                    booking: ref_from_session(session)?,
                })
            }
            (event_type, EventObject::PaymentIntent(intent)) => {
                let kind = PaymentEventKind::from_event_type(event_type)?;
                Some(PaymentEvent { kind, booking: ref_from_intent(intent) })
            }
            (EventType::ChargeUpdated, EventObject::Charge(charge)) => {
                if !charge.refunded {
                    return None;
                }
                Some(PaymentEvent {
                    kind: PaymentEventKind::ChargeRefundUpdated,
                    booking: ref_from_charge(charge)?,
                })
            }
            (event_type, EventObject::Charge(charge)) => {
                let kind = PaymentEventKind::from_event_type(event_type)?;
                Some(PaymentEvent { kind, booking: ref_from_charge(charge)? })
            }
            _ => None,
        }
    }
}

fn booking_id_from_metadata(metadata: &std::collections::HashMap<String, String>) -> Option<Uuid> {
    metadata.get("booking_id").and_then(|v| Uuid::parse_str(v).ok())
}

fn expandable_intent_id(intent: &Expandable<PaymentIntent>) -> String {
    match intent {
        Expandable::Id(id) => id.to_string(),
        Expandable::Object(intent) => intent.id.to_string(),
    }
}

fn ref_from_intent(intent: &PaymentIntent) -> BookingRef {
    match booking_id_from_metadata(&intent.metadata) {
        Some(id) => BookingRef::ById(id),
        None => BookingRef::ByPaymentRef(intent.id.to_string()),
    }
}

fn ref_from_charge(charge: &Charge) -> Option<BookingRef> {
    if let Some(id) = booking_id_from_metadata(&charge.metadata) {
        return Some(BookingRef::ById(id));
    }
    charge
        .payment_intent
        .as_ref()
        .map(|intent| BookingRef::ByPaymentRef(expandable_intent_id(intent)))
}

fn ref_from_session(session: &CheckoutSession) -> Option<BookingRef> {
    if let Some(id) = session.metadata.as_ref().and_then(|m| booking_id_from_metadata(m)) {
        return Some(BookingRef::ById(id));
    }
    if let Some(id) = session.client_reference_id.as_deref().and_then(|v| Uuid::parse_str(v).ok()) {
        return Some(BookingRef::ById(id));
    }
    session
        .payment_intent
        .as_ref()
        .map(|intent| BookingRef::ByPaymentRef(expandable_intent_id(intent)))
}

/// What applying an event did. Everything except `Applied` is a no-op on
/// storage; none of these are errors from the processor's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Applied { from: PaymentStatus, to: PaymentStatus },
    AlreadyCurrent,
    DisallowedEdge { from: PaymentStatus, to: PaymentStatus },
    BookingNotFound,
}

/// Applies verified processor events to booking state, exactly once per
/// logical outcome. Status writes are idempotent by value; the confirmation
/// email pair is guarded by the observed `pending -> paid` flip so webhook
/// retries never double-send.
pub struct PaymentReconciler {
    bookings: Arc<dyn BookingRepository>,
    listings: Arc<dyn ListingRepository>,
    providers: Arc<dyn ProviderRepository>,
    profiles: Arc<dyn ProfileRepository>,
    notifier: Arc<Notifier>,
}

impl PaymentReconciler {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        listings: Arc<dyn ListingRepository>,
        providers: Arc<dyn ProviderRepository>,
        profiles: Arc<dyn ProfileRepository>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self { bookings, listings, providers, profiles, notifier }
    }

    pub async fn apply(&self, event: PaymentEvent) -> Result<ReconcileOutcome> {
        let booking = match self.resolve(&event.booking).await? {
            Some(booking) => booking,
            None => {
                tracing::warn!(booking_ref = ?event.booking, kind = ?event.kind, "no booking for payment event");
                return Ok(ReconcileOutcome::BookingNotFound);
            }
        };

        let prior = booking.payment_status;
        let target = event.kind.target_status();

        if prior == target {
            tracing::debug!(booking_id = %booking.id, status = ?target, "redundant payment event, no-op");
            return Ok(ReconcileOutcome::AlreadyCurrent);
        }

        if !prior.can_transition(target) {
            tracing::warn!(
                booking_id = %booking.id,
                from = ?prior,
                to = ?target,
                kind = ?event.kind,
                "skipping disallowed payment transition"
            );
            return Ok(ReconcileOutcome::DisallowedEdge { from: prior, to: target });
        }

        self.bookings.update_payment_status(booking.id, target).await?;
        tracing::info!(booking_id = %booking.id, from = ?prior, to = ?target, "payment status updated");

        // Only the observed pending -> paid flip triggers the confirmation
        // pair; a re-delivered success event lands in the no-op branch above.
        if event.kind == PaymentEventKind::PaymentSucceeded && target == PaymentStatus::Paid {
            self.send_payment_confirmation(&booking).await;
        }

        Ok(ReconcileOutcome::Applied { from: prior, to: target })
    }

    async fn resolve(&self, booking_ref: &BookingRef) -> Result<Option<Booking>> {
        match booking_ref {
            BookingRef::ById(id) => self.bookings.find_by_id(*id).await,
            BookingRef::ByPaymentRef(reference) => self.bookings.find_by_payment_ref(reference).await,
        }
    }

    async fn send_payment_confirmation(&self, booking: &Booking) {
        let consumer = match self.profiles.find_by_id(booking.consumer_id).await {
            Ok(Some(profile)) => profile,
            other => {
                tracing::warn!(booking_id = %booking.id, ?other, "consumer lookup failed, skipping confirmation emails");
                return;
            }
        };
        let provider = match self.providers.find_by_id(booking.provider_id).await {
            Ok(Some(provider)) => provider,
            other => {
                tracing::warn!(booking_id = %booking.id, ?other, "provider lookup failed, skipping confirmation emails");
                return;
            }
        };
        let listing_title = match self.listings.find_by_id(booking.listing_id).await {
            Ok(Some(listing)) => listing.title,
            _ => "your booking".to_string(),
        };

        self.notifier
            .payment_confirmed(&consumer, &provider, booking, &listing_title)
            .await;
    }
}
