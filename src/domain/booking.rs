use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A single order linking a consumer, a provider, and a listing.
///
/// `status` tracks the consumer/provider-driven workflow; `payment_status` is
/// owned by the payment reconciler and moves independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub consumer_id: Uuid,
    pub provider_id: Uuid,
    pub listing_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub pickup_address: Option<String>,
    pub dropoff_address: String,
    pub pickup_lat: Option<f64>,
    pub pickup_lng: Option<f64>,
    pub dropoff_lat: Option<f64>,
    pub dropoff_lng: Option<f64>,
    pub distance_miles: Option<f64>,
    pub duration_minutes: Option<f64>,
    pub special_instructions: Option<String>,
    /// Total in dollars, rounded to cents at quote time.
    pub total_price: f64,
    /// Processor authorization reference. Write-once: set during intake,
    /// never rewritten afterwards.
    pub payment_intent_id: Option<String>,
    pub payment_status: PaymentStatus,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields needed to insert a booking row. Status columns always start at
/// `pending`/`pending` with no payment reference.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub consumer_id: Uuid,
    pub provider_id: Uuid,
    pub listing_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub pickup_address: Option<String>,
    pub dropoff_address: String,
    pub pickup_lat: Option<f64>,
    pub pickup_lng: Option<f64>,
    pub dropoff_lat: Option<f64>,
    pub dropoff_lng: Option<f64>,
    pub distance_miles: Option<f64>,
    pub duration_minutes: Option<f64>,
    pub special_instructions: Option<String>,
    pub total_price: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Accepted,
    InProgress,
    Completed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Accepted => "accepted",
            BookingStatus::InProgress => "in_progress",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "accepted" => Some(BookingStatus::Accepted),
            "in_progress" => Some(BookingStatus::InProgress),
            "completed" => Some(BookingStatus::Completed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Completed | BookingStatus::Cancelled)
    }

    /// The workflow edges actually intended. Every status write goes through
    /// this check; there is no direct-assignment path.
    pub fn can_transition(&self, to: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, to),
            (Pending, Accepted)
                | (Accepted, InProgress)
                | (InProgress, Completed)
                | (Pending, Cancelled)
                | (Accepted, Cancelled)
        )
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            "failed" => Some(PaymentStatus::Failed),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }

    /// Monotonic edges. Re-applying the current value is handled by callers
    /// as a no-op; anything outside this set is skipped, so a `refunded`
    /// booking can never flip back to `paid` however events are ordered.
    pub fn can_transition(&self, to: PaymentStatus) -> bool {
        use PaymentStatus::*;
        matches!((self, to), (Pending, Paid) | (Pending, Failed) | (Paid, Refunded))
    }
}

/// Client payload for `POST /api/bookings`.
///
/// `scheduled_at` arrives as a string so that an unparseable datetime maps to
/// `INVALID_SCHEDULE` rather than a generic deserialization failure.
/// Coordinates are genuinely optional; absence means the distance term of the
/// quote falls back to an explicit `distance_miles` or to zero.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub listing_id: Uuid,
    pub scheduled_at: String,
    pub pickup_address: Option<String>,
    #[validate(length(min = 1, message = "dropoff address must not be empty"))]
    pub dropoff_address: String,
    pub special_instructions: Option<String>,
    #[validate(range(min = 0.0))]
    pub distance_miles: Option<f64>,
    #[validate(range(min = 0.0))]
    pub duration_minutes: Option<f64>,
    pub pickup_lat: Option<f64>,
    pub pickup_lng: Option<f64>,
    pub dropoff_lat: Option<f64>,
    pub dropoff_lng: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booking_workflow_edges() {
        use BookingStatus::*;
        assert!(Pending.can_transition(Accepted));
        assert!(Accepted.can_transition(InProgress));
        assert!(InProgress.can_transition(Completed));
        assert!(Pending.can_transition(Cancelled));
        assert!(Accepted.can_transition(Cancelled));

        assert!(!InProgress.can_transition(Cancelled));
        assert!(!Completed.can_transition(Cancelled));
        assert!(!Cancelled.can_transition(Pending));
        assert!(!Pending.can_transition(Completed));
        assert!(!Pending.can_transition(InProgress));
    }

    #[test]
    fn payment_transitions_are_monotonic() {
        use PaymentStatus::*;
        assert!(Pending.can_transition(Paid));
        assert!(Pending.can_transition(Failed));
        assert!(Paid.can_transition(Refunded));

        // No path leads back out of refunded, and a failed payment does not
        // become paid through reconciliation.
        assert!(!Refunded.can_transition(Paid));
        assert!(!Refunded.can_transition(Failed));
        assert!(!Refunded.can_transition(Pending));
        assert!(!Failed.can_transition(Paid));
        assert!(!Paid.can_transition(Pending));
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Accepted,
            BookingStatus::InProgress,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Paid,
            PaymentStatus::Failed,
            PaymentStatus::Refunded,
        ] {
            assert_eq!(PaymentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(BookingStatus::parse("unknown"), None);
        assert_eq!(PaymentStatus::parse("unknown"), None);
    }
}
