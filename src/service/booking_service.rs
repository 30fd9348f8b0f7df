use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::{Booking, BookingStatus, CreateBookingRequest, NewBooking, PaymentStatus, Profile},
    error::{AppError, Result},
    notifications::Notifier,
    payments::{AuthorizationRequest, PaymentGateway},
    pricing::{self, TripInputs},
    repository::{BookingRepository, ListingRepository, ProviderRepository},
};

/// Which side of the marketplace the caller is acting as for a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Party {
    Consumer,
    Provider,
}

#[derive(Debug, Clone)]
pub struct CreatedBooking {
    pub id: Uuid,
    pub client_secret: Option<String>,
}

/// Order intake and the booking workflow. Intake persists the booking, opens
/// a payment authorization tagged with the booking id, and records the
/// reference; every status change goes through the explicit transition table.
pub struct BookingService {
    bookings: Arc<dyn BookingRepository>,
    listings: Arc<dyn ListingRepository>,
    providers: Arc<dyn ProviderRepository>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<Notifier>,
}

impl BookingService {
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        listings: Arc<dyn ListingRepository>,
        providers: Arc<dyn ProviderRepository>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self { bookings, listings, providers, gateway, notifier }
    }

    pub async fn create_booking(
        &self,
        consumer: &Profile,
        request: CreateBookingRequest,
    ) -> Result<CreatedBooking> {
        request.validate()?;

        let scheduled_at = parse_schedule(&request.scheduled_at)?;

        let listing = self
            .listings
            .find_by_id(request.listing_id)
            .await?
            .filter(|l| l.active)
            .ok_or_else(|| AppError::NotFound("Listing not found".to_string()))?;

        let provider = self
            .providers
            .find_by_id(listing.provider_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!("Listing {} has no provider", listing.id))
            })?;

        let trip = TripInputs {
            distance_miles: request.distance_miles,
            duration_minutes: request.duration_minutes,
            pickup: coordinate_pair(request.pickup_lat, request.pickup_lng),
            dropoff: coordinate_pair(request.dropoff_lat, request.dropoff_lng),
        };
        let total = pricing::compute_total(&listing, &trip);

        let booking = self
            .bookings
            .create(NewBooking {
                consumer_id: consumer.id,
                provider_id: provider.id,
                listing_id: listing.id,
                scheduled_at,
                pickup_address: request.pickup_address,
                dropoff_address: request.dropoff_address,
                pickup_lat: request.pickup_lat,
                pickup_lng: request.pickup_lng,
                dropoff_lat: request.dropoff_lat,
                dropoff_lng: request.dropoff_lng,
                distance_miles: request.distance_miles,
                duration_minutes: request.duration_minutes,
                special_instructions: request.special_instructions,
                total_price: total,
            })
            .await?;

        let authorization = match self
            .gateway
            .create_authorization(AuthorizationRequest {
                booking_id: booking.id,
                consumer_id: consumer.id,
                listing_id: listing.id,
                amount_cents: pricing::total_cents(total),
                description: format!("{} ({})", listing.title, provider.display_name),
            })
            .await
        {
            Ok(authorization) => authorization,
            Err(e) => {
                // A booking may not stay live without an authorization.
                if let Err(cleanup) = self.bookings.mark_intake_failed(booking.id).await {
                    tracing::error!(booking_id = %booking.id, error = ?cleanup, "failed to cancel booking after authorization failure");
                }
                return Err(e);
            }
        };

        if let Err(e) = self
            .bookings
            .set_payment_reference(booking.id, &authorization.reference)
            .await
        {
            // The hold exists but we can't record it; release it rather than
            // strand an untracked authorization.
            if let Err(cancel) = self.gateway.cancel_authorization(&authorization.reference).await {
                tracing::error!(
                    booking_id = %booking.id,
                    reference = %authorization.reference,
                    error = ?cancel,
                    "failed to release authorization after reference write failure"
                );
            }
            if let Err(cleanup) = self.bookings.mark_intake_failed(booking.id).await {
                tracing::error!(booking_id = %booking.id, error = ?cleanup, "failed to cancel booking after reference write failure");
            }
            return Err(e);
        }

        self.notifier
            .booking_created(consumer, &provider, &booking, &listing.title)
            .await;

        tracing::info!(booking_id = %booking.id, total = total, "booking created");

        Ok(CreatedBooking { id: booking.id, client_secret: authorization.client_secret })
    }

    pub async fn get_booking(&self, actor: &Profile, id: Uuid) -> Result<Booking> {
        let (booking, _) = self.load_scoped(actor, id).await?;
        Ok(booking)
    }

    pub async fn list_bookings(&self, actor: &Profile) -> Result<Vec<Booking>> {
        self.bookings.list_for_profile(actor.id).await
    }

    pub async fn accept(&self, actor: &Profile, id: Uuid) -> Result<Booking> {
        self.transition(actor, id, BookingStatus::Accepted, Party::Provider).await
    }

    pub async fn start(&self, actor: &Profile, id: Uuid) -> Result<Booking> {
        self.transition(actor, id, BookingStatus::InProgress, Party::Provider).await
    }

    pub async fn complete(&self, actor: &Profile, id: Uuid) -> Result<Booking> {
        self.transition(actor, id, BookingStatus::Completed, Party::Provider).await
    }

    pub async fn cancel(&self, actor: &Profile, id: Uuid) -> Result<Booking> {
        self.transition(actor, id, BookingStatus::Cancelled, Party::Consumer).await
    }

    pub async fn receipt_url(&self, actor: &Profile, id: Uuid) -> Result<String> {
        let (booking, _) = self.load_scoped(actor, id).await?;

        if booking.payment_status != PaymentStatus::Paid {
            return Err(AppError::NotFound("No receipt available".to_string()));
        }
        let reference = booking
            .payment_intent_id
            .as_deref()
            .ok_or_else(|| AppError::NotFound("No receipt available".to_string()))?;

        self.gateway
            .receipt_url(reference)
            .await?
            .ok_or_else(|| AppError::NotFound("No receipt available".to_string()))
    }

    async fn transition(
        &self,
        actor: &Profile,
        id: Uuid,
        to: BookingStatus,
        required: Party,
    ) -> Result<Booking> {
        let (booking, party) = self.load_scoped(actor, id).await?;

        if party != required {
            let side = match required {
                Party::Consumer => "consumer",
                Party::Provider => "provider",
            };
            return Err(AppError::validation(format!(
                "Only the {side} can move this booking to {}",
                to.as_str()
            )));
        }

        if !booking.status.can_transition(to) {
            return Err(AppError::validation(format!(
                "Cannot move booking from {} to {}",
                booking.status.as_str(),
                to.as_str()
            )));
        }

        let updated = self.bookings.update_status(id, to).await?;
        tracing::info!(booking_id = %id, from = booking.status.as_str(), to = to.as_str(), "booking status updated");
        Ok(updated)
    }

    /// Bookings are visible only to their parties; anyone else sees a 404.
    async fn load_scoped(&self, actor: &Profile, id: Uuid) -> Result<(Booking, Party)> {
        let booking = self
            .bookings
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        if booking.consumer_id == actor.id {
            return Ok((booking, Party::Consumer));
        }

        if let Some(provider) = self.providers.find_by_profile(actor.id).await? {
            if provider.id == booking.provider_id {
                return Ok((booking, Party::Provider));
            }
        }

        Err(AppError::NotFound("Booking not found".to_string()))
    }
}

fn parse_schedule(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::InvalidSchedule(format!("Not a valid RFC 3339 datetime: {raw}")))
}

fn coordinate_pair(lat: Option<f64>, lng: Option<f64>) -> Option<(f64, f64)> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => Some((lat, lng)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedule_parsing() {
        assert!(parse_schedule("2026-09-01T10:30:00Z").is_ok());
        assert!(parse_schedule("2026-09-01T10:30:00+02:00").is_ok());
        assert!(matches!(
            parse_schedule("next tuesday"),
            Err(AppError::InvalidSchedule(_))
        ));
        assert!(matches!(parse_schedule(""), Err(AppError::InvalidSchedule(_))));
    }

    #[test]
    fn coordinate_pairs_need_both_halves() {
        assert_eq!(coordinate_pair(Some(42.0), Some(-83.0)), Some((42.0, -83.0)));
        assert_eq!(coordinate_pair(Some(42.0), None), None);
        assert_eq!(coordinate_pair(None, Some(-83.0)), None);
        assert_eq!(coordinate_pair(None, None), None);
    }
}
