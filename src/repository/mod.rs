use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::*;
use crate::error::Result;

pub mod booking_repository;
pub mod listing_repository;
pub mod profile_repository;
pub mod provider_repository;

pub use booking_repository::SqliteBookingRepository;
pub use listing_repository::SqliteListingRepository;
pub use profile_repository::SqliteProfileRepository;
pub use provider_repository::SqliteProviderRepository;

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn create(&self, booking: NewBooking) -> Result<Booking>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>>;
    /// Correlation fallback: locate the booking whose stored authorization
    /// reference matches.
    async fn find_by_payment_ref(&self, reference: &str) -> Result<Option<Booking>>;
    /// Bookings where the profile is the consumer, or the provider's owner.
    async fn list_for_profile(&self, profile_id: Uuid) -> Result<Vec<Booking>>;
    async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<Booking>;
    async fn update_payment_status(&self, id: Uuid, status: PaymentStatus) -> Result<Booking>;
    /// Write-once: fails if a reference is already set.
    async fn set_payment_reference(&self, id: Uuid, reference: &str) -> Result<()>;
    /// Compensation for a failed intake: booking cancelled, payment failed.
    async fn mark_intake_failed(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait ListingRepository: Send + Sync {
    async fn create(&self, listing: NewListing) -> Result<Listing>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Listing>>;
    async fn list_active(&self) -> Result<Vec<Listing>>;
}

#[async_trait]
pub trait ProviderRepository: Send + Sync {
    async fn create(&self, provider: NewProvider) -> Result<Provider>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Provider>>;
    async fn find_by_profile(&self, profile_id: Uuid) -> Result<Option<Provider>>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn create(&self, profile: NewProfile) -> Result<Profile>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Profile>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Profile>>;
}
