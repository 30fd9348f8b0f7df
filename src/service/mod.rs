pub mod booking_service;

use std::sync::Arc;

use sqlx::SqlitePool;

use crate::auth::SessionStore;
use crate::notifications::{Mailer, Notifier};
use crate::payments::{PaymentGateway, PaymentReconciler};
use crate::repository::*;

pub use booking_service::{BookingService, CreatedBooking};

pub struct ServiceContext {
    pub profile_repo: Arc<dyn ProfileRepository>,
    pub provider_repo: Arc<dyn ProviderRepository>,
    pub listing_repo: Arc<dyn ListingRepository>,
    pub booking_repo: Arc<dyn BookingRepository>,
    pub booking_service: Arc<BookingService>,
    pub reconciler: Arc<PaymentReconciler>,
    pub session_store: Arc<SessionStore>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(
        profile_repo: Arc<dyn ProfileRepository>,
        provider_repo: Arc<dyn ProviderRepository>,
        listing_repo: Arc<dyn ListingRepository>,
        booking_repo: Arc<dyn BookingRepository>,
        gateway: Arc<dyn PaymentGateway>,
        mailer: Arc<dyn Mailer>,
        db_pool: SqlitePool,
    ) -> Self {
        let notifier = Arc::new(Notifier::new(mailer));
        let session_store = Arc::new(SessionStore::new(db_pool.clone()));

        let booking_service = Arc::new(BookingService::new(
            booking_repo.clone(),
            listing_repo.clone(),
            provider_repo.clone(),
            gateway,
            notifier.clone(),
        ));

        let reconciler = Arc::new(PaymentReconciler::new(
            booking_repo.clone(),
            listing_repo.clone(),
            provider_repo.clone(),
            profile_repo.clone(),
            notifier,
        ));

        Self {
            profile_repo,
            provider_repo,
            listing_repo,
            booking_repo,
            booking_service,
            reconciler,
            session_store,
            db_pool,
        }
    }
}
