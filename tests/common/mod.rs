#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::SqlitePool;

use waypoint::{
    domain::{
        CreateBookingRequest, NewListing, NewProfile, NewProvider, Profile, ProfileRole, Provider,
        Listing, ServiceType,
    },
    notifications::{Mailer, RecordingMailer},
    payments::{FakeStripeGateway, PaymentGateway},
    repository::{
        ListingRepository, ProfileRepository, ProviderRepository, SqliteBookingRepository,
        SqliteListingRepository, SqliteProfileRepository, SqliteProviderRepository,
    },
    service::ServiceContext,
};

pub async fn test_pool() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePool::connect(":memory:").await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

pub fn build_services(
    pool: SqlitePool,
    gateway: Arc<dyn PaymentGateway>,
    mailer: Arc<dyn Mailer>,
) -> Arc<ServiceContext> {
    let profile_repo = Arc::new(SqliteProfileRepository::new(pool.clone()));
    let provider_repo = Arc::new(SqliteProviderRepository::new(pool.clone()));
    let listing_repo = Arc::new(SqliteListingRepository::new(pool.clone()));
    let booking_repo = Arc::new(SqliteBookingRepository::new(pool.clone()));

    Arc::new(ServiceContext::new(
        profile_repo,
        provider_repo,
        listing_repo,
        booking_repo,
        gateway,
        mailer,
        pool,
    ))
}

/// Everything a booking scenario needs: one consumer, one provider with a
/// courier listing priced base 10 / 2 per mile / 0.5 per minute.
pub struct TestApp {
    pub pool: SqlitePool,
    pub services: Arc<ServiceContext>,
    pub gateway: Arc<FakeStripeGateway>,
    pub mailer: Arc<RecordingMailer>,
    pub consumer: Profile,
    pub provider_profile: Profile,
    pub provider: Provider,
    pub listing: Listing,
}

pub async fn spawn_test_app() -> anyhow::Result<TestApp> {
    let pool = test_pool().await?;
    let gateway = Arc::new(FakeStripeGateway::new());
    let mailer = Arc::new(RecordingMailer::new());

    let gateway_dyn: Arc<dyn PaymentGateway> = gateway.clone();
    let mailer_dyn: Arc<dyn Mailer> = mailer.clone();
    let services = build_services(pool.clone(), gateway_dyn, mailer_dyn);

    let consumer = services
        .profile_repo
        .create(NewProfile {
            email: "rosa@example.com".to_string(),
            full_name: "Rosa Diaz".to_string(),
            role: ProfileRole::Consumer,
        })
        .await?;

    let provider_profile = services
        .profile_repo
        .create(NewProfile {
            email: "dispatch@motorcity-couriers.example".to_string(),
            full_name: "Motor City Couriers".to_string(),
            role: ProfileRole::Provider,
        })
        .await?;

    let provider = services
        .provider_repo
        .create(NewProvider {
            profile_id: provider_profile.id,
            display_name: "Motor City Couriers".to_string(),
            contact_email: "dispatch@motorcity-couriers.example".to_string(),
            service_type: ServiceType::Courier,
        })
        .await?;

    let listing = services
        .listing_repo
        .create(NewListing {
            provider_id: provider.id,
            title: "Same-day courier run".to_string(),
            description: None,
            service_type: ServiceType::Courier,
            price_base: 10.0,
            price_per_mile: 2.0,
            price_per_minute: 0.5,
        })
        .await?;

    Ok(TestApp { pool, services, gateway, mailer, consumer, provider_profile, provider, listing })
}

/// A request that prices to exactly $21.00 against the fixture listing.
pub fn booking_request(listing_id: uuid::Uuid) -> CreateBookingRequest {
    CreateBookingRequest {
        listing_id,
        scheduled_at: "2026-09-01T10:30:00Z".to_string(),
        pickup_address: Some("441 W Canfield St".to_string()),
        dropoff_address: "1265 Griswold St".to_string(),
        special_instructions: None,
        distance_miles: Some(3.0),
        duration_minutes: Some(10.0),
        pickup_lat: None,
        pickup_lng: None,
        dropoff_lat: None,
        dropoff_lng: None,
    }
}

pub async fn auth_token(services: &ServiceContext, profile: &Profile) -> anyhow::Result<String> {
    let token = services.session_store.issue(profile.id, Duration::hours(24)).await?;
    Ok(token)
}

/// Forge a processor signature header over the exact payload bytes:
/// `t=<ts>,v1=<hex hmac-sha256 of "<ts>.<payload>">`.
pub fn stripe_signature(payload: &str, secret: &str) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let timestamp = Utc::now().timestamp();
    let signed_payload = format!("{timestamp}.{payload}");
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(signed_payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    format!("t={timestamp},v1={signature}")
}
