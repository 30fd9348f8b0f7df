use chrono::Duration;
use clap::Parser;
use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use sqlx::sqlite::SqlitePoolOptions;

use waypoint::{
    auth::SessionStore,
    domain::{NewListing, NewProfile, NewProvider, ProfileRole, ServiceType},
    repository::{
        ListingRepository, ProfileRepository, ProviderRepository, SqliteListingRepository,
        SqliteProfileRepository, SqliteProviderRepository,
    },
};

#[derive(Parser)]
#[command(about = "Seed the Waypoint database with development data")]
struct Args {
    /// Database URL (falls back to DATABASE_URL, then sqlite:waypoint.db)
    #[arg(long)]
    database_url: Option<String>,

    /// Number of extra consumer profiles to generate
    #[arg(long, default_value_t = 5)]
    consumers: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    println!("🌱 Starting database seeding...");

    let database_url = args
        .database_url
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite:waypoint.db".to_string());

    let db_pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    println!("📋 Running migrations...");
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    let profile_repo = SqliteProfileRepository::new(db_pool.clone());
    let provider_repo = SqliteProviderRepository::new(db_pool.clone());
    let listing_repo = SqliteListingRepository::new(db_pool.clone());
    let session_store = SessionStore::new(db_pool.clone());

    println!("👥 Creating provider operators...");

    let courier_profile = profile_repo
        .create(NewProfile {
            email: "dispatch@motorcity-couriers.example".to_string(),
            full_name: "Motor City Couriers".to_string(),
            role: ProfileRole::Provider,
        })
        .await?;
    let courier = provider_repo
        .create(NewProvider {
            profile_id: courier_profile.id,
            display_name: "Motor City Couriers".to_string(),
            contact_email: "dispatch@motorcity-couriers.example".to_string(),
            service_type: ServiceType::Courier,
        })
        .await?;

    let aerial_profile = profile_repo
        .create(NewProfile {
            email: "ops@skyline-aerial.example".to_string(),
            full_name: "Skyline Aerial".to_string(),
            role: ProfileRole::Provider,
        })
        .await?;
    let aerial = provider_repo
        .create(NewProvider {
            profile_id: aerial_profile.id,
            display_name: "Skyline Aerial".to_string(),
            contact_email: "ops@skyline-aerial.example".to_string(),
            service_type: ServiceType::AerialImaging,
        })
        .await?;

    println!("📦 Creating listings...");

    listing_repo
        .create(NewListing {
            provider_id: courier.id,
            title: "Same-day courier run".to_string(),
            description: Some("Documents and small parcels across the metro area".to_string()),
            service_type: ServiceType::Courier,
            price_base: 10.0,
            price_per_mile: 2.0,
            price_per_minute: 0.5,
        })
        .await?;

    listing_repo
        .create(NewListing {
            provider_id: courier.id,
            title: "Hot food delivery".to_string(),
            description: Some("Insulated transport, restaurant to door".to_string()),
            service_type: ServiceType::FoodDelivery,
            price_base: 6.0,
            price_per_mile: 1.5,
            price_per_minute: 0.25,
        })
        .await?;

    listing_repo
        .create(NewListing {
            provider_id: aerial.id,
            title: "Aerial site survey".to_string(),
            description: Some("Orthomosaic mapping of construction sites up to 40 acres".to_string()),
            service_type: ServiceType::SiteMapping,
            price_base: 250.0,
            price_per_mile: 0.0,
            price_per_minute: 3.0,
        })
        .await?;

    println!("🧑 Creating {} consumer profiles...", args.consumers);

    for i in 0..args.consumers {
        let consumer = profile_repo
            .create(NewProfile {
                email: SafeEmail().fake(),
                full_name: Name().fake(),
                role: ProfileRole::Consumer,
            })
            .await?;

        let token = session_store.issue(consumer.id, Duration::days(30)).await?;

        println!("  ✅ {} <{}> bearer token: {}", consumer.full_name, consumer.email, token);
        if i == 0 {
            println!("     (use this token in an Authorization: Bearer header)");
        }
    }

    println!("✨ Seeding complete.");

    Ok(())
}
