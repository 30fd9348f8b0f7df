use std::sync::Arc;

use sqlx::sqlite::SqlitePoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use waypoint::{
    api,
    config::Settings,
    notifications::{DisabledMailer, Mailer, SmtpMailer},
    payments::StripeGateway,
    repository,
    service::ServiceContext,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "waypoint=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::new().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config: {}. Using defaults.", e);
        Settings::default()
    });

    tracing::info!("Starting Waypoint server on {}:{}", settings.server.host, settings.server.port);

    // Initialize database
    let db_pool = SqlitePoolOptions::new()
        .max_connections(settings.database.max_connections)
        .connect(&settings.database.url)
        .await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&db_pool).await?;

    // Payment processing is the core of the service; refuse to start without it.
    let gateway = match (settings.stripe.secret_key.clone(), settings.stripe.webhook_secret.clone()) {
        (Some(secret_key), Some(webhook_secret)) => {
            tracing::info!("Stripe payment processing enabled");
            Arc::new(StripeGateway::new(secret_key, webhook_secret))
        }
        _ => anyhow::bail!(
            "stripe.secret_key and stripe.webhook_secret must be configured (WAYPOINT__STRIPE__SECRET_KEY / WAYPOINT__STRIPE__WEBHOOK_SECRET)"
        ),
    };

    // Email is best-effort; without SMTP config deliveries are dropped.
    let mailer: Arc<dyn Mailer> = if settings.smtp.enabled {
        tracing::info!("SMTP notifications enabled via {}", settings.smtp.host);
        Arc::new(SmtpMailer::new(&settings.smtp).map_err(|e| anyhow::anyhow!("{e}"))?)
    } else {
        tracing::info!("SMTP notifications disabled");
        Arc::new(DisabledMailer)
    };

    // Initialize repositories
    let profile_repo = Arc::new(repository::SqliteProfileRepository::new(db_pool.clone()));
    let provider_repo = Arc::new(repository::SqliteProviderRepository::new(db_pool.clone()));
    let listing_repo = Arc::new(repository::SqliteListingRepository::new(db_pool.clone()));
    let booking_repo = Arc::new(repository::SqliteBookingRepository::new(db_pool.clone()));

    // Create service context
    let services = Arc::new(ServiceContext::new(
        profile_repo,
        provider_repo,
        listing_repo,
        booking_repo,
        gateway.clone(),
        mailer,
        db_pool,
    ));

    let app = api::create_app(services, gateway, Arc::new(settings.clone()));

    let listener = tokio::net::TcpListener::bind(
        format!("{}:{}", settings.server.host, settings.server.port)
    ).await?;

    tracing::info!("Server listening on http://{}:{}", settings.server.host, settings.server.port);

    axum::serve(listener, app).await?;

    Ok(())
}
