use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Listing, NewListing, ServiceType},
    error::{AppError, Result},
    repository::ListingRepository,
};

#[derive(FromRow)]
struct ListingRow {
    id: String,
    provider_id: String,
    title: String,
    description: Option<String>,
    service_type: String,
    price_base: f64,
    price_per_mile: f64,
    price_per_minute: f64,
    active: bool,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

pub struct SqliteListingRepository {
    pool: SqlitePool,
}

impl SqliteListingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_listing(row: ListingRow) -> Result<Listing> {
        Ok(Listing {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            provider_id: Uuid::parse_str(&row.provider_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            title: row.title,
            description: row.description,
            service_type: ServiceType::parse(&row.service_type)
                .ok_or_else(|| AppError::Database(format!("Invalid service type: {}", row.service_type)))?,
            price_base: row.price_base,
            price_per_mile: row.price_per_mile,
            price_per_minute: row.price_per_minute,
            active: row.active,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

#[async_trait]
impl ListingRepository for SqliteListingRepository {
    async fn create(&self, listing: NewListing) -> Result<Listing> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO listings (
                id, provider_id, title, description, service_type,
                price_base, price_per_mile, price_per_minute, active,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 1, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(listing.provider_id.to_string())
        .bind(&listing.title)
        .bind(&listing.description)
        .bind(listing.service_type.as_str())
        .bind(listing.price_base)
        .bind(listing.price_per_mile)
        .bind(listing.price_per_minute)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created listing".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Listing>> {
        let row = sqlx::query_as::<_, ListingRow>(
            r#"
            SELECT id, provider_id, title, description, service_type,
                   price_base, price_per_mile, price_per_minute, active,
                   created_at, updated_at
            FROM listings
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_listing(r)?)),
            None => Ok(None),
        }
    }

    async fn list_active(&self) -> Result<Vec<Listing>> {
        let rows = sqlx::query_as::<_, ListingRow>(
            r#"
            SELECT id, provider_id, title, description, service_type,
                   price_base, price_per_mile, price_per_minute, active,
                   created_at, updated_at
            FROM listings
            WHERE active = 1
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_listing).collect()
    }
}
