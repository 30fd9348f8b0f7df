use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{Booking, BookingStatus, NewBooking, PaymentStatus},
    error::{AppError, Result},
    repository::BookingRepository,
};

#[derive(FromRow)]
struct BookingRow {
    id: String,
    consumer_id: String,
    provider_id: String,
    listing_id: String,
    scheduled_at: NaiveDateTime,
    pickup_address: Option<String>,
    dropoff_address: String,
    pickup_lat: Option<f64>,
    pickup_lng: Option<f64>,
    dropoff_lat: Option<f64>,
    dropoff_lng: Option<f64>,
    distance_miles: Option<f64>,
    duration_minutes: Option<f64>,
    special_instructions: Option<String>,
    total_price: f64,
    payment_intent_id: Option<String>,
    payment_status: String,
    status: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

const BOOKING_COLUMNS: &str = r#"
    id, consumer_id, provider_id, listing_id, scheduled_at,
    pickup_address, dropoff_address, pickup_lat, pickup_lng,
    dropoff_lat, dropoff_lng, distance_miles, duration_minutes,
    special_instructions, total_price, payment_intent_id,
    payment_status, status, created_at, updated_at
"#;

pub struct SqliteBookingRepository {
    pool: SqlitePool,
}

impl SqliteBookingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_booking(row: BookingRow) -> Result<Booking> {
        Ok(Booking {
            id: parse_uuid(&row.id)?,
            consumer_id: parse_uuid(&row.consumer_id)?,
            provider_id: parse_uuid(&row.provider_id)?,
            listing_id: parse_uuid(&row.listing_id)?,
            scheduled_at: DateTime::from_naive_utc_and_offset(row.scheduled_at, Utc),
            pickup_address: row.pickup_address,
            dropoff_address: row.dropoff_address,
            pickup_lat: row.pickup_lat,
            pickup_lng: row.pickup_lng,
            dropoff_lat: row.dropoff_lat,
            dropoff_lng: row.dropoff_lng,
            distance_miles: row.distance_miles,
            duration_minutes: row.duration_minutes,
            special_instructions: row.special_instructions,
            total_price: row.total_price,
            payment_intent_id: row.payment_intent_id,
            payment_status: PaymentStatus::parse(&row.payment_status)
                .ok_or_else(|| AppError::Database(format!("Invalid payment status: {}", row.payment_status)))?,
            status: BookingStatus::parse(&row.status)
                .ok_or_else(|| AppError::Database(format!("Invalid booking status: {}", row.status)))?,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }
}

fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| AppError::Database(e.to_string()))
}

#[async_trait]
impl BookingRepository for SqliteBookingRepository {
    async fn create(&self, booking: NewBooking) -> Result<Booking> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, consumer_id, provider_id, listing_id, scheduled_at,
                pickup_address, dropoff_address, pickup_lat, pickup_lng,
                dropoff_lat, dropoff_lng, distance_miles, duration_minutes,
                special_instructions, total_price, payment_intent_id,
                payment_status, status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, NULL, ?, ?, ?, ?)
            "#,
        )
        .bind(&id_str)
        .bind(booking.consumer_id.to_string())
        .bind(booking.provider_id.to_string())
        .bind(booking.listing_id.to_string())
        .bind(booking.scheduled_at.naive_utc())
        .bind(&booking.pickup_address)
        .bind(&booking.dropoff_address)
        .bind(booking.pickup_lat)
        .bind(booking.pickup_lng)
        .bind(booking.dropoff_lat)
        .bind(booking.dropoff_lng)
        .bind(booking.distance_miles)
        .bind(booking.duration_minutes)
        .bind(&booking.special_instructions)
        .bind(booking.total_price)
        .bind(PaymentStatus::Pending.as_str())
        .bind(BookingStatus::Pending.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created booking".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Booking>> {
        let id_str = id.to_string();
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?"
        ))
        .bind(id_str)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_booking(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_payment_ref(&self, reference: &str) -> Result<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE payment_intent_id = ?"
        ))
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_booking(r)?)),
            None => Ok(None),
        }
    }

    async fn list_for_profile(&self, profile_id: Uuid) -> Result<Vec<Booking>> {
        let profile_id_str = profile_id.to_string();
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            r#"
            SELECT {BOOKING_COLUMNS} FROM bookings
            WHERE consumer_id = ?
               OR provider_id IN (SELECT id FROM providers WHERE profile_id = ?)
            ORDER BY created_at DESC
            "#
        ))
        .bind(&profile_id_str)
        .bind(&profile_id_str)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter().map(Self::row_to_booking).collect()
    }

    async fn update_status(&self, id: Uuid, status: BookingStatus) -> Result<Booking> {
        let id_str = id.to_string();
        let now = Utc::now().naive_utc();

        sqlx::query("UPDATE bookings SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(now)
            .bind(&id_str)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated booking".to_string()))
    }

    async fn update_payment_status(&self, id: Uuid, status: PaymentStatus) -> Result<Booking> {
        let id_str = id.to_string();
        let now = Utc::now().naive_utc();

        sqlx::query("UPDATE bookings SET payment_status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(now)
            .bind(&id_str)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve updated booking".to_string()))
    }

    async fn set_payment_reference(&self, id: Uuid, reference: &str) -> Result<()> {
        let id_str = id.to_string();
        let now = Utc::now().naive_utc();

        // The IS NULL guard makes the reference write-once at the row level.
        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET payment_intent_id = ?, updated_at = ?
            WHERE id = ? AND payment_intent_id IS NULL
            "#,
        )
        .bind(reference)
        .bind(now)
        .bind(&id_str)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::Database(format!(
                "Booking {id} missing or payment reference already set"
            )));
        }

        Ok(())
    }

    async fn mark_intake_failed(&self, id: Uuid) -> Result<()> {
        let id_str = id.to_string();
        let now = Utc::now().naive_utc();

        sqlx::query("UPDATE bookings SET status = ?, payment_status = ?, updated_at = ? WHERE id = ?")
            .bind(BookingStatus::Cancelled.as_str())
            .bind(PaymentStatus::Failed.as_str())
            .bind(now)
            .bind(&id_str)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}
