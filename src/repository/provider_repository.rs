use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{NewProvider, Provider, ServiceType},
    error::{AppError, Result},
    repository::ProviderRepository,
};

#[derive(FromRow)]
struct ProviderRow {
    id: String,
    profile_id: String,
    display_name: String,
    contact_email: String,
    service_type: String,
    created_at: NaiveDateTime,
}

pub struct SqliteProviderRepository {
    pool: SqlitePool,
}

impl SqliteProviderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_provider(row: ProviderRow) -> Result<Provider> {
        Ok(Provider {
            id: Uuid::parse_str(&row.id).map_err(|e| AppError::Database(e.to_string()))?,
            profile_id: Uuid::parse_str(&row.profile_id)
                .map_err(|e| AppError::Database(e.to_string()))?,
            display_name: row.display_name,
            contact_email: row.contact_email,
            service_type: ServiceType::parse(&row.service_type)
                .ok_or_else(|| AppError::Database(format!("Invalid service type: {}", row.service_type)))?,
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
        })
    }
}

#[async_trait]
impl ProviderRepository for SqliteProviderRepository {
    async fn create(&self, provider: NewProvider) -> Result<Provider> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO providers (id, profile_id, display_name, contact_email, service_type, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(provider.profile_id.to_string())
        .bind(&provider.display_name)
        .bind(&provider.contact_email)
        .bind(provider.service_type.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database("Failed to retrieve created provider".to_string()))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Provider>> {
        let row = sqlx::query_as::<_, ProviderRow>(
            r#"
            SELECT id, profile_id, display_name, contact_email, service_type, created_at
            FROM providers
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_provider(r)?)),
            None => Ok(None),
        }
    }

    async fn find_by_profile(&self, profile_id: Uuid) -> Result<Option<Provider>> {
        let row = sqlx::query_as::<_, ProviderRow>(
            r#"
            SELECT id, profile_id, display_name, contact_email, service_type, created_at
            FROM providers
            WHERE profile_id = ?
            "#,
        )
        .bind(profile_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => Ok(Some(Self::row_to_provider(r)?)),
            None => Ok(None),
        }
    }
}
