use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// Bearer-token sessions backing the `Authorization` header. Tokens are
/// random 32-byte values handed to the client once; only their sha256 lands
/// in the database.
pub struct SessionStore {
    pool: SqlitePool,
}

impl SessionStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Mint a token for a profile and return it.
    pub async fn issue(&self, profile_id: Uuid, ttl: Duration) -> Result<String> {
        let token = generate_token();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO sessions (id, profile_id, token_hash, expires_at, created_at, last_used_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(profile_id.to_string())
        .bind(hash_token(&token))
        .bind((now + ttl).naive_utc())
        .bind(now.naive_utc())
        .bind(now.naive_utc())
        .execute(&self.pool)
        .await?;

        Ok(token)
    }

    /// Resolve a presented token to its profile id, bumping `last_used_at`.
    /// Expired or unknown tokens resolve to `None`.
    pub async fn authenticate(&self, token: &str) -> Result<Option<Uuid>> {
        let now = Utc::now().naive_utc();

        let row: Option<(String, String)> = sqlx::query_as(
            "SELECT id, profile_id FROM sessions WHERE token_hash = ? AND expires_at > ?",
        )
        .bind(hash_token(token))
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        let Some((session_id, profile_id)) = row else {
            return Ok(None);
        };

        sqlx::query("UPDATE sessions SET last_used_at = ? WHERE id = ?")
            .bind(now)
            .bind(&session_id)
            .execute(&self.pool)
            .await?;

        let profile_id =
            Uuid::parse_str(&profile_id).map_err(|e| AppError::Database(e.to_string()))?;
        Ok(Some(profile_id))
    }

    pub async fn revoke(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM sessions WHERE token_hash = ?")
            .bind(hash_token(token))
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn cleanup_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= ?")
            .bind(Utc::now().naive_utc())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}

fn generate_token() -> String {
    use rand::RngCore;
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn hash_token(token: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
