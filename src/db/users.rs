//! User records: a denormalized set of owned review ids per user.
//!
//! This is a convenience index, not a source of truth. Callers invoke it
//! after the primary review write commits and log failures instead of
//! propagating them; a user row that is missing an id is valid state.
//!
//! The read-modify-write below is not atomic: two concurrent writes for
//! the same user can lose one id, silently. That window is accepted; the
//! index tolerates missing ids and the reviews table stays canonical.

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Row, SqlitePool};

/// Add a review id to the owner's set, creating the user row if absent.
/// No-op when the id is already present.
pub async fn add_review_id(pool: &SqlitePool, user_id: &str, review_id: &str) -> Result<()> {
    let mut ids = load_review_ids(pool, user_id).await?;
    if ids.iter().any(|id| id == review_id) {
        return Ok(());
    }
    ids.push(review_id.to_string());
    store_review_ids(pool, user_id, &ids).await
}

/// Remove a review id from the owner's set. No-op when absent.
pub async fn remove_review_id(pool: &SqlitePool, user_id: &str, review_id: &str) -> Result<()> {
    let mut ids = load_review_ids(pool, user_id).await?;
    let before = ids.len();
    ids.retain(|id| id != review_id);
    if ids.len() == before {
        return Ok(());
    }
    store_review_ids(pool, user_id, &ids).await
}

/// Load the owner's review-id set. A missing user row reads as empty.
pub async fn load_review_ids(pool: &SqlitePool, user_id: &str) -> Result<Vec<String>> {
    let row = sqlx::query("SELECT review_ids FROM users WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => {
            let raw: String = row.get("review_ids");
            serde_json::from_str(&raw).context("Corrupt review_ids JSON in users row")
        }
        None => Ok(Vec::new()),
    }
}

async fn store_review_ids(pool: &SqlitePool, user_id: &str, ids: &[String]) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    let encoded = serde_json::to_string(ids).context("Failed to encode review_ids")?;

    sqlx::query(
        r#"
        INSERT INTO users (user_id, review_ids, created_at, updated_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(user_id) DO UPDATE SET
            review_ids = excluded.review_ids,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id)
    .bind(encoded)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .expect("Failed to create in-memory database");
        crate::db::init_tables(&pool)
            .await
            .expect("Failed to initialize schema");
        pool
    }

    #[tokio::test]
    async fn test_add_and_remove_review_ids() {
        let pool = test_pool().await;

        add_review_id(&pool, "u1", "r1").await.unwrap();
        add_review_id(&pool, "u1", "r2").await.unwrap();
        add_review_id(&pool, "u1", "r1").await.unwrap(); // duplicate, no-op

        let ids = load_review_ids(&pool, "u1").await.unwrap();
        assert_eq!(ids, vec!["r1".to_string(), "r2".to_string()]);

        remove_review_id(&pool, "u1", "r1").await.unwrap();
        let ids = load_review_ids(&pool, "u1").await.unwrap();
        assert_eq!(ids, vec!["r2".to_string()]);

        // Removing from a user with no row is fine.
        remove_review_id(&pool, "u2", "r9").await.unwrap();
        assert!(load_review_ids(&pool, "u2").await.unwrap().is_empty());
    }
}
