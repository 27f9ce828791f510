//! Review store: the canonical `(user, item_type, item_id)` -> review
//! mapping.
//!
//! The natural key is enforced by a unique index. An upsert runs as
//! update-if-exists, else insert; when two first-time upserts for the same
//! triple race, exactly one insert wins and the loser retries once as a
//! pure update against the now-existing row. A second miss is a hard error,
//! not ordinary contention.

use crate::models::{rating_from_half, ItemType, Review};
use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Fields an upsert touches. `None` means "leave as is" on the update
/// branch and "use the insert default" (rating sentinel 0, empty body) on
/// the insert branch.
#[derive(Debug, Clone, Default)]
pub struct ReviewPatch {
    pub rating_half: Option<i64>,
    pub body: Option<String>,
}

/// Per-song rating aggregate, ordered best-first.
#[derive(Debug, Clone, PartialEq)]
pub struct RatedSong {
    pub item_id: String,
    /// Average rating in the half-step domain (2.0 .. 10.0).
    pub avg_half: f64,
    pub review_count: i64,
}

/// Upsert a review by its natural key, returning the stored row.
pub async fn upsert_review(
    pool: &SqlitePool,
    user_id: &str,
    item_type: ItemType,
    item_id: &str,
    patch: &ReviewPatch,
) -> Result<Review> {
    let now = Utc::now().to_rfc3339();

    if !try_update(pool, user_id, item_type, item_id, patch, &now).await? {
        match try_insert(pool, user_id, item_type, item_id, patch, &now).await {
            Ok(()) => {}
            Err(e) if is_unique_violation(&e) => {
                // Lost the insert race to a concurrent first-time upsert;
                // the row exists now, so degrade to a pure update.
                if !try_update(pool, user_id, item_type, item_id, patch, &now).await? {
                    return Err(anyhow!(
                        "Review upsert retry found no row for ({}, {}, {})",
                        user_id,
                        item_type,
                        item_id
                    ));
                }
            }
            Err(e) => return Err(e.into()),
        }
    }

    get_review(pool, user_id, item_type, item_id)
        .await?
        .ok_or_else(|| {
            anyhow!(
                "Review vanished after upsert for ({}, {}, {})",
                user_id,
                item_type,
                item_id
            )
        })
}

async fn try_update(
    pool: &SqlitePool,
    user_id: &str,
    item_type: ItemType,
    item_id: &str,
    patch: &ReviewPatch,
    now: &str,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE reviews
        SET rating = COALESCE(?, rating),
            body = COALESCE(?, body),
            updated_at = ?
        WHERE user_id = ? AND item_type = ? AND item_id = ?
        "#,
    )
    .bind(patch.rating_half)
    .bind(&patch.body)
    .bind(now)
    .bind(user_id)
    .bind(item_type.as_str())
    .bind(item_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

async fn try_insert(
    pool: &SqlitePool,
    user_id: &str,
    item_type: ItemType,
    item_id: &str,
    patch: &ReviewPatch,
    now: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO reviews (
            id, user_id, item_type, item_id, rating, body,
            likes, dislikes, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, 0, 0, ?, ?)
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(item_type.as_str())
    .bind(item_id)
    .bind(patch.rating_half.unwrap_or(0))
    .bind(patch.body.as_deref().unwrap_or(""))
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .map(|db_err| db_err.is_unique_violation())
        .unwrap_or(false)
}

/// Load a review by its natural key.
pub async fn get_review(
    pool: &SqlitePool,
    user_id: &str,
    item_type: ItemType,
    item_id: &str,
) -> Result<Option<Review>> {
    let row = sqlx::query(
        r#"
        SELECT id, user_id, item_type, item_id, rating, body,
               likes, dislikes, created_at, updated_at
        FROM reviews
        WHERE user_id = ? AND item_type = ? AND item_id = ?
        "#,
    )
    .bind(user_id)
    .bind(item_type.as_str())
    .bind(item_id)
    .fetch_optional(pool)
    .await?;

    row.map(|r| review_from_row(&r)).transpose()
}

/// Delete a review by its natural key. Returns the deleted review's id, or
/// `None` when there was nothing to delete (idempotent).
pub async fn delete_review(
    pool: &SqlitePool,
    user_id: &str,
    item_type: ItemType,
    item_id: &str,
) -> Result<Option<String>> {
    let row = sqlx::query(
        r#"
        DELETE FROM reviews
        WHERE user_id = ? AND item_type = ? AND item_id = ?
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(item_type.as_str())
    .bind(item_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(|r| r.get("id")))
}

/// List a user's reviews, most-recently-updated first, id as the stable
/// tie-break so offset pagination is deterministic.
pub async fn list_reviews_by_user(
    pool: &SqlitePool,
    user_id: &str,
    limit: i64,
    offset: i64,
) -> Result<Vec<Review>> {
    let rows = sqlx::query(
        r#"
        SELECT id, user_id, item_type, item_id, rating, body,
               likes, dislikes, created_at, updated_at
        FROM reviews
        WHERE user_id = ?
        ORDER BY updated_at DESC, id ASC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    rows.iter().map(review_from_row).collect()
}

/// Aggregate song ratings across all users: per item, the average rating
/// (half-step domain) and the count of contributing reviews, best first.
/// Sentinel (unrated) rows never contribute. The cap bounds downstream
/// catalog-lookup cost regardless of corpus size.
pub async fn aggregate_song_ratings(pool: &SqlitePool, cap: i64) -> Result<Vec<RatedSong>> {
    let rows = sqlx::query(
        r#"
        SELECT item_id, AVG(rating) AS avg_half, COUNT(*) AS review_count
        FROM reviews
        WHERE item_type = 'song' AND rating > 0
        GROUP BY item_id
        ORDER BY avg_half DESC, review_count DESC
        LIMIT ?
        "#,
    )
    .bind(cap)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| RatedSong {
            item_id: row.get("item_id"),
            avg_half: row.get("avg_half"),
            review_count: row.get("review_count"),
        })
        .collect())
}

fn review_from_row(row: &SqliteRow) -> Result<Review> {
    let item_type_str: String = row.get("item_type");
    let item_type = item_type_str
        .parse::<ItemType>()
        .map_err(|t| anyhow!("Corrupt item_type in reviews row: {}", t))?;
    let rating_half: i64 = row.get("rating");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    Ok(Review {
        id: row.get("id"),
        user_id: row.get("user_id"),
        item_type,
        item_id: row.get("item_id"),
        rating: rating_from_half(rating_half),
        body: row.get("body"),
        likes: row.get("likes"),
        dislikes: row.get("dislikes"),
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(value)
        .map_err(|e| anyhow!("Corrupt timestamp in reviews row: {}", e))?
        .with_timezone(&Utc))
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
    async fn test_upsert_inserts_then_updates_in_place() {
        let pool = test_pool().await;

        let first = upsert_review(
            &pool,
            "u1",
            ItemType::Song,
            "track-1",
            &ReviewPatch {
                rating_half: Some(9),
                body: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(first.rating, Some(4.5));
        assert_eq!(first.body, "");

        let second = upsert_review(
            &pool,
            "u1",
            ItemType::Song,
            "track-1",
            &ReviewPatch {
                rating_half: None,
                body: Some("great".to_string()),
            },
        )
        .await
        .unwrap();

        // Same row mutated in place: id stable, untouched field kept.
        assert_eq!(second.id, first.id);
        assert_eq!(second.rating, Some(4.5));
        assert_eq!(second.body, "great");
        assert_eq!(second.created_at, first.created_at);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM reviews")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_get_missing_review_is_none() {
        let pool = test_pool().await;
        let review = get_review(&pool, "u1", ItemType::Album, "album-1")
            .await
            .unwrap();
        assert!(review.is_none());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let pool = test_pool().await;
        upsert_review(
            &pool,
            "u1",
            ItemType::Song,
            "track-1",
            &ReviewPatch {
                rating_half: Some(6),
                body: None,
            },
        )
        .await
        .unwrap();

        let first = delete_review(&pool, "u1", ItemType::Song, "track-1")
            .await
            .unwrap();
        assert!(first.is_some());

        let second = delete_review(&pool, "u1", ItemType::Song, "track-1")
            .await
            .unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn test_list_orders_by_updated_at_desc() {
        let pool = test_pool().await;
        for (item, rating) in [("t1", 6), ("t2", 8), ("t3", 10)] {
            upsert_review(
                &pool,
                "u1",
                ItemType::Song,
                item,
                &ReviewPatch {
                    rating_half: Some(rating),
                    body: None,
                },
            )
            .await
            .unwrap();
            // Distinct timestamps so the ordering is unambiguous.
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        // Touch t1 again; it should move to the front.
        upsert_review(
            &pool,
            "u1",
            ItemType::Song,
            "t1",
            &ReviewPatch {
                rating_half: None,
                body: Some("revisited".to_string()),
            },
        )
        .await
        .unwrap();

        let reviews = list_reviews_by_user(&pool, "u1", 10, 0).await.unwrap();
        let items: Vec<&str> = reviews.iter().map(|r| r.item_id.as_str()).collect();
        assert_eq!(items, vec!["t1", "t3", "t2"]);

        // Another user's reviews don't leak in.
        let other = list_reviews_by_user(&pool, "u2", 10, 0).await.unwrap();
        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn test_aggregate_orders_by_avg_then_count() {
        let pool = test_pool().await;

        // s1: avg 4.5 from 3 reviews; s2: avg 4.5 from 5; s3: avg 5.0 from 1.
        for user in ["a", "b", "c"] {
            upsert_review(
                &pool,
                user,
                ItemType::Song,
                "s1",
                &ReviewPatch {
                    rating_half: Some(9),
                    body: None,
                },
            )
            .await
            .unwrap();
        }
        for user in ["a", "b", "c", "d", "e"] {
            upsert_review(
                &pool,
                user,
                ItemType::Song,
                "s2",
                &ReviewPatch {
                    rating_half: Some(9),
                    body: None,
                },
            )
            .await
            .unwrap();
        }
        upsert_review(
            &pool,
            "a",
            ItemType::Song,
            "s3",
            &ReviewPatch {
                rating_half: Some(10),
                body: None,
            },
        )
        .await
        .unwrap();

        // Text-only review: sentinel rating, must not contribute.
        upsert_review(
            &pool,
            "f",
            ItemType::Song,
            "s1",
            &ReviewPatch {
                rating_half: None,
                body: Some("words only".to_string()),
            },
        )
        .await
        .unwrap();

        // Album reviews must not contribute either.
        upsert_review(
            &pool,
            "a",
            ItemType::Album,
            "s1",
            &ReviewPatch {
                rating_half: Some(2),
                body: None,
            },
        )
        .await
        .unwrap();

        let ranked = aggregate_song_ratings(&pool, 300).await.unwrap();
        let order: Vec<(&str, i64)> = ranked
            .iter()
            .map(|r| (r.item_id.as_str(), r.review_count))
            .collect();
        assert_eq!(order, vec![("s3", 1), ("s2", 5), ("s1", 3)]);
        assert!((ranked[0].avg_half - 10.0).abs() < f64::EPSILON);
        assert!((ranked[1].avg_half - 9.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_aggregate_respects_cap() {
        let pool = test_pool().await;
        for i in 0..10 {
            upsert_review(
                &pool,
                "u1",
                ItemType::Song,
                &format!("s{}", i),
                &ReviewPatch {
                    rating_half: Some(8),
                    body: None,
                },
            )
            .await
            .unwrap();
        }

        let ranked = aggregate_song_ratings(&pool, 4).await.unwrap();
        assert_eq!(ranked.len(), 4);
    }
}
