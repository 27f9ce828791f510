//! Top-songs aggregator: the highest-average-rated songs credited to an
//! artist, across all users' reviews.
//!
//! Rating storage knows nothing about artist membership, so this runs in
//! two phases: a local SQL aggregation produces globally-ranked candidates,
//! then catalog batches confirm artist membership and attach display
//! metadata. The candidate set is capped before any external lookup, which
//! bounds phase-2 cost but means an artist whose best song ranks below the
//! global top 300 never surfaces. That is a known, accepted limitation;
//! widening the scan would change the cost envelope.

use crate::catalog::{CatalogKind, CatalogLookup};
use crate::db::reviews;
use anyhow::Result;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::warn;

/// Ceiling on globally-ranked candidates evaluated per query.
pub const CANDIDATE_CAP: i64 = 300;

/// One ranked result entry.
#[derive(Debug, Clone, Serialize)]
pub struct TopSong {
    pub id: String,
    pub title: String,
    pub artists: Vec<String>,
    pub cover_art_url: Option<String>,
    /// Average rating in the half-point decimal domain, rounded to 2
    /// decimals.
    pub avg_rating: f64,
    pub review_count: i64,
    pub external_url: Option<String>,
}

/// Return up to `limit` songs credited to `artist_id`, best-rated first.
///
/// A failed catalog batch is logged and skipped; its candidates are simply
/// not evaluated. Partial results beat total failure for a display widget.
/// The empty result is success.
pub async fn top_songs_for_artist(
    pool: &SqlitePool,
    catalog: &dyn CatalogLookup,
    artist_id: &str,
    limit: usize,
) -> Result<Vec<TopSong>> {
    let candidates = reviews::aggregate_song_ratings(pool, CANDIDATE_CAP).await?;

    let mut results = Vec::with_capacity(limit);
    'batches: for chunk in candidates.chunks(CatalogKind::Track.max_batch()) {
        let ids: Vec<String> = chunk.iter().map(|c| c.item_id.clone()).collect();
        let entries = match catalog.lookup_batch(CatalogKind::Track, &ids).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    chunk_len = ids.len(),
                    "Top-songs catalog batch failed, skipping: {:#}", e
                );
                continue;
            }
        };

        // Walk in candidate-rank order so output stays best-first.
        for candidate in chunk {
            let Some(entry) = entries.get(&candidate.item_id) else {
                continue;
            };
            if !entry.artists.iter().any(|a| a.id == artist_id) {
                continue;
            }

            results.push(TopSong {
                id: entry.id.clone(),
                title: entry.title.clone(),
                artists: entry.artists.iter().map(|a| a.name.clone()).collect(),
                cover_art_url: entry.cover_art_url.clone(),
                avg_rating: round_half_avg(candidate.avg_half),
                review_count: candidate.review_count,
                external_url: entry.external_url.clone(),
            });

            if results.len() >= limit {
                break 'batches;
            }
        }
    }

    Ok(results)
}

/// Half-step-domain average back to half-point decimals, 2-decimal rounded.
fn round_half_avg(avg_half: f64) -> f64 {
    (avg_half / 2.0 * 100.0).round() / 100.0
}
