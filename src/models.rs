//! Core review domain types and normalization rules.
//!
//! Ratings live on a half-point scale in [0.5, 5.0]. They are stored as
//! fixed-point half-steps (`round(rating * 2)`, so 1..=10) to keep the
//! database free of floating-point drift; 0 is the storage sentinel for
//! "no rating yet" and is never a valid input value.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum number of whitespace-delimited words in a review body.
pub const MAX_REVIEW_WORDS: usize = 1000;

/// Smallest valid rating, in half-steps.
pub const MIN_RATING_HALF: i64 = 1;

/// Largest valid rating, in half-steps.
pub const MAX_RATING_HALF: i64 = 10;

/// Kind of catalog item a review is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Song,
    Album,
    Artist,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::Song => "song",
            ItemType::Album => "album",
            ItemType::Artist => "artist",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ItemType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "song" => Ok(ItemType::Song),
            "album" => Ok(ItemType::Album),
            "artist" => Ok(ItemType::Artist),
            other => Err(other.to_string()),
        }
    }
}

/// A stored review: one user's rating and/or text for one catalog item.
#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: String,
    pub user_id: String,
    pub item_type: ItemType,
    pub item_id: String,
    /// Half-point decimal in [0.5, 5.0], absent when the user never rated.
    pub rating: Option<f64>,
    /// Trimmed review text; empty string means "no text".
    pub body: String,
    pub likes: i64,
    pub dislikes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Normalize a submitted rating to half-steps.
///
/// In-range values round to the nearest 0.5; anything outside [0.5, 5.0]
/// (including exactly 0) is treated as not provided rather than rejected,
/// so one bad field never fails a whole upsert.
pub fn normalize_rating(rating: f64) -> Option<i64> {
    if !(0.5..=5.0).contains(&rating) {
        return None;
    }
    let half = (rating * 2.0).round() as i64;
    Some(half.clamp(MIN_RATING_HALF, MAX_RATING_HALF))
}

/// Convert stored half-steps back to the half-point decimal domain.
/// The 0 sentinel decodes to `None`.
pub fn rating_from_half(half: i64) -> Option<f64> {
    if (MIN_RATING_HALF..=MAX_RATING_HALF).contains(&half) {
        Some(half as f64 / 2.0)
    } else {
        None
    }
}

/// Count whitespace-delimited words in a review body.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
