//! Review endpoints: upsert, get, delete, and the caller's own listing.

use crate::api::auth::AuthUser;
use crate::db::{reviews, users};
use crate::models::{normalize_rating, word_count, ItemType, Review, MAX_REVIEW_WORDS};
use crate::services::enrich::{self, DisplayMeta};
use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Path, Query, State},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default page size for the listing endpoint
const DEFAULT_PAGE_LIMIT: i64 = 20;

/// Largest page size the listing endpoint serves
const MAX_PAGE_LIMIT: i64 = 50;

/// Upsert request body. Both fields optional, but at least one meaningful
/// field must survive normalization.
#[derive(Debug, Deserialize)]
pub struct UpsertReviewRequest {
    pub rating: Option<f64>,
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeleteReviewResponse {
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
pub struct ListedReview {
    #[serde(flatten)]
    pub review: Review,
    /// Display metadata from the catalog; absent when the provider didn't
    /// resolve the item (or its batch failed).
    pub catalog: Option<DisplayMeta>,
}

#[derive(Debug, Serialize)]
pub struct ListReviewsResponse {
    pub items: Vec<ListedReview>,
    pub next_offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn parse_item_key(item_type: &str, item_id: &str) -> ApiResult<(ItemType, String)> {
    let item_type = item_type
        .parse::<ItemType>()
        .map_err(ApiError::InvalidItemType)?;
    let item_id = item_id.trim();
    if item_id.is_empty() {
        return Err(ApiError::InvalidItemId);
    }
    Ok((item_type, item_id.to_string()))
}

/// PUT /api/reviews/:item_type/:item_id
pub async fn upsert_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((item_type, item_id)): Path<(String, String)>,
    Json(payload): Json<UpsertReviewRequest>,
) -> ApiResult<Json<Review>> {
    let (item_type, item_id) = parse_item_key(&item_type, &item_id)?;

    // Out-of-range ratings are dropped, not rejected; one bad field must
    // not fail the whole upsert.
    let rating_half = payload.rating.and_then(normalize_rating);

    let body = match payload.text.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => {
            let words = word_count(text);
            if words > MAX_REVIEW_WORDS {
                return Err(ApiError::TextTooLong {
                    words,
                    limit: MAX_REVIEW_WORDS,
                });
            }
            Some(text.to_string())
        }
        _ => None,
    };

    if rating_half.is_none() && body.is_none() {
        return Err(ApiError::EmptyReview);
    }

    let patch = reviews::ReviewPatch { rating_half, body };
    let review = reviews::upsert_review(&state.db, &user_id, item_type, &item_id, &patch).await?;

    // Best-effort back-reference; the review itself is already durable.
    if let Err(e) = users::add_review_id(&state.db, &user_id, &review.id).await {
        warn!(
            user_id = %user_id,
            review_id = %review.id,
            "Failed to index review id on user record: {:#}",
            e
        );
    }

    Ok(Json(review))
}

/// GET /api/reviews/:item_type/:item_id
pub async fn get_my_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((item_type, item_id)): Path<(String, String)>,
) -> ApiResult<Json<Review>> {
    let (item_type, item_id) = parse_item_key(&item_type, &item_id)?;

    let review = reviews::get_review(&state.db, &user_id, item_type, &item_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound(format!("No review for {} {}", item_type, item_id))
        })?;

    Ok(Json(review))
}

/// DELETE /api/reviews/:item_type/:item_id
pub async fn delete_my_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path((item_type, item_id)): Path<(String, String)>,
) -> ApiResult<Json<DeleteReviewResponse>> {
    let (item_type, item_id) = parse_item_key(&item_type, &item_id)?;

    let deleted_id = reviews::delete_review(&state.db, &user_id, item_type, &item_id).await?;

    if let Some(review_id) = &deleted_id {
        if let Err(e) = users::remove_review_id(&state.db, &user_id, review_id).await {
            warn!(
                user_id = %user_id,
                review_id = %review_id,
                "Failed to unindex review id on user record: {:#}",
                e
            );
        }
    }

    Ok(Json(DeleteReviewResponse {
        deleted: deleted_id.is_some(),
    }))
}

/// GET /api/reviews?limit&offset
pub async fn list_my_reviews(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<ListReviewsResponse>> {
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_LIMIT).clamp(1, MAX_PAGE_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let page = reviews::list_reviews_by_user(&state.db, &user_id, limit, offset).await?;
    let metadata = enrich::display_metadata(state.catalog.as_ref(), &page).await;

    // A full page means there may be more; a short page is the end.
    let next_offset = (page.len() as i64 == limit).then_some(offset + limit);

    let items = page
        .into_iter()
        .map(|review| {
            let catalog = metadata
                .get(&(review.item_type, review.item_id.clone()))
                .cloned();
            ListedReview { review, catalog }
        })
        .collect();

    Ok(Json(ListReviewsResponse { items, next_offset }))
}

/// Build review routes
pub fn review_routes() -> Router<AppState> {
    Router::new()
        .route("/api/reviews", get(list_my_reviews))
        .route(
            "/api/reviews/:item_type/:item_id",
            put(upsert_review).get(get_my_review).delete(delete_my_review),
        )
}
