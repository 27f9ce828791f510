//! Artist endpoints: top-rated songs for an artist.

use crate::services::top_songs::{self, TopSong};
use crate::{ApiError, ApiResult, AppState};
use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

/// Default result count for the top-songs endpoint
const DEFAULT_TOP_LIMIT: usize = 10;

/// Largest result count the endpoint serves
const MAX_TOP_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct TopSongsParams {
    pub limit: Option<usize>,
}

/// GET /api/artists/:artist_id/top-songs?limit
///
/// Public read path: no user identity required. Empty result is a 200.
pub async fn top_songs_for_artist(
    State(state): State<AppState>,
    Path(artist_id): Path<String>,
    Query(params): Query<TopSongsParams>,
) -> ApiResult<Json<Vec<TopSong>>> {
    let artist_id = artist_id.trim();
    if artist_id.is_empty() {
        return Err(ApiError::InvalidArtistId);
    }

    let limit = params
        .limit
        .unwrap_or(DEFAULT_TOP_LIMIT)
        .clamp(1, MAX_TOP_LIMIT);

    let songs =
        top_songs::top_songs_for_artist(&state.db, state.catalog.as_ref(), artist_id, limit)
            .await?;

    Ok(Json(songs))
}

/// Build artist routes
pub fn artist_routes() -> Router<AppState> {
    Router::new().route("/api/artists/:artist_id/top-songs", get(top_songs_for_artist))
}
