//! Shared test helpers: in-memory app construction and a stub catalog.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tunenote::catalog::{CatalogArtist, CatalogEntry, CatalogKind, CatalogLookup};
use tunenote::AppState;

/// Stub catalog provider backed by a fixed id -> entry map.
///
/// Any batch containing an id that starts with `bad` fails wholesale, to
/// exercise the per-batch failure tolerance paths.
pub struct StubCatalog {
    entries: HashMap<String, CatalogEntry>,
}

impl StubCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries: entries.into_iter().map(|e| (e.id.clone(), e)).collect(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl CatalogLookup for StubCatalog {
    async fn lookup_batch(
        &self,
        _kind: CatalogKind,
        ids: &[String],
    ) -> Result<HashMap<String, CatalogEntry>> {
        if ids.iter().any(|id| id.starts_with("bad")) {
            return Err(anyhow!("stub provider unavailable"));
        }
        Ok(ids
            .iter()
            .filter_map(|id| self.entries.get(id).map(|e| (id.clone(), e.clone())))
            .collect())
    }
}

/// Build a catalog entry for a track credited to the given artist ids.
pub fn track(id: &str, title: &str, artist_ids: &[&str]) -> CatalogEntry {
    CatalogEntry {
        id: id.to_string(),
        title: title.to_string(),
        artists: artist_ids
            .iter()
            .map(|a| CatalogArtist {
                id: a.to_string(),
                name: format!("name-{}", a),
            })
            .collect(),
        cover_art_url: Some(format!("https://img.example/{}.jpg", id)),
        external_url: Some(format!("https://open.example/track/{}", id)),
    }
}

/// Create a test app over an in-memory database and the given stub catalog.
pub async fn create_test_app(catalog: StubCatalog) -> (axum::Router, SqlitePool) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");

    tunenote::db::init_tables(&pool)
        .await
        .expect("Failed to initialize database schema");

    let state = AppState::new(pool.clone(), Arc::new(catalog));
    let app = tunenote::build_router(state);

    (app, pool)
}
