//! External catalog access.
//!
//! The review store never owns catalog metadata; everything displayable
//! (titles, artist credits, cover art) is fetched live from the provider in
//! id batches. `CatalogLookup` is the seam: production uses the
//! Spotify-shaped client, tests substitute a stub.

pub mod spotify;

pub use spotify::SpotifyCatalog;

use crate::models::ItemType;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::warn;

/// Kind of catalog record a batched lookup resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogKind {
    Track,
    Album,
    Artist,
}

impl CatalogKind {
    /// Provider-imposed maximum ids per lookup call.
    pub fn max_batch(&self) -> usize {
        match self {
            CatalogKind::Track => 50,
            CatalogKind::Album => 20,
            CatalogKind::Artist => 50,
        }
    }
}

impl From<ItemType> for CatalogKind {
    fn from(item_type: ItemType) -> Self {
        match item_type {
            ItemType::Song => CatalogKind::Track,
            ItemType::Album => CatalogKind::Album,
            ItemType::Artist => CatalogKind::Artist,
        }
    }
}

/// An artist credit on a catalog record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogArtist {
    pub id: String,
    pub name: String,
}

/// Display metadata for one catalog item.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    pub artists: Vec<CatalogArtist>,
    pub cover_art_url: Option<String>,
    pub external_url: Option<String>,
}

/// Batched, read-only catalog metadata lookup.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// Resolve metadata for one batch of ids (at most `kind.max_batch()`).
    ///
    /// Ids the provider does not know are simply absent from the result map;
    /// only transport/provider failures return an error.
    async fn lookup_batch(
        &self,
        kind: CatalogKind,
        ids: &[String],
    ) -> Result<HashMap<String, CatalogEntry>>;
}

/// Resolve metadata for arbitrarily many ids, chunked by the provider's
/// batch ceiling. A failed chunk is logged and skipped; its ids are simply
/// missing from the result map. Enrichment callers prefer partial results
/// over total failure.
pub async fn lookup_chunked(
    catalog: &dyn CatalogLookup,
    kind: CatalogKind,
    ids: &[String],
) -> HashMap<String, CatalogEntry> {
    let mut resolved = HashMap::with_capacity(ids.len());
    for chunk in ids.chunks(kind.max_batch()) {
        match catalog.lookup_batch(kind, chunk).await {
            Ok(entries) => resolved.extend(entries),
            Err(e) => {
                warn!(
                    kind = ?kind,
                    chunk_len = chunk.len(),
                    "Catalog batch lookup failed, skipping chunk: {:#}",
                    e
                );
            }
        }
    }
    resolved
}
