//! Display-metadata enrichment for review listings.
//!
//! Resolves titles, cover art, and links for a page of reviews in one
//! chunked catalog pass per item kind. Enrichment is best-effort: a failed
//! chunk just leaves those entries without metadata.

use crate::catalog::{lookup_chunked, CatalogKind, CatalogLookup};
use crate::models::{ItemType, Review};
use serde::Serialize;
use std::collections::HashMap;

/// Minimal display metadata attached to a listed review.
#[derive(Debug, Clone, Serialize)]
pub struct DisplayMeta {
    pub title: String,
    pub cover_art_url: Option<String>,
    /// Canonical in-app route for the item, e.g. `/song/{id}`.
    pub route: String,
    pub external_url: Option<String>,
}

/// Resolve display metadata for a page of reviews, keyed by
/// `(item_type, item_id)`.
pub async fn display_metadata(
    catalog: &dyn CatalogLookup,
    reviews: &[Review],
) -> HashMap<(ItemType, String), DisplayMeta> {
    let mut ids_by_kind: HashMap<CatalogKind, Vec<String>> = HashMap::new();
    for review in reviews {
        let ids = ids_by_kind.entry(review.item_type.into()).or_default();
        if !ids.contains(&review.item_id) {
            ids.push(review.item_id.clone());
        }
    }

    let mut resolved = HashMap::new();
    for (kind, ids) in &ids_by_kind {
        let entries = lookup_chunked(catalog, *kind, ids).await;
        for review in reviews {
            if CatalogKind::from(review.item_type) != *kind {
                continue;
            }
            if let Some(entry) = entries.get(&review.item_id) {
                resolved.insert(
                    (review.item_type, review.item_id.clone()),
                    DisplayMeta {
                        title: entry.title.clone(),
                        cover_art_url: entry.cover_art_url.clone(),
                        route: format!("/{}/{}", review.item_type, review.item_id),
                        external_url: entry.external_url.clone(),
                    },
                );
            }
        }
    }

    resolved
}
