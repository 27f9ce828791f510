//! Spotify-shaped catalog provider client.
//!
//! Authenticates with the client-credentials grant and resolves track,
//! album, and artist metadata in id batches. The access token is cached
//! process-wide with its expiry instant; the cache mutex is held across a
//! refresh so concurrent callers hitting an expired token produce exactly
//! one refresh request instead of a thundering herd.

use super::{CatalogArtist, CatalogEntry, CatalogKind, CatalogLookup};
use crate::config::CatalogConfig;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

/// Timeout for provider API requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Refresh the token this many seconds before its nominal expiry
const TOKEN_EXPIRY_SLACK_SECS: i64 = 30;

/// Cached client-credentials token
#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self) -> bool {
        Utc::now() + ChronoDuration::seconds(TOKEN_EXPIRY_SLACK_SECS) < self.expires_at
    }
}

/// Catalog client for a Spotify-shaped web API.
pub struct SpotifyCatalog {
    http_client: Client,
    config: CatalogConfig,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifyCatalog {
    pub fn new(config: CatalogConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client for catalog provider")?;

        Ok(Self {
            http_client,
            config,
            token: Mutex::new(None),
        })
    }

    /// Get a fresh access token, refreshing the cached one if expired.
    ///
    /// The lock is held across the refresh round-trip: one refresh in
    /// flight at a time, everyone else waits and reuses its result.
    async fn access_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.is_fresh() {
                return Ok(token.access_token.clone());
            }
        }

        debug!("Refreshing catalog provider access token");
        let response = self
            .http_client
            .post(&self.config.token_url)
            .basic_auth(&self.config.client_id, Some(&self.config.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .context("Token request to catalog provider failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!(
                "Catalog token endpoint returned {}: {}",
                status,
                body
            ));
        }

        let token: TokenResponse = response
            .json()
            .await
            .context("Failed to parse catalog token response")?;

        let fresh = CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + ChronoDuration::seconds(token.expires_in),
        };
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);

        Ok(access_token)
    }

    async fn fetch_batch(
        &self,
        kind: CatalogKind,
        ids: &[String],
    ) -> Result<HashMap<String, CatalogEntry>> {
        let token = self.access_token().await?;
        let path = match kind {
            CatalogKind::Track => "tracks",
            CatalogKind::Album => "albums",
            CatalogKind::Artist => "artists",
        };
        let url = format!("{}/{}?ids={}", self.config.api_url, path, ids.join(","));

        debug!(kind = ?kind, count = ids.len(), "Catalog batch lookup");
        let response = self
            .http_client
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .context("Catalog batch request failed")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Catalog API returned {}: {}", status, body));
        }

        let mut entries = HashMap::with_capacity(ids.len());
        match kind {
            CatalogKind::Track => {
                let batch: TracksResponse = response
                    .json()
                    .await
                    .context("Failed to parse tracks response")?;
                for track in batch.tracks.into_iter().flatten() {
                    entries.insert(track.id.clone(), track.into_entry());
                }
            }
            CatalogKind::Album => {
                let batch: AlbumsResponse = response
                    .json()
                    .await
                    .context("Failed to parse albums response")?;
                for album in batch.albums.into_iter().flatten() {
                    entries.insert(album.id.clone(), album.into_entry());
                }
            }
            CatalogKind::Artist => {
                let batch: ArtistsResponse = response
                    .json()
                    .await
                    .context("Failed to parse artists response")?;
                for artist in batch.artists.into_iter().flatten() {
                    entries.insert(artist.id.clone(), artist.into_entry());
                }
            }
        }

        Ok(entries)
    }
}

#[async_trait]
impl CatalogLookup for SpotifyCatalog {
    async fn lookup_batch(
        &self,
        kind: CatalogKind,
        ids: &[String],
    ) -> Result<HashMap<String, CatalogEntry>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        if ids.len() > kind.max_batch() {
            return Err(anyhow!(
                "Batch of {} ids exceeds provider ceiling {} for {:?}",
                ids.len(),
                kind.max_batch(),
                kind
            ));
        }
        self.fetch_batch(kind, ids).await
    }
}

// Wire types for the provider's JSON responses. Unknown ids come back as
// nulls inside the arrays, hence the Option wrappers.

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Deserialize)]
struct TracksResponse {
    tracks: Vec<Option<TrackObject>>,
}

#[derive(Debug, Deserialize)]
struct AlbumsResponse {
    albums: Vec<Option<AlbumObject>>,
}

#[derive(Debug, Deserialize)]
struct ArtistsResponse {
    artists: Vec<Option<ArtistObject>>,
}

#[derive(Debug, Deserialize)]
struct TrackObject {
    id: String,
    name: String,
    artists: Vec<ArtistRef>,
    album: Option<AlbumRef>,
    external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Deserialize)]
struct AlbumObject {
    id: String,
    name: String,
    #[serde(default)]
    artists: Vec<ArtistRef>,
    #[serde(default)]
    images: Vec<Image>,
    external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Deserialize)]
struct ArtistObject {
    id: String,
    name: String,
    #[serde(default)]
    images: Vec<Image>,
    external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Deserialize)]
struct ArtistRef {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct AlbumRef {
    #[serde(default)]
    images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct Image {
    url: String,
}

#[derive(Debug, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

impl TrackObject {
    fn into_entry(self) -> CatalogEntry {
        CatalogEntry {
            id: self.id,
            title: self.name,
            artists: self
                .artists
                .into_iter()
                .map(|a| CatalogArtist { id: a.id, name: a.name })
                .collect(),
            cover_art_url: self
                .album
                .and_then(|a| a.images.into_iter().next().map(|i| i.url)),
            external_url: self.external_urls.and_then(|u| u.spotify),
        }
    }
}

impl AlbumObject {
    fn into_entry(self) -> CatalogEntry {
        CatalogEntry {
            id: self.id,
            title: self.name,
            artists: self
                .artists
                .into_iter()
                .map(|a| CatalogArtist { id: a.id, name: a.name })
                .collect(),
            cover_art_url: self.images.into_iter().next().map(|i| i.url),
            external_url: self.external_urls.and_then(|u| u.spotify),
        }
    }
}

impl ArtistObject {
    fn into_entry(self) -> CatalogEntry {
        CatalogEntry {
            id: self.id,
            title: self.name,
            artists: Vec::new(),
            cover_art_url: self.images.into_iter().next().map(|i| i.url),
            external_url: self.external_urls.and_then(|u| u.spotify),
        }
    }
}
