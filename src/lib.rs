//! tunenote - music review microservice
//!
//! Stores user reviews (half-point ratings and text) for songs, albums,
//! and artists identified by an external catalog provider, and serves
//! aggregate read paths that join stored ratings against live catalog
//! metadata.

pub mod api;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use crate::catalog::CatalogLookup;
use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// External catalog metadata lookup
    pub catalog: Arc<dyn CatalogLookup>,
}

impl AppState {
    pub fn new(db: SqlitePool, catalog: Arc<dyn CatalogLookup>) -> Self {
        Self { db, catalog }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::review_routes())
        .merge(api::artist_routes())
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
