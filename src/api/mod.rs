//! HTTP API handlers.

pub mod artists;
pub mod auth;
pub mod health;
pub mod reviews;

pub use artists::artist_routes;
pub use health::health_routes;
pub use reviews::review_routes;
