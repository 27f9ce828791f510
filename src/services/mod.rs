//! Application services: logic that joins stored ratings against
//! externally-fetched catalog metadata.

pub mod enrich;
pub mod top_songs;
