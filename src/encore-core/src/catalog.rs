//! The seam between the plugins and the remote Cantio service.
//!
//! Everything the provider and suggester consume from the catalog goes
//! through [`CatalogClient`] and [`Station`], so tests can substitute an
//! in-memory implementation for the HTTP client.

use crate::models::{Credentials, SessionToken, StreamQuality, Track, TrackId};
use std::path::Path;
use thiserror::Error;

/// Failure categories surfaced by catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog rejected the session token")]
    Unauthorized,
    #[error("entity not found: {id}")]
    NotFound { id: String },
    #[error("network error: {message}")]
    Network { message: String },
    #[error("i/o error: {message}")]
    Io { message: String },
    #[error("{message}")]
    Other { message: String },
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Operations consumed from the remote catalog.
///
/// Implementations carry exactly one live session token; [`install_token`]
/// replaces it in place so an authorization refresh does not require
/// rebuilding the client.
///
/// [`install_token`]: CatalogClient::install_token
pub trait CatalogClient: Send + Sync {
    fn search_tracks(&self, query: &str, limit: u32) -> CatalogResult<Vec<Track>>;

    fn get_track(&self, id: &TrackId) -> CatalogResult<Track>;

    /// Downloads the audio payload for `track` to `dest`. The caller owns
    /// temp-file/rename discipline; this writes to `dest` directly.
    fn download(&self, track: &Track, quality: StreamQuality, dest: &Path) -> CatalogResult<()>;

    /// Exchanges account credentials for a fresh session token.
    fn login(&self, credentials: &Credentials) -> CatalogResult<SessionToken>;

    /// Validates a previously persisted token, returning a usable one.
    fn refresh_token(&self, token: &SessionToken) -> CatalogResult<SessionToken>;

    /// Replaces the live token without rebuilding the client.
    fn install_token(&self, token: SessionToken);

    fn create_station(
        &self,
        seed: &Track,
        name: &str,
        recommend_to_public: bool,
    ) -> CatalogResult<Box<dyn Station>>;
}

/// A server-side seeded recommendation stream. Stateful; must be deleted
/// when superseded or on shutdown.
pub trait Station: Send + Sync {
    fn seed_id(&self) -> &TrackId;

    /// Fetches one batch of recommendations. `recently_played` is context
    /// only — id stubs, not full tracks.
    fn get_tracks(
        &self,
        recently_played: &[TrackId],
        want_fresh: bool,
        exclude_recent: bool,
    ) -> CatalogResult<Vec<Track>>;

    fn delete(&self) -> CatalogResult<()>;
}
