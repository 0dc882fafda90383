use crate::models::{Song, StreamQuality, TrackId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Capability flags describing optional provider features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ProviderCapabilities {
    pub artwork: bool,
    pub offline_download: bool,
    pub suggestions: bool,
}

impl ProviderCapabilities {
    pub fn supports_offline_download(&self) -> bool {
        self.offline_download
    }

    pub fn supports_suggestions(&self) -> bool {
        self.suggestions
    }
}

/// Failures surfaced to the host by provider operations.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("authorization failed: {message}")]
    Auth { message: String },
    #[error("no such track: {id}")]
    NoSuchTrack { id: TrackId },
    #[error("failed to load song {id}: {message}")]
    SongLoad { id: TrackId, message: String },
    #[error("network error: {message}")]
    Network { message: String },
    #[error("{message}")]
    Other { message: String },
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Fatal startup failure; aborts plugin initialization.
#[derive(Debug, Error)]
#[error("plugin initialization failed: {message}")]
pub struct InitializationError {
    pub message: String,
}

impl InitializationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Host-facing provider interface.
///
/// Operations block; network calls inherit the remote client's timeouts.
pub trait Provider: Send + Sync {
    /// Stable provider identifier (e.g., "cantio").
    fn id(&self) -> &str;

    /// Human-friendly provider name.
    fn name(&self) -> &str;

    /// Advertised capabilities.
    fn capabilities(&self) -> ProviderCapabilities;

    /// Searches the catalog. Transport and authorization failures are logged
    /// and yield an empty result, never an error.
    fn search(&self, query: &str) -> Vec<Song>;

    /// Resolves a track id to the canonical cached [`Song`].
    fn lookup(&self, id: &TrackId) -> ProviderResult<Song>;

    /// Guarantees the audio payload for `song` exists on local storage and
    /// returns its path.
    fn ensure_local(&self, song: &Song, quality: StreamQuality) -> ProviderResult<PathBuf>;

    /// Releases local resources. Idempotent.
    fn close(&self);
}
