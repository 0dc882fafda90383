//! Cantio catalog provider for the Encore playback bot.
//!
//! Wires the HTTP catalog client, session manager, track cache, and song
//! store into the host-facing [`Provider`] implementation. Evicted cache
//! entries have their downloaded files deleted through the cache's eviction
//! listener.

mod cache;
mod client;
mod mapping;
pub mod models;
mod session;
mod store;

pub use cache::{EvictionListener, TrackCache, TrackLoader};
pub use client::{CantioClientConfig, HttpCatalogClient};
pub use session::SessionManager;
pub use store::SongStore;

use encore_core::catalog::{CatalogClient, CatalogError};
use encore_core::config::CantioConfig;
use encore_core::models::{Credentials, Song, StreamQuality, Track, TrackId};
use encore_core::provider::{
    InitializationError, Provider, ProviderCapabilities, ProviderError, ProviderResult,
};
use encore_core::secrets::TokenStore;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const PROVIDER_ID: &str = "cantio";

const SEARCH_LIMIT: u32 = 30;

/// Tunables the provider needs beyond its collaborators.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub quality: StreamQuality,
    /// Idle time before a cached song is evicted and its file deleted.
    pub cache_expiry: Duration,
    /// Minimum interval between token refreshes after a 401.
    pub refresh_cooldown: Duration,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            quality: StreamQuality::default(),
            cache_expiry: Duration::from_secs(60 * 60),
            refresh_cooldown: Duration::from_secs(60),
        }
    }
}

impl ProviderSettings {
    pub fn from_config(config: &CantioConfig) -> Self {
        Self {
            quality: config.quality,
            cache_expiry: Duration::from_secs(u64::from(config.cache_expiry_minutes) * 60),
            ..Self::default()
        }
    }
}

pub struct CantioProvider {
    id: String,
    name: String,
    client: Arc<dyn CatalogClient>,
    session: Arc<SessionManager>,
    cache: TrackCache,
    store: Arc<SongStore>,
    quality: StreamQuality,
}

impl CantioProvider {
    /// Connects to the catalog at `config.base_url` and logs in.
    pub fn connect(
        config: &CantioConfig,
        password: String,
        tokens: Arc<dyn TokenStore>,
        songs_dir: PathBuf,
    ) -> Result<Self, InitializationError> {
        let client = HttpCatalogClient::new(CantioClientConfig {
            base_url: config.base_url.clone(),
            access_token: None,
        })
        .map_err(|e| InitializationError::new(format!("could not build catalog client: {e}")))?;
        let credentials = Credentials {
            username: config.username.clone(),
            password,
            device_id: config.device_id.clone(),
        };
        Self::with_client(
            Arc::new(client),
            credentials,
            tokens,
            songs_dir,
            ProviderSettings::from_config(config),
        )
    }

    /// Builds the provider around an existing catalog client and logs in.
    /// Fails fatally when no session can be established.
    pub fn with_client(
        client: Arc<dyn CatalogClient>,
        credentials: Credentials,
        tokens: Arc<dyn TokenStore>,
        songs_dir: PathBuf,
        settings: ProviderSettings,
    ) -> Result<Self, InitializationError> {
        let session = Arc::new(SessionManager::with_cooldown(
            client.clone(),
            credentials,
            tokens,
            settings.refresh_cooldown,
        ));
        session.login()?;

        let store = Arc::new(SongStore::new(songs_dir, client.clone())?);

        let loader: TrackLoader = {
            let client = client.clone();
            let session = session.clone();
            Box::new(move |id| {
                get_track_with_reauth(client.as_ref(), &session, id)
                    .map(|track| Song::from_track(&track, PROVIDER_ID))
                    .map_err(|e| e.to_string())
            })
        };
        let mut cache = TrackCache::new(settings.cache_expiry, loader);
        let evict_store = store.clone();
        cache.set_eviction_listener(Box::new(move |song| evict_store.remove(&song.id)));

        Ok(Self {
            id: PROVIDER_ID.into(),
            name: "Cantio".into(),
            client,
            session,
            cache,
            store,
            quality: settings.quality,
        })
    }

    /// Accessor handed to the suggester at construction so it can drive
    /// stations through the same authenticated client.
    pub fn client(&self) -> Arc<dyn CatalogClient> {
        self.client.clone()
    }

    /// Quality tier configured for downloads.
    pub fn quality(&self) -> StreamQuality {
        self.quality
    }
}

/// One fetch, with a single refresh-and-retry cycle on authorization
/// failure. A second 401 after a successful refresh is surfaced as-is.
fn get_track_with_reauth(
    client: &dyn CatalogClient,
    session: &SessionManager,
    id: &TrackId,
) -> Result<Track, CatalogError> {
    match client.get_track(id) {
        Err(CatalogError::Unauthorized) if session.handle_unauthorized() => client.get_track(id),
        other => other,
    }
}

impl Provider for CantioProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            artwork: true,
            offline_download: true,
            suggestions: true,
        }
    }

    fn search(&self, query: &str) -> Vec<Song> {
        let tracks = match self.client.search_tracks(query, SEARCH_LIMIT) {
            Ok(tracks) => tracks,
            Err(CatalogError::Unauthorized) => {
                if !self.session.handle_unauthorized() {
                    return Vec::new();
                }
                match self.client.search_tracks(query, SEARCH_LIMIT) {
                    Ok(tracks) => tracks,
                    Err(e) => {
                        warn!(query, error = %e, "search failed after token refresh");
                        return Vec::new();
                    }
                }
            }
            Err(e) => {
                warn!(query, error = %e, "search failed");
                return Vec::new();
            }
        };

        tracks
            .iter()
            .map(|track| {
                let song = Song::from_track(track, &self.id);
                self.cache.put(song.clone());
                song
            })
            .collect()
    }

    fn lookup(&self, id: &TrackId) -> ProviderResult<Song> {
        self.cache.get(id)
    }

    fn ensure_local(&self, song: &Song, quality: StreamQuality) -> ProviderResult<PathBuf> {
        let track = get_track_with_reauth(self.client.as_ref(), &self.session, &song.id).map_err(
            |e| ProviderError::SongLoad {
                id: song.id.clone(),
                message: e.to_string(),
            },
        )?;
        self.store.ensure_local(&track, quality)
    }

    fn close(&self) {
        debug!(provider = %self.id, "closing provider");
    }
}
