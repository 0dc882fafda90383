//! Local song file storage.
//!
//! Downloads go to a temp sibling first and are renamed into place, so
//! concurrent readers of the canonical path never see a partial file. The
//! songs directory is shared with the cache's eviction deletions; eviction
//! removing a file mid-download is an accepted race, the cache idle window
//! is long relative to a single download.

use encore_core::catalog::CatalogClient;
use encore_core::models::{StreamQuality, Track, TrackId};
use encore_core::provider::{InitializationError, ProviderError, ProviderResult};
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

const SONG_EXTENSION: &str = "mp3";

pub struct SongStore {
    dir: PathBuf,
    client: Arc<dyn CatalogClient>,
}

impl SongStore {
    pub fn new(dir: PathBuf, client: Arc<dyn CatalogClient>) -> Result<Self, InitializationError> {
        fs::create_dir_all(&dir).map_err(|e| {
            InitializationError::new(format!(
                "unable to create song directory {}: {e}",
                dir.display()
            ))
        })?;
        Ok(Self { dir, client })
    }

    pub fn song_path(&self, id: &TrackId) -> PathBuf {
        self.dir.join(format!("{}.{SONG_EXTENSION}", id.as_ref()))
    }

    fn temp_path(&self, id: &TrackId) -> PathBuf {
        self.dir
            .join(format!("{}.{SONG_EXTENSION}.tmp", id.as_ref()))
    }

    /// Guarantees the audio payload for `track` exists at the canonical
    /// path and returns it. Idempotent: an existing file is returned
    /// unchanged, no download happens.
    pub fn ensure_local(&self, track: &Track, quality: StreamQuality) -> ProviderResult<PathBuf> {
        let path = self.song_path(&track.id);
        if path.exists() {
            return Ok(path);
        }

        let tmp = self.temp_path(&track.id);
        if let Err(e) = self.client.download(track, quality, &tmp) {
            // Don't leave a partial temp file around.
            if let Err(cleanup) = fs::remove_file(&tmp) {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!(id = %track.id, error = %cleanup, "failed to clean up partial download");
                }
            }
            return Err(ProviderError::SongLoad {
                id: track.id.clone(),
                message: e.to_string(),
            });
        }

        // The rename is the serialization point for concurrent downloads of
        // the same id; last writer wins with equivalent content.
        fs::rename(&tmp, &path).map_err(|e| ProviderError::SongLoad {
            id: track.id.clone(),
            message: format!("failed to move download into place: {e}"),
        })?;
        debug!(id = %track.id, path = %path.display(), "downloaded song");
        Ok(path)
    }

    /// Best-effort removal of the downloaded file for `id`, used by the
    /// cache eviction path. Failures are logged, never raised.
    pub fn remove(&self, id: &TrackId) {
        let path = self.song_path(id);
        match fs::remove_file(&path) {
            Ok(()) => debug!(%id, "deleted evicted song file"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(%id, error = %e, "failed to delete evicted song file"),
        }
    }
}
