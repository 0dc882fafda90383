//! Station-based suggester for the Cantio provider.
//!
//! Keeps a server-side station seeded on the last played song, a bounded
//! window of recent plays used as exclusion context, and a buffer of
//! not-yet-dispatched suggestions. The provider and the authenticated
//! catalog client are injected at construction.

mod window;

use encore_core::catalog::{CatalogClient, CatalogResult, Station};
use encore_core::models::{Song, TrackId};
use encore_core::provider::{InitializationError, Provider};
use encore_core::suggest::{SuggestError, SuggestResult, Suggester};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info, warn};
use window::{RecentWindow, RECENTLY_PLAYED_CAPACITY};

pub struct CantioSuggester {
    name: String,
    provider: Arc<dyn Provider>,
    client: Arc<dyn CatalogClient>,
    fallback_seed: TrackId,
    state: Mutex<SuggesterState>,
}

enum Lifecycle {
    Uninitialized,
    Active,
    Closed,
}

struct SuggesterState {
    lifecycle: Lifecycle,
    station: Option<Box<dyn Station>>,
    /// Seed id of the current station; a re-seed only happens when the
    /// played song differs from this.
    last_seed_id: Option<TrackId>,
    /// Song the current station was seeded on, for display.
    seed_song: Option<Song>,
    /// Song resolved from the configured fallback seed at initialize time;
    /// returned when the station yields nothing.
    fallback_song: Option<Song>,
    recently_played: RecentWindow,
    suggestions: Vec<Song>,
}

impl CantioSuggester {
    pub fn new(
        provider: Arc<dyn Provider>,
        client: Arc<dyn CatalogClient>,
        fallback_seed: TrackId,
    ) -> Self {
        Self {
            name: "Cantio Station Suggester".into(),
            provider,
            client,
            fallback_seed,
            state: Mutex::new(SuggesterState {
                lifecycle: Lifecycle::Uninitialized,
                station: None,
                last_seed_id: None,
                seed_song: None,
                fallback_song: None,
                recently_played: RecentWindow::new(RECENTLY_PLAYED_CAPACITY),
                suggestions: Vec::new(),
            }),
        }
    }

    fn active_state(&self) -> SuggestResult<MutexGuard<'_, SuggesterState>> {
        let state = self.state.lock().expect("suggester lock poisoned");
        match state.lifecycle {
            Lifecycle::Uninitialized => Err(SuggestError::NotInitialized),
            Lifecycle::Closed => Err(SuggestError::Closed),
            Lifecycle::Active => Ok(state),
        }
    }

    /// Creates a station seeded on `song` when the seed changed. The new
    /// station exists before the previous one is deleted, and the buffer is
    /// cleared so stale suggestions never leak into the new context.
    fn seed_station(&self, state: &mut SuggesterState, song: &Song) -> CatalogResult<()> {
        if state.last_seed_id.as_ref() == Some(&song.id) {
            return Ok(());
        }
        let seed_track = self.client.get_track(&song.id)?;
        let station_name = format!("Station on {}", song.title);
        let station = self.client.create_station(&seed_track, &station_name, false)?;

        if let Some(previous) = state.station.take() {
            if let Err(e) = previous.delete() {
                warn!(error = %e, "failed to delete superseded station");
            }
        }
        state.suggestions.clear();
        state.station = Some(station);
        state.last_seed_id = Some(song.id.clone());
        state.seed_song = Some(song.clone());
        info!(seed = %song.id, "created station");
        Ok(())
    }

    /// Tops the buffer up to `target` with station batches. Stops when the
    /// station has nothing further this cycle or a fetch fails.
    fn refill(&self, state: &mut SuggesterState, target: usize) {
        while state.suggestions.len() < target {
            let context = state.recently_played.ids();
            let batch = match state.station.as_ref() {
                Some(station) => station.get_tracks(&context, true, true),
                None => return,
            };
            match batch {
                Ok(batch) if batch.is_empty() => {
                    debug!("station returned no further tracks");
                    break;
                }
                Ok(batch) => {
                    for track in &batch {
                        state
                            .suggestions
                            .push(Song::from_track(track, self.provider.id()));
                    }
                }
                Err(e) => {
                    error!(error = %e, "failed to fetch station tracks");
                    break;
                }
            }
        }
    }

    /// Shared bookkeeping for played/disliked songs: the recently-played
    /// window absorbs the song and it leaves the suggestion buffer.
    fn record_played(&self, state: &mut SuggesterState, song: &Song) {
        state.recently_played.push(song.clone());
        state.suggestions.retain(|s| s.id != song.id);
    }
}

impl Suggester for CantioSuggester {
    fn name(&self) -> &str {
        &self.name
    }

    fn subject(&self) -> String {
        let state = self.state.lock().expect("suggester lock poisoned");
        match &state.seed_song {
            Some(song) => format!("Based on {}", song.title),
            None => self.name.clone(),
        }
    }

    fn initialize(&self) -> Result<(), InitializationError> {
        let mut state = self.state.lock().expect("suggester lock poisoned");
        match state.lifecycle {
            Lifecycle::Active => return Ok(()),
            Lifecycle::Closed => {
                return Err(InitializationError::new("suggester is already closed"))
            }
            Lifecycle::Uninitialized => {}
        }

        let fallback = self.provider.lookup(&self.fallback_seed).map_err(|e| {
            InitializationError::new(format!(
                "could not resolve fallback track {}: {e}",
                self.fallback_seed
            ))
        })?;
        state.fallback_song = Some(fallback.clone());

        self.seed_station(&mut state, &fallback).map_err(|e| {
            InitializationError::new(format!("unable to create station on {}: {e}", fallback.id))
        })?;
        state.lifecycle = Lifecycle::Active;
        Ok(())
    }

    fn suggest_next(&self) -> SuggestResult<Song> {
        let mut state = self.active_state()?;
        self.refill(&mut state, 1);
        let next = if state.suggestions.is_empty() {
            match &state.fallback_song {
                Some(song) => {
                    debug!(id = %song.id, "station exhausted, suggesting the fallback song");
                    song.clone()
                }
                None => return Err(SuggestError::NotInitialized),
            }
        } else {
            state.suggestions.remove(0)
        };
        self.record_played(&mut state, &next);
        Ok(next)
    }

    fn get_next_suggestions(&self, max: usize) -> SuggestResult<Vec<Song>> {
        let mut state = self.active_state()?;
        self.refill(&mut state, max);
        Ok(state.suggestions.iter().take(max).cloned().collect())
    }

    fn notify_played(&self, song: &Song) -> SuggestResult<()> {
        let mut state = self.active_state()?;
        self.record_played(&mut state, song);
        if let Err(e) = self.seed_station(&mut state, song) {
            error!(seed = %song.id, error = %e, "station re-seed failed, keeping previous station");
        }
        Ok(())
    }

    fn remove_suggestion(&self, song: &Song) -> SuggestResult<()> {
        // The catalog has no dislike channel; treated exactly like a play.
        let mut state = self.active_state()?;
        self.record_played(&mut state, song);
        Ok(())
    }

    fn close(&self) {
        let mut state = self.state.lock().expect("suggester lock poisoned");
        if let Some(station) = state.station.take() {
            if let Err(e) = station.delete() {
                warn!(error = %e, "failed to delete station on shutdown");
            }
        }
        state.lifecycle = Lifecycle::Closed;
    }
}
