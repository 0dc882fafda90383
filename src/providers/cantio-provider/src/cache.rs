//! Bounded, time-expiring track cache with load-on-miss.
//!
//! Entries expire after a configurable idle time measured from last access,
//! and the least-recently-used entry is evicted when the cache is full.
//! Evictions (expiry or LRU replacement, not explicit overwrites) invoke a
//! synchronous best-effort listener so the provider can delete the
//! downloaded file for the evicted id.

use encore_core::models::{Song, TrackId};
use encore_core::provider::{ProviderError, ProviderResult};
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Loads a song from the catalog on a cache miss.
pub type TrackLoader = Box<dyn Fn(&TrackId) -> Result<Song, String> + Send + Sync>;

/// Invoked synchronously for every evicted entry. Must not block.
pub type EvictionListener = Box<dyn Fn(&Song) + Send + Sync>;

const INITIAL_CAPACITY: usize = 256;
pub(crate) const MAX_ENTRIES: usize = 1024;

pub struct TrackCache {
    state: Mutex<CacheState>,
    loader: TrackLoader,
    expiry: Duration,
    max_entries: usize,
    on_evict: Option<EvictionListener>,
}

struct CacheState {
    entries: HashMap<TrackId, CacheEntry>,
    /// At most one load per key is in flight; late arrivals wait on the
    /// slot and share its outcome.
    in_flight: HashMap<TrackId, Arc<LoadSlot>>,
}

struct CacheEntry {
    song: Song,
    last_access: Instant,
}

struct LoadSlot {
    outcome: Mutex<Option<Result<Song, String>>>,
    ready: Condvar,
}

impl LoadSlot {
    fn new() -> Self {
        Self {
            outcome: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    fn publish(&self, outcome: Result<Song, String>) {
        *self.outcome.lock().expect("load slot poisoned") = Some(outcome);
        self.ready.notify_all();
    }

    fn wait(&self) -> Result<Song, String> {
        let mut guard = self.outcome.lock().expect("load slot poisoned");
        loop {
            if let Some(outcome) = guard.as_ref() {
                return outcome.clone();
            }
            guard = self.ready.wait(guard).expect("load slot poisoned");
        }
    }
}

enum Role {
    Hit(Song),
    Waiter(Arc<LoadSlot>),
    Loader(Arc<LoadSlot>),
}

impl TrackCache {
    pub fn new(expiry: Duration, loader: TrackLoader) -> Self {
        Self::with_capacity(expiry, MAX_ENTRIES, loader)
    }

    pub fn with_capacity(expiry: Duration, max_entries: usize, loader: TrackLoader) -> Self {
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::with_capacity(INITIAL_CAPACITY.min(max_entries)),
                in_flight: HashMap::new(),
            }),
            loader,
            expiry,
            max_entries,
            on_evict: None,
        }
    }

    pub fn set_eviction_listener(&mut self, listener: EvictionListener) {
        self.on_evict = Some(listener);
    }

    /// Returns the canonical song for `id`, loading it on a miss. Concurrent
    /// misses for the same id collapse into a single load whose result (or
    /// failure) is shared.
    pub fn get(&self, id: &TrackId) -> ProviderResult<Song> {
        let role = {
            let mut state = self.state.lock().expect("cache lock poisoned");
            self.purge_expired(&mut state);
            if let Some(entry) = state.entries.get_mut(id) {
                entry.last_access = Instant::now();
                Role::Hit(entry.song.clone())
            } else if let Some(slot) = state.in_flight.get(id) {
                Role::Waiter(slot.clone())
            } else {
                let slot = Arc::new(LoadSlot::new());
                state.in_flight.insert(id.clone(), slot.clone());
                Role::Loader(slot)
            }
        };

        match role {
            Role::Hit(song) => Ok(song),
            Role::Waiter(slot) => slot
                .wait()
                .map_err(|_| ProviderError::NoSuchTrack { id: id.clone() }),
            Role::Loader(slot) => {
                debug!(%id, "loading track into cache");
                let outcome = (self.loader)(id);
                {
                    let mut state = self.state.lock().expect("cache lock poisoned");
                    state.in_flight.remove(id);
                    if let Ok(song) = &outcome {
                        self.admit(&mut state, song.clone());
                    }
                }
                slot.publish(outcome.clone());
                outcome.map_err(|message| {
                    warn!(%id, error = %message, "track lookup failed");
                    ProviderError::NoSuchTrack { id: id.clone() }
                })
            }
        }
    }

    /// Installs `song` as the canonical entry for its id, e.g. to
    /// pre-populate from search results. Overwriting an existing entry
    /// refreshes it and never fires the eviction listener.
    pub fn put(&self, song: Song) {
        let mut state = self.state.lock().expect("cache lock poisoned");
        self.purge_expired(&mut state);
        self.admit(&mut state, song);
    }

    pub fn len(&self) -> usize {
        self.state.lock().expect("cache lock poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Does not count as an access.
    pub fn contains(&self, id: &TrackId) -> bool {
        self.state
            .lock()
            .expect("cache lock poisoned")
            .entries
            .contains_key(id)
    }

    fn admit(&self, state: &mut CacheState, song: Song) {
        let now = Instant::now();
        if let Some(entry) = state.entries.get_mut(&song.id) {
            entry.song = song;
            entry.last_access = now;
            return;
        }
        if state.entries.len() >= self.max_entries {
            self.evict_lru(state);
        }
        state.entries.insert(
            song.id.clone(),
            CacheEntry {
                song,
                last_access: now,
            },
        );
    }

    fn evict_lru(&self, state: &mut CacheState) {
        let victim = state
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(id, _)| id.clone());
        if let Some(id) = victim {
            if let Some(entry) = state.entries.remove(&id) {
                debug!(%id, "evicting least recently used entry");
                self.notify_evicted(&entry.song);
            }
        }
    }

    fn purge_expired(&self, state: &mut CacheState) {
        let expired: Vec<TrackId> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.last_access.elapsed() >= self.expiry)
            .map(|(id, _)| id.clone())
            .collect();
        for id in expired {
            if let Some(entry) = state.entries.remove(&id) {
                debug!(%id, "evicting expired entry");
                self.notify_evicted(&entry.song);
            }
        }
    }

    fn notify_evicted(&self, song: &Song) {
        if let Some(listener) = &self.on_evict {
            listener(song);
        }
    }
}
