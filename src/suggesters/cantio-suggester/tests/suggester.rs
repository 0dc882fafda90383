//! Suggester behavior against a scripted in-memory catalog.

use cantio_suggester::CantioSuggester;
use encore_core::catalog::{CatalogClient, CatalogError, CatalogResult, Station};
use encore_core::models::{Credentials, SessionToken, Song, StreamQuality, Track, TrackId};
use encore_core::provider::{
    Provider, ProviderCapabilities, ProviderError, ProviderResult,
};
use encore_core::suggest::{SuggestError, Suggester};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

type BatchScript = Vec<Result<Vec<Track>, String>>;

fn track(id: &str) -> Track {
    Track {
        id: TrackId::new(id),
        title: format!("Track {id}"),
        artist: "Artist".into(),
        duration_seconds: Some(180),
        album_art_url: None,
    }
}

fn song(id: &str) -> Song {
    Song::from_track(&track(id), "cantio")
}

/// Catalog fake; each created station consumes the next batch script.
struct FakeCatalog {
    tracks: HashMap<String, Track>,
    scripts: Mutex<VecDeque<BatchScript>>,
    fail_create: AtomicBool,
    /// Ordered "create:<seed>" / "delete:<station>" events.
    log: Arc<Mutex<Vec<String>>>,
    /// Context ids passed to every station fetch.
    contexts: Arc<Mutex<Vec<Vec<TrackId>>>>,
}

impl FakeCatalog {
    fn new(ids: &[&str], scripts: Vec<BatchScript>) -> Self {
        Self {
            tracks: ids.iter().map(|id| ((*id).to_owned(), track(id))).collect(),
            scripts: Mutex::new(scripts.into()),
            fail_create: AtomicBool::new(false),
            log: Arc::new(Mutex::new(Vec::new())),
            contexts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    fn creates(&self) -> usize {
        self.log().iter().filter(|e| e.starts_with("create:")).count()
    }
}

impl CatalogClient for FakeCatalog {
    fn search_tracks(&self, _query: &str, _limit: u32) -> CatalogResult<Vec<Track>> {
        Ok(Vec::new())
    }

    fn get_track(&self, id: &TrackId) -> CatalogResult<Track> {
        self.tracks
            .get(id.as_ref())
            .cloned()
            .ok_or_else(|| CatalogError::NotFound { id: id.to_string() })
    }

    fn download(&self, _track: &Track, _quality: StreamQuality, _dest: &Path) -> CatalogResult<()> {
        unimplemented!("not used by suggester tests")
    }

    fn login(&self, _credentials: &Credentials) -> CatalogResult<SessionToken> {
        Ok(SessionToken::new("tok"))
    }

    fn refresh_token(&self, _token: &SessionToken) -> CatalogResult<SessionToken> {
        Ok(SessionToken::new("tok"))
    }

    fn install_token(&self, _token: SessionToken) {}

    fn create_station(
        &self,
        seed: &Track,
        _name: &str,
        _recommend_to_public: bool,
    ) -> CatalogResult<Box<dyn Station>> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(CatalogError::Network {
                message: "station service unreachable".into(),
            });
        }
        let mut log = self.log.lock().unwrap();
        let id = format!("st-{}", log.iter().filter(|e| e.starts_with("create:")).count());
        log.push(format!("create:{}", seed.id));
        let batches = self.scripts.lock().unwrap().pop_front().unwrap_or_default();
        Ok(Box::new(FakeStation {
            id,
            seed: seed.id.clone(),
            batches: Mutex::new(batches.into()),
            log: self.log.clone(),
            contexts: self.contexts.clone(),
        }))
    }
}

struct FakeStation {
    id: String,
    seed: TrackId,
    batches: Mutex<VecDeque<Result<Vec<Track>, String>>>,
    log: Arc<Mutex<Vec<String>>>,
    contexts: Arc<Mutex<Vec<Vec<TrackId>>>>,
}

impl Station for FakeStation {
    fn seed_id(&self) -> &TrackId {
        &self.seed
    }

    fn get_tracks(
        &self,
        recently_played: &[TrackId],
        _want_fresh: bool,
        _exclude_recent: bool,
    ) -> CatalogResult<Vec<Track>> {
        self.contexts.lock().unwrap().push(recently_played.to_vec());
        match self.batches.lock().unwrap().pop_front() {
            Some(Ok(batch)) => Ok(batch),
            Some(Err(message)) => Err(CatalogError::Network { message }),
            None => Ok(Vec::new()),
        }
    }

    fn delete(&self) -> CatalogResult<()> {
        self.log.lock().unwrap().push(format!("delete:{}", self.id));
        Ok(())
    }
}

/// Provider fake: resolves ids straight through the catalog.
struct FakeProvider {
    catalog: Arc<FakeCatalog>,
}

impl Provider for FakeProvider {
    fn id(&self) -> &str {
        "cantio"
    }

    fn name(&self) -> &str {
        "Cantio"
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            artwork: false,
            offline_download: false,
            suggestions: true,
        }
    }

    fn search(&self, _query: &str) -> Vec<Song> {
        Vec::new()
    }

    fn lookup(&self, id: &TrackId) -> ProviderResult<Song> {
        self.catalog
            .get_track(id)
            .map(|t| Song::from_track(&t, self.id()))
            .map_err(|_| ProviderError::NoSuchTrack { id: id.clone() })
    }

    fn ensure_local(&self, song: &Song, _quality: StreamQuality) -> ProviderResult<PathBuf> {
        Err(ProviderError::SongLoad {
            id: song.id.clone(),
            message: "not used by suggester tests".into(),
        })
    }

    fn close(&self) {}
}

const FALLBACK: &str = "Tfallback";

fn suggester_with(scripts: Vec<BatchScript>) -> (Arc<FakeCatalog>, CantioSuggester) {
    let catalog = Arc::new(FakeCatalog::new(
        &[FALLBACK, "T2", "T3", "T4", "T5"],
        scripts,
    ));
    let provider = Arc::new(FakeProvider {
        catalog: catalog.clone(),
    });
    let suggester = CantioSuggester::new(provider, catalog.clone(), TrackId::new(FALLBACK));
    (catalog, suggester)
}

#[test]
fn initialize_creates_a_station_on_the_fallback_seed() {
    let (catalog, suggester) = suggester_with(vec![]);

    suggester.initialize().unwrap();

    assert_eq!(catalog.log(), vec![format!("create:{FALLBACK}")]);
    assert_eq!(suggester.subject(), format!("Based on Track {FALLBACK}"));
}

#[test]
fn initialize_fails_for_an_unresolvable_fallback() {
    let catalog = Arc::new(FakeCatalog::new(&["T2"], vec![]));
    let provider = Arc::new(FakeProvider {
        catalog: catalog.clone(),
    });
    let suggester = CantioSuggester::new(provider, catalog, TrackId::new("Tmissing"));

    assert!(suggester.initialize().is_err());
}

#[test]
fn operations_require_initialization() {
    let (_catalog, suggester) = suggester_with(vec![]);
    assert_eq!(suggester.suggest_next(), Err(SuggestError::NotInitialized));
    assert_eq!(
        suggester.notify_played(&song("T2")),
        Err(SuggestError::NotInitialized)
    );
}

#[test]
fn suggest_next_pops_the_buffer_in_order() {
    let scripts = vec![vec![Ok(vec![track("T2"), track("T3")])]];
    let (_catalog, suggester) = suggester_with(scripts);
    suggester.initialize().unwrap();

    assert_eq!(suggester.suggest_next().unwrap(), song("T2"));
    assert_eq!(suggester.get_next_suggestions(5).unwrap(), vec![song("T3")]);
}

#[test]
fn suggest_next_falls_back_when_the_station_is_dry() {
    // The only script entry is a failing fetch; afterwards the station
    // reports empty batches.
    let scripts = vec![vec![Err("station offline".to_owned())]];
    let (_catalog, suggester) = suggester_with(scripts);
    suggester.initialize().unwrap();

    let fallback = suggester.suggest_next().unwrap();
    assert_eq!(fallback, song(FALLBACK));

    // The fallback never entered the suggestion buffer.
    assert!(suggester.get_next_suggestions(5).unwrap().is_empty());
}

#[test]
fn get_next_suggestions_does_not_consume() {
    let scripts = vec![vec![Ok(vec![track("T2"), track("T3"), track("T4")])]];
    let (_catalog, suggester) = suggester_with(scripts);
    suggester.initialize().unwrap();

    let first = suggester.get_next_suggestions(2).unwrap();
    let second = suggester.get_next_suggestions(2).unwrap();

    assert_eq!(first, vec![song("T2"), song("T3")]);
    assert_eq!(first, second);
}

#[test]
fn station_fetches_carry_the_recently_played_context() {
    let scripts = vec![vec![
        Ok(vec![track("T2")]),
        Ok(vec![track("T3")]),
    ]];
    let (catalog, suggester) = suggester_with(scripts);
    suggester.initialize().unwrap();

    // T2 is suggested and recorded as recently played.
    assert_eq!(suggester.suggest_next().unwrap(), song("T2"));
    // The next refill must exclude it.
    suggester.get_next_suggestions(1).unwrap();

    let contexts = catalog.contexts.lock().unwrap();
    let last = contexts.last().unwrap();
    assert_eq!(last.as_slice(), [TrackId::new("T2")]);
}

#[test]
fn notify_played_with_the_current_seed_keeps_the_station() {
    let (catalog, suggester) = suggester_with(vec![]);
    suggester.initialize().unwrap();

    suggester.notify_played(&song(FALLBACK)).unwrap();

    assert_eq!(catalog.creates(), 1);
}

#[test]
fn notify_played_reseeds_create_before_delete_and_clears_the_buffer() {
    let scripts = vec![
        vec![Ok(vec![track("T2"), track("T3")])],
        // The replacement station has nothing to offer.
        vec![],
    ];
    let (catalog, suggester) = suggester_with(scripts);
    suggester.initialize().unwrap();

    // Fill the buffer from the first station.
    assert_eq!(suggester.get_next_suggestions(2).unwrap().len(), 2);

    suggester.notify_played(&song("T5")).unwrap();

    assert_eq!(
        catalog.log(),
        vec![
            format!("create:{FALLBACK}"),
            "create:T5".to_owned(),
            "delete:st-0".to_owned(),
        ]
    );
    // Stale suggestions from the old station are gone.
    assert!(suggester.get_next_suggestions(5).unwrap().is_empty());
    assert_eq!(suggester.subject(), "Based on Track T5");
}

#[test]
fn failed_reseed_keeps_the_previous_station() {
    let scripts = vec![vec![Ok(vec![track("T2"), track("T3")])]];
    let (catalog, suggester) = suggester_with(scripts);
    suggester.initialize().unwrap();
    catalog.fail_create.store(true, Ordering::SeqCst);

    suggester.notify_played(&song("T5")).unwrap();

    // No new station, no deletion, old suggestions still flowing.
    assert_eq!(catalog.log(), vec![format!("create:{FALLBACK}")]);
    assert_eq!(suggester.suggest_next().unwrap(), song("T2"));
    assert_eq!(suggester.subject(), format!("Based on Track {FALLBACK}"));
}

#[test]
fn remove_suggestion_is_treated_as_played() {
    let scripts = vec![vec![Ok(vec![track("T2"), track("T3")])]];
    let (catalog, suggester) = suggester_with(scripts);
    suggester.initialize().unwrap();
    suggester.get_next_suggestions(2).unwrap();

    suggester.remove_suggestion(&song("T2")).unwrap();

    // Dropped from the buffer, no re-seed happened.
    assert_eq!(suggester.get_next_suggestions(5).unwrap(), vec![song("T3")]);
    assert_eq!(catalog.creates(), 1);

    // Recorded as recently played: the next refill excludes it.
    suggester.suggest_next().unwrap();
    suggester.get_next_suggestions(1).unwrap();
    let contexts = catalog.contexts.lock().unwrap();
    assert!(contexts.last().unwrap().contains(&TrackId::new("T2")));
}

#[test]
fn close_deletes_the_station_and_rejects_further_use() {
    let (catalog, suggester) = suggester_with(vec![]);
    suggester.initialize().unwrap();

    suggester.close();

    assert!(catalog.log().contains(&"delete:st-0".to_owned()));
    assert_eq!(suggester.suggest_next(), Err(SuggestError::Closed));
    assert_eq!(
        suggester.get_next_suggestions(1),
        Err(SuggestError::Closed)
    );
}
