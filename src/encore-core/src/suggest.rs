use crate::models::Song;
use crate::provider::InitializationError;
use thiserror::Error;

/// Lifecycle failures surfaced by suggester operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SuggestError {
    #[error("suggester has not been initialized")]
    NotInitialized,
    #[error("suggester is closed")]
    Closed,
}

pub type SuggestResult<T> = Result<T, SuggestError>;

/// Host-facing suggester interface.
///
/// Lifecycle: constructed → [`initialize`] → active → [`close`]. Operations
/// on an uninitialized or closed suggester fail with [`SuggestError`].
///
/// [`initialize`]: Suggester::initialize
/// [`close`]: Suggester::close
pub trait Suggester: Send + Sync {
    /// Human-friendly suggester name.
    fn name(&self) -> &str;

    /// Short description of what suggestions are currently based on.
    fn subject(&self) -> String;

    /// Resolves the fallback seed and creates the initial station.
    fn initialize(&self) -> Result<(), InitializationError>;

    /// Pops the next suggestion, falling back to the configured fallback
    /// song when the station yields nothing.
    fn suggest_next(&self) -> SuggestResult<Song>;

    /// Returns up to `max` upcoming suggestions without consuming them.
    fn get_next_suggestions(&self, max: usize) -> SuggestResult<Vec<Song>>;

    /// Records a played song and re-seeds the station on it when the seed
    /// changed. Re-seed failures keep the previous station.
    fn notify_played(&self, song: &Song) -> SuggestResult<()>;

    /// Removes a song from future consideration. The catalog has no
    /// negative-feedback channel, so this is treated exactly like a play.
    fn remove_suggestion(&self, song: &Song) -> SuggestResult<()>;

    /// Deletes the remote station (best effort) and closes the suggester.
    fn close(&self);
}
