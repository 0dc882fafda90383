use encore_core::models::{Song, TrackId};
use std::collections::VecDeque;

pub(crate) const RECENTLY_PLAYED_CAPACITY: usize = 200;

/// Bounded FIFO of recently played songs, de-duplicated by id.
pub(crate) struct RecentWindow {
    songs: VecDeque<Song>,
    capacity: usize,
}

impl RecentWindow {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            songs: VecDeque::with_capacity(capacity.min(64)),
            capacity,
        }
    }

    /// Records a song. A duplicate id is a no-op; at capacity the oldest
    /// entry makes room first.
    pub(crate) fn push(&mut self, song: Song) -> bool {
        if self.songs.iter().any(|s| s.id == song.id) {
            return false;
        }
        if self.songs.len() == self.capacity {
            self.songs.pop_front();
        }
        self.songs.push_back(song);
        true
    }

    /// Ids in play order, oldest first — the station context stubs.
    pub(crate) fn ids(&self) -> Vec<TrackId> {
        self.songs.iter().map(|s| s.id.clone()).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.songs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encore_core::models::Track;

    fn song(id: &str) -> Song {
        let track = Track {
            id: TrackId::new(id),
            title: format!("Track {id}"),
            artist: "Artist".into(),
            duration_seconds: None,
            album_art_url: None,
        };
        Song::from_track(&track, "cantio")
    }

    #[test]
    fn duplicate_ids_are_not_reinserted() {
        let mut window = RecentWindow::new(10);
        assert!(window.push(song("T1")));
        assert!(!window.push(song("T1")));
        assert_eq!(window.len(), 1);
    }

    #[test]
    fn capacity_evicts_oldest_first() {
        let mut window = RecentWindow::new(3);
        for id in ["T1", "T2", "T3", "T4"] {
            window.push(song(id));
        }
        assert_eq!(window.len(), 3);
        assert_eq!(
            window.ids(),
            vec![TrackId::new("T2"), TrackId::new("T3"), TrackId::new("T4")]
        );
    }

    #[test]
    fn never_exceeds_capacity() {
        let mut window = RecentWindow::new(RECENTLY_PLAYED_CAPACITY);
        for i in 0..RECENTLY_PLAYED_CAPACITY + 50 {
            window.push(song(&format!("T{i}")));
        }
        assert_eq!(window.len(), RECENTLY_PLAYED_CAPACITY);
    }
}
