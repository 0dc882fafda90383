use crate::models::CatalogTrack;
use encore_core::models::{Track, TrackId};

pub fn map_track(track: &CatalogTrack) -> Track {
    Track {
        id: TrackId::new(track.id.clone()),
        title: track.title.clone(),
        artist: track.artist.clone(),
        // The catalog reports milliseconds; seconds are truncated.
        duration_seconds: track.duration_ms.map(|d| (d / 1000) as u32),
        album_art_url: track.album_art_refs.first().map(|r| r.url.clone()),
    }
}
