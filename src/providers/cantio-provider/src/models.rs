//! Wire types for the Cantio HTTP API.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct TrackPageResponse {
    pub data: Vec<CatalogTrack>,
}

#[derive(Debug, Deserialize)]
pub struct CatalogTrack {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub artist: String,
    #[serde(rename = "durationMs", default)]
    pub duration_ms: Option<u64>,
    #[serde(rename = "albumArtRefs", default)]
    pub album_art_refs: Vec<ArtRef>,
}

#[derive(Debug, Deserialize)]
pub struct ArtRef {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    #[serde(rename = "deviceId")]
    pub device_id: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct StationResponse {
    pub id: String,
}

#[derive(Debug, Serialize)]
pub struct CreateStationRequest<'a> {
    #[serde(rename = "seedTrackId")]
    pub seed_track_id: &'a str,
    pub name: &'a str,
    #[serde(rename = "recommendToPublic")]
    pub recommend_to_public: bool,
}

#[derive(Debug, Serialize)]
pub struct StationTracksRequest<'a> {
    #[serde(rename = "recentlyPlayed")]
    pub recently_played: &'a [String],
    #[serde(rename = "wantFresh")]
    pub want_fresh: bool,
    #[serde(rename = "excludeRecent")]
    pub exclude_recent: bool,
}
