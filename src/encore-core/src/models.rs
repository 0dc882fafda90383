use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// A Cantio-scoped track identifier.
///
/// The catalog treats this as an opaque, case-sensitive identifier that is
/// stable across runs. Cantio ids start with `T`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct TrackId(pub String);

impl TrackId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl AsRef<str> for TrackId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TrackId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for TrackId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A remote catalog record. Read-only; never mutated locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    pub artist: String,
    /// Duration in seconds when the catalog reports one.
    pub duration_seconds: Option<u32>,
    /// First album-art reference, when present.
    pub album_art_url: Option<String>,
}

/// The local, playable projection of a [`Track`].
///
/// Songs are compared and hashed by id only: two instances built from the
/// same track at different times are interchangeable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Song {
    pub id: TrackId,
    pub provider_id: String,
    pub title: String,
    pub description: String,
    pub duration_seconds: Option<u32>,
    pub album_art_url: Option<String>,
}

impl Song {
    pub fn from_track(track: &Track, provider_id: &str) -> Self {
        Self {
            id: track.id.clone(),
            provider_id: provider_id.to_string(),
            title: track.title.clone(),
            description: track.artist.clone(),
            duration_seconds: track.duration_seconds,
            album_art_url: track.album_art_url.clone(),
        }
    }
}

impl PartialEq for Song {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Song {}

impl Hash for Song {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Fidelity tier requested for streaming/downloading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StreamQuality {
    Low,
    Medium,
    #[default]
    High,
}

impl StreamQuality {
    /// Wire name used in catalog requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamQuality::Low => "low",
            StreamQuality::Medium => "medium",
            StreamQuality::High => "high",
        }
    }
}

/// Opaque session credential issued by the catalog.
///
/// Debug output never includes the token value.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken([redacted])")
    }
}

/// Account credentials used for token exchange.
///
/// Debug output redacts the password.
#[derive(Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
    pub device_id: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[redacted]")
            .field("device_id", &self.device_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn track(id: &str) -> Track {
        Track {
            id: TrackId::new(id),
            title: "Example".into(),
            artist: "Artist".into(),
            duration_seconds: Some(183),
            album_art_url: Some("https://img.cantio.example/t1".into()),
        }
    }

    #[test]
    fn song_equality_is_by_id() {
        let a = Song::from_track(&track("T1"), "cantio");
        let mut b = Song::from_track(&track("T1"), "cantio");
        b.title = "Renamed".into();
        assert_eq!(a, b);

        let c = Song::from_track(&track("T2"), "cantio");
        assert_ne!(a, c);
    }

    #[test]
    fn song_carries_track_fields() {
        let song = Song::from_track(&track("T1"), "cantio");
        assert_eq!(song.id, TrackId::new("T1"));
        assert_eq!(song.provider_id, "cantio");
        assert_eq!(song.description, "Artist");
        assert_eq!(song.duration_seconds, Some(183));
        assert_eq!(
            song.album_art_url.as_deref(),
            Some("https://img.cantio.example/t1")
        );
    }

    #[test]
    fn session_token_debug_is_redacted() {
        let token = SessionToken::new("super-secret");
        let printed = format!("{token:?}");
        assert!(!printed.contains("super-secret"));
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = Credentials {
            username: "user@example.com".into(),
            password: "hunter2".into(),
            device_id: "device-1".into(),
        };
        let printed = format!("{creds:?}");
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("user@example.com"));
    }

    #[test]
    fn default_quality_is_high() {
        assert_eq!(StreamQuality::default(), StreamQuality::High);
        assert_eq!(StreamQuality::default().as_str(), "high");
    }
}
