//! HTTP client for the Cantio catalog API.

use crate::mapping::map_track;
use crate::models::{
    CreateStationRequest, LoginRequest, StationResponse, StationTracksRequest, TokenResponse,
    TrackPageResponse,
};
use encore_core::catalog::{CatalogClient, CatalogError, CatalogResult, Station};
use encore_core::models::{Credentials, SessionToken, StreamQuality, Track, TrackId};
use encore_core::redact::redact_secrets;
use reqwest::blocking::{Client, Response};
use reqwest::StatusCode;
use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use url::Url;

#[derive(Clone)]
pub struct CantioClientConfig {
    pub base_url: String,
    pub access_token: Option<String>,
}

pub struct HttpCatalogClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: Client,
    base_url: Url,
    token: RwLock<Option<String>>,
}

impl ClientInner {
    fn bearer(&self) -> String {
        self.token
            .read()
            .expect("token lock poisoned")
            .clone()
            .unwrap_or_default()
    }

    fn endpoint(&self, path: &str) -> CatalogResult<Url> {
        self.base_url.join(path).map_err(|e| CatalogError::Other {
            message: format!("invalid endpoint {path}: {e}"),
        })
    }

    fn check(&self, response: Response, looked_up: Option<&str>) -> CatalogResult<Response> {
        match response.status() {
            StatusCode::UNAUTHORIZED => Err(CatalogError::Unauthorized),
            StatusCode::NOT_FOUND if looked_up.is_some() => Err(CatalogError::NotFound {
                id: looked_up.unwrap_or_default().to_string(),
            }),
            status if status.is_success() => Ok(response),
            status => Err(CatalogError::Other {
                message: format!("catalog returned {status}"),
            }),
        }
    }
}

fn network_error(e: reqwest::Error) -> CatalogError {
    CatalogError::Network {
        message: redact_secrets(&e.to_string()).into_owned(),
    }
}

fn decode_error(e: reqwest::Error) -> CatalogError {
    CatalogError::Other {
        message: format!("failed to decode catalog response: {e}"),
    }
}

impl HttpCatalogClient {
    pub fn new(config: CantioClientConfig) -> CatalogResult<Self> {
        let base_url = Url::parse(&config.base_url).map_err(|e| CatalogError::Other {
            message: format!("invalid base_url: {e}"),
        })?;
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| CatalogError::Other {
                message: e.to_string(),
            })?;
        Ok(Self {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                token: RwLock::new(config.access_token),
            }),
        })
    }
}

impl CatalogClient for HttpCatalogClient {
    fn search_tracks(&self, query: &str, limit: u32) -> CatalogResult<Vec<Track>> {
        let url = self.inner.endpoint("api/v1/search/tracks")?;
        let limit = limit.to_string();
        let response = self
            .inner
            .http
            .get(url)
            .query(&[("q", query), ("limit", limit.as_str())])
            .bearer_auth(self.inner.bearer())
            .send()
            .map_err(network_error)?;
        let body: TrackPageResponse = self
            .inner
            .check(response, None)?
            .json()
            .map_err(decode_error)?;
        Ok(body.data.iter().map(map_track).collect())
    }

    fn get_track(&self, id: &TrackId) -> CatalogResult<Track> {
        let url = self
            .inner
            .endpoint(&format!("api/v1/tracks/{}", id.as_ref()))?;
        let response = self
            .inner
            .http
            .get(url)
            .bearer_auth(self.inner.bearer())
            .send()
            .map_err(network_error)?;
        let body: crate::models::CatalogTrack = self
            .inner
            .check(response, Some(id.as_ref()))?
            .json()
            .map_err(decode_error)?;
        Ok(map_track(&body))
    }

    fn download(&self, track: &Track, quality: StreamQuality, dest: &Path) -> CatalogResult<()> {
        let url = self
            .inner
            .endpoint(&format!("api/v1/tracks/{}/stream", track.id.as_ref()))?;
        let response = self
            .inner
            .http
            .get(url)
            .query(&[("quality", quality.as_str())])
            .bearer_auth(self.inner.bearer())
            .send()
            .map_err(network_error)?;
        let mut response = self.inner.check(response, Some(track.id.as_ref()))?;

        let mut file = fs::File::create(dest).map_err(|e| CatalogError::Io {
            message: format!("failed to create {}: {e}", dest.display()),
        })?;
        response.copy_to(&mut file).map_err(network_error)?;
        Ok(())
    }

    fn login(&self, credentials: &Credentials) -> CatalogResult<SessionToken> {
        let url = self.inner.endpoint("api/v1/auth/login")?;
        let response = self
            .inner
            .http
            .post(url)
            .json(&LoginRequest {
                username: &credentials.username,
                password: &credentials.password,
                device_id: &credentials.device_id,
            })
            .send()
            .map_err(network_error)?;
        let body: TokenResponse = self
            .inner
            .check(response, None)?
            .json()
            .map_err(decode_error)?;
        Ok(SessionToken::new(body.token))
    }

    fn refresh_token(&self, token: &SessionToken) -> CatalogResult<SessionToken> {
        let url = self.inner.endpoint("api/v1/auth/refresh")?;
        let response = self
            .inner
            .http
            .post(url)
            .bearer_auth(token.as_str())
            .send()
            .map_err(network_error)?;
        let body: TokenResponse = self
            .inner
            .check(response, None)?
            .json()
            .map_err(decode_error)?;
        Ok(SessionToken::new(body.token))
    }

    fn install_token(&self, token: SessionToken) {
        *self.inner.token.write().expect("token lock poisoned") =
            Some(token.as_str().to_owned());
    }

    fn create_station(
        &self,
        seed: &Track,
        name: &str,
        recommend_to_public: bool,
    ) -> CatalogResult<Box<dyn Station>> {
        let url = self.inner.endpoint("api/v1/stations")?;
        let response = self
            .inner
            .http
            .post(url)
            .json(&CreateStationRequest {
                seed_track_id: seed.id.as_ref(),
                name,
                recommend_to_public,
            })
            .bearer_auth(self.inner.bearer())
            .send()
            .map_err(network_error)?;
        let body: StationResponse = self
            .inner
            .check(response, Some(seed.id.as_ref()))?
            .json()
            .map_err(decode_error)?;
        tracing::debug!(station = %body.id, seed = %seed.id, "created station");
        Ok(Box::new(HttpStation {
            inner: self.inner.clone(),
            id: body.id,
            seed: seed.id.clone(),
        }))
    }
}

struct HttpStation {
    inner: Arc<ClientInner>,
    id: String,
    seed: TrackId,
}

impl Station for HttpStation {
    fn seed_id(&self) -> &TrackId {
        &self.seed
    }

    fn get_tracks(
        &self,
        recently_played: &[TrackId],
        want_fresh: bool,
        exclude_recent: bool,
    ) -> CatalogResult<Vec<Track>> {
        let url = self
            .inner
            .endpoint(&format!("api/v1/stations/{}/tracks", self.id))?;
        let context: Vec<String> = recently_played
            .iter()
            .map(|id| id.as_ref().to_owned())
            .collect();
        let response = self
            .inner
            .http
            .post(url)
            .json(&StationTracksRequest {
                recently_played: &context,
                want_fresh,
                exclude_recent,
            })
            .bearer_auth(self.inner.bearer())
            .send()
            .map_err(network_error)?;
        let body: TrackPageResponse = self
            .inner
            .check(response, Some(&self.id))?
            .json()
            .map_err(decode_error)?;
        Ok(body.data.iter().map(map_track).collect())
    }

    fn delete(&self) -> CatalogResult<()> {
        let url = self
            .inner
            .endpoint(&format!("api/v1/stations/{}", self.id))?;
        let response = self
            .inner
            .http
            .delete(url)
            .bearer_auth(self.inner.bearer())
            .send()
            .map_err(network_error)?;
        self.inner.check(response, Some(&self.id))?;
        tracing::debug!(station = %self.id, "deleted station");
        Ok(())
    }
}
