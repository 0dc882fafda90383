//! Session token lifecycle: login, persistence, cooldown-gated refresh.

use encore_core::catalog::{CatalogClient, CatalogError};
use encore_core::models::{Credentials, SessionToken};
use encore_core::provider::InitializationError;
use encore_core::secrets::TokenStore;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Minimum interval between credential exchanges once a token is live.
const TOKEN_COOLDOWN: Duration = Duration::from_secs(60);

pub struct SessionManager {
    client: Arc<dyn CatalogClient>,
    credentials: Credentials,
    tokens: Arc<dyn TokenStore>,
    cooldown: Duration,
    /// Instant of the last successful exchange, including the initial login.
    /// Held for the whole refresh so concurrent 401 handlers serialize.
    last_exchange: Mutex<Option<Instant>>,
}

impl SessionManager {
    pub fn new(
        client: Arc<dyn CatalogClient>,
        credentials: Credentials,
        tokens: Arc<dyn TokenStore>,
    ) -> Self {
        Self::with_cooldown(client, credentials, tokens, TOKEN_COOLDOWN)
    }

    pub fn with_cooldown(
        client: Arc<dyn CatalogClient>,
        credentials: Credentials,
        tokens: Arc<dyn TokenStore>,
        cooldown: Duration,
    ) -> Self {
        Self {
            client,
            credentials,
            tokens,
            cooldown,
            last_exchange: Mutex::new(None),
        }
    }

    /// Obtains a session token and installs it into the catalog client.
    ///
    /// A persisted token is revalidated first; if the catalog rejects it,
    /// the persisted copy is cleared and credential login is attempted
    /// exactly once. Any remaining failure aborts initialization.
    pub fn login(&self) -> Result<(), InitializationError> {
        let persisted = match self.tokens.load() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "token store unavailable, falling back to credential login");
                None
            }
        };

        if let Some(saved) = persisted {
            info!("validating persisted session token");
            match self.client.refresh_token(&saved) {
                Ok(fresh) => {
                    self.adopt_token(fresh);
                    return Ok(());
                }
                Err(CatalogError::Unauthorized) => {
                    info!("persisted token rejected, requesting a new one");
                    if let Err(e) = self.tokens.clear() {
                        warn!(error = %e, "failed to clear rejected token");
                    }
                }
                Err(e) => {
                    return Err(InitializationError::new(format!(
                        "could not validate session token: {e}"
                    )));
                }
            }
        }

        self.credential_login()
            .map_err(|e| InitializationError::new(format!("credential login failed: {e}")))
    }

    fn credential_login(&self) -> Result<(), CatalogError> {
        let token = self.client.login(&self.credentials)?;
        self.adopt_token(token);
        Ok(())
    }

    fn adopt_token(&self, token: SessionToken) {
        if let Err(e) = self.tokens.save(&token) {
            warn!(error = %e, "failed to persist session token");
        }
        self.client.install_token(token);
        *self.last_exchange.lock().expect("session lock poisoned") = Some(Instant::now());
    }

    /// Called after an authorization failure from the catalog. Returns
    /// whether a refresh happened; callers retry their operation exactly
    /// once on `true` and surface the original error on `false`.
    pub fn handle_unauthorized(&self) -> bool {
        let mut last = self.last_exchange.lock().expect("session lock poisoned");
        if let Some(at) = *last {
            let elapsed = at.elapsed();
            if elapsed < self.cooldown {
                info!(
                    remaining_secs = (self.cooldown - elapsed).as_secs(),
                    "token refresh on cooldown"
                );
                return false;
            }
        }

        info!("authorization expired, requesting a new token");
        match self.client.login(&self.credentials) {
            Ok(token) => {
                if let Err(e) = self.tokens.save(&token) {
                    warn!(error = %e, "failed to persist session token");
                }
                self.client.install_token(token);
                *last = Some(Instant::now());
                true
            }
            Err(e) => {
                error!(error = %e, "token refresh failed, client stays unauthenticated");
                false
            }
        }
    }
}
