//! Session context
//!
//! The bearer token and signed-in user are held by an explicit [`Session`] object
//! handed to the API client at construction instead of being looked up from
//! ambient storage. A 401 anywhere calls [`Session::on_unauthorized`].

use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::config::ClientConfig;

pub trait Session: Send + Sync {
    /// Bearer token for the `Authorization` header, if signed in
    fn token(&self) -> Option<String>;

    /// Username of the signed-in user, if known
    fn username(&self) -> Option<String>;

    /// Called when the API answers 401. Implementations clear stored credentials
    /// and route the user back to login.
    fn on_unauthorized(&self);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub username: Option<String>,
}

/// In-process session store.
///
/// `login_required()` hands out a receiver that flips to `true` once the session
/// has been invalidated, which is how a front end learns it must show the login
/// screen.
pub struct MemorySession {
    credentials: RwLock<Option<Credentials>>,
    login_required: watch::Sender<bool>,
}

impl MemorySession {
    pub fn new() -> Self {
        let (login_required, _) = watch::channel(false);
        Self {
            credentials: RwLock::new(None),
            login_required,
        }
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let session = Self::new();
        session.store(token, None);
        session
    }

    /// Signed in when the config carries a pre-issued token
    pub fn from_config(config: &ClientConfig) -> Self {
        let session = Self::new();
        if let Some(token) = config.token.as_deref().filter(|t| !t.trim().is_empty()) {
            session.store(token, config.username.clone());
        }
        session
    }

    pub fn store(&self, token: impl Into<String>, username: Option<String>) {
        *self.credentials.write() = Some(Credentials {
            token: token.into(),
            username,
        });
        self.login_required.send_replace(false);
    }

    pub fn clear(&self) {
        *self.credentials.write() = None;
    }

    pub fn is_signed_in(&self) -> bool {
        self.credentials.read().is_some()
    }

    pub fn login_required(&self) -> watch::Receiver<bool> {
        self.login_required.subscribe()
    }
}

impl Default for MemorySession {
    fn default() -> Self {
        Self::new()
    }
}

impl Session for MemorySession {
    fn token(&self) -> Option<String> {
        self.credentials.read().as_ref().map(|c| c.token.clone())
    }

    fn username(&self) -> Option<String> {
        self.credentials
            .read()
            .as_ref()
            .and_then(|c| c.username.clone())
    }

    fn on_unauthorized(&self) {
        let had_credentials = self.credentials.write().take().is_some();
        if had_credentials {
            warn!("Unauthorized response, stored credentials cleared");
        } else {
            info!("Unauthorized response without stored credentials");
        }
        self.login_required.send_replace(true);
    }
}
