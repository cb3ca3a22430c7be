//! Session-token authentication gate.
//!
//! A caller counts as signed in while a non-empty session token is stored
//! under [`TOKEN_KEY`]. Refused actions send the caller to the login route.

use crate::error::{Error, Result};
use crate::traits::{AuthGate, KeyValueStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, info, warn};

/// Key holding the session token.
pub const TOKEN_KEY: &str = "token";

/// Where unauthenticated callers are sent.
pub const DEFAULT_LOGIN_ROUTE: &str = "/auth/login";

/// Gate that checks for a session token in a key-value store.
#[derive(Debug)]
pub struct TokenGate<S> {
    storage: S,
    login_route: String,
    redirects: AtomicUsize,
}

impl<S: KeyValueStore> TokenGate<S> {
    /// Create a gate reading the token from `storage`.
    pub fn new(storage: S) -> Self {
        Self { storage, login_route: DEFAULT_LOGIN_ROUTE.to_string(), redirects: AtomicUsize::new(0) }
    }

    /// Redirect to a different login route.
    #[must_use]
    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    /// The configured login route.
    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    /// Number of redirects performed so far.
    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl<S: KeyValueStore> AuthGate for TokenGate<S> {
    fn is_authenticated(&self) -> bool {
        match self.storage.get(TOKEN_KEY) {
            Ok(token) => token.is_some_and(|t| !t.trim().is_empty()),
            Err(e) => {
                warn!("cannot read session token: {e}");
                false
            }
        }
    }

    fn redirect_to_login(&self) -> String {
        self.redirects.fetch_add(1, Ordering::SeqCst);
        warn!(route = %self.login_route, "not signed in; redirecting to login");
        self.login_route.clone()
    }
}

/// Refuse the action unless `gate` reports an authenticated caller.
///
/// # Errors
///
/// Returns [`Error::Unauthenticated`] after performing the gate's redirect.
pub fn guard(gate: &dyn AuthGate) -> Result<()> {
    if gate.is_authenticated() {
        return Ok(());
    }
    let redirect = gate.redirect_to_login();
    Err(Error::Unauthenticated { redirect })
}

/// Store a session token.
///
/// # Errors
///
/// Returns [`Error::Validation`] for a blank token, or a storage error.
pub fn login(storage: &impl KeyValueStore, token: &str) -> Result<()> {
    let token = token.trim();
    if token.is_empty() {
        return Err(Error::validation("session token must not be empty"));
    }
    storage.set(TOKEN_KEY, token)?;
    info!("session token stored");
    Ok(())
}

/// Forget the session token.
///
/// # Errors
///
/// Returns an error if the storage cannot be written.
pub fn logout(storage: &impl KeyValueStore) -> Result<()> {
    storage.remove(TOKEN_KEY)?;
    debug!("session token removed");
    Ok(())
}
