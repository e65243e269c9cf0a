//! Dual-slot token store. One logical bearer token is persisted in two
//! physical locations: a script-readable slot consumed by in-page code and an
//! edge-readable slot consumed by the request filter before any script runs.
//! The invariant is that the two slots never disagree past one set/clear call;
//! there is no partial-write state visible to any reader.

use crate::errors::AuthError;
use secrecy::SecretString;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tracing::warn;

/// Expiration horizon written to the edge-readable slot on every set.
pub const EDGE_TOKEN_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// One physical token location. Hosts embedding the core supply platform
/// backends; the crate ships [`MemorySlot`] for in-process use and tests.
pub trait TokenSlot: Send + Sync {
    fn read(&self) -> Option<SecretString>;

    /// Persist the token. `ttl` is the expiration horizon for slots that
    /// support one; slots without expiry semantics ignore it.
    ///
    /// # Errors
    /// Returns `AuthError::Storage` if the backing storage is unavailable.
    fn write(&self, token: &SecretString, ttl: Option<Duration>) -> Result<(), AuthError>;

    /// # Errors
    /// Returns `AuthError::Storage` if the backing storage is unavailable.
    fn clear(&self) -> Result<(), AuthError>;
}

/// In-process slot backed by a mutex.
#[derive(Debug, Default)]
pub struct MemorySlot {
    token: Mutex<Option<SecretString>>,
}

impl MemorySlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenSlot for MemorySlot {
    fn read(&self) -> Option<SecretString> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn write(&self, token: &SecretString, _ttl: Option<Duration>) -> Result<(), AuthError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}

/// Owns the script-readable and edge-readable slots and keeps them in sync.
/// The store never triggers navigation or verification; its only side effects
/// are the two physical slots.
pub struct TokenStore {
    script: Box<dyn TokenSlot>,
    edge: Box<dyn TokenSlot>,
}

impl TokenStore {
    #[must_use]
    pub fn new(script: Box<dyn TokenSlot>, edge: Box<dyn TokenSlot>) -> Self {
        Self { script, edge }
    }

    /// Store backed by two in-process slots, created empty.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Box::new(MemorySlot::new()), Box::new(MemorySlot::new()))
    }

    /// Write the token to both slots as one logical operation. The edge slot
    /// gets the 7-day horizon; the script slot has caller-driven expiry only.
    /// A failing slot is logged and skipped, the other write still happens.
    pub fn set(&self, token: &SecretString) {
        if let Err(err) = self.edge.write(token, Some(EDGE_TOKEN_TTL)) {
            warn!("edge slot write failed: {err}");
        }
        if let Err(err) = self.script.write(token, None) {
            warn!("script slot write failed: {err}");
        }
    }

    /// Current token as seen by in-page code.
    #[must_use]
    pub fn get(&self) -> Option<SecretString> {
        self.script.read()
    }

    /// Current token as seen by the edge request filter.
    #[must_use]
    pub fn edge_token(&self) -> Option<SecretString> {
        self.edge.read()
    }

    #[must_use]
    pub fn has_token(&self) -> bool {
        self.get().is_some()
    }

    /// `Authorization` header value for outbound authenticated requests.
    #[must_use]
    pub fn bearer(&self) -> Option<String> {
        use secrecy::ExposeSecret;
        self.get()
            .map(|token| format!("Bearer {}", token.expose_secret()))
    }

    /// Null out both slots, even if only one currently holds a value.
    pub fn clear(&self) {
        if let Err(err) = self.edge.clear() {
            warn!("edge slot clear failed: {err}");
        }
        if let Err(err) = self.script.clear() {
            warn!("script slot clear failed: {err}");
        }
    }
}
