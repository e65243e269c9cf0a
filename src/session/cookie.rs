//! Wire format of the edge-readable slot: a cookie with a fixed name, written
//! alongside every token set and deleted alongside every clear. The request
//! filter parses the `Cookie` header with these helpers since it runs before
//! any script and cannot see the script-readable slot.

use crate::errors::AuthError;
use crate::session::store::{TokenSlot, EDGE_TOKEN_TTL};
use secrecy::{ExposeSecret, SecretString};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

pub const TOKEN_COOKIE_NAME: &str = "auth_token";

/// `Set-Cookie` value carrying the token with the given expiration horizon.
#[must_use]
pub fn set_cookie_value(token: &SecretString, max_age: Duration) -> String {
    format!(
        "{TOKEN_COOKIE_NAME}={}; Path=/; SameSite=Strict; Max-Age={}",
        token.expose_secret(),
        max_age.as_secs()
    )
}

/// `Set-Cookie` value that deletes the token cookie.
#[must_use]
pub fn clear_cookie_value() -> String {
    format!("{TOKEN_COOKIE_NAME}=; Path=/; SameSite=Strict; Max-Age=0")
}

/// Extract the token from a `Cookie` request header, ignoring other cookies.
#[must_use]
pub fn token_from_cookie_header(header: &str) -> Option<String> {
    for pair in header.split(';') {
        let mut parts = pair.trim().splitn(2, '=');
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        let value = value.trim();
        if key.trim() == TOKEN_COOKIE_NAME && !value.is_empty() {
            return Some(value.to_string());
        }
    }
    None
}

/// Edge slot that persists the token in serialized cookie form, the way a
/// browser or gateway holds it.
#[derive(Debug, Default)]
pub struct CookieSlot {
    cookie: Mutex<Option<String>>,
}

impl CookieSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The serialized `Set-Cookie` value currently held, if any.
    #[must_use]
    pub fn cookie(&self) -> Option<String> {
        self.cookie
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl TokenSlot for CookieSlot {
    fn read(&self) -> Option<SecretString> {
        self.cookie()
            .as_deref()
            .and_then(token_from_cookie_header)
            .map(SecretString::from)
    }

    fn write(&self, token: &SecretString, ttl: Option<Duration>) -> Result<(), AuthError> {
        let max_age = ttl.unwrap_or(EDGE_TOKEN_TTL);
        *self.cookie.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(set_cookie_value(token, max_age));
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        *self.cookie.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
