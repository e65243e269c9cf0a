//! Error taxonomy for the session core. Nothing here is fatal: the worst case
//! for any of these variants is "treated as logged out".

use std::fmt;

#[derive(Clone, Debug)]
pub enum AuthError {
    /// Client-side misconfiguration, e.g. an unusable authority base URL.
    Config(String),
    /// Transport-level failure: the authority never answered.
    Network(String),
    /// The request was abandoned after the client timeout.
    Timeout(String),
    /// The authority answered with a non-success status.
    Http { status: u16, message: String },
    /// The authority answered but the body could not be decoded.
    Parse(String),
    /// Writing or clearing a token slot failed, e.g. storage disabled.
    Storage(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Config(message) => write!(formatter, "Config error: {message}"),
            AuthError::Network(message) => write!(formatter, "Network error: {message}"),
            AuthError::Timeout(message) => write!(formatter, "Timeout: {message}"),
            AuthError::Http { status, message } => {
                write!(formatter, "Request failed ({status}): {message}")
            }
            AuthError::Parse(message) => write!(formatter, "Response error: {message}"),
            AuthError::Storage(message) => write!(formatter, "Storage error: {message}"),
        }
    }
}

impl std::error::Error for AuthError {}

impl AuthError {
    /// True for failures where the authority was never reached, i.e. the ones
    /// that must not destroy a token that might still be valid.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthError::Network(_) | AuthError::Timeout(_))
    }
}
