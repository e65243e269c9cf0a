//! Token verification against the remote authority. The verifier only reports
//! a verdict; clearing the store on rejection is the session manager's job.
//! The three-way split matters: callers must not destroy a token the authority
//! never got to judge, so transport failure is kept apart from rejection.

use crate::errors::AuthError;
use crate::session::{client::AuthClient, Identity};
use secrecy::SecretString;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// The authority recognizes the token and names this identity.
    Valid(Identity),
    /// The authority judged the token invalid, expired, or revoked.
    Rejected(String),
    /// The authority could not be reached; the token's status is unknown.
    Unreachable,
}

#[derive(Debug, Clone)]
pub struct Verifier {
    api: AuthClient,
}

impl Verifier {
    #[must_use]
    pub fn new(api: AuthClient) -> Self {
        Self { api }
    }

    /// Ask the authority whether `token` is still valid. Never fails: every
    /// outcome is folded into a [`Verdict`].
    pub async fn verify(&self, token: &SecretString) -> Verdict {
        match self.api.me(token).await {
            Ok(identity) => Verdict::Valid(identity),
            Err(AuthError::Http { status, message }) => {
                warn!(status, "token rejected by authority: {message}");
                Verdict::Rejected(message)
            }
            Err(err) if err.is_transient() => {
                warn!("authority unreachable: {err}");
                Verdict::Unreachable
            }
            // A decode or config failure on our side says nothing about the
            // token; treat it as inconclusive rather than rejected.
            Err(err) => {
                warn!("verification inconclusive: {err}");
                Verdict::Unreachable
            }
        }
    }
}
