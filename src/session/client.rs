//! Remote authority client. Wraps the three auth endpoints behind one reqwest
//! client with a fixed timeout, mapping transport failures and authority error
//! bodies into [`AuthError`] so flows can tell "the authority said no" apart
//! from "the authority never answered".

use crate::errors::AuthError;
use crate::session::Identity;
use crate::APP_USER_AGENT;
use reqwest::{Client, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, Instrument};

/// Request timeout applied to every authority call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum number of error body characters surfaced to callers.
const MAX_ERROR_CHARS: usize = 200;

#[derive(Serialize, Debug)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Clone)]
pub struct AuthClient {
    client: Client,
    base_url: String,
}

impl AuthClient {
    /// # Errors
    /// Returns `AuthError::Config` if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, AuthError> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|err| AuthError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Exchange credentials for a bearer token.
    ///
    /// # Errors
    /// `AuthError::Http` carries the authority's verbatim message for invalid
    /// credentials; transport failures map to `Network`/`Timeout`.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<SecretString, AuthError> {
        let url = self.endpoint("/auth/login");
        let payload = Credentials {
            email: email.trim(),
            password,
        };

        let span = tracing::info_span!("auth.login", http.method = "POST", url = %url);
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .instrument(span)
            .await
            .map_err(map_send_error)?;

        let response = check_status(response).await?;
        let body: TokenResponse = response
            .json()
            .await
            .map_err(|err| AuthError::Parse(format!("Failed to decode response: {err}")))?;

        debug!("login succeeded");

        Ok(SecretString::from(body.access_token))
    }

    /// Create an account. A 2xx response is the only success signal.
    ///
    /// # Errors
    /// `AuthError::Http` carries the authority's verbatim rejection message.
    #[instrument(skip(self, password))]
    pub async fn register(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let url = self.endpoint("/auth/register");
        let payload = Credentials {
            email: email.trim(),
            password,
        };

        let span = tracing::info_span!("auth.register", http.method = "POST", url = %url);
        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .instrument(span)
            .await
            .map_err(map_send_error)?;

        check_status(response).await?;

        Ok(())
    }

    /// Ask the authority what identity the token names. Any non-2xx answer,
    /// 401 included, surfaces as `AuthError::Http`.
    ///
    /// # Errors
    /// `AuthError::Http` for authority-side rejection, `Network`/`Timeout` for
    /// transport failure, `Parse` for an undecodable success body.
    #[instrument(skip(self, token))]
    pub async fn me(&self, token: &SecretString) -> Result<Identity, AuthError> {
        let url = self.endpoint("/auth/me");

        let span = tracing::info_span!("auth.me", http.method = "GET", url = %url);
        let response = self
            .client
            .get(&url)
            .bearer_auth(token.expose_secret())
            .send()
            .instrument(span)
            .await
            .map_err(map_send_error)?;

        let response = check_status(response).await?;

        response
            .json()
            .await
            .map_err(|err| AuthError::Parse(format!("Failed to decode response: {err}")))
    }
}

fn map_send_error(err: reqwest::Error) -> AuthError {
    if err.is_timeout() {
        AuthError::Timeout("Request timed out. Please try again.".to_string())
    } else {
        AuthError::Network(format!("Unable to reach the server: {err}"))
    }
}

/// Turn non-success responses into `AuthError::Http` with the authority's
/// message, preferring the JSON `message` field over the raw body.
async fn check_status(response: Response) -> Result<Response, AuthError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<Value>(&body)
        .ok()
        .and_then(|value| {
            value
                .get("message")
                .and_then(Value::as_str)
                .map(ToString::to_string)
        })
        .unwrap_or_else(|| sanitize_body(body));

    Err(AuthError::Http {
        status: status.as_u16(),
        message,
    })
}

fn sanitize_body(body: String) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
