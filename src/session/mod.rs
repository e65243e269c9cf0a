//! Process-wide session state derived from the token store and the verifier.
//! UI gates subscribe to one owned state container instead of re-deriving
//! "am I logged in" flags per consumer, so every gate sees the same answer.

pub mod client;
pub mod cookie;
pub mod modal;
pub mod store;
pub mod verifier;

use crate::admission::login_redirect;
use crate::session::{
    modal::AuthModal,
    store::TokenStore,
    verifier::{Verdict, Verifier},
};
use secrecy::SecretString;
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

/// Minimal user-identifying data returned by the authority.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Identity {
    pub email: String,
}

/// Exactly one value at a time. `Unknown` is the sole initial state, exited
/// exactly once when the first verification attempt resolves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Session {
    Unknown,
    Authenticated(Identity),
    Anonymous,
}

impl Session {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }
}

/// What an unauthenticated gate does: navigate to the login page, or pop the
/// auth modal in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePolicy {
    RedirectToPage,
    PromptModal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// The session is authenticated; no side effect.
    Granted,
    /// Navigate to this target (login page carrying the return path).
    Redirect(String),
    /// The auth modal was opened; no navigation happens.
    ModalOpened,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Where unauthenticated gates send the user.
    pub login_page: String,
    /// Public landing target after logout.
    pub landing_page: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            login_page: "/auth".to_string(),
            landing_page: "/".to_string(),
        }
    }
}

/// Owns the session state machine: the token store, the verifier, the auth
/// modal, and the observable state channel.
pub struct SessionManager {
    store: TokenStore,
    verifier: Verifier,
    modal: AuthModal,
    config: SessionConfig,
    state: watch::Sender<Session>,
    resolve_lock: Mutex<()>,
    // Bumped on every explicit transition; a verification that started under
    // an older generation is discarded on arrival.
    generation: AtomicU64,
}

impl SessionManager {
    #[must_use]
    pub fn new(store: TokenStore, verifier: Verifier, config: SessionConfig) -> Self {
        let (state, _) = watch::channel(Session::Unknown);
        Self {
            store,
            verifier,
            modal: AuthModal::new(),
            config,
            state,
            resolve_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn current(&self) -> Session {
        self.state.borrow().clone()
    }

    fn transition(&self, next: Session) {
        self.state.send_replace(next);
    }

    /// Watch channel for UI gates; receivers observe every transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    #[must_use]
    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    #[must_use]
    pub fn modal(&self) -> &AuthModal {
        &self.modal
    }

    /// Resolve the initial `Unknown` state. An empty store short-circuits to
    /// `Anonymous` without a network call; otherwise the token is verified and
    /// the verdict applied. Safe to call more than once: if already resolved
    /// it is a no-op, and concurrent callers share one pending verification.
    pub async fn bootstrap(&self) -> Session {
        let _guard = self.resolve_lock.lock().await;
        let current = self.current();
        if current != Session::Unknown {
            return current;
        }
        self.verify_and_apply().await
    }

    /// Re-verify the stored token, e.g. on a later navigation after a
    /// transient outage left the state anonymous with the token retained.
    pub async fn refresh(&self) -> Session {
        let _guard = self.resolve_lock.lock().await;
        self.verify_and_apply().await
    }

    async fn verify_and_apply(&self) -> Session {
        let Some(token) = self.store.get() else {
            debug!("no stored token, session is anonymous");
            self.transition(Session::Anonymous);
            return Session::Anonymous;
        };

        let generation = self.generation.load(Ordering::SeqCst);
        let verdict = self.verifier.verify(&token).await;

        if self.generation.load(Ordering::SeqCst) != generation {
            debug!("discarding stale verification verdict");
            return self.current();
        }

        match verdict {
            Verdict::Valid(identity) => {
                info!("session verified for {}", identity.email);
                let session = Session::Authenticated(identity);
                self.transition(session.clone());
                session
            }
            Verdict::Rejected(reason) => {
                warn!("stored token rejected: {reason}");
                self.store.clear();
                self.transition(Session::Anonymous);
                Session::Anonymous
            }
            // Gate as anonymous but keep the token: a later retry may still
            // succeed, and a brief outage must not force a re-login.
            Verdict::Unreachable => {
                warn!("authority unreachable, gating as anonymous");
                self.transition(Session::Anonymous);
                Session::Anonymous
            }
        }
    }

    /// Record a successful login. The issuing flow already holds the identity,
    /// so no extra verification round-trip happens. Returns the auth modal's
    /// deferred destination, if the modal was the active gate.
    pub fn login(&self, token: &SecretString, identity: Identity) -> Option<String> {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.store.set(token);
        info!("session authenticated for {}", identity.email);
        self.transition(Session::Authenticated(identity));
        self.modal.complete()
    }

    /// Clear both token slots and demote to anonymous. Returns the public
    /// landing target for the presentation layer to navigate to.
    pub fn logout(&self) -> String {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.store.clear();
        info!("session logged out");
        self.transition(Session::Anonymous);
        self.config.landing_page.clone()
    }

    /// Shared handling for an authority-side token rejection, including a 401
    /// from any outbound authenticated call: clear the store, demote.
    pub fn token_rejected(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.store.clear();
        warn!("token rejected, session demoted to anonymous");
        self.transition(Session::Anonymous);
    }

    /// Gate a page on an authenticated session. Suspends while the state is
    /// `Unknown` until bootstrap resolves, then applies the policy.
    pub async fn require_authenticated(
        &self,
        policy: GatePolicy,
        current_path: &str,
    ) -> GateOutcome {
        if self.current() == Session::Unknown {
            self.bootstrap().await;
        }

        if self.current().is_authenticated() {
            return GateOutcome::Granted;
        }

        match policy {
            GatePolicy::RedirectToPage => {
                GateOutcome::Redirect(login_redirect(&self.config.login_page, current_path))
            }
            GatePolicy::PromptModal => {
                self.modal.open(Some(current_path.to_string()));
                GateOutcome::ModalOpened
            }
        }
    }

    /// 401 handling for API collaborators: reject the token, then apply the
    /// gate policy for the page the user is on.
    pub async fn handle_unauthorized(
        &self,
        policy: GatePolicy,
        current_path: &str,
    ) -> GateOutcome {
        self.token_rejected();
        self.require_authenticated(policy, current_path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::client::AuthClient;
    use secrecy::ExposeSecret;
    use serde_json::json;
    use std::net::TcpListener;
    use std::sync::Arc;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn can_bind_localhost() -> bool {
        TcpListener::bind("127.0.0.1:0").is_ok()
    }

    fn token(value: &str) -> SecretString {
        SecretString::from(value.to_string())
    }

    fn identity(email: &str) -> Identity {
        Identity {
            email: email.to_string(),
        }
    }

    fn manager(base_url: &str) -> anyhow::Result<SessionManager> {
        Ok(SessionManager::new(
            TokenStore::in_memory(),
            Verifier::new(AuthClient::new(base_url)?),
            SessionConfig::default(),
        ))
    }

    #[tokio::test]
    async fn bootstrap_with_empty_store_skips_verification() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let manager = manager(&server.uri())?;
        assert_eq!(manager.bootstrap().await, Session::Anonymous);
        Ok(())
    }

    #[tokio::test]
    async fn bootstrap_with_valid_token_authenticates() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .and(header("Authorization", "Bearer tok1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "email": "learner@parlo.dev"
            })))
            .mount(&server)
            .await;

        let manager = manager(&server.uri())?;
        manager.store().set(&token("tok1"));

        let mut observer = manager.subscribe();
        assert_eq!(
            manager.bootstrap().await,
            Session::Authenticated(identity("learner@parlo.dev"))
        );
        observer.changed().await?;
        assert!(observer.borrow().is_authenticated());
        Ok(())
    }

    #[tokio::test]
    async fn rejected_verdict_clears_the_store() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "message": "token expired"
            })))
            .mount(&server)
            .await;

        let manager = manager(&server.uri())?;
        manager.store().set(&token("tok1"));

        assert_eq!(manager.bootstrap().await, Session::Anonymous);
        assert!(manager.store().get().is_none());
        assert!(manager.store().edge_token().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_verdict_retains_the_token() -> anyhow::Result<()> {
        let manager = manager("http://127.0.0.1:1")?;
        manager.store().set(&token("tok1"));

        assert_eq!(manager.bootstrap().await, Session::Anonymous);
        assert_eq!(
            manager.store().get().map(|t| t.expose_secret().to_string()),
            Some("tok1".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn concurrent_bootstraps_share_one_verification() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "email": "learner@parlo.dev"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let manager = manager(&server.uri())?;
        manager.store().set(&token("tok1"));

        let (first, second) = tokio::join!(manager.bootstrap(), manager.bootstrap());
        assert_eq!(first, second);
        assert!(first.is_authenticated());

        // Resolved state makes further bootstraps a no-op.
        assert!(manager.bootstrap().await.is_authenticated());
        Ok(())
    }

    #[tokio::test]
    async fn logout_discards_in_flight_verification() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"email": "learner@parlo.dev"}))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&server)
            .await;

        let manager = Arc::new(manager(&server.uri())?);
        manager.store().set(&token("tok1"));

        let in_flight = tokio::spawn({
            let manager = Arc::clone(&manager);
            async move { manager.bootstrap().await }
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        manager.logout();

        // The stale verdict must not resurrect the session.
        assert_eq!(in_flight.await?, Session::Anonymous);
        assert_eq!(manager.current(), Session::Anonymous);
        assert!(manager.store().get().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn login_then_logout_empties_both_slots() -> anyhow::Result<()> {
        let manager = manager("http://127.0.0.1:1")?;

        manager.login(&token("tok1"), identity("learner@parlo.dev"));
        assert!(manager.current().is_authenticated());
        assert!(manager.store().edge_token().is_some());

        let landing = manager.logout();
        assert_eq!(landing, "/");
        assert_eq!(manager.current(), Session::Anonymous);
        assert!(manager.store().get().is_none());
        assert!(manager.store().edge_token().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn modal_gate_delivers_destination_on_login() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let manager = manager(&server.uri())?;
        let outcome = manager
            .require_authenticated(GatePolicy::PromptModal, "/upload")
            .await;
        assert_eq!(outcome, GateOutcome::ModalOpened);
        assert!(manager.modal().is_open());

        let destination = manager.login(&token("tok1"), identity("learner@parlo.dev"));
        assert_eq!(destination, Some("/upload".to_string()));
        assert!(!manager.modal().is_open());

        // The destination is handed over exactly once.
        assert_eq!(manager.modal().complete(), None);
        Ok(())
    }

    #[tokio::test]
    async fn redirect_gate_carries_return_url() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let manager = manager(&server.uri())?;
        let outcome = manager
            .require_authenticated(GatePolicy::RedirectToPage, "/upload")
            .await;
        assert_eq!(
            outcome,
            GateOutcome::Redirect("/auth?returnUrl=%2Fupload".to_string())
        );
        Ok(())
    }

    #[tokio::test]
    async fn authenticated_gate_resolves_immediately() -> anyhow::Result<()> {
        let manager = manager("http://127.0.0.1:1")?;
        manager.login(&token("tok1"), identity("learner@parlo.dev"));

        let outcome = manager
            .require_authenticated(GatePolicy::RedirectToPage, "/upload")
            .await;
        assert_eq!(outcome, GateOutcome::Granted);
        Ok(())
    }

    #[tokio::test]
    async fn unauthorized_api_response_demotes_and_gates() -> anyhow::Result<()> {
        let manager = manager("http://127.0.0.1:1")?;
        manager.login(&token("tok1"), identity("learner@parlo.dev"));

        let outcome = manager
            .handle_unauthorized(GatePolicy::RedirectToPage, "/upload")
            .await;
        assert_eq!(
            outcome,
            GateOutcome::Redirect("/auth?returnUrl=%2Fupload".to_string())
        );
        assert_eq!(manager.current(), Session::Anonymous);
        assert!(manager.store().get().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn refresh_recovers_a_retained_token() -> anyhow::Result<()> {
        if !can_bind_localhost() {
            eprintln!("Skipping test: cannot bind localhost");
            return Ok(());
        }
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .and(header("Authorization", "Bearer tok1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "email": "learner@parlo.dev"
            })))
            .mount(&server)
            .await;

        let manager = manager(&server.uri())?;
        assert_eq!(manager.bootstrap().await, Session::Anonymous);

        // A token survives a transient outage; the next navigation retries.
        manager.store().set(&token("tok1"));
        assert_eq!(
            manager.refresh().await,
            Session::Authenticated(identity("learner@parlo.dev"))
        );
        Ok(())
    }
}
