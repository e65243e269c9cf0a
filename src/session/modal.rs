//! State machine for the "pop a dialog instead of navigating" admission mode.
//! At most one modal context exists at a time; opening again replaces the
//! stored return destination (latest caller wins).

use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default, Clone)]
struct ModalContext {
    is_open: bool,
    return_destination: Option<String>,
}

#[derive(Debug, Default)]
pub struct AuthModal {
    inner: Mutex<ModalContext>,
}

impl AuthModal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ModalContext> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open the modal, remembering where to return after authentication.
    pub fn open(&self, return_destination: Option<String>) {
        let mut context = self.lock();
        context.is_open = true;
        context.return_destination = return_destination;
    }

    /// Close the modal and drop any pending destination. Idempotent.
    pub fn close(&self) {
        let mut context = self.lock();
        context.is_open = false;
        context.return_destination = None;
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.lock().is_open
    }

    #[must_use]
    pub fn return_destination(&self) -> Option<String> {
        self.lock().return_destination.clone()
    }

    /// Called on external authentication success: closes the modal and hands
    /// back the stored destination exactly once.
    pub fn complete(&self) -> Option<String> {
        let mut context = self.lock();
        context.is_open = false;
        context.return_destination.take()
    }
}
