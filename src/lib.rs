//! Session and route admission core for the Parlo language-learning client.
//!
//! One opaque bearer token lives in two physical slots (a script-readable one
//! and an edge-readable cookie). This crate keeps the two in sync, verifies the
//! token against the remote authority, derives the observable session state
//! consumed by UI gates, and decides route admission before any page renders.

pub mod admission;
pub mod cli;
pub mod edge;
pub mod errors;
pub mod session;

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
