//! Stickkery admin session guard.
//!
//! Keeps a locally cached admin session honest: every API response, a
//! fixed-interval poll and foreground-regain checks all funnel into one
//! idempotent termination routine that wipes the session and sends the
//! host back to the login surface once the backend reports the account
//! disabled.

pub mod auth;
pub mod classify;
pub mod config;
pub mod error;
pub mod guard;
pub mod hooks;
pub mod net;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use auth::AuthClient;
pub use classify::{DisabledSignal, classify};
pub use config::GuardConfig;
pub use error::GuardError;
pub use guard::{CheckOutcome, GuardHooks, GuardPhase, SessionEvent, SessionGuard, Trigger};
pub use net::{ApiRequest, ApiResponse, GuardedClient};
pub use session::{Session, SessionStorage};
