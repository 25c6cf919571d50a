//! Session guard: ends the local session the moment the backend says the
//! account behind it is disabled.
//!
//! DESIGN
//! ======
//! Three independent triggers feed one termination routine: the response
//! interceptor, the fixed-interval poller and the visibility check. They
//! race freely. Termination is at-most-once: it only runs from `Armed`, and
//! an in-flight flag stays held for a short dedupe window after the run so
//! late duplicates (including responses for the old token that land after a
//! quick re-login) are absorbed.
//!
//! STATE
//! =====
//! `Disarmed` --arm--> `Armed` --terminate--> `Terminating` --> `Disarmed`.
//! The poller's cancellation token is present iff the guard is armed.
//! Auth state is published on a `watch` channel and lifecycle changes on a
//! `broadcast` channel so UI layers subscribe instead of being called into.

pub mod interceptor;
pub mod poller;
pub mod visibility;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use reqwest::{Method, StatusCode, Url};
use tokio::sync::{broadcast, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::classify::{DisabledSignal, VERIFY_PATH, classify};
use crate::config::GuardConfig;
use crate::error::GuardError;
use crate::hooks::{Navigator, Notifier};
use crate::net::{GuardedClient, HttpTransport, OutboundRequest};
use crate::session::SessionStorage;
pub use interceptor::DisabledAccountInterceptor;
pub use visibility::Visibility;

pub const DISABLED_NOTICE: &str =
    "Your account has been disabled. You have been logged out. Please contact support for assistance.";

const EVENT_CAPACITY: usize = 16;

// =============================================================================
// PUBLIC TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardPhase {
    Disarmed,
    Armed,
    Terminating,
}

/// Which path detected the disabled account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Interceptor,
    Poll,
    Visibility,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Interceptor => "interceptor",
            Self::Poll => "poll",
            Self::Visibility => "visibility",
        })
    }
}

/// Lifecycle notifications published to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A session was stored and monitoring started.
    Armed,
    /// The backend reported the account disabled; the session was wiped.
    Terminated { trigger: Trigger },
    /// Explicit logout, or the token vanished from storage.
    SignedOut,
}

/// Result of a single verification round-trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    /// No token stored; nothing was sent.
    NoSession,
    /// The session verified cleanly.
    Active,
    /// Non-success without a disable signal. The session is kept.
    Rejected(StatusCode),
    /// Disable signal seen. `executed` is false when another trigger had
    /// already handled it.
    Disabled { executed: bool },
}

/// Side effects the guard performs on the host during termination.
#[derive(Clone)]
pub struct GuardHooks {
    pub navigator: Arc<dyn Navigator>,
    pub notifier: Arc<dyn Notifier>,
}

// =============================================================================
// STATE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InFlight {
    Idle,
    Running,
    Draining(Instant),
}

impl InFlight {
    fn is_held(self, now: Instant) -> bool {
        match self {
            Self::Idle => false,
            Self::Running => true,
            Self::Draining(until) => now < until,
        }
    }
}

struct GuardInner {
    phase: GuardPhase,
    in_flight: InFlight,
    poll: Option<CancellationToken>,
}

// =============================================================================
// SESSION GUARD
// =============================================================================

pub struct SessionGuard {
    storage: SessionStorage,
    transport: Arc<dyn HttpTransport>,
    verify_url: Url,
    login_route: String,
    poll_interval: Duration,
    dedupe_window: Duration,
    hooks: GuardHooks,
    installed: AtomicBool,
    inner: Mutex<GuardInner>,
    auth: watch::Sender<bool>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionGuard {
    /// Build the guard. It starts `Disarmed`; call [`install`](Self::install).
    ///
    /// # Errors
    ///
    /// Returns an error if the verify endpoint cannot be resolved.
    pub fn new(
        config: &GuardConfig,
        storage: SessionStorage,
        transport: Arc<dyn HttpTransport>,
        hooks: GuardHooks,
    ) -> Result<Arc<Self>, GuardError> {
        let (auth, _) = watch::channel(false);
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Arc::new(Self {
            storage,
            transport,
            verify_url: config.endpoint(VERIFY_PATH)?,
            login_route: config.login_route.clone(),
            poll_interval: config.poll_interval,
            dedupe_window: config.dedupe_window,
            hooks,
            installed: AtomicBool::new(false),
            inner: Mutex::new(GuardInner { phase: GuardPhase::Disarmed, in_flight: InFlight::Idle, poll: None }),
            auth,
            events,
        }))
    }

    fn lock(&self) -> MutexGuard<'_, GuardInner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Wire the disabled-account interceptor into `client` and, if a token is
    /// already stored, arm the guard. Only the first call does anything.
    pub fn install(self: &Arc<Self>, client: &GuardedClient) -> bool {
        if self
            .installed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("session guard already installed");
            return false;
        }

        client.add_interceptor(Arc::new(DisabledAccountInterceptor::new(Arc::downgrade(self))));
        if self.storage.has_token() {
            self.arm();
        }
        info!(poll_interval_secs = self.poll_interval.as_secs(), "session guard installed");
        true
    }

    /// Start monitoring a freshly stored session, replacing any running poller.
    pub fn arm(self: &Arc<Self>) {
        let cancel = CancellationToken::new();
        {
            let mut inner = self.lock();
            if let Some(previous) = inner.poll.replace(cancel.clone()) {
                previous.cancel();
            }
            inner.phase = GuardPhase::Armed;
        }
        poller::spawn_poller(Arc::downgrade(self), self.poll_interval, cancel);
        self.auth.send_replace(true);
        let _ = self.events.send(SessionEvent::Armed);
        info!("session guard armed");
    }

    /// Stop monitoring after an explicit logout.
    pub fn disarm(&self) {
        let was_active = {
            let mut inner = self.lock();
            if let Some(poll) = inner.poll.take() {
                poll.cancel();
            }
            std::mem::replace(&mut inner.phase, GuardPhase::Disarmed) != GuardPhase::Disarmed
        };
        self.auth.send_replace(false);
        if was_active {
            let _ = self.events.send(SessionEvent::SignedOut);
            info!("session guard disarmed");
        }
    }

    /// Poller path for a token that disappeared from storage. Ignored when
    /// `cancel` is no longer the live poller's token.
    pub(crate) fn lapse(&self, cancel: &CancellationToken) {
        {
            let inner = self.lock();
            if cancel.is_cancelled() || inner.phase != GuardPhase::Armed {
                return;
            }
        }
        info!("session token gone; stopping account checks");
        self.disarm();
    }

    /// Stop the poller without touching the stored session.
    pub fn teardown(&self) {
        let mut inner = self.lock();
        if let Some(poll) = inner.poll.take() {
            poll.cancel();
        }
        if inner.phase == GuardPhase::Armed {
            inner.phase = GuardPhase::Disarmed;
        }
        debug!("session guard torn down");
    }

    /// Forcibly end the session. Returns `true` only for the call that ran
    /// the termination sequence.
    pub fn terminate(&self, trigger: Trigger) -> bool {
        let now = Instant::now();
        {
            let mut inner = self.lock();
            if inner.in_flight.is_held(now) {
                debug!(%trigger, "termination already in flight; skipping");
                return false;
            }
            if inner.phase != GuardPhase::Armed {
                debug!(%trigger, phase = ?inner.phase, "no armed session to terminate");
                return false;
            }
            inner.phase = GuardPhase::Terminating;
            inner.in_flight = InFlight::Running;
            if let Some(poll) = inner.poll.take() {
                poll.cancel();
            }
        }

        warn!(%trigger, "account disabled; logging out");
        if let Err(e) = self.storage.clear() {
            error!(error = %e, "failed to clear stored session");
        }
        self.auth.send_replace(false);
        let _ = self.events.send(SessionEvent::Terminated { trigger });
        self.hooks.notifier.notify(DISABLED_NOTICE);
        self.hooks.navigator.replace(&self.login_route);

        let mut inner = self.lock();
        inner.in_flight = InFlight::Draining(Instant::now() + self.dedupe_window);
        if inner.phase == GuardPhase::Terminating {
            inner.phase = GuardPhase::Disarmed;
        }
        true
    }

    /// One verification round-trip against `/api/auth/verify`.
    ///
    /// # Errors
    ///
    /// Returns transport errors; callers on background paths log and drop them.
    pub async fn check_once(&self, trigger: Trigger) -> Result<CheckOutcome, GuardError> {
        let Some(token) = self.storage.token() else {
            return Ok(CheckOutcome::NoSession);
        };

        let request = OutboundRequest { method: Method::GET, url: self.verify_url.clone(), bearer: Some(token), body: None };
        let response = self.transport.execute(request).await?;
        let signal = classify(response.status, &response.url, &response.body);
        debug!(%trigger, status = response.status.as_u16(), ?signal, "account check");

        Ok(match signal {
            DisabledSignal::Disabled => CheckOutcome::Disabled { executed: self.terminate(trigger) },
            _ if response.is_success() => CheckOutcome::Active,
            _ => CheckOutcome::Rejected(response.status),
        })
    }

    #[must_use]
    pub fn phase(&self) -> GuardPhase {
        self.lock().phase
    }

    #[must_use]
    pub fn is_polling(&self) -> bool {
        self.lock().poll.is_some()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        *self.auth.borrow()
    }

    #[must_use]
    pub fn watch_auth(&self) -> watch::Receiver<bool> {
        self.auth.subscribe()
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    #[must_use]
    pub fn storage(&self) -> &SessionStorage {
        &self.storage
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
