//! Fixed-interval account check.
//!
//! The first check fires one period after arming. Missed ticks are skipped,
//! not bunched. Network failures are logged and the next tick proceeds
//! normally; only a classified disable signal ends the session.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{SessionGuard, Trigger};

/// Spawn the poller. It exits on cancellation (termination, logout or
/// re-arm), when the guard is dropped, or when the stored token disappears.
pub fn spawn_poller(guard: Weak<SessionGuard>, period: Duration, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let Some(guard) = guard.upgrade() else {
                break;
            };
            if !guard.storage().has_token() {
                guard.lapse(&cancel);
                break;
            }

            match guard.check_once(Trigger::Poll).await {
                Ok(outcome) => debug!(?outcome, "periodic account check"),
                Err(e) => warn!(error = %e, "periodic account check failed (ignored)"),
            }
            // A disable absorbed by the dedupe window leaves this poller live.
            if cancel.is_cancelled() {
                break;
            }
        }
        debug!("account poller stopped");
    })
}
