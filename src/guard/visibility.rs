//! Immediate account check when the host regains the foreground.

use std::sync::Weak;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::{SessionGuard, Trigger};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Run one check per `Visible` event while a token is stored.
///
/// The task ends when the event channel closes, the guard is dropped, or
/// `cancel` fires.
pub fn spawn_visibility_watcher(
    guard: Weak<SessionGuard>,
    mut events: mpsc::Receiver<Visibility>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                () = cancel.cancelled() => break,
                event = events.recv() => event,
            };
            let Some(event) = event else {
                break;
            };
            if event == Visibility::Hidden {
                continue;
            }

            let Some(guard) = guard.upgrade() else {
                break;
            };
            if !guard.storage().has_token() {
                continue;
            }
            match guard.check_once(Trigger::Visibility).await {
                Ok(outcome) => debug!(?outcome, "visibility account check"),
                Err(e) => warn!(error = %e, "visibility account check failed (ignored)"),
            }
        }
        debug!("visibility watcher stopped");
    })
}

#[cfg(test)]
#[path = "visibility_test.rs"]
mod tests;
