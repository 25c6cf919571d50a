//! Host side effects the guard triggers without knowing the UI.

use tracing::{info, warn};

/// Forces the host onto another route.
pub trait Navigator: Send + Sync {
    /// Navigate to `route`, replacing history so back-navigation cannot
    /// restore the previous view.
    fn replace(&self, route: &str);
}

/// Surfaces a message to the person using the dashboard.
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Terminal stand-in for a browser redirect.
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn replace(&self, route: &str) {
        info!(route, "navigating to login surface");
        eprintln!("-> {route}: sign in again with `stickkery-admin login`");
    }
}

/// Terminal stand-in for a browser alert.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, message: &str) {
        warn!(message, "user notice");
        eprintln!("{message}");
    }
}
