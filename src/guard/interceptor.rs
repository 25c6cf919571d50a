//! Response interceptor that ends the session on a disabled-account reply.

use std::sync::Weak;

use tracing::debug;

use super::{SessionGuard, Trigger};
use crate::classify::{DisabledSignal, classify, has_disabling_error_field};
use crate::net::{ApiResponse, ResponseInterceptor};

/// Inspects every non-2xx response, and any 2xx whose JSON `error` field
/// carries a disabling message, for a disabled-account signal.
pub struct DisabledAccountInterceptor {
    guard: Weak<SessionGuard>,
}

impl DisabledAccountInterceptor {
    #[must_use]
    pub fn new(guard: Weak<SessionGuard>) -> Self {
        Self { guard }
    }
}

impl ResponseInterceptor for DisabledAccountInterceptor {
    fn inspect(&self, response: &ApiResponse) {
        if response.is_success() && !has_disabling_error_field(&response.body) {
            return;
        }

        let signal = classify(response.status, &response.url, &response.body);
        if signal != DisabledSignal::Disabled {
            return;
        }

        debug!(status = response.status.as_u16(), url = %response.url, "disabled account detected in API response");
        if let Some(guard) = self.guard.upgrade() {
            guard.terminate(Trigger::Interceptor);
        }
    }
}

#[cfg(test)]
#[path = "interceptor_test.rs"]
mod tests;
