//! Login and logout: the only paths that write the stored session besides
//! guard termination.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::classify::{ErrorText, error_text};
use crate::error::GuardError;
use crate::guard::SessionGuard;
use crate::net::{ApiRequest, GuardedClient};
use crate::session::{AdminProfile, Session};

pub const LOGIN_PATH: &str = "/api/auth/login";

pub const LOGIN_DISABLED_MESSAGE: &str = "Your account has been disabled. Please contact support for assistance.";
const DEFAULT_LOGIN_ERROR: &str = "Invalid credentials";

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
    #[serde(default)]
    user: Option<Value>,
}

pub struct AuthClient {
    client: GuardedClient,
    guard: Arc<SessionGuard>,
}

impl AuthClient {
    pub fn new(client: GuardedClient, guard: Arc<SessionGuard>) -> Self {
        Self { client, guard }
    }

    /// `POST /api/auth/login`, store the session and arm the guard.
    ///
    /// # Errors
    ///
    /// - [`GuardError::AccountDisabled`] when the backend refuses a disabled account
    /// - [`GuardError::LoginRejected`] for any other refusal
    /// - transport, JSON and storage errors
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, GuardError> {
        let request = ApiRequest::post(LOGIN_PATH, json!({ "email": email, "password": password })).anonymous();
        let response = self.client.send(request).await?;

        if !response.is_success() {
            let message = match error_text(&response.body) {
                ErrorText::Present(message) => message,
                ErrorText::NotJson | ErrorText::Absent => DEFAULT_LOGIN_ERROR.to_string(),
            };
            warn!(status = response.status.as_u16(), %message, "login rejected");
            return Err(login_error(&message));
        }

        let body: Value = response.json()?;
        let parsed: LoginResponse = serde_json::from_value(body.clone())?;
        // Backends that omit `user` get the whole body as the snapshot.
        let session = Session { token: parsed.token, user: parsed.user.unwrap_or(body) };

        self.client.storage().save(&session)?;
        self.guard.arm();
        info!(admin = %session.profile().name, "login successful");
        Ok(session)
    }

    /// Clear the stored session and stop monitoring.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored session cannot be removed.
    pub fn logout(&self) -> Result<(), GuardError> {
        let cleared = self.client.storage().clear();
        self.guard.disarm();
        cleared?;
        info!("logged out");
        Ok(())
    }

    #[must_use]
    pub fn current_profile(&self) -> Option<AdminProfile> {
        self.client.storage().session().map(|s| s.profile())
    }
}

fn login_error(message: &str) -> GuardError {
    let lower = message.to_lowercase();
    if lower.contains("disabled") || lower.contains("account") {
        GuardError::AccountDisabled(LOGIN_DISABLED_MESSAGE.to_string())
    } else {
        GuardError::LoginRejected(message.to_string())
    }
}

#[cfg(test)]
#[path = "auth_test.rs"]
mod tests;
