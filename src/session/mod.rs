//! Locally cached admin session: bearer token plus an opaque user snapshot.
//!
//! The pair lives under two keys, `adminToken` and `adminUser`. Only the
//! login flow writes it and only logout or guard termination clears it.

pub mod store;

use std::sync::Arc;

use serde_json::Value;

use crate::error::GuardError;
pub use store::{FileStore, KeyValueStore, MemoryStore};

pub const TOKEN_KEY: &str = "adminToken";
pub const USER_KEY: &str = "adminUser";

const DEFAULT_ADMIN_NAME: &str = "Admin";
const DEFAULT_ADMIN_EMAIL: &str = "admin@stickkery.com";

/// A stored session. The user snapshot is whatever the login response said.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: Value,
}

impl Session {
    #[must_use]
    pub fn profile(&self) -> AdminProfile {
        AdminProfile::from_snapshot(&self.user)
    }
}

/// Display view over the user snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminProfile {
    pub name: String,
    pub email: String,
}

impl AdminProfile {
    #[must_use]
    pub fn from_snapshot(user: &Value) -> Self {
        let field = |key: &str| {
            user.get(key)
                .and_then(Value::as_str)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
        };
        Self {
            name: field("name").unwrap_or_else(|| DEFAULT_ADMIN_NAME.to_string()),
            email: field("email").unwrap_or_else(|| DEFAULT_ADMIN_EMAIL.to_string()),
        }
    }

    /// Avatar initial: first character of the name.
    #[must_use]
    pub fn initial(&self) -> char {
        self.name.chars().next().unwrap_or('A')
    }
}

/// Typed access to the two session keys over any [`KeyValueStore`].
#[derive(Clone)]
pub struct SessionStorage {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// The stored token, ignoring blank values.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.store.get_item(TOKEN_KEY).filter(|t| !t.trim().is_empty())
    }

    #[must_use]
    pub fn has_token(&self) -> bool {
        self.token().is_some()
    }

    /// The stored session. A missing or unparsable user snapshot reads as `{}`.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        let token = self.token()?;
        let user = self
            .store
            .get_item(USER_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
        Some(Session { token, user })
    }

    /// # Errors
    ///
    /// Returns an error if either key cannot be written.
    pub fn save(&self, session: &Session) -> Result<(), GuardError> {
        self.store.set_item(TOKEN_KEY, &session.token)?;
        self.store.set_item(USER_KEY, &serde_json::to_string(&session.user)?)?;
        Ok(())
    }

    /// Remove both keys. Both removals are attempted even if the first fails.
    ///
    /// # Errors
    ///
    /// Returns the first removal error.
    pub fn clear(&self) -> Result<(), GuardError> {
        let token = self.store.remove_item(TOKEN_KEY);
        let user = self.store.remove_item(USER_KEY);
        token.and(user)
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
