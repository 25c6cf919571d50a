//! Error type shared by the guard, the HTTP client and the login flow.
//!
//! ERROR HANDLING
//! ==============
//! Only the edges (config, login, explicit API calls) surface errors to the
//! caller. The guard's own triggers log and swallow failures so a flaky
//! network never ends a session by itself.

/// Errors produced by session guard operations.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// The configured API base URL is unusable.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// The HTTP request could not be sent or its body could not be read.
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A non-reqwest transport could not complete the exchange.
    #[error("transport failed: {0}")]
    Transport(String),

    /// The session store could not be read or written.
    #[error("session storage failed: {0}")]
    Storage(#[from] std::io::Error),

    /// A JSON payload could not be encoded or decoded.
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The backend refused the credentials.
    #[error("login rejected: {0}")]
    LoginRejected(String),

    /// The backend refused the login because the account is disabled.
    #[error("{0}")]
    AccountDisabled(String),

    /// The operation needs a stored session token and there is none.
    #[error("no active session; run `login` first")]
    MissingSession,
}
