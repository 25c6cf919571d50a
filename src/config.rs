//! Guard configuration parsed from environment variables.
//!
//! Every backend call goes through one configurable base URL. Paths such as
//! `/api/auth/verify` are resolved against it, never hard-coded to a host.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Url;

use crate::error::GuardError;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3001";
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
pub const DEFAULT_DEDUPE_WINDOW_MS: u64 = 2000;
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

const SESSION_DIR: &str = ".stickkery";
const SESSION_FILE: &str = "session.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub request: Duration,
    pub connect: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    /// Backend origin every API path is resolved against.
    pub base_url: Url,
    /// Period of the background verification poll.
    pub poll_interval: Duration,
    /// How long the in-flight termination flag absorbs duplicate triggers.
    pub dedupe_window: Duration,
    /// Route the guard navigates to after a forced logout.
    pub login_route: String,
    /// File backing the durable session store.
    pub session_file: PathBuf,
    pub timeouts: HttpTimeouts,
}

impl GuardConfig {
    /// Build typed guard config from environment variables.
    ///
    /// Optional:
    /// - `STICKKERY_API_BASE_URL`: default `http://localhost:3001`
    /// - `STICKKERY_POLL_INTERVAL_SECS`: default 10
    /// - `STICKKERY_DEDUPE_WINDOW_MS`: default 2000
    /// - `STICKKERY_LOGIN_ROUTE`: default `/login`
    /// - `STICKKERY_SESSION_FILE`: default `~/.stickkery/session.json`
    /// - `STICKKERY_REQUEST_TIMEOUT_SECS`: default 30
    /// - `STICKKERY_CONNECT_TIMEOUT_SECS`: default 10
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an absolute http(s) URL.
    pub fn from_env() -> Result<Self, GuardError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is not an absolute http(s) URL.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GuardError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = parse_base_url(lookup("STICKKERY_API_BASE_URL").as_deref().unwrap_or(DEFAULT_API_BASE_URL))?;
        let poll_secs = parse_positive(lookup("STICKKERY_POLL_INTERVAL_SECS").as_deref(), DEFAULT_POLL_INTERVAL_SECS);
        let dedupe_ms = parse_positive(lookup("STICKKERY_DEDUPE_WINDOW_MS").as_deref(), DEFAULT_DEDUPE_WINDOW_MS);
        let login_route = lookup("STICKKERY_LOGIN_ROUTE")
            .filter(|route| !route.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOGIN_ROUTE.to_string());
        let session_file = lookup("STICKKERY_SESSION_FILE")
            .filter(|path| !path.trim().is_empty())
            .map_or_else(default_session_file, PathBuf::from);
        let timeouts = HttpTimeouts {
            request: Duration::from_secs(parse_positive(
                lookup("STICKKERY_REQUEST_TIMEOUT_SECS").as_deref(),
                DEFAULT_REQUEST_TIMEOUT_SECS,
            )),
            connect: Duration::from_secs(parse_positive(
                lookup("STICKKERY_CONNECT_TIMEOUT_SECS").as_deref(),
                DEFAULT_CONNECT_TIMEOUT_SECS,
            )),
        };

        Ok(Self {
            base_url,
            poll_interval: Duration::from_secs(poll_secs),
            dedupe_window: Duration::from_millis(dedupe_ms),
            login_route,
            session_file,
            timeouts,
        })
    }

    /// Override the base URL (used by the `--base-url` CLI flag).
    ///
    /// # Errors
    ///
    /// Returns an error if `raw` is not an absolute http(s) URL.
    pub fn with_base_url(mut self, raw: &str) -> Result<Self, GuardError> {
        self.base_url = parse_base_url(raw)?;
        Ok(self)
    }

    /// Resolve an API path such as `/api/auth/verify` against the base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the joined URL is malformed.
    pub fn endpoint(&self, path: &str) -> Result<Url, GuardError> {
        resolve_endpoint(&self.base_url, path)
    }
}

pub(crate) fn resolve_endpoint(base_url: &Url, path: &str) -> Result<Url, GuardError> {
    base_url
        .join(path)
        .map_err(|e| GuardError::InvalidBaseUrl(format!("{path}: {e}")))
}

pub(crate) fn parse_base_url(raw: &str) -> Result<Url, GuardError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed).map_err(|e| GuardError::InvalidBaseUrl(format!("{trimmed}: {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(GuardError::InvalidBaseUrl(format!("unsupported scheme '{other}' in {trimmed}"))),
    }
}

fn parse_positive(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn default_session_file() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(SESSION_DIR)
        .join(SESSION_FILE)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
