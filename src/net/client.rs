//! Guarded API client.

use std::sync::{Arc, RwLock};

use reqwest::Url;
use tracing::debug;

use super::ResponseInterceptor;
use super::transport::HttpTransport;
use super::types::{ApiRequest, ApiResponse, OutboundRequest};
use crate::config::resolve_endpoint;
use crate::error::GuardError;
use crate::session::SessionStorage;

/// Client wrapper every outbound call is required to use.
///
/// Cheap to clone; clones share the transport and the interceptor list.
#[derive(Clone)]
pub struct GuardedClient {
    base_url: Url,
    transport: Arc<dyn HttpTransport>,
    storage: SessionStorage,
    interceptors: Arc<RwLock<Vec<Arc<dyn ResponseInterceptor>>>>,
}

impl GuardedClient {
    pub fn new(base_url: Url, transport: Arc<dyn HttpTransport>, storage: SessionStorage) -> Self {
        Self { base_url, transport, storage, interceptors: Arc::new(RwLock::new(Vec::new())) }
    }

    /// Append an interceptor; it sees every response sent after this call.
    pub fn add_interceptor(&self, interceptor: Arc<dyn ResponseInterceptor>) {
        self.interceptors
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(interceptor);
    }

    #[must_use]
    pub fn interceptor_count(&self) -> usize {
        self.interceptors
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn storage(&self) -> &SessionStorage {
        &self.storage
    }

    /// Send a request and return the response exactly as received.
    ///
    /// Non-2xx statuses are not errors here; callers decide what they mean.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be resolved or the transport fails.
    pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse, GuardError> {
        let url = resolve_endpoint(&self.base_url, &request.path)?;
        let bearer = if request.authorized { self.storage.token() } else { None };
        let outbound = OutboundRequest { method: request.method, url, bearer, body: request.body };

        let response = self.transport.execute(outbound).await?;
        debug!(status = response.status.as_u16(), url = %response.url, "api response");

        let interceptors = self
            .interceptors
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();
        for interceptor in &interceptors {
            interceptor.inspect(&response);
        }

        Ok(response)
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
