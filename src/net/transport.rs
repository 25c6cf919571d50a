//! HTTP transport seam. Production uses `reqwest`; tests script responses.

use async_trait::async_trait;

use super::types::{ApiResponse, OutboundRequest};
use crate::config::HttpTimeouts;
use crate::error::GuardError;

/// Executes a resolved request and buffers the whole response body.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: OutboundRequest) -> Result<ApiResponse, GuardError>;
}

pub struct ReqwestTransport {
    http: reqwest::Client,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client fails to build.
    pub fn new(timeouts: HttpTimeouts) -> Result<Self, GuardError> {
        let http = reqwest::Client::builder()
            .timeout(timeouts.request)
            .connect_timeout(timeouts.connect)
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: OutboundRequest) -> Result<ApiResponse, GuardError> {
        let mut builder = self.http.request(request.method, request.url.clone());
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();

        Ok(ApiResponse { status, url: request.url, body })
    }
}
