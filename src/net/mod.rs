//! HTTP plumbing: transport seam, guarded client, response interceptors.
//!
//! ARCHITECTURE
//! ============
//! All application traffic goes through [`GuardedClient`]. The client runs
//! each buffered response past an ordered list of [`ResponseInterceptor`]s
//! before handing it back, so observers such as the disabled-account check
//! never need to patch a global HTTP primitive.

pub mod client;
pub mod transport;
pub mod types;

pub use client::GuardedClient;
pub use transport::{HttpTransport, ReqwestTransport};
pub use types::{ApiRequest, ApiResponse, OutboundRequest};

/// Observes responses on their way back to the caller.
///
/// Implementations must not panic or block; they only see an immutable
/// response and cannot change what the caller receives.
pub trait ResponseInterceptor: Send + Sync {
    fn inspect(&self, response: &ApiResponse);
}
