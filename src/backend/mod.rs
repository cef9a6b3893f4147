//! Access to the Wavefront query backend.

use async_trait::async_trait;

use crate::{
    models::{TranslatedQuery, UpstreamResponse},
    Result,
};

pub mod mock;
pub mod wavefront;

pub use mock::MockExecutor;
pub use wavefront::WavefrontClient;

/// Runs a translated query against the backend.
///
/// A query-level failure reported by the backend comes back as `Ok` with the
/// error fields of [`UpstreamResponse`] set; `Err` is reserved for transport
/// failures.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &TranslatedQuery) -> Result<UpstreamResponse>;
}
