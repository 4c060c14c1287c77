//! RPC seam between the orchestrator and the org's reset service.

use async_trait::async_trait;

use crate::error::AppError;

/// Remote operations the reset run is built from.
///
/// Implemented by the Apex REST client in production; tests substitute a
/// scripted fake to assert call counts, ordering, and poll timing.
#[async_trait]
pub trait ResetBackend: Send + Sync {
    /// Submits an asynchronous bulk-delete job for one object.
    /// Returns the job identifier to poll with.
    async fn submit_delete(&self, s_object: &str) -> Result<String, AppError>;

    /// Returns true once every job in the set has completed. The service
    /// answers for the whole set; there is no per-job granularity.
    async fn poll_jobs(&self, job_ids: &[String]) -> Result<bool, AppError>;

    /// Restores one object's training records from a static resource.
    async fn submit_upsert(&self, s_object: &str, static_resource: &str) -> Result<(), AppError>;
}
