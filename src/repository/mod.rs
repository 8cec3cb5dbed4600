mod conversion;
mod submission_repository;

use async_trait::async_trait;

use crate::models::{NewSubmission, Submission, SubmissionId};

pub use submission_repository::SubmissionRepository;

/// Durable storage for submissions.
///
/// Implementations must enforce URL uniqueness themselves: `insert` returns
/// `Ok(None)` when a submission with the same URL already exists.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    async fn insert(&self, submission: &NewSubmission) -> anyhow::Result<Option<Submission>>;

    async fn find_by_url(&self, url: &str) -> anyhow::Result<Option<Submission>>;

    /// Oldest first.
    async fn list_all(&self) -> anyhow::Result<Vec<Submission>>;

    /// Deleting an unknown id is not an error.
    async fn delete_by_id(&self, id: SubmissionId) -> anyhow::Result<()>;

    async fn delete_all_and_compact(&self) -> anyhow::Result<()>;
}
