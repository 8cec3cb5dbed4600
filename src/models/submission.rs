use serde::Serialize;

use super::{types::UtcDateTime, Platform};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SubmissionId(pub i64);

/// A stored video link. Never mutated after it is created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub id: SubmissionId,
    pub url: String,
    pub platform: Platform,
    pub submitter: String,
    pub created_at: UtcDateTime,
}

#[derive(Clone, Debug)]
pub struct NewSubmission {
    pub url: String,
    pub platform: Platform,
    pub submitter: String,
    pub created_at: UtcDateTime,
}
