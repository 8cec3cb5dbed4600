mod platform;
mod submission;

pub mod types;

pub use platform::Platform;
pub use submission::{NewSubmission, Submission, SubmissionId};
