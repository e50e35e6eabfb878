pub mod job_ctx;
pub mod job_poller;
pub mod submission_driver;

pub use job_ctx::JobCtx;
pub use job_poller::{JobHandle, JobPoller, JobState};
pub use submission_driver::{SubmissionDriver, SubmissionReport};
