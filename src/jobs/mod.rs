pub mod poller;

pub use poller::{await_completion, JobOutcome, JobStatus, JobStatusSource, PollSettings};
