//! Scheduler module
//!
//! Fires the daily collection jobs after each exchange's market close and
//! the evening summary once all three have run.

mod jobs;

pub use jobs::{Job, JobKind, JobScheduler};
