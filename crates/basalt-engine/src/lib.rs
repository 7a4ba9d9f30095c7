//! Basalt engine — check planning and report collection
//!
//! The planning half expands a resolved checktype catalog against the scan
//! targets into the job list submitted to the external check runner; the
//! collection half is the in-memory store those running checks upload their
//! reports to.

pub mod jobs;
pub mod store;

pub use jobs::{generate_checks, generate_jobs, Check, Job};
pub use store::{ReportStore, KIND_LOGS, KIND_REPORTS};
