//! Attendance and leave accounting.
//!
//! Everything here is synchronous and side-effect free: callers pass in the
//! clock events and leave requests they loaded and get computed snapshots
//! back. Nothing is cached between calls.

pub mod calendar;
pub mod error;
pub mod ledger;
pub mod report;
pub mod sessions;
pub mod workflow;
