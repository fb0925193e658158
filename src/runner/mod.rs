//! The runner streams user actions from a CSV file, feeds them through a
//! [`Storyteller`](crate::Storyteller) and writes the resulting ledger to a
//! writer.

mod async_runner;

pub use async_runner::{run, RunSummary};
