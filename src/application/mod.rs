//! Application layer: the scheduling queue, the per-account lock registry,
//! and the `TransactionEngine` worker pool that drives a transaction from
//! submission through success or final failure.

pub mod engine;
pub mod locks;
pub mod queue;
