//! The cachework worker.
//!
//! Ties the pieces together: the interception boundary routes requests
//! to a retrieval strategy by resource class, the lifecycle transitions
//! manage store population and eviction, and the control channel handles
//! inbound commands from pages.

pub mod control;
mod lifecycle;
mod strategy;
#[cfg(test)]
mod testutil;
pub mod worker;

pub use worker::{FetchOutcome, FetchRequest, Worker, WorkerEvent, WorkerState};
