//! Network client for cachework.
//!
//! This crate provides the HTTP fetch pipeline used by the retrieval
//! strategies: a reqwest client with a hard per-request timeout, plus the
//! [`Fetcher`] trait seam the worker tests mock out.

pub mod fetch;

pub use fetch::{FetchClient, FetchConfig, FetchResponse, Fetcher};
