//! REST API client module for the demo service.
//!
//! This module provides the `ApiClient` for JSON requests against a fixed
//! base URL, and the `ApiError` taxonomy every failed call is mapped to.
//!
//! Authenticated calls carry the bearer token of the stored session;
//! a 401 from any endpoint clears that session.

pub mod client;
pub mod error;

pub use client::ApiClient;
pub use error::ApiError;
