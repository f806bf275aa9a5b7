//! Authentication module for the demo API's credential endpoints.
//!
//! This module provides:
//! - `AuthService`: login and registration calls, plus direct access to the
//!   stored session for logout and "is anyone signed in" checks
//! - `LoginResponse` / `RegisterResponse`: payloads returned on success
//!
//! The service keeps no state of its own. `SessionManager` builds on it.

pub mod service;

pub use service::{AuthService, LoginResponse, RegisterResponse};
