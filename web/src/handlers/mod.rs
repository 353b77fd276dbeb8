//! HTTP request handlers.
//!
//! This module contains all HTTP handlers organized by resource.

pub mod check_in;
pub mod events;
pub mod health;
pub mod me;

pub use health::{health_check, readiness_check};
