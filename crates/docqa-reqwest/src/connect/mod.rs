//! Reqwest client module.
//!
//! This module provides the HTTP client bound to the backend origin and its
//! configuration. It wraps the `reqwest` crate.

mod client;
mod config;

pub use client::{ReqwestClient, TRACING_TARGET};
pub use config::{DEFAULT_TIMEOUT_SECS, EndpointTarget, ReqwestConfig};
