//! Tracker API client and types.
//!
//! This module provides the interface for communicating with the issue
//! tracker's HTTP API.

mod client;
mod error;
pub mod types;

pub use client::{IssueApi, TrackerClient};
pub use error::{ApiError, Result};
