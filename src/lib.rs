//! issuectl - a terminal client for a tracker's issue API.
//!
//! The crate is organized around a few single-owner pieces of state:
//! [`query::QueryState`] holds the list parameters and their reset rules,
//! [`session::Session`] owns the list result and rosters and decides what
//! request each change triggers, and [`form::FormController`] owns the
//! create/edit draft and its submission rules. The [`api`] module is the
//! HTTP boundary, behind a trait so everything above it tests without a
//! network.

pub mod api;
pub mod config;
pub mod error;
pub mod form;
pub mod logging;
pub mod pagination;
pub mod query;
pub mod session;
pub mod tasks;

pub use error::{AppError, Result};
