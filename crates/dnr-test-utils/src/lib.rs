//! Shared test utilities for the dnr-sync workspace.
//!
//! This crate provides standardised fixtures to eliminate duplication
//! across crate test suites. It is a dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`tds`]: tracker dataset fixtures
//! - [`state`]: [`TestStateDir`] builder for file-backed engine state

pub mod state;
pub mod tds;

pub use state::TestStateDir;
