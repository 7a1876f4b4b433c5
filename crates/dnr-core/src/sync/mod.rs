//! SyncEngine for keeping installed rules in step with configuration data
//!
//! This module provides:
//! - **engine**: convergence on update notifications
//! - **check**: compare version records with installed sentinels

mod check;
mod engine;

pub use check::{CheckReport, CheckStatus, DriftItem, PartitionState};
pub use engine::{SyncEngine, SyncOptions, SyncOutcome};
