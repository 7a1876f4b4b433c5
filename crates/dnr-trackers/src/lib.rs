//! Tracker-blocking ruleset generation.
//!
//! Parses the tracker dataset (`tds`) and turns it into declarative rules:
//! one grouped block rule per owning entity, plus rules for each tracker's
//! regex rules, surrogates and exceptions. Alongside the rules a lookup
//! table maps every generated rule ID back to the tracker domains it covers.

pub mod dataset;
pub mod error;
pub mod generator;
pub mod lookup;

pub use dataset::{Entity, Owner, Tracker, TrackerAction, TrackerData, TrackerException, TrackerRule};
pub use error::{Error, Result};
pub use generator::{
    BASELINE_PRIORITY, TRACKER_RULE_PRIORITY_STEP, TrackerBlockingGenerator,
};
pub use lookup::TrackerDomainLookup;
