//! Declarative filtering rule schema for dnr-sync.
//!
//! This crate defines the rule objects understood by the platform's
//! declarative filtering engine, the bulk update request used to replace
//! them, and the contract every ruleset generator implements.
//!
//! - [`schema`]: `Rule`, `RuleCondition`, `RuleAction` and friends
//! - [`update`]: the remove+add request applied to an installed rule table
//! - [`validation`]: structural checks applied before rules are installed
//! - [`generator`]: `RulesetGenerator` and the regex capability probe

pub mod error;
pub mod generator;
pub mod schema;
pub mod update;
pub mod validation;

pub use error::{Error, Result};
pub use generator::{GeneratedRuleset, RegexProbe, RulesetGenerator, StandardRegexProbe};
pub use schema::{
    DomainType, Redirect, ResourceType, Rule, RuleAction, RuleActionType, RuleCondition, RuleId,
};
pub use update::RuleUpdate;
