//! Rule schema definitions
//!
//! These types mirror the JSON shape accepted by the platform's declarative
//! filtering API, so rules can be serialized straight into the installed
//! rule table:
//!
//! ```json
//! {
//!   "id": 2,
//!   "priority": 10000,
//!   "condition": {
//!     "requestDomains": ["tracker.example"],
//!     "excludedInitiatorDomains": ["example.com"]
//!   },
//!   "action": { "type": "block" }
//! }
//! ```

pub mod condition;
pub mod rule;

pub use condition::{DomainType, ResourceType, RuleCondition};
pub use rule::{Redirect, Rule, RuleAction, RuleActionType, RuleId};
