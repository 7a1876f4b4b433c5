//! Command implementations for dnr-cli

pub mod check;
pub mod converge;
pub mod rules;
pub mod status;

pub use check::run_check;
pub use converge::run_converge;
pub use rules::run_rules;
pub use status::run_status;
