//! Evolution layer - rule-driven page adaptation.
//!
//! A fixed, ordered table of rules is evaluated against the interaction
//! statistics. A rule whose predicate holds and which is eligible mutates
//! the page, is recorded in the persisted history, and surfaces a notice.

#![warn(missing_docs, unused_crate_dependencies)]

mod rule;
mod rules;
mod engine;
mod metrics;

pub use rule::{Action, ActionReport, EvolutionRule, Predicate, RefirePolicy, RuleError, RuleSet};
pub use rules::{
    CONTENT_REVEAL, CTA_OPTIMIZATION, DARK_THEME_DEFAULT, PROJECTS_PRIORITY, PROJECT_HIGHLIGHT,
};
pub use engine::{AppliedEvolution, EvolutionEngine};
pub use metrics::{EvolutionStats, RuleStats};
