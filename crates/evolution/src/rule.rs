//! Rule descriptors.

use chrono::Duration;
use folio_core::InteractionData;
use folio_page::{Lookup, Page};
use serde::{Deserialize, Serialize};

/// Pure test over the statistics.
pub type Predicate = fn(&InteractionData) -> bool;

/// One-shot page mutation.
pub type Action = fn(&mut dyn Page) -> ActionReport;

/// What an action did to the page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionReport {
    /// Number of targets mutated
    pub changed: usize,
    /// Targets that were not on the page
    pub missing: Vec<String>,
}

impl ActionReport {
    /// Fold a single-target lookup into the report.
    pub fn record<T>(&mut self, lookup: Lookup<T>) {
        match lookup {
            Lookup::Found(_) => self.changed += 1,
            Lookup::Absent(what) => self.missing.push(what),
        }
    }

    /// Fold a multi-target count into the report.
    pub fn record_count(&mut self, count: usize, selector: &str) {
        if count == 0 {
            self.missing.push(selector.to_string());
        }
        self.changed += count;
    }

    /// Whether every target was present.
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// When an applied rule may fire again within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefirePolicy {
    /// Never: once applied, a rule stays active for the rest of the session
    #[default]
    Once,
    /// Again, once its cooldown has elapsed since the last application
    AfterCooldown,
}

/// A named (predicate, action, cooldown) triple.
#[derive(Clone)]
pub struct EvolutionRule {
    /// Unique rule name
    pub name: &'static str,
    /// Text shown to the visitor and stored in the history
    pub description: &'static str,
    /// When the rule applies
    pub predicate: Predicate,
    /// What it does to the page
    pub action: Action,
    /// Minimum time between applications
    pub cooldown: Duration,
}

impl std::fmt::Debug for EvolutionRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvolutionRule")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("cooldown_ms", &self.cooldown.num_milliseconds())
            .finish_non_exhaustive()
    }
}

/// Errors building a rule set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuleError {
    /// Two rules share a name
    #[error("duplicate rule name: {0}")]
    Duplicate(String),

    /// An override names a rule that does not exist
    #[error("unknown rule: {0}")]
    Unknown(String),
}

/// Ordered, fixed collection of rules with unique names.
#[derive(Debug, Clone)]
pub struct RuleSet {
    pub(crate) rules: Vec<EvolutionRule>,
}

impl RuleSet {
    /// Build a rule set, rejecting duplicate names.
    pub fn new(rules: Vec<EvolutionRule>) -> Result<Self, RuleError> {
        for (i, rule) in rules.iter().enumerate() {
            if rules[..i].iter().any(|r| r.name == rule.name) {
                return Err(RuleError::Duplicate(rule.name.to_string()));
            }
        }
        Ok(Self { rules })
    }

    /// Override the cooldown of the rule called `name`.
    pub fn with_cooldown(mut self, name: &str, cooldown: Duration) -> Result<Self, RuleError> {
        let rule = self
            .rules
            .iter_mut()
            .find(|r| r.name == name)
            .ok_or_else(|| RuleError::Unknown(name.to_string()))?;
        rule.cooldown = cooldown;
        Ok(self)
    }

    /// Look up a rule by name.
    pub fn get(&self, name: &str) -> Option<&EvolutionRule> {
        self.rules.iter().find(|r| r.name == name)
    }

    /// Rules in evaluation order.
    pub fn iter(&self) -> impl Iterator<Item = &EvolutionRule> {
        self.rules.iter()
    }

    /// Rule names in evaluation order.
    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
