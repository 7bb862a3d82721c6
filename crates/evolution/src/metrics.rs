//! Summary statistics over the evolution history.

use folio_core::{EvolutionHistory, Time};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Applications of one rule.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleStats {
    /// Number of recorded applications
    pub applications: usize,
    /// Most recent application
    pub last_applied: Option<Time>,
}

/// Overview of the recorded history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvolutionStats {
    /// Recorded applications
    pub total: usize,
    /// Distinct sessions that applied at least one rule
    pub sessions: usize,
    /// Per-rule breakdown
    pub by_rule: BTreeMap<String, RuleStats>,
    /// Mean engagement score across entries (0 when empty)
    pub mean_engagement: f64,
    /// Engagement score of the newest entry
    pub latest_engagement: Option<f64>,
}

impl EvolutionStats {
    /// Summarize a history.
    pub fn from_history(history: &EvolutionHistory) -> Self {
        let mut by_rule: BTreeMap<String, RuleStats> = BTreeMap::new();
        let mut sessions = BTreeSet::new();
        let mut score_sum = 0.0;

        for entry in history.iter() {
            let stats = by_rule.entry(entry.rule.clone()).or_default();
            stats.applications += 1;
            stats.last_applied = Some(match stats.last_applied {
                Some(prev) if prev > entry.timestamp => prev,
                _ => entry.timestamp,
            });
            sessions.insert(entry.session.to_string());
            score_sum += entry.engagement_score;
        }

        let total = history.len();
        Self {
            total,
            sessions: sessions.len(),
            by_rule,
            mean_engagement: if total > 0 { score_sum / total as f64 } else { 0.0 },
            latest_engagement: history.last().map(|e| e.engagement_score),
        }
    }
}
