//! Evolution history - record of applied layout/content changes.

use crate::capped::CappedLog;
use crate::id::{EvolutionId, SessionId};
use crate::interaction::InteractionData;
use crate::Time;
use serde::{Deserialize, Serialize};

/// Maximum number of entries kept in the evolution history.
pub const MAX_HISTORY: usize = 100;

/// Applied evolutions, newest last.
pub type EvolutionHistory = CappedLog<EvolutionHistoryEntry, MAX_HISTORY>;

/// One applied evolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvolutionHistoryEntry {
    /// Unique identifier
    pub id: EvolutionId,

    /// Session the rule fired in
    pub session: SessionId,

    /// Name of the rule that fired
    pub rule: String,

    /// When it was applied
    pub timestamp: Time,

    /// Human-readable description
    pub description: String,

    /// Statistics at application time
    pub snapshot: InteractionData,

    /// Engagement score of `snapshot`
    pub engagement_score: f64,
}

impl EvolutionHistoryEntry {
    /// Create an entry from a snapshot, deriving its engagement score.
    pub fn new(
        session: SessionId,
        rule: impl Into<String>,
        description: impl Into<String>,
        snapshot: InteractionData,
        timestamp: Time,
    ) -> Self {
        let engagement_score = snapshot.engagement_score();
        Self {
            id: EvolutionId::new(),
            session,
            rule: rule.into(),
            timestamp,
            description: description.into(),
            snapshot,
            engagement_score,
        }
    }
}
