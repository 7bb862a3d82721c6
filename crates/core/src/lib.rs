//! Folio core data models.
//!
//! This crate defines the interaction statistics record, the evolution
//! history, and the small supporting types shared by the tracker, the
//! evolution engine and the session loop.

#![warn(missing_docs)]

mod capped;
mod clock;
mod history;
mod id;
mod interaction;

pub use capped::CappedLog;
pub use clock::{Clock, ManualClock, SystemClock};
pub use history::{EvolutionHistory, EvolutionHistoryEntry, MAX_HISTORY};
pub use id::{EvolutionId, SessionId};
pub use interaction::{
    ClickCategory, ClickCounts, InteractionData, InteractionEvent, InteractionKind,
    InteractionLog, Section, SectionCounters, Theme, UnknownKey, MAX_INTERACTIONS,
};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
