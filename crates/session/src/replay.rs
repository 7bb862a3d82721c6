//! Deterministic replay of a timed event script.
//!
//! The session's clock must be the [`ManualClock`] handed to [`replay`];
//! the clock is stepped to every timer deadline and event time in order,
//! so a replay always produces the same result.

use crate::{Session, UiEvent};
use chrono::Duration;
use folio_core::{Clock, ManualClock, Time};
use folio_evolution::AppliedEvolution;
use folio_page::Page;
use folio_storage::Storage;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// One event at an offset from the start of the replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptStep {
    /// Milliseconds after the start
    pub at_ms: u64,
    /// The event
    pub event: UiEvent,
}

/// A timed event script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Script {
    /// Steps, applied in `at_ms` order (ties keep file order)
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
    /// Extra time to let timers run after the last step
    #[serde(default)]
    pub settle_ms: u64,
}

impl Script {
    /// Parse a script from JSON.
    pub fn parse(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Offset of the last step, or zero.
    pub fn duration_ms(&self) -> u64 {
        self.steps.iter().map(|s| s.at_ms).max().unwrap_or(0)
    }
}

/// An evolution applied during a replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayedEvolution {
    /// Milliseconds after the start
    pub at_ms: i64,
    /// Rule name
    pub rule: String,
    /// Notice text
    pub description: String,
    /// Engagement score at application time
    pub engagement_score: f64,
}

/// What happened during a replay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplayReport {
    /// Events the session accepted
    pub handled: usize,
    /// Events rejected because the session had shut down or their offset
    /// was out of range
    pub rejected: usize,
    /// Evolutions in application order
    pub evolutions: Vec<ReplayedEvolution>,
    /// Engagement score at the end
    pub engagement_score: f64,
    /// Whether the script unloaded the session
    pub closed: bool,
}

/// Play `script` against `session`, whose context must use `clock`.
pub async fn replay<S: Storage, P: Page>(
    session: &mut Session<S, P>,
    clock: &ManualClock,
    script: &Script,
) -> ReplayReport {
    let start = clock.now();
    let mut report = ReplayReport::default();

    let mut steps: Vec<&ScriptStep> = script.steps.iter().collect();
    steps.sort_by_key(|s| s.at_ms);

    let mut last = start;
    for step in steps {
        let Some(at) = start.checked_add_signed(millis(step.at_ms)) else {
            warn!(at_ms = step.at_ms, "step offset out of range, skipped");
            report.rejected += 1;
            continue;
        };
        last = at;
        run_timers_until(session, clock, at, start, &mut report).await;
        clock.set(at);
        debug!(at_ms = step.at_ms, event = ?step.event, "replaying event");
        match session.handle(step.event.clone()).await {
            Ok(()) => report.handled += 1,
            Err(e) => {
                warn!(at_ms = step.at_ms, error = %e, "event rejected");
                report.rejected += 1;
            }
        }
    }

    let end = last.checked_add_signed(millis(script.settle_ms)).unwrap_or(last);
    run_timers_until(session, clock, end, start, &mut report).await;
    if clock.now() < end {
        clock.set(end);
    }

    report.engagement_score = session.tracker().engagement_score();
    report.closed = session.is_closed();
    report
}

async fn run_timers_until<S: Storage, P: Page>(
    session: &mut Session<S, P>,
    clock: &ManualClock,
    until: Time,
    start: Time,
    report: &mut ReplayReport,
) {
    while let Some(deadline) = session.next_deadline().filter(|d| *d <= until) {
        clock.set(deadline);
        let applied = session.advance_to(deadline).await;
        record(report, &applied, deadline - start);
    }
}

fn record(report: &mut ReplayReport, applied: &[AppliedEvolution], offset: Duration) {
    report.evolutions.extend(applied.iter().map(|a| ReplayedEvolution {
        at_ms: offset.num_milliseconds(),
        rule: a.rule.to_string(),
        description: a.description.to_string(),
        engagement_score: a.engagement_score,
    }));
}

fn millis(ms: u64) -> Duration {
    Duration::milliseconds(i64::try_from(ms).unwrap_or(i64::MAX))
}
