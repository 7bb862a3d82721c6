//! Timer queue for a session.

use folio_core::Time;
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// What a timer does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Periodic rule evaluation
    Evaluate,
    /// Periodic statistics flush
    Flush,
    /// Evaluation scheduled by a click
    ClickCheck,
    /// Hide the notice, if it is still the one shown at `generation`
    HideNotice {
        /// Notice generation this timer belongs to
        generation: u64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Timer {
    due: Time,
    seq: u64,
    kind: TimerKind,
}

impl Ord for Timer {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

impl PartialOrd for Timer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Pending timers, earliest deadline first. Timers with equal deadlines
/// fire in the order they were scheduled.
#[derive(Debug, Default)]
pub struct Timers {
    heap: BinaryHeap<Reverse<Timer>>,
    next_seq: u64,
}

impl Timers {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `kind` to fire at `due`.
    pub fn schedule(&mut self, due: Time, kind: TimerKind) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Timer { due, seq, kind }));
    }

    /// Deadline of the earliest pending timer.
    pub fn next_deadline(&self) -> Option<Time> {
        self.heap.peek().map(|Reverse(t)| t.due)
    }

    /// Remove and return the earliest timer if it is due at `now`.
    pub fn pop_due(&mut self, now: Time) -> Option<(Time, TimerKind)> {
        match self.heap.peek() {
            Some(Reverse(t)) if t.due <= now => {}
            _ => return None,
        }
        self.heap.pop().map(|Reverse(t)| (t.due, t.kind))
    }

    /// Number of pending timers matching `pred`.
    pub fn count(&self, pred: impl Fn(TimerKind) -> bool) -> usize {
        self.heap.iter().filter(|Reverse(t)| pred(t.kind)).count()
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether no timers are pending.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Drop every pending timer.
    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_fires_in_deadline_then_schedule_order() {
        let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut timers = Timers::new();
        timers.schedule(t0 + Duration::seconds(10), TimerKind::Evaluate);
        timers.schedule(t0 + Duration::seconds(1), TimerKind::ClickCheck);
        timers.schedule(t0 + Duration::seconds(1), TimerKind::HideNotice { generation: 1 });
        timers.schedule(t0 + Duration::seconds(30), TimerKind::Flush);

        assert_eq!(timers.next_deadline(), Some(t0 + Duration::seconds(1)));
        let now = t0 + Duration::seconds(10);
        let fired: Vec<_> = std::iter::from_fn(|| timers.pop_due(now)).map(|(_, k)| k).collect();
        assert_eq!(
            fired,
            vec![
                TimerKind::ClickCheck,
                TimerKind::HideNotice { generation: 1 },
                TimerKind::Evaluate
            ]
        );
        assert_eq!(timers.len(), 1);
        assert!(timers.pop_due(now).is_none());
    }

    #[test]
    fn test_count_and_clear() {
        let t0 = Utc::now();
        let mut timers = Timers::new();
        timers.schedule(t0, TimerKind::ClickCheck);
        timers.schedule(t0, TimerKind::ClickCheck);
        timers.schedule(t0, TimerKind::Flush);
        assert_eq!(timers.count(|k| k == TimerKind::ClickCheck), 2);
        timers.clear();
        assert!(timers.is_empty());
        assert_eq!(timers.next_deadline(), None);
    }
}
