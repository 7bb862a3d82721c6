//! Interaction tracking.
//!
//! Click counts, section views and dwell time, scroll depth, theme
//! preference and visits, accumulated in one persisted record.

#![warn(missing_docs)]

pub mod tracker;

pub use tracker::InteractionTracker;
