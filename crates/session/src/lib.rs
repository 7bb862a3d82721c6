//! Session layer - event wiring, timers, and the run loop.
//!
//! A [`Session`] is one page load: it owns the tracker, the evolution
//! engine and the page, maps UI events onto tracker calls, and keeps an
//! explicit timer queue for periodic evaluation, periodic flushing,
//! post-click checks and notice expiry. [`run`] drives it from a channel
//! in real time; [`replay`] drives it deterministically from a script.

#![warn(missing_docs)]

pub mod config;
pub mod event;
pub mod timers;
pub mod session;
pub mod driver;
pub mod replay;

pub use config::{ConfigError, SessionConfig, MAX_DURATION_MS};
pub use event::UiEvent;
pub use timers::{TimerKind, Timers};
pub use session::{Session, SessionError};
pub use driver::run;
pub use replay::{replay, ReplayReport, ReplayedEvolution, Script, ScriptStep};
