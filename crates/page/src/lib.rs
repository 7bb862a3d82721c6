//! Page surface for Folio.
//!
//! The evolution rules and the event wiring never touch a concrete DOM.
//! They go through the [`Page`] trait, which reports missing targets as
//! [`Lookup::Absent`] rather than failing. [`Document`] is the in-memory
//! implementation used by the session, the CLI and the tests.

#![warn(missing_docs)]

mod element;
mod page;
mod document;
mod fixture;
mod form;

pub use element::Element;
pub use page::{Lookup, Page, NOTICE_ID, NOTICE_VISIBLE_CLASS};
pub use document::Document;
pub use form::{ContactForm, FormError};
