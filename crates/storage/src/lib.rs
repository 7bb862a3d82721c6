//! Storage abstraction and implementations for Folio.
//!
//! Persisted state is a handful of JSON blobs under fixed string keys, the
//! same shape as per-origin browser storage. This crate provides the
//! key/value trait, a directory-backed JSON implementation, an in-memory
//! implementation, and typed load/save helpers that report *why* a value
//! could not be loaded instead of failing.

#![warn(missing_docs)]

pub mod trait_;
pub mod blob;
pub mod json_storage;
pub mod memory;
pub mod context;

pub use trait_::{Storage, StorageError, Result};
pub use blob::{load_json, save_json, LoadOutcome};
pub use json_storage::JsonStorage;
pub use memory::MemoryStorage;
pub use context::{AppContext, SharedStorage, StorageKeys};
