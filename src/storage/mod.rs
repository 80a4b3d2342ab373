//! Local storage module for the offline workshop queue
//!
//! This module owns the SeaORM connection used for:
//! - Queued submission, assessment and evaluation actions
//! - Per-workshop synchronization times
//! - Cached web-service responses

pub mod db;

pub use db::LocalStorage;
