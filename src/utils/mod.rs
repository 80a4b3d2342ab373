//! Utility modules for the workshop sync engine.
//!
//! - [`datetime`] - UNIX timestamp helpers shared by the queue and the sync engine

pub mod datetime;
