//! workshop-sync - Offline queue and synchronization for Moodle workshops
//!
//! This library lets a client keep working on a Moodle workshop activity
//! without a connection. Submissions, assessments and evaluations are queued
//! in a local `SQLite` store when the site can't be reached and replayed by
//! the sync engine later, with conflict detection against the site.
//!
//! # Modules
//!
//! The library is organized into several key modules:
//!
//! * [`config`] - Application configuration management
//! * [`offline`] - Queue of offline actions and their attachments
//! * [`site`] - Moodle web-service client and data structures
//! * [`strategy`] - Grading strategies validating assessment forms
//! * [`sync`] - Replay of queued actions against the site
//! * [`workshop`] - Online/offline provider and display merge
//! * [`storage`] - Local database and data persistence

/// Configuration module for managing application settings
pub mod config;

/// Application constants and default values
pub mod constants;

/// Service wiring from configuration
pub mod context;

/// SeaORM entity models for database tables
pub mod entities;

/// Assessment form data and dimension parsing
pub mod form;

/// Logging setup for the sync engine
pub mod logger;

/// Offline queue of workshop actions
pub mod offline;

/// Repository layer for database operations
pub mod repositories;

/// Moodle web-service client
pub mod site;

/// Local storage layer for queued actions and cached data
pub mod storage;

/// Grading strategies
pub mod strategy;

/// Synchronization engine replaying queued actions
pub mod sync;

/// Utility functions for date/time handling
pub mod utils;

/// Workshop provider choosing between the site and the offline queue
pub mod workshop;

pub use context::AppContext;
