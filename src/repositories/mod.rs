//! Repository layer for database operations.
//!
//! This module provides repository structs that encapsulate database queries
//! and operations, following the Data Mapper pattern recommended by SeaORM.
//! Repositories keep entities as pure data models while providing reusable
//! database access methods.

pub mod assessment;
pub mod evaluation;
pub mod submission;
pub mod sync_time;
pub mod ws_cache;

pub use assessment::AssessmentRepository;
pub use evaluation::{EvaluateAssessmentRepository, EvaluateSubmissionRepository};
pub use submission::SubmissionRepository;
pub use sync_time::SyncTimeRepository;
pub use ws_cache::WsCacheRepository;
