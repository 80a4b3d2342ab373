pub mod assessment;
pub mod evaluate_assessment;
pub mod evaluate_submission;
pub mod submission;
pub mod sync_time;
pub mod ws_cache;

pub use assessment::Entity as Assessment;
pub use evaluate_assessment::Entity as EvaluateAssessment;
pub use evaluate_submission::Entity as EvaluateSubmission;
pub use submission::Entity as Submission;
pub use sync_time::Entity as SyncTime;
pub use ws_cache::Entity as WsCache;
