//! Constants used throughout the application
//!
//! This module centralizes web-service function names, component names,
//! warning texts and default values.

/// Component name used for sync times and operation blocking
pub const WORKSHOP_COMPONENT: &str = "mod_workshop";

/// Minimum time between two automatic syncs of the same workshop (seconds)
pub const DEFAULT_SYNC_INTERVAL_SECONDS: u64 = 300;
/// Upper bound accepted for the sync interval (seconds)
pub const MAX_SYNC_INTERVAL_SECONDS: u64 = 86_400;
/// Default HTTP timeout for web-service calls (seconds)
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

/// Environment variable holding the web-service token
pub const DEFAULT_TOKEN_ENV: &str = "MOODLE_WS_TOKEN";

// Web-service endpoints
pub const WS_REST_PATH: &str = "/webservice/rest/server.php?moodlewsrestformat=json";
pub const WS_UPLOAD_PATH: &str = "/webservice/upload.php";

// Web-service functions
pub const WS_GET_WORKSHOPS_BY_COURSES: &str = "mod_workshop_get_workshops_by_courses";
pub const WS_GET_ACCESS_INFORMATION: &str = "mod_workshop_get_workshop_access_information";
pub const WS_GET_USER_PLAN: &str = "mod_workshop_get_user_plan";
pub const WS_GET_SUBMISSIONS: &str = "mod_workshop_get_submissions";
pub const WS_GET_SUBMISSION: &str = "mod_workshop_get_submission";
pub const WS_GET_ASSESSMENT: &str = "mod_workshop_get_assessment";
pub const WS_GET_REVIEWER_ASSESSMENTS: &str = "mod_workshop_get_reviewer_assessments";
pub const WS_GET_ASSESSMENT_FORM: &str = "mod_workshop_get_assessment_form_definition";
pub const WS_ADD_SUBMISSION: &str = "mod_workshop_add_submission";
pub const WS_UPDATE_SUBMISSION: &str = "mod_workshop_update_submission";
pub const WS_DELETE_SUBMISSION: &str = "mod_workshop_delete_submission";
pub const WS_UPDATE_ASSESSMENT: &str = "mod_workshop_update_assessment";
pub const WS_EVALUATE_SUBMISSION: &str = "mod_workshop_evaluate_submission";
pub const WS_EVALUATE_ASSESSMENT: &str = "mod_workshop_evaluate_assessment";

/// Text format sent with feedback fields (HTML)
pub const FORMAT_HTML: i32 = 1;

// Sync warnings
pub const WARNING_SUBMISSION_MODIFIED: &str = "The submission was modified on the site.";
pub const WARNING_ASSESSMENT_MODIFIED: &str = "The assessment was modified on the site.";

/// Highest dimension or level index accepted in assessment form fields
pub const MAX_FORM_INDEX: usize = 255;

// Form validation message keys
pub const ERROR_REQUIRED: &str = "err_required";
pub const ERROR_MUST_CHOOSE_GRADE: &str = "mustchoosegrade";
pub const ERROR_MUST_CHOOSE_ONE: &str = "mustchooseone";
pub const ERROR_REQUIRED_CHOICE: &str = "required";

// CLI messages
pub const CONFIG_GENERATED: &str = "✅ Generated default configuration file";
pub const ERROR_NO_API_TOKEN: &str = "❌ Error: web-service token environment variable not set";
pub const SUCCESS_NOTHING_TO_SYNC: &str = "✅ Nothing to synchronize";
