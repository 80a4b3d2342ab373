//! Site abstraction layer for the Moodle workshop web services.
//!
//! This module defines the interface the sync engine and the workshop provider
//! use to reach the site, the data types exchanged with it, and the error type
//! that tells a rejected mutation apart from a transient failure.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::form::{AssessmentForm, FormData};
use crate::offline::AttachmentFile;

pub mod factory;
pub mod moodle;
pub mod params;

pub use factory::create_site;
pub use moodle::MoodleSite;

/// Error types for site operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SiteError {
    /// The site processed the request and refused it. Retrying won't help.
    #[error("{message}")]
    WebService { errorcode: String, message: String },

    /// The site could not be reached or answered with an HTTP error.
    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl SiteError {
    /// Whether the error came from the web service itself
    ///
    /// Mutations failing this way are discarded; anything else is retried later.
    pub fn is_web_service_error(&self) -> bool {
        matches!(self, SiteError::WebService { .. } | SiteError::NotFound(_))
    }

    /// Build a web-service error from a failed `status` response
    pub fn failed_status(message: &str) -> Self {
        SiteError::WebService {
            errorcode: "failedstatus".to_string(),
            message: message.to_string(),
        }
    }
}

/// Workshop phases as reported by the site
pub mod phase {
    pub const SETUP: i32 = 10;
    pub const SUBMISSION: i32 = 20;
    pub const ASSESSMENT: i32 = 30;
    pub const EVALUATION: i32 = 40;
    pub const CLOSED: i32 = 50;
}

/// Example assessment modes
pub mod examples_mode {
    pub const VOLUNTARY: i32 = 0;
    pub const BEFORE_SUBMISSION: i32 = 1;
    pub const BEFORE_ASSESSMENT: i32 = 2;
}

/// Submission field modes (`submissiontypetext`, `submissiontypefile`)
pub mod submission_type {
    pub const DISABLED: i32 = 0;
    pub const AVAILABLE: i32 = 1;
    pub const REQUIRED: i32 = 2;
}

/// Overall feedback modes
pub mod overall_feedback_mode {
    pub const DISABLED: i32 = 0;
    pub const ENABLED_OPTIONAL: i32 = 1;
    pub const ENABLED_REQUIRED: i32 = 2;
}

/// A file stored on the site.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteFile {
    pub filename: String,
    pub filepath: String,
    pub filesize: i64,
    pub fileurl: String,
    pub timemodified: i64,
    pub mimetype: Option<String>,
}

/// Workshop activity settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkshopData {
    pub id: i64,
    pub course: i64,
    pub coursemodule: i64,
    pub name: String,
    pub phase: i32,
    pub strategy: Option<String>,
    pub grade: f64,
    pub gradinggrade: f64,
    pub gradedecimals: i32,
    pub useexamples: bool,
    pub examplesmode: i32,
    pub submissiontypetext: i32,
    pub submissiontypefile: i32,
    pub overallfeedbackmode: i32,
}

/// Capabilities of the current user in a workshop.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessInformation {
    pub canview: bool,
    pub cansubmit: bool,
    pub canviewallsubmissions: bool,
    pub canmanageexamples: bool,
    pub canviewauthornames: bool,
    pub canpublishsubmissions: bool,
    pub canoverridegrades: bool,
}

/// One task of a phase in the user plan.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseTaskData {
    pub code: String,
    pub title: String,
    pub link: String,
    pub details: Option<String>,
    /// "1" when done, "0" when failed, empty when pending
    pub completed: String,
}

impl PhaseTaskData {
    pub fn is_completed(&self) -> bool {
        !self.completed.is_empty() && self.completed != "0"
    }
}

/// One phase of the user plan.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseData {
    pub code: i32,
    pub title: String,
    pub active: bool,
    pub tasks: Vec<PhaseTaskData>,
}

/// A workshop submission.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionData {
    pub id: i64,
    pub workshopid: i64,
    pub example: bool,
    pub authorid: i64,
    pub timecreated: i64,
    pub timemodified: i64,
    pub title: String,
    pub content: String,
    pub attachment: i32,
    pub attachmentfiles: Vec<RemoteFile>,
    pub published: bool,
    pub late: i32,
    pub grade: Option<f64>,
    pub gradeover: Option<f64>,
    pub feedbackauthor: Option<String>,
}

/// A workshop assessment.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentData {
    pub id: i64,
    pub submissionid: i64,
    pub reviewerid: i64,
    pub weight: i32,
    pub timecreated: i64,
    pub timemodified: i64,
    pub grade: Option<f64>,
    pub gradinggrade: Option<f64>,
    pub gradinggradeover: Option<f64>,
    pub feedbackauthor: Option<String>,
    pub feedbackreviewer: Option<String>,
    pub feedbackattachmentfiles: Vec<RemoteFile>,
}

/// Which side of an assessment form to fetch
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormMode {
    Assessment,
    Preview,
}

impl FormMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormMode::Assessment => "assessment",
            FormMode::Preview => "preview",
        }
    }
}

/// Site trait that the sync engine and the workshop provider talk to.
///
/// `MoodleSite` is the production implementation; tests script their own.
#[async_trait]
pub trait WorkshopSite: Send + Sync {
    // Reads
    async fn get_workshop_by_id(&self, course_id: i64, workshop_id: i64) -> Result<WorkshopData, SiteError>;
    async fn get_access_information(&self, workshop_id: i64) -> Result<AccessInformation, SiteError>;
    async fn get_user_plan(&self, workshop_id: i64) -> Result<Vec<PhaseData>, SiteError>;
    async fn get_submissions(&self, workshop_id: i64) -> Result<Vec<SubmissionData>, SiteError>;
    async fn get_submission(&self, workshop_id: i64, submission_id: i64) -> Result<SubmissionData, SiteError>;
    async fn get_assessment(&self, workshop_id: i64, assessment_id: i64) -> Result<AssessmentData, SiteError>;
    async fn get_reviewer_assessments(&self, workshop_id: i64) -> Result<Vec<AssessmentData>, SiteError>;
    async fn get_assessment_form(
        &self,
        workshop_id: i64,
        assessment_id: i64,
        mode: FormMode,
    ) -> Result<AssessmentForm, SiteError>;

    // Submissions
    async fn add_submission(
        &self,
        workshop_id: i64,
        title: &str,
        content: &str,
        attachments_id: Option<i64>,
    ) -> Result<i64, SiteError>;
    async fn update_submission(
        &self,
        submission_id: i64,
        title: &str,
        content: &str,
        attachments_id: Option<i64>,
    ) -> Result<(), SiteError>;
    async fn delete_submission(&self, submission_id: i64) -> Result<(), SiteError>;

    // Assessments and evaluations
    async fn update_assessment(&self, assessment_id: i64, data: &FormData) -> Result<(), SiteError>;
    async fn evaluate_submission(
        &self,
        submission_id: i64,
        feedback_text: &str,
        published: bool,
        grade_over: Option<&str>,
    ) -> Result<(), SiteError>;
    async fn evaluate_assessment(
        &self,
        assessment_id: i64,
        feedback_text: &str,
        weight: i32,
        grading_grade_over: Option<&str>,
    ) -> Result<(), SiteError>;

    // Files
    /// Upload a file to a draft area and return its item id. Pass 0 to start a new area.
    async fn upload_file(&self, item_id: i64, filename: &str, bytes: Vec<u8>) -> Result<i64, SiteError>;
    async fn download_file(&self, url: &str) -> Result<Vec<u8>, SiteError>;

    /// Drop cached reads for a workshop
    async fn invalidate_content(&self, workshop_id: i64, course_id: i64) -> Result<(), SiteError>;
}

/// Put every file into one fresh draft area and return its item id
///
/// Files already on the site are downloaded and uploaded again. No files
/// gives item id 0, which clears the attachments on the site.
pub async fn upload_files(site: &dyn WorkshopSite, files: &[AttachmentFile]) -> Result<i64, SiteError> {
    let mut item_id = 0;
    for file in files {
        let bytes = match file {
            AttachmentFile::Online(remote) => site.download_file(&remote.fileurl).await?,
            AttachmentFile::Local { bytes, .. } => bytes.clone(),
        };
        item_id = site.upload_file(item_id, file.filename(), bytes).await?;
    }
    Ok(item_id)
}
