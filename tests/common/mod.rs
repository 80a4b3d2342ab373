#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

use workshop_sync::form::{AssessmentForm, FormData};
use workshop_sync::offline::{OfflineFiles, OfflineStore};
use workshop_sync::site::{
    AccessInformation, AssessmentData, FormMode, PhaseData, SiteError, SubmissionData, WorkshopData, WorkshopSite,
};
use workshop_sync::storage::LocalStorage;
use workshop_sync::sync::WorkshopSync;
use workshop_sync::utils::datetime;
use workshop_sync::workshop::{Connectivity, WorkshopService};

pub const WORKSHOP_ID: i64 = 7;
pub const COURSE_ID: i64 = 3;

/// Scripted state of the fake site
#[derive(Default)]
pub struct FakeState {
    pub workshop: WorkshopData,
    pub submissions: HashMap<i64, SubmissionData>,
    pub assessments: HashMap<i64, AssessmentData>,
    pub form: AssessmentForm,
    pub next_submission_id: i64,
    pub next_item_id: i64,
    /// Method name -> error returned by every call of that method
    pub failures: HashMap<&'static str, SiteError>,
    pub calls: Vec<String>,
    pub uploads: Vec<(i64, String, Vec<u8>)>,
    pub added: Vec<(String, String, Option<i64>)>,
    pub updated: Vec<(i64, String, String, Option<i64>)>,
    pub deleted: Vec<i64>,
    pub assessed: Vec<(i64, FormData)>,
    pub evaluated_submissions: Vec<(i64, String, bool, Option<String>)>,
    pub evaluated_assessments: Vec<(i64, String, i32, Option<String>)>,
    pub invalidated: Vec<i64>,
}

pub struct FakeSite {
    pub state: Mutex<FakeState>,
}

impl FakeSite {
    pub fn new() -> Self {
        let workshop = WorkshopData {
            id: WORKSHOP_ID,
            course: COURSE_ID,
            name: "Peer review".to_string(),
            phase: 20,
            strategy: Some("accumulative".to_string()),
            grade: 80.0,
            gradinggrade: 20.0,
            gradedecimals: 2,
            submissiontypetext: 2,
            submissiontypefile: 1,
            ..Default::default()
        };

        Self {
            state: Mutex::new(FakeState {
                workshop,
                next_submission_id: 100,
                next_item_id: 500,
                ..Default::default()
            }),
        }
    }

    pub fn fail(&self, method: &'static str, error: SiteError) {
        self.state.lock().unwrap().failures.insert(method, error);
    }

    pub fn recover(&self, method: &'static str) {
        self.state.lock().unwrap().failures.remove(method);
    }

    /// A submission on the site, last modified `age` seconds ago
    pub fn put_submission(&self, id: i64, age: i64) {
        let submission = SubmissionData {
            id,
            workshopid: WORKSHOP_ID,
            title: format!("Submission {}", id),
            content: "Site content".to_string(),
            timemodified: datetime::timestamp() - age,
            ..Default::default()
        };
        self.state.lock().unwrap().submissions.insert(id, submission);
    }

    /// An assessment on the site, last modified `age` seconds ago
    pub fn put_assessment(&self, id: i64, age: i64) {
        let assessment = AssessmentData {
            id,
            submissionid: 1,
            weight: 1,
            timemodified: datetime::timestamp() - age,
            ..Default::default()
        };
        self.state.lock().unwrap().assessments.insert(id, assessment);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    fn enter(&self, method: &'static str) -> Result<std::sync::MutexGuard<'_, FakeState>, SiteError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(method.to_string());
        if let Some(error) = state.failures.get(method).cloned() {
            return Err(error);
        }
        Ok(state)
    }
}

#[async_trait]
impl WorkshopSite for FakeSite {
    async fn get_workshop_by_id(&self, _course_id: i64, workshop_id: i64) -> Result<WorkshopData, SiteError> {
        let state = self.enter("get_workshop_by_id")?;
        if state.workshop.id == workshop_id {
            Ok(state.workshop.clone())
        } else {
            Err(SiteError::NotFound(format!("workshop {}", workshop_id)))
        }
    }

    async fn get_access_information(&self, _workshop_id: i64) -> Result<AccessInformation, SiteError> {
        self.enter("get_access_information")?;
        Ok(AccessInformation {
            canview: true,
            cansubmit: true,
            ..Default::default()
        })
    }

    async fn get_user_plan(&self, _workshop_id: i64) -> Result<Vec<PhaseData>, SiteError> {
        self.enter("get_user_plan")?;
        Ok(Vec::new())
    }

    async fn get_submissions(&self, _workshop_id: i64) -> Result<Vec<SubmissionData>, SiteError> {
        let state = self.enter("get_submissions")?;
        Ok(state.submissions.values().cloned().collect())
    }

    async fn get_submission(&self, _workshop_id: i64, submission_id: i64) -> Result<SubmissionData, SiteError> {
        let state = self.enter("get_submission")?;
        state
            .submissions
            .get(&submission_id)
            .cloned()
            .ok_or_else(|| SiteError::NotFound(format!("submission {}", submission_id)))
    }

    async fn get_assessment(&self, _workshop_id: i64, assessment_id: i64) -> Result<AssessmentData, SiteError> {
        let state = self.enter("get_assessment")?;
        state
            .assessments
            .get(&assessment_id)
            .cloned()
            .ok_or_else(|| SiteError::NotFound(format!("assessment {}", assessment_id)))
    }

    async fn get_reviewer_assessments(&self, _workshop_id: i64) -> Result<Vec<AssessmentData>, SiteError> {
        let state = self.enter("get_reviewer_assessments")?;
        Ok(state.assessments.values().cloned().collect())
    }

    async fn get_assessment_form(
        &self,
        _workshop_id: i64,
        _assessment_id: i64,
        _mode: FormMode,
    ) -> Result<AssessmentForm, SiteError> {
        let state = self.enter("get_assessment_form")?;
        Ok(state.form.clone())
    }

    async fn add_submission(
        &self,
        workshop_id: i64,
        title: &str,
        content: &str,
        attachments_id: Option<i64>,
    ) -> Result<i64, SiteError> {
        let mut state = self.enter("add_submission")?;
        let id = state.next_submission_id;
        state.next_submission_id += 1;
        state.added.push((title.to_string(), content.to_string(), attachments_id));
        state.submissions.insert(
            id,
            SubmissionData {
                id,
                workshopid: workshop_id,
                title: title.to_string(),
                content: content.to_string(),
                timemodified: datetime::timestamp(),
                ..Default::default()
            },
        );
        Ok(id)
    }

    async fn update_submission(
        &self,
        submission_id: i64,
        title: &str,
        content: &str,
        attachments_id: Option<i64>,
    ) -> Result<(), SiteError> {
        let mut state = self.enter("update_submission")?;
        state
            .updated
            .push((submission_id, title.to_string(), content.to_string(), attachments_id));
        Ok(())
    }

    async fn delete_submission(&self, submission_id: i64) -> Result<(), SiteError> {
        let mut state = self.enter("delete_submission")?;
        state.deleted.push(submission_id);
        state.submissions.remove(&submission_id);
        Ok(())
    }

    async fn update_assessment(&self, assessment_id: i64, data: &FormData) -> Result<(), SiteError> {
        let mut state = self.enter("update_assessment")?;
        state.assessed.push((assessment_id, data.clone()));
        Ok(())
    }

    async fn evaluate_submission(
        &self,
        submission_id: i64,
        feedback_text: &str,
        published: bool,
        grade_over: Option<&str>,
    ) -> Result<(), SiteError> {
        let mut state = self.enter("evaluate_submission")?;
        state.evaluated_submissions.push((
            submission_id,
            feedback_text.to_string(),
            published,
            grade_over.map(str::to_string),
        ));
        Ok(())
    }

    async fn evaluate_assessment(
        &self,
        assessment_id: i64,
        feedback_text: &str,
        weight: i32,
        grading_grade_over: Option<&str>,
    ) -> Result<(), SiteError> {
        let mut state = self.enter("evaluate_assessment")?;
        state.evaluated_assessments.push((
            assessment_id,
            feedback_text.to_string(),
            weight,
            grading_grade_over.map(str::to_string),
        ));
        Ok(())
    }

    async fn upload_file(&self, item_id: i64, filename: &str, bytes: Vec<u8>) -> Result<i64, SiteError> {
        let mut state = self.enter("upload_file")?;
        let item_id = if item_id == 0 {
            let next = state.next_item_id;
            state.next_item_id += 1;
            next
        } else {
            item_id
        };
        state.uploads.push((item_id, filename.to_string(), bytes));
        Ok(item_id)
    }

    async fn download_file(&self, url: &str) -> Result<Vec<u8>, SiteError> {
        self.enter("download_file")?;
        Ok(format!("downloaded {}", url).into_bytes())
    }

    async fn invalidate_content(&self, workshop_id: i64, _course_id: i64) -> Result<(), SiteError> {
        let mut state = self.enter("invalidate_content")?;
        state.invalidated.push(workshop_id);
        Ok(())
    }
}

/// Services wired around a fake site, an in-memory database and a scratch folder
pub struct Harness {
    pub site: Arc<FakeSite>,
    pub storage: Arc<AsyncMutex<LocalStorage>>,
    pub offline: OfflineStore,
    pub files: OfflineFiles,
    pub connectivity: Connectivity,
    pub service: WorkshopService,
    pub sync: WorkshopSync,
}

impl Harness {
    pub async fn new(online: bool) -> Self {
        let site = Arc::new(FakeSite::new());
        let storage = Arc::new(AsyncMutex::new(LocalStorage::in_memory().await.unwrap()));
        let offline = OfflineStore::new(storage.clone());
        let files = OfflineFiles::new(scratch_dir());
        let connectivity = Connectivity::new(online);

        let service = WorkshopService::new(site.clone(), offline.clone(), files.clone(), connectivity.clone());
        let sync = WorkshopSync::new(site.clone(), offline.clone(), files.clone(), connectivity.clone());

        Self {
            site,
            storage,
            offline,
            files,
            connectivity,
            service,
            sync,
        }
    }
}

/// Fresh folder under the system temp dir
pub fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("workshop-sync-test-{}", uuid::Uuid::new_v4().simple()))
}

pub fn web_service_error(message: &str) -> SiteError {
    SiteError::WebService {
        errorcode: "invalidparameter".to_string(),
        message: message.to_string(),
    }
}

pub fn network_error() -> SiteError {
    SiteError::Network("connection refused".to_string())
}
