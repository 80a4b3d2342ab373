//! Moodle REST web-service implementation of [`WorkshopSite`].

use async_trait::async_trait;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use super::params::{flatten, object_to_name_value_list};
use super::{
    AccessInformation, AssessmentData, FormMode, PhaseData, SiteError, SubmissionData, WorkshopData,
    WorkshopSite,
};
use crate::constants::*;
use crate::form::{parse_form_fields, AssessmentForm, DimensionInfo, FormData, FormField};
use crate::repositories::WsCacheRepository;
use crate::storage::LocalStorage;
use crate::utils::datetime;

/// Moodle site reached through `webservice/rest/server.php`.
pub struct MoodleSite {
    client: reqwest::Client,
    url: String,
    token: String,
    storage: Arc<Mutex<LocalStorage>>,
}

#[derive(Deserialize)]
struct WorkshopsResponse {
    #[serde(default)]
    workshops: Vec<WorkshopData>,
}

#[derive(Deserialize)]
struct UserPlanResponse {
    userplan: UserPlan,
}

#[derive(Deserialize)]
struct UserPlan {
    #[serde(default)]
    phases: Vec<PhaseData>,
}

#[derive(Deserialize)]
struct SubmissionsResponse {
    #[serde(default)]
    submissions: Vec<SubmissionData>,
}

#[derive(Deserialize)]
struct SubmissionResponse {
    submission: SubmissionData,
}

#[derive(Deserialize)]
struct AssessmentResponse {
    assessment: AssessmentData,
}

#[derive(Deserialize)]
struct AssessmentsResponse {
    #[serde(default)]
    assessments: Vec<AssessmentData>,
}

#[derive(Deserialize)]
struct AssessmentFormResponse {
    #[serde(default)]
    dimenssionscount: usize,
    #[serde(default)]
    dimensionsinfo: Vec<DimensionInfo>,
    #[serde(default)]
    fields: Vec<FormField>,
    #[serde(default)]
    current: Vec<FormField>,
    #[serde(default)]
    options: Vec<FormField>,
}

/// Parse a REST response body, turning Moodle exceptions into [`SiteError::WebService`]
///
/// Some functions legitimately return `null`; that becomes `Value::Null`.
pub fn parse_response(body: &str) -> Result<Value, SiteError> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return Ok(Value::Null);
    }

    let value: Value =
        serde_json::from_str(trimmed).map_err(|e| SiteError::InvalidResponse(format!("Malformed JSON: {}", e)))?;

    if let Some(object) = value.as_object() {
        if object.contains_key("exception") || object.contains_key("debuginfo") {
            let errorcode = object
                .get("errorcode")
                .or_else(|| object.get("exception"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let message = object
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown web-service error")
                .to_string();
            return Err(SiteError::WebService { errorcode, message });
        }
    }

    Ok(value)
}

/// Reject write responses that report `status: false`
///
/// The first warning message is preferred over the generic `message`.
pub fn check_status(response: &Value, message: &str) -> Result<(), SiteError> {
    if response.get("status").and_then(Value::as_bool) == Some(false) {
        let warning = response
            .get("warnings")
            .and_then(Value::as_array)
            .and_then(|warnings| warnings.first())
            .and_then(|warning| warning.get("message"))
            .and_then(Value::as_str);
        return Err(SiteError::failed_status(warning.unwrap_or(message)));
    }
    Ok(())
}

/// Parse the JSON returned by `webservice/upload.php` into the draft item id
pub fn parse_upload_response(body: &str) -> Result<i64, SiteError> {
    let value = parse_response(body)?;

    if let Some(error) = value.get("error").and_then(Value::as_str) {
        return Err(SiteError::WebService {
            errorcode: "uploaderror".to_string(),
            message: error.to_string(),
        });
    }

    let first = value
        .as_array()
        .and_then(|files| files.first())
        .ok_or_else(|| SiteError::InvalidResponse("Upload returned no file".to_string()))?;

    if let Some(error) = first.get("error").and_then(Value::as_str) {
        return Err(SiteError::WebService {
            errorcode: "uploaderror".to_string(),
            message: error.to_string(),
        });
    }

    first
        .get("itemid")
        .and_then(Value::as_i64)
        .ok_or_else(|| SiteError::InvalidResponse("Upload returned no item id".to_string()))
}

/// Point a `pluginfile.php` URL at the token-authenticated endpoint
pub fn fix_pluginfile_url(url: &str, token: &str) -> String {
    let mut fixed = if url.contains("/webservice/pluginfile.php") {
        url.to_string()
    } else {
        url.replacen("/pluginfile.php", "/webservice/pluginfile.php", 1)
    };

    if !fixed.contains("token=") {
        fixed.push(if fixed.contains('?') { '&' } else { '?' });
        fixed.push_str("token=");
        fixed.push_str(token);
    }
    fixed
}

fn decode<T: DeserializeOwned>(value: Value, function: &str) -> Result<T, SiteError> {
    serde_json::from_value(value).map_err(|e| SiteError::InvalidResponse(format!("{}: {}", function, e)))
}

fn network(e: reqwest::Error) -> SiteError {
    SiteError::Network(e.to_string())
}

/// Cache key prefix shared by every read of a workshop
pub fn workshop_cache_prefix(workshop_id: i64) -> String {
    format!("{}:{}:", WORKSHOP_COMPONENT, workshop_id)
}

impl MoodleSite {
    /// Create a site client for `url` authenticated with `token`.
    pub fn new(
        url: &str,
        token: String,
        timeout: Duration,
        storage: Arc<Mutex<LocalStorage>>,
    ) -> Result<Self, SiteError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("workshop-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(network)?;

        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
            token,
            storage,
        })
    }

    /// POST a web-service call and return the decoded body
    async fn call(&self, function: &str, params: Value) -> Result<Value, SiteError> {
        let mut form = flatten(&params);
        form.push(("wsfunction".to_string(), function.to_string()));
        form.push(("wstoken".to_string(), self.token.clone()));

        debug!("🌐 Calling {}", function);
        let response = self
            .client
            .post(format!("{}{}", self.url, WS_REST_PATH))
            .form(&form)
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SiteError::Network(format!("{} returned HTTP {}", function, status)));
        }

        let body = response.text().await.map_err(network)?;
        parse_response(&body)
    }

    /// Cached read: successful answers are stored, transport failures fall back to the cache.
    async fn read(&self, workshop_id: i64, function: &str, params: Value) -> Result<Value, SiteError> {
        let cache_key = format!("{}{}:{}", workshop_cache_prefix(workshop_id), function, params);

        match self.call(function, params).await {
            Ok(value) => {
                let storage = self.storage.lock().await;
                if let Err(e) =
                    WsCacheRepository::put(&storage.conn, &cache_key, function, &value.to_string(), datetime::timestamp())
                        .await
                {
                    warn!("⚠️  Failed to cache {}: {}", function, e);
                }
                Ok(value)
            }
            Err(SiteError::Network(reason)) => {
                let storage = self.storage.lock().await;
                match WsCacheRepository::get(&storage.conn, &cache_key).await {
                    Ok(Some(entry)) => {
                        debug!("📦 Using cached {} after network error: {}", function, reason);
                        serde_json::from_str(&entry.data)
                            .map_err(|e| SiteError::InvalidResponse(format!("Corrupt cache entry: {}", e)))
                    }
                    _ => Err(SiteError::Network(reason)),
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn write(&self, function: &str, params: Value, failure: &str) -> Result<Value, SiteError> {
        let response = self.call(function, params).await?;
        check_status(&response, failure)?;
        Ok(response)
    }
}

#[async_trait]
impl WorkshopSite for MoodleSite {
    async fn get_workshop_by_id(&self, course_id: i64, workshop_id: i64) -> Result<WorkshopData, SiteError> {
        let value = self
            .read(workshop_id, WS_GET_WORKSHOPS_BY_COURSES, json!({ "courseids": [course_id] }))
            .await?;
        let response: WorkshopsResponse = decode(value, WS_GET_WORKSHOPS_BY_COURSES)?;

        response
            .workshops
            .into_iter()
            .find(|workshop| workshop.id == workshop_id)
            .ok_or_else(|| SiteError::NotFound(format!("Workshop {} in course {}", workshop_id, course_id)))
    }

    async fn get_access_information(&self, workshop_id: i64) -> Result<AccessInformation, SiteError> {
        let value = self
            .read(workshop_id, WS_GET_ACCESS_INFORMATION, json!({ "workshopid": workshop_id }))
            .await?;
        decode(value, WS_GET_ACCESS_INFORMATION)
    }

    async fn get_user_plan(&self, workshop_id: i64) -> Result<Vec<PhaseData>, SiteError> {
        let value = self
            .read(workshop_id, WS_GET_USER_PLAN, json!({ "workshopid": workshop_id }))
            .await?;
        let response: UserPlanResponse = decode(value, WS_GET_USER_PLAN)?;
        Ok(response.userplan.phases)
    }

    async fn get_submissions(&self, workshop_id: i64) -> Result<Vec<SubmissionData>, SiteError> {
        let value = self
            .read(workshop_id, WS_GET_SUBMISSIONS, json!({ "workshopid": workshop_id }))
            .await?;
        let response: SubmissionsResponse = decode(value, WS_GET_SUBMISSIONS)?;
        Ok(response.submissions)
    }

    async fn get_submission(&self, workshop_id: i64, submission_id: i64) -> Result<SubmissionData, SiteError> {
        let value = self
            .read(workshop_id, WS_GET_SUBMISSION, json!({ "submissionid": submission_id }))
            .await?;
        let response: SubmissionResponse = decode(value, WS_GET_SUBMISSION)?;
        Ok(response.submission)
    }

    async fn get_assessment(&self, workshop_id: i64, assessment_id: i64) -> Result<AssessmentData, SiteError> {
        let value = self
            .read(workshop_id, WS_GET_ASSESSMENT, json!({ "assessmentid": assessment_id }))
            .await?;
        let response: AssessmentResponse = decode(value, WS_GET_ASSESSMENT)?;
        Ok(response.assessment)
    }

    async fn get_reviewer_assessments(&self, workshop_id: i64) -> Result<Vec<AssessmentData>, SiteError> {
        let value = self
            .read(workshop_id, WS_GET_REVIEWER_ASSESSMENTS, json!({ "workshopid": workshop_id }))
            .await?;
        let response: AssessmentsResponse = decode(value, WS_GET_REVIEWER_ASSESSMENTS)?;
        Ok(response.assessments)
    }

    async fn get_assessment_form(
        &self,
        workshop_id: i64,
        assessment_id: i64,
        mode: FormMode,
    ) -> Result<AssessmentForm, SiteError> {
        let value = self
            .read(
                workshop_id,
                WS_GET_ASSESSMENT_FORM,
                json!({ "assessmentid": assessment_id, "mode": mode.as_str() }),
            )
            .await?;
        let response: AssessmentFormResponse = decode(value, WS_GET_ASSESSMENT_FORM)?;

        Ok(AssessmentForm {
            dimensions_count: response.dimenssionscount,
            dimensions_info: response.dimensionsinfo,
            fields: parse_form_fields(&response.fields),
            current: parse_form_fields(&response.current),
            options: response.options.into_iter().map(|option| (option.name, option.value)).collect(),
        })
    }

    async fn add_submission(
        &self,
        workshop_id: i64,
        title: &str,
        content: &str,
        attachments_id: Option<i64>,
    ) -> Result<i64, SiteError> {
        let params = json!({
            "workshopid": workshop_id,
            "title": title,
            "content": content,
            "attachmentsid": attachments_id,
        });
        let response = self.write(WS_ADD_SUBMISSION, params, "Add submission failed").await?;

        response
            .get("submissionid")
            .and_then(Value::as_i64)
            .filter(|id| *id > 0)
            .ok_or_else(|| SiteError::failed_status("Add submission failed, no submission id was returned"))
    }

    async fn update_submission(
        &self,
        submission_id: i64,
        title: &str,
        content: &str,
        attachments_id: Option<i64>,
    ) -> Result<(), SiteError> {
        let params = json!({
            "submissionid": submission_id,
            "title": title,
            "content": content,
            "attachmentsid": attachments_id.unwrap_or(0),
        });
        self.write(WS_UPDATE_SUBMISSION, params, "Update submission failed").await?;
        Ok(())
    }

    async fn delete_submission(&self, submission_id: i64) -> Result<(), SiteError> {
        self.write(
            WS_DELETE_SUBMISSION,
            json!({ "submissionid": submission_id }),
            "Delete submission failed",
        )
        .await?;
        Ok(())
    }

    async fn update_assessment(&self, assessment_id: i64, data: &FormData) -> Result<(), SiteError> {
        let params = json!({
            "assessmentid": assessment_id,
            "data": object_to_name_value_list(data),
        });
        self.write(WS_UPDATE_ASSESSMENT, params, "Update assessment failed").await?;
        Ok(())
    }

    async fn evaluate_submission(
        &self,
        submission_id: i64,
        feedback_text: &str,
        published: bool,
        grade_over: Option<&str>,
    ) -> Result<(), SiteError> {
        let params = json!({
            "submissionid": submission_id,
            "feedbacktext": feedback_text,
            "feedbackformat": FORMAT_HTML,
            "published": published,
            "gradeover": grade_over,
        });
        self.write(WS_EVALUATE_SUBMISSION, params, "Evaluate submission failed").await?;
        Ok(())
    }

    async fn evaluate_assessment(
        &self,
        assessment_id: i64,
        feedback_text: &str,
        weight: i32,
        grading_grade_over: Option<&str>,
    ) -> Result<(), SiteError> {
        let params = json!({
            "assessmentid": assessment_id,
            "feedbacktext": feedback_text,
            "feedbackformat": FORMAT_HTML,
            "weight": weight,
            "gradinggradeover": grading_grade_over,
        });
        self.write(WS_EVALUATE_ASSESSMENT, params, "Evaluate assessment failed").await?;
        Ok(())
    }

    async fn upload_file(&self, item_id: i64, filename: &str, bytes: Vec<u8>) -> Result<i64, SiteError> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(filename.to_string());
        let form = reqwest::multipart::Form::new()
            .text("token", self.token.clone())
            .text("filearea", "draft")
            .text("itemid", item_id.to_string())
            .part("file", part);

        debug!("📤 Uploading {} to draft area {}", filename, item_id);
        let response = self
            .client
            .post(format!("{}{}", self.url, WS_UPLOAD_PATH))
            .multipart(form)
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SiteError::Network(format!("Upload returned HTTP {}", status)));
        }

        let body = response.text().await.map_err(network)?;
        parse_upload_response(&body)
    }

    async fn download_file(&self, url: &str) -> Result<Vec<u8>, SiteError> {
        let response = self
            .client
            .get(fix_pluginfile_url(url, &self.token))
            .send()
            .await
            .map_err(network)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SiteError::Network(format!("Download returned HTTP {}", status)));
        }

        Ok(response.bytes().await.map_err(network)?.to_vec())
    }

    async fn invalidate_content(&self, workshop_id: i64, _course_id: i64) -> Result<(), SiteError> {
        let storage = self.storage.lock().await;
        let removed = WsCacheRepository::delete_with_prefix(&storage.conn, &workshop_cache_prefix(workshop_id))
            .await
            .map_err(|e| SiteError::InvalidResponse(format!("Cache invalidation failed: {}", e)))?;
        debug!("🧹 Dropped {} cached responses for workshop {}", removed, workshop_id);
        Ok(())
    }
}
