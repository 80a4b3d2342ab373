//! Display merge and workshop rules.

use anyhow::Result;
use log::warn;

use crate::constants::{ERROR_REQUIRED, FORMAT_HTML};
use crate::form::{parse_form_fields, AssessmentForm, FormData, FormDimension, FormField};
use crate::offline::{
    AttachmentFile, OfflineAssessment, OfflineEvaluateAssessment, OfflineEvaluateSubmission, OfflineFiles,
    OfflineSubmission, SubmissionAction, FEEDBACK_ATTACHMENTS_FIELD,
};
use crate::site::{
    examples_mode, overall_feedback_mode, phase, AccessInformation, AssessmentData, PhaseTaskData, SubmissionData,
    WorkshopData,
};
use crate::strategy::{strategy_for, FieldErrors};

/// A submission as shown to the user, with queued actions applied
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DisplaySubmission {
    pub data: SubmissionData,
    pub course_id: Option<i64>,
    /// Title or content come from a queued add or update
    pub offline: bool,
    /// A delete is queued
    pub deleted: bool,
    /// Time of the latest queued action
    pub submission_modified: Option<i64>,
    pub attachments: Vec<AttachmentFile>,
}

/// Apply queued submission actions to a site submission
///
/// `actions` must be in the order they were queued. Returns `None` when there
/// is neither a submission nor any action.
pub async fn apply_offline_data(
    files: &OfflineFiles,
    submission: Option<SubmissionData>,
    actions: &[OfflineSubmission],
) -> Result<Option<DisplaySubmission>> {
    let Some(data) = submission.or_else(|| (!actions.is_empty()).then(SubmissionData::default)) else {
        return Ok(None);
    };

    let mut display = DisplaySubmission {
        attachments: data.attachmentfiles.iter().cloned().map(AttachmentFile::Online).collect(),
        data,
        ..Default::default()
    };

    let mut editing = true;
    let mut latest_files = None;
    let mut workshop_id = display.data.workshopid;

    for action in actions {
        match action.action {
            SubmissionAction::Add | SubmissionAction::Update => {
                if action.action == SubmissionAction::Add {
                    display.data.id = action.submission_id;
                    editing = false;
                }
                display.data.title = action.title.clone();
                display.data.content = action.content.clone();
                display.course_id = Some(action.course_id);
                display.submission_modified = Some(action.time_modified);
                display.offline = true;
                latest_files = action.attachments.clone();
                workshop_id = action.workshop_id;
            }
            SubmissionAction::Delete => {
                display.deleted = true;
                display.submission_modified = Some(action.time_modified);
            }
        }
    }

    if !actions.is_empty() {
        display.attachments = match latest_files {
            Some(stored) => {
                files
                    .get_submission_files(workshop_id, display.data.id, editing, &stored)
                    .await?
            }
            None => Vec::new(),
        };
    }

    Ok(Some(display))
}

/// Overwrite the current form values with a queued assessment
pub fn apply_offline_assessment(form: &mut AssessmentForm, queued: &OfflineAssessment) {
    let fields: Vec<FormField> = queued
        .input_data
        .iter()
        .map(|(name, value)| FormField {
            name: name.clone(),
            value: match value {
                serde_json::Value::String(text) => text.clone(),
                other => other.to_string(),
            },
        })
        .collect();

    for (index, queued_dimension) in parse_form_fields(&fields).into_iter().enumerate() {
        if queued_dimension.values.is_empty() {
            continue;
        }
        while form.current.len() <= index {
            let number = form.current.len() + 1;
            form.current.push(FormDimension {
                number,
                ..Default::default()
            });
        }
        form.current[index].values.extend(queued_dimension.values);
    }
}

/// Show a queued submission evaluation on the submission
pub fn apply_offline_evaluate_submission(submission: &mut SubmissionData, queued: &OfflineEvaluateSubmission) {
    submission.feedbackauthor = Some(queued.feedback_text.clone());
    submission.published = queued.published;
    submission.gradeover = queued.grade_over.as_deref().and_then(|grade| grade.trim().parse().ok());
}

/// Show a queued assessment evaluation on the assessment
pub fn apply_offline_evaluate_assessment(assessment: &mut AssessmentData, queued: &OfflineEvaluateAssessment) {
    assessment.feedbackreviewer = Some(queued.feedback_text.clone());
    assessment.weight = queued.weight;
    assessment.gradinggradeover = queued
        .grading_grade_over
        .as_deref()
        .and_then(|grade| grade.trim().parse().ok());
}

/// Find a task of the user plan by code
pub fn get_task<'a>(tasks: &'a [PhaseTaskData], code: &str) -> Option<&'a PhaseTaskData> {
    tasks.iter().find(|task| task.code == code)
}

/// Whether a task is completed. A task missing from the plan counts as done.
pub fn is_task_done(tasks: &[PhaseTaskData], code: &str) -> bool {
    match get_task(tasks, code) {
        Some(task) => task.is_completed(),
        None => true,
    }
}

/// Whether the user may submit work
pub fn can_submit(workshop: &WorkshopData, access: &AccessInformation, tasks: &[PhaseTaskData]) -> bool {
    let examples_must = workshop.useexamples && workshop.examplesmode == examples_mode::BEFORE_SUBMISSION;
    let examples_done = access.canmanageexamples
        || workshop.examplesmode == examples_mode::VOLUNTARY
        || is_task_done(tasks, "examples");

    workshop.phase > phase::SETUP && access.cansubmit && (!examples_must || examples_done)
}

/// Whether the user may assess peers
pub fn can_assess(workshop: &WorkshopData, access: &AccessInformation) -> bool {
    let examples_must = workshop.useexamples && workshop.examplesmode == examples_mode::BEFORE_ASSESSMENT;
    !examples_must || access.canmanageexamples
}

/// Turn a percentage into a grade out of `max`, rounded to `decimals`
pub fn real_grade_value(value: Option<f64>, max: f64, decimals: i32) -> Option<String> {
    let value = value?;
    if max == 0.0 {
        return Some("0".to_string());
    }

    let decimals = decimals.clamp(0, 10);
    let factor = 10f64.powi(decimals);
    let rounded = (max * value / 100.0 * factor).round() / factor;
    let formatted = format!("{:.*}", decimals as usize, rounded);
    let trimmed = if formatted.contains('.') {
        formatted.trim_end_matches('0').trim_end_matches('.')
    } else {
        &formatted
    };
    Some(trimmed.to_string())
}

/// Real grades of an assessment
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RealGrades {
    pub grade: Option<String>,
    pub gradinggrade: Option<String>,
    pub gradinggradeover: Option<String>,
}

pub fn real_grades(workshop: &WorkshopData, assessment: &AssessmentData) -> RealGrades {
    RealGrades {
        grade: real_grade_value(assessment.grade, workshop.grade, workshop.gradedecimals),
        gradinggrade: real_grade_value(assessment.gradinggrade, workshop.gradinggrade, workshop.gradedecimals),
        gradinggradeover: real_grade_value(
            assessment.gradinggradeover,
            workshop.gradinggrade,
            workshop.gradedecimals,
        ),
    }
}

/// Build the form data of an assessment
///
/// Required overall feedback is checked first, then the workshop strategy
/// validates the selected values.
pub fn prepare_assessment_data(
    workshop: &WorkshopData,
    selected: &[FormDimension],
    feedback_text: &str,
    form: &AssessmentForm,
    attachments_id: i64,
) -> Result<FormData, FieldErrors> {
    if workshop.overallfeedbackmode == overall_feedback_mode::ENABLED_REQUIRED && feedback_text.trim().is_empty() {
        let mut errors = FieldErrors::new();
        errors.insert("feedbackauthor", ERROR_REQUIRED);
        return Err(errors);
    }

    let strategy_name = workshop.strategy.as_deref().unwrap_or_default();
    let mut data = match strategy_for(strategy_name) {
        Some(strategy) => strategy.prepare_assessment_data(selected, form)?,
        None => {
            warn!("⚠️  Unknown assessment strategy '{}', sending feedback only", strategy_name);
            FormData::new()
        }
    };

    data.insert("feedbackauthor".to_string(), feedback_text.into());
    data.insert("feedbackauthorformat".to_string(), FORMAT_HTML.into());
    data.insert(FEEDBACK_ATTACHMENTS_FIELD.to_string(), attachments_id.into());
    data.insert("nodims".to_string(), form.dimensions_count.into());
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(code: &str, completed: &str) -> PhaseTaskData {
        PhaseTaskData {
            code: code.to_string(),
            completed: completed.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn missing_task_counts_as_done() {
        let tasks = vec![task("submit", "0")];
        assert!(is_task_done(&tasks, "examples"));
        assert!(!is_task_done(&tasks, "submit"));
        assert!(is_task_done(&[task("submit", "1")], "submit"));
    }

    #[test]
    fn real_grade_scales_and_rounds() {
        assert_eq!(real_grade_value(Some(50.0), 80.0, 2), Some("40".to_string()));
        assert_eq!(real_grade_value(Some(33.333), 10.0, 2), Some("3.33".to_string()));
        assert_eq!(real_grade_value(Some(45.0), 10.0, 0), Some("5".to_string()));
        assert_eq!(real_grade_value(Some(70.0), 0.0, 2), Some("0".to_string()));
        assert_eq!(real_grade_value(None, 80.0, 2), None);
    }
}
