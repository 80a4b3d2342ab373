//! Assessment grading strategies.
//!
//! Each workshop grades assessments with one strategy. A strategy knows which
//! values of the assessment form the reviewer edits, how to tell whether they
//! changed, and how to validate them into the form data sent to
//! `mod_workshop_update_assessment`.

pub mod accumulative;
pub mod comments;
pub mod numerrors;
pub mod rubric;

use std::collections::BTreeMap;
use std::fmt;

use crate::form::{AssessmentForm, FormData, FormDimension};

pub use accumulative::Accumulative;
pub use comments::Comments;
pub use numerrors::NumErrors;
pub use rubric::Rubric;

/// Validation errors of an assessment form, keyed by field
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FieldErrors(pub BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: &str) {
        self.0.insert(field.into(), message.to_string());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<String> = self
            .0
            .iter()
            .map(|(field, message)| format!("{}: {}", field, message))
            .collect();
        write!(f, "Invalid assessment form ({})", fields.join(", "))
    }
}

impl std::error::Error for FieldErrors {}

/// Grading strategy of a workshop
pub trait AssessmentStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Values the reviewer starts editing from, one entry per form field
    fn original_values(&self, form: &AssessmentForm) -> Vec<FormDimension>;

    fn has_data_changed(&self, original: &[FormDimension], current: &[FormDimension]) -> bool;

    /// Validate the edited values and build the form data to send
    fn prepare_assessment_data(
        &self,
        current: &[FormDimension],
        form: &AssessmentForm,
    ) -> Result<FormData, FieldErrors>;
}

static ACCUMULATIVE: Accumulative = Accumulative;
static COMMENTS: Comments = Comments;
static NUMERRORS: NumErrors = NumErrors;
static RUBRIC: Rubric = Rubric;

/// Strategy handler for a workshop `strategy` name
pub fn strategy_for(name: &str) -> Option<&'static dyn AssessmentStrategy> {
    match name {
        "accumulative" => Some(&ACCUMULATIVE),
        "comments" => Some(&COMMENTS),
        "numerrors" => Some(&NUMERRORS),
        "rubric" => Some(&RUBRIC),
        _ => None,
    }
}

/// Leading integer of a form value (`"4"`, `" -1"`, `"12abc"`)
pub(crate) fn parse_int(value: &str) -> Option<i64> {
    let value = value.trim();
    let digits_start = usize::from(value.starts_with('-') || value.starts_with('+'));
    let digits_end = value[digits_start..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(value.len(), |pos| pos + digits_start);

    if digits_end == digits_start {
        return None;
    }
    value[..digits_end].parse().ok()
}

/// Value of `key` in the `index`th dimension, empty when missing
pub(crate) fn value_at<'a>(dimensions: &'a [FormDimension], index: usize, key: &str) -> &'a str {
    dimensions
        .get(index)
        .and_then(|dimension| dimension.get(key))
        .unwrap_or_default()
}

/// Integer value of `key` in the `index`th dimension
pub(crate) fn int_at(dimensions: &[FormDimension], index: usize, key: &str) -> Option<i64> {
    parse_int(value_at(dimensions, index, key))
}

/// Whether any of `keys` differs between two value lists
pub(crate) fn keys_changed(original: &[FormDimension], current: &[FormDimension], keys: &[&str]) -> bool {
    original.iter().enumerate().any(|(index, _)| {
        keys.iter()
            .any(|key| value_at(original, index, key) != value_at(current, index, key))
    })
}

/// Start an original-values entry for a form field
pub(crate) fn original_entry(field: &FormDimension) -> FormDimension {
    FormDimension {
        number: field.number,
        ..Default::default()
    }
}

/// `gradeid__idx_N` and `dimensionid__idx_N`, shared by every strategy
pub(crate) fn insert_ids(data: &mut FormData, index: usize, field: &FormDimension, form: &AssessmentForm) {
    data.insert(
        format!("gradeid__idx_{}", index),
        int_at(&form.current, index, "gradeid").unwrap_or(0).into(),
    );
    data.insert(
        format!("dimensionid__idx_{}", index),
        field.get_i64("dimensionid").unwrap_or(0).into(),
    );
}

/// `peercomment__idx_N` when the reviewer wrote one
pub(crate) fn insert_peer_comment(data: &mut FormData, index: usize, current: &[FormDimension]) {
    let comment = value_at(current, index, "peercomment");
    if !comment.is_empty() {
        data.insert(format!("peercomment__idx_{}", index), comment.into());
    }
}
