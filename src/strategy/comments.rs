//! Comments only: every aspect needs a written comment, no grades.

use super::{insert_ids, insert_peer_comment, keys_changed, original_entry, value_at, AssessmentStrategy, FieldErrors};
use crate::constants::ERROR_REQUIRED;
use crate::form::{AssessmentForm, FormData, FormDimension};

pub struct Comments;

impl AssessmentStrategy for Comments {
    fn name(&self) -> &'static str {
        "comments"
    }

    fn original_values(&self, form: &AssessmentForm) -> Vec<FormDimension> {
        form.fields
            .iter()
            .enumerate()
            .map(|(index, field)| {
                let mut entry = original_entry(field);
                entry
                    .values
                    .insert("peercomment".to_string(), value_at(&form.current, index, "peercomment").to_string());
                entry
            })
            .collect()
    }

    fn has_data_changed(&self, original: &[FormDimension], current: &[FormDimension]) -> bool {
        keys_changed(original, current, &["peercomment"])
    }

    fn prepare_assessment_data(
        &self,
        current: &[FormDimension],
        form: &AssessmentForm,
    ) -> Result<FormData, FieldErrors> {
        let mut data = FormData::new();
        let mut errors = FieldErrors::new();

        for (index, field) in form.fields.iter().enumerate().take(form.dimensions_count) {
            if value_at(current, index, "peercomment").is_empty() {
                errors.insert(format!("peercomment_{}", index), ERROR_REQUIRED);
            }

            insert_peer_comment(&mut data, index, current);
            insert_ids(&mut data, index, field, form);
        }

        if errors.is_empty() {
            Ok(data)
        } else {
            Err(errors)
        }
    }
}
