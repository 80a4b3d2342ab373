//! Number of errors: each assertion is marked passed (1) or failed (-1).

use super::{insert_ids, insert_peer_comment, int_at, keys_changed, original_entry, value_at, AssessmentStrategy, FieldErrors};
use crate::constants::ERROR_REQUIRED_CHOICE;
use crate::form::{AssessmentForm, FormData, FormDimension};

pub struct NumErrors;

impl AssessmentStrategy for NumErrors {
    fn name(&self) -> &'static str {
        "numerrors"
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
                let grade = int_at(&form.current, index, "grade")
                    .map(|grade| grade.to_string())
                    .unwrap_or_default();
                entry.values.insert("grade".to_string(), grade);
                entry
            })
            .collect()
    }

    fn has_data_changed(&self, original: &[FormDimension], current: &[FormDimension]) -> bool {
        keys_changed(original, current, &["grade", "peercomment"])
    }

    fn prepare_assessment_data(
        &self,
        current: &[FormDimension],
        form: &AssessmentForm,
    ) -> Result<FormData, FieldErrors> {
        let mut data = FormData::new();
        let mut errors = FieldErrors::new();

        for (index, field) in form.fields.iter().enumerate().take(form.dimensions_count) {
            match int_at(current, index, "grade") {
                Some(grade @ (1 | -1)) => {
                    data.insert(format!("grade__idx_{}", index), grade.into());
                }
                _ => errors.insert(format!("grade_{}", index), ERROR_REQUIRED_CHOICE),
            }

            insert_peer_comment(&mut data, index, current);
            insert_ids(&mut data, index, field, form);
            data.insert(
                format!("weight__idx_{}", index),
                field.get_i64("weight").unwrap_or(0).into(),
            );
        }

        if errors.is_empty() {
            Ok(data)
        } else {
            Err(errors)
        }
    }
}
