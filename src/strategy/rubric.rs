//! Rubric: one level chosen per criterion.

use super::{insert_ids, int_at, keys_changed, original_entry, value_at, AssessmentStrategy, FieldErrors};
use crate::constants::ERROR_MUST_CHOOSE_ONE;
use crate::form::{AssessmentForm, FormData, FormDimension};

pub struct Rubric;

impl AssessmentStrategy for Rubric {
    fn name(&self) -> &'static str {
        "rubric"
    }

    fn original_values(&self, form: &AssessmentForm) -> Vec<FormDimension> {
        form.fields
            .iter()
            .enumerate()
            .map(|(index, field)| {
                let mut entry = original_entry(field);
                entry.values.insert(
                    "chosenlevelid".to_string(),
                    value_at(&form.current, index, "chosenlevelid").to_string(),
                );
                entry
            })
            .collect()
    }

    fn has_data_changed(&self, original: &[FormDimension], current: &[FormDimension]) -> bool {
        keys_changed(original, current, &["chosenlevelid"])
    }

    fn prepare_assessment_data(
        &self,
        current: &[FormDimension],
        form: &AssessmentForm,
    ) -> Result<FormData, FieldErrors> {
        let mut data = FormData::new();
        let mut errors = FieldErrors::new();

        for (index, field) in form.fields.iter().enumerate().take(form.dimensions_count) {
            match int_at(current, index, "chosenlevelid") {
                Some(level_id) if level_id >= 0 => {
                    data.insert(format!("chosenlevelid__idx_{}", index), level_id.into());
                }
                _ => errors.insert(format!("chosenlevelid_{}", index), ERROR_MUST_CHOOSE_ONE),
            }

            insert_ids(&mut data, index, field, form);
        }

        if errors.is_empty() {
            Ok(data)
        } else {
            Err(errors)
        }
    }
}
