//! Assessment form definitions.
//!
//! `mod_workshop_get_assessment_form_definition` returns form fields as a flat
//! list of `name__idx_N` (per dimension) and `name__idx_N__idy_M` (per level
//! inside a dimension) entries. [`parse_form_fields`] groups them back into
//! dimensions.

use log::warn;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::MAX_FORM_INDEX;

/// Prepared form data sent to `mod_workshop_update_assessment`
pub type FormData = serde_json::Map<String, serde_json::Value>;

/// Raw `name`/`value` pair as returned by the web service
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub name: String,
    #[serde(default)]
    pub value: String,
}

/// Values of one dimension (or one level inside a dimension)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FormDimension {
    /// 1-based position
    pub number: usize,
    pub values: BTreeMap<String, String>,
    pub levels: Vec<FormDimension>,
}

impl FormDimension {
    fn new(number: usize) -> Self {
        Self {
            number,
            ..Default::default()
        }
    }

    /// Value of a field in this dimension
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Integer value of a field, `None` if missing or not a number
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|value| value.trim().parse().ok())
    }
}

/// Per-dimension metadata
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionInfo {
    pub id: i64,
    #[serde(default)]
    pub min: f64,
    #[serde(default)]
    pub max: f64,
    #[serde(default)]
    pub weight: Option<i64>,
    #[serde(default)]
    pub scale: Option<String>,
}

/// Parsed assessment form
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AssessmentForm {
    pub dimensions_count: usize,
    pub dimensions_info: Vec<DimensionInfo>,
    pub fields: Vec<FormDimension>,
    pub current: Vec<FormDimension>,
    pub options: BTreeMap<String, String>,
}

/// Split `grade__idx_3__idy_1` into (`grade`, 3, Some(1))
fn split_field_name(name: &str) -> Option<(&str, usize, Option<usize>)> {
    let (base, rest) = name.split_once("__idx_")?;
    match rest.split_once("__idy_") {
        Some((idx, idy)) => Some((base, idx.parse().ok()?, Some(idy.parse().ok()?))),
        None => Some((base, rest.parse().ok()?, None)),
    }
}

fn slot(list: &mut Vec<FormDimension>, index: usize) -> &mut FormDimension {
    while list.len() <= index {
        let number = list.len() + 1;
        list.push(FormDimension::new(number));
    }
    &mut list[index]
}

/// Group a flat field list into dimensions
///
/// Fields without a numeric `__idx_` suffix are ignored, as are indexes
/// above [`MAX_FORM_INDEX`].
pub fn parse_form_fields(fields: &[FormField]) -> Vec<FormDimension> {
    let mut parsed: Vec<FormDimension> = Vec::new();

    for field in fields {
        let Some((name, idx, idy)) = split_field_name(&field.name) else {
            continue;
        };
        if idx > MAX_FORM_INDEX || idy.is_some_and(|idy| idy > MAX_FORM_INDEX) {
            warn!("⚠️  Ignoring form field '{}': index out of range", field.name);
            continue;
        }

        let dimension = slot(&mut parsed, idx);
        match idy {
            Some(idy) => {
                slot(&mut dimension.levels, idy)
                    .values
                    .insert(name.to_string(), field.value.clone());
            }
            None => {
                dimension.values.insert(name.to_string(), field.value.clone());
            }
        }
    }

    parsed
}
