use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "workshop_evaluate_assessments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub workshop_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub assessment_id: i64,
    pub course_id: i64,
    #[sea_orm(column_type = "Text")]
    pub feedback_text: String,
    pub weight: i32,
    pub grading_grade_over: Option<String>,
    pub time_modified: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
