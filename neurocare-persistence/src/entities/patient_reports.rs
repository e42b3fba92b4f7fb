use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "patient_reports")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub patient_code: String,
    pub doctor_id: Option<Uuid>,
    #[sea_orm(column_type = "Text")]
    pub report_content: String,
    pub prediction_summary: Option<Json>,
    pub generated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
