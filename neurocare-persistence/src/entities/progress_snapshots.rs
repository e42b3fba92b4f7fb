use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "progress_snapshots")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub patient_code: String,
    pub snapshot_date: Date,
    #[sea_orm(column_type = "Double")]
    pub average_score: f64,
    pub games_completed: i32,
    #[sea_orm(column_type = "Double")]
    pub improvement_rate: f64,
    /// Game name to mean score for the week.
    pub cognitive_domains: Json,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
