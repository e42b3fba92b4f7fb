use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "game_scores")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub patient_code: String,
    pub session_id: Option<String>,
    pub game: String,
    pub level: Option<i32>,
    pub attempt: i32,
    #[sea_orm(column_type = "Double")]
    pub score: f64,
    pub metrics: Option<Json>,
    pub timestamp_start: Option<String>,
    pub timestamp_end: Option<String>,
    pub device: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::patients::Entity",
        from = "Column::PatientCode",
        to = "super::patients::Column::PatientCode"
    )]
    Patient,
}

impl Related<super::patients::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Patient.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
