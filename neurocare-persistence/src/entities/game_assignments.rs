use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "game_assignments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub patient_code: String,
    pub doctor_id: Option<Uuid>,
    pub game_name: String,
    pub status: String,
    pub assigned_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
