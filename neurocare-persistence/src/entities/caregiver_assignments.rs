use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "caregiver_assignments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub caregiver_id: Uuid,
    pub patient_code: String,
    pub assigned_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CaregiverId",
        to = "super::users::Column::Id"
    )]
    Caregiver,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Caregiver.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
