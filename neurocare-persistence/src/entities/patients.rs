use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "patients")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub patient_code: String,
    /// The patient's own login, when one is linked.
    pub user_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub age: Option<i32>,
    pub sex: Option<String>,
    pub education_years: Option<i32>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id"
    )]
    Account,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::DoctorId",
        to = "super::users::Column::Id"
    )]
    Doctor,
    #[sea_orm(has_many = "super::game_scores::Entity")]
    GameScores,
}

impl Related<super::game_scores::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GameScores.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
