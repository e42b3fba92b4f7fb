use sea_orm_migration::prelude::*;

use crate::m20240101_000001_create_users_table::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Patients::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Patients::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Patients::PatientCode)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Patients::UserId).uuid().null())
                    .col(ColumnDef::new(Patients::DoctorId).uuid().null())
                    .col(ColumnDef::new(Patients::Age).integer().null())
                    .col(ColumnDef::new(Patients::Sex).string().null())
                    .col(ColumnDef::new(Patients::EducationYears).integer().null())
                    .col(
                        ColumnDef::new(Patients::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_patients_user")
                            .from(Patients::Table, Patients::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_patients_doctor")
                            .from(Patients::Table, Patients::DoctorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_patients_doctor")
                    .table(Patients::Table)
                    .col(Patients::DoctorId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CaregiverAssignments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CaregiverAssignments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(CaregiverAssignments::CaregiverId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CaregiverAssignments::PatientCode)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CaregiverAssignments::AssignedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_caregiver_assignments_caregiver")
                            .from(
                                CaregiverAssignments::Table,
                                CaregiverAssignments::CaregiverId,
                            )
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_caregiver_assignments_patient")
                            .from(
                                CaregiverAssignments::Table,
                                CaregiverAssignments::PatientCode,
                            )
                            .to(Patients::Table, Patients::PatientCode)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_caregiver_assignments_pair")
                    .table(CaregiverAssignments::Table)
                    .col(CaregiverAssignments::CaregiverId)
                    .col(CaregiverAssignments::PatientCode)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GameAssignments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GameAssignments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GameAssignments::PatientCode)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(GameAssignments::DoctorId).uuid().null())
                    .col(ColumnDef::new(GameAssignments::GameName).string().not_null())
                    .col(
                        ColumnDef::new(GameAssignments::Status)
                            .string()
                            .not_null()
                            .default("assigned"),
                    )
                    .col(
                        ColumnDef::new(GameAssignments::AssignedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_assignments_patient")
                            .from(GameAssignments::Table, GameAssignments::PatientCode)
                            .to(Patients::Table, Patients::PatientCode)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_assignments_doctor")
                            .from(GameAssignments::Table, GameAssignments::DoctorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_game_assignments_patient")
                    .table(GameAssignments::Table)
                    .col(GameAssignments::PatientCode)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GameAssignments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CaregiverAssignments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Patients::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Patients {
    Table,
    Id,
    PatientCode,
    UserId,
    DoctorId,
    Age,
    Sex,
    EducationYears,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CaregiverAssignments {
    Table,
    Id,
    CaregiverId,
    PatientCode,
    AssignedAt,
}

#[derive(DeriveIden)]
enum GameAssignments {
    Table,
    Id,
    PatientCode,
    DoctorId,
    GameName,
    Status,
    AssignedAt,
}
