use sea_orm_migration::prelude::*;

use crate::m20240101_000001_create_users_table::Users;
use crate::m20240101_000002_create_patients_tables::Patients;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GameScores::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GameScores::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GameScores::PatientCode).string().not_null())
                    .col(ColumnDef::new(GameScores::SessionId).string().null())
                    .col(ColumnDef::new(GameScores::Game).string().not_null())
                    .col(ColumnDef::new(GameScores::Level).integer().null())
                    .col(
                        ColumnDef::new(GameScores::Attempt)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(ColumnDef::new(GameScores::Score).double().not_null())
                    .col(ColumnDef::new(GameScores::Metrics).json().null())
                    .col(ColumnDef::new(GameScores::TimestampStart).string().null())
                    .col(ColumnDef::new(GameScores::TimestampEnd).string().null())
                    .col(ColumnDef::new(GameScores::Device).string().null())
                    .col(
                        ColumnDef::new(GameScores::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_game_scores_patient")
                            .from(GameScores::Table, GameScores::PatientCode)
                            .to(Patients::Table, Patients::PatientCode)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Every analytic reads one patient's scores in time order
        manager
            .create_index(
                Index::create()
                    .name("idx_game_scores_patient_created")
                    .table(GameScores::Table)
                    .col(GameScores::PatientCode)
                    .col(GameScores::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Predictions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Predictions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Predictions::PatientCode).string().not_null())
                    .col(ColumnDef::new(Predictions::ModelVersion).string().null())
                    .col(ColumnDef::new(Predictions::RiskLabel).string().not_null())
                    .col(
                        ColumnDef::new(Predictions::RiskProbability)
                            .double()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Predictions::InputSummary).json().null())
                    .col(
                        ColumnDef::new(Predictions::ComputedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_predictions_patient")
                            .from(Predictions::Table, Predictions::PatientCode)
                            .to(Patients::Table, Patients::PatientCode)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PatientReports::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PatientReports::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PatientReports::PatientCode)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PatientReports::DoctorId).uuid().null())
                    .col(
                        ColumnDef::new(PatientReports::ReportContent)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PatientReports::PredictionSummary)
                            .json()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PatientReports::GeneratedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_patient_reports_patient")
                            .from(PatientReports::Table, PatientReports::PatientCode)
                            .to(Patients::Table, Patients::PatientCode)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_patient_reports_doctor")
                            .from(PatientReports::Table, PatientReports::DoctorId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProgressSnapshots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProgressSnapshots::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProgressSnapshots::PatientCode)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProgressSnapshots::SnapshotDate)
                            .date()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProgressSnapshots::AverageScore)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(ProgressSnapshots::GamesCompleted)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ProgressSnapshots::ImprovementRate)
                            .double()
                            .not_null()
                            .default(0.0),
                    )
                    .col(
                        ColumnDef::new(ProgressSnapshots::CognitiveDomains)
                            .json()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProgressSnapshots::Notes).text().null())
                    .col(
                        ColumnDef::new(ProgressSnapshots::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_progress_snapshots_patient")
                            .from(ProgressSnapshots::Table, ProgressSnapshots::PatientCode)
                            .to(Patients::Table, Patients::PatientCode)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One snapshot per patient per day
        manager
            .create_index(
                Index::create()
                    .name("idx_progress_snapshots_patient_date")
                    .table(ProgressSnapshots::Table)
                    .col(ProgressSnapshots::PatientCode)
                    .col(ProgressSnapshots::SnapshotDate)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProgressSnapshots::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PatientReports::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Predictions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(GameScores::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum GameScores {
    Table,
    Id,
    PatientCode,
    SessionId,
    Game,
    Level,
    Attempt,
    Score,
    Metrics,
    TimestampStart,
    TimestampEnd,
    Device,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Predictions {
    Table,
    Id,
    PatientCode,
    ModelVersion,
    RiskLabel,
    RiskProbability,
    InputSummary,
    ComputedAt,
}

#[derive(DeriveIden)]
enum PatientReports {
    Table,
    Id,
    PatientCode,
    DoctorId,
    ReportContent,
    PredictionSummary,
    GeneratedAt,
}

#[derive(DeriveIden)]
enum ProgressSnapshots {
    Table,
    Id,
    PatientCode,
    SnapshotDate,
    AverageScore,
    GamesCompleted,
    ImprovementRate,
    CognitiveDomains,
    Notes,
    CreatedAt,
}
