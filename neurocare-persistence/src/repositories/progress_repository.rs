use anyhow::Result;
use chrono::NaiveDate;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};

use crate::entities::{prelude::*, progress_snapshots};
use neurocare_core::SnapshotMetrics;
use neurocare_types::ProgressSnapshot;

pub struct ProgressRepository {
    db: DatabaseConnection,
}

impl ProgressRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_snapshot(model: progress_snapshots::Model) -> Result<ProgressSnapshot> {
        Ok(ProgressSnapshot {
            id: model.id,
            patient_code: model.patient_code,
            snapshot_date: model.snapshot_date.to_string(),
            average_score: model.average_score,
            games_completed: model.games_completed,
            improvement_rate: model.improvement_rate,
            cognitive_domains: serde_json::from_value(model.cognitive_domains)?,
            notes: model.notes.unwrap_or_default(),
            created_at: model.created_at.to_rfc3339(),
        })
    }

    /// Writes the snapshot for `date`, replacing one taken earlier that day.
    pub async fn upsert_snapshot(
        &self,
        patient_code: &str,
        date: NaiveDate,
        metrics: &SnapshotMetrics,
        notes: Option<String>,
    ) -> Result<ProgressSnapshot> {
        let model = progress_snapshots::ActiveModel {
            patient_code: ActiveValue::Set(patient_code.to_string()),
            snapshot_date: ActiveValue::Set(date),
            average_score: ActiveValue::Set(metrics.average_score),
            games_completed: ActiveValue::Set(metrics.games_completed),
            improvement_rate: ActiveValue::Set(metrics.improvement_rate),
            cognitive_domains: ActiveValue::Set(serde_json::to_value(&metrics.cognitive_domains)?),
            notes: ActiveValue::Set(notes),
            created_at: ActiveValue::Set(super::now()),
            ..Default::default()
        };

        ProgressSnapshots::insert(model)
            .on_conflict(
                OnConflict::columns([
                    progress_snapshots::Column::PatientCode,
                    progress_snapshots::Column::SnapshotDate,
                ])
                .update_columns([
                    progress_snapshots::Column::AverageScore,
                    progress_snapshots::Column::GamesCompleted,
                    progress_snapshots::Column::ImprovementRate,
                    progress_snapshots::Column::CognitiveDomains,
                    progress_snapshots::Column::Notes,
                    progress_snapshots::Column::CreatedAt,
                ])
                .to_owned(),
            )
            .exec(&self.db)
            .await?;

        let saved = ProgressSnapshots::find()
            .filter(progress_snapshots::Column::PatientCode.eq(patient_code))
            .filter(progress_snapshots::Column::SnapshotDate.eq(date))
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve saved snapshot"))?;
        Self::model_to_snapshot(saved)
    }

    /// Newest first.
    pub async fn list_snapshots(&self, patient_code: &str, limit: u64) -> Result<Vec<ProgressSnapshot>> {
        ProgressSnapshots::find()
            .filter(progress_snapshots::Column::PatientCode.eq(patient_code))
            .order_by_desc(progress_snapshots::Column::SnapshotDate)
            .limit(limit)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Self::model_to_snapshot)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_to_memory_database;
    use crate::{NewPatient, PatientRepository};
    use migration::{Migrator, MigratorTrait};
    use std::collections::BTreeMap;

    async fn setup_test_db() -> ProgressRepository {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        PatientRepository::new(db.clone())
            .create_patient(NewPatient {
                patient_code: "1001".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        ProgressRepository::new(db)
    }

    fn metrics(average: f64) -> SnapshotMetrics {
        SnapshotMetrics {
            average_score: average,
            games_completed: 4,
            improvement_rate: 12.5,
            cognitive_domains: BTreeMap::from([("n_back".to_string(), average)]),
        }
    }

    #[tokio::test]
    async fn test_snapshot_upsert_per_day() {
        let repo = setup_test_db().await;
        let monday = NaiveDate::from_ymd_opt(2024, 6, 3).unwrap();
        let tuesday = NaiveDate::from_ymd_opt(2024, 6, 4).unwrap();

        repo.upsert_snapshot("1001", monday, &metrics(50.0), None)
            .await
            .unwrap();
        let replaced = repo
            .upsert_snapshot("1001", monday, &metrics(60.0), Some("after review".to_string()))
            .await
            .unwrap();
        assert_eq!(replaced.average_score, 60.0);
        assert_eq!(replaced.notes, "after review");
        assert_eq!(replaced.cognitive_domains.get("n_back"), Some(&60.0));

        repo.upsert_snapshot("1001", tuesday, &metrics(70.0), None)
            .await
            .unwrap();

        let snapshots = repo.list_snapshots("1001", 90).await.unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].snapshot_date, "2024-06-04");
        assert_eq!(snapshots[0].notes, "");
        assert_eq!(repo.list_snapshots("1001", 1).await.unwrap().len(), 1);
    }
}
