use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};

use crate::entities::{game_scores, prelude::*};
use neurocare_core::ScoreSample;
use neurocare_types::{GameKind, GameScore};

pub struct ScoreRepository {
    db: DatabaseConnection,
}

#[derive(Debug, Clone)]
pub struct NewScore {
    pub patient_code: String,
    pub session_id: Option<String>,
    pub game: GameKind,
    pub level: Option<i32>,
    pub attempt: i32,
    pub score: f64,
    pub metrics: Option<serde_json::Value>,
    pub timestamp_start: Option<String>,
    pub timestamp_end: Option<String>,
    pub device: Option<String>,
}

impl ScoreRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_score(model: game_scores::Model) -> Result<GameScore> {
        Ok(GameScore {
            id: model.id,
            patient_code: model.patient_code,
            session_id: model.session_id,
            game: model.game.parse()?,
            level: model.level,
            attempt: model.attempt,
            score: model.score,
            metrics: model.metrics,
            timestamp_start: model.timestamp_start,
            timestamp_end: model.timestamp_end,
            device: model.device,
            created_at: model.created_at.to_rfc3339(),
        })
    }

    fn model_to_sample(model: game_scores::Model) -> Result<ScoreSample> {
        let mut sample = ScoreSample::new(
            model.game.parse()?,
            model.score,
            model.created_at.with_timezone(&Utc),
        );
        sample.level = model.level;
        Ok(sample)
    }

    /// Stores one game result and returns its id.
    pub async fn record_score(&self, score: NewScore) -> Result<i32> {
        let model = game_scores::ActiveModel {
            patient_code: ActiveValue::Set(score.patient_code),
            session_id: ActiveValue::Set(score.session_id),
            game: ActiveValue::Set(score.game.as_str().to_string()),
            level: ActiveValue::Set(score.level),
            attempt: ActiveValue::Set(score.attempt),
            score: ActiveValue::Set(score.score),
            metrics: ActiveValue::Set(score.metrics),
            timestamp_start: ActiveValue::Set(score.timestamp_start),
            timestamp_end: ActiveValue::Set(score.timestamp_end),
            device: ActiveValue::Set(score.device),
            created_at: ActiveValue::Set(super::now()),
            ..Default::default()
        };

        let result = GameScores::insert(model).exec(&self.db).await?;
        Ok(result.last_insert_id)
    }

    /// Every score for the patient, newest first.
    pub async fn list_for_patient(&self, patient_code: &str) -> Result<Vec<GameScore>> {
        GameScores::find()
            .filter(game_scores::Column::PatientCode.eq(patient_code))
            .order_by_desc(game_scores::Column::CreatedAt)
            .order_by_desc(game_scores::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Self::model_to_score)
            .collect()
    }

    /// Scores recorded at or after `start`, oldest first.
    pub async fn list_since(
        &self,
        patient_code: &str,
        start: DateTime<Utc>,
    ) -> Result<Vec<GameScore>> {
        GameScores::find()
            .filter(game_scores::Column::PatientCode.eq(patient_code))
            .filter(game_scores::Column::CreatedAt.gte(start.fixed_offset()))
            .order_by_asc(game_scores::Column::CreatedAt)
            .order_by_asc(game_scores::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Self::model_to_score)
            .collect()
    }

    /// The patient's full history as analytic samples, oldest first.
    pub async fn samples_for_patient(&self, patient_code: &str) -> Result<Vec<ScoreSample>> {
        GameScores::find()
            .filter(game_scores::Column::PatientCode.eq(patient_code))
            .order_by_asc(game_scores::Column::CreatedAt)
            .order_by_asc(game_scores::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Self::model_to_sample)
            .collect()
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(GameScores::find().count(&self.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_to_memory_database;
    use crate::{NewPatient, PatientRepository};
    use migration::{Migrator, MigratorTrait};

    async fn setup_test_db() -> ScoreRepository {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        PatientRepository::new(db.clone())
            .create_patient(NewPatient {
                patient_code: "1001".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        ScoreRepository::new(db)
    }

    fn new_score(game: GameKind, score: f64) -> NewScore {
        NewScore {
            patient_code: "1001".to_string(),
            session_id: Some("session-1".to_string()),
            game,
            level: Some(2),
            attempt: 1,
            score,
            metrics: Some(serde_json::json!({"accuracy": 0.9})),
            timestamp_start: None,
            timestamp_end: None,
            device: Some("tablet".to_string()),
        }
    }

    #[tokio::test]
    async fn test_record_and_list_scores() {
        let repo = setup_test_db().await;

        let first = repo.record_score(new_score(GameKind::NBack, 55.0)).await.unwrap();
        let second = repo
            .record_score(new_score(GameKind::StroopTest, 80.5))
            .await
            .unwrap();
        assert!(second > first);

        let scores = repo.list_for_patient("1001").await.unwrap();
        assert_eq!(scores.len(), 2);
        assert_eq!(scores[0].id, second);
        assert_eq!(scores[0].game, GameKind::StroopTest);
        assert_eq!(scores[0].metrics, Some(serde_json::json!({"accuracy": 0.9})));

        let samples = repo.samples_for_patient("1001").await.unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].game, GameKind::NBack);
        assert_eq!(samples[0].level, Some(2));

        let recent = repo
            .list_since("1001", Utc::now() - chrono::Duration::days(1))
            .await
            .unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, first);

        assert_eq!(repo.count().await.unwrap(), 2);
        assert!(repo.list_for_patient("9999").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_patient_rejected() {
        let repo = setup_test_db().await;
        let mut orphan = new_score(GameKind::NBack, 10.0);
        orphan.patient_code = "missing".to_string();
        assert!(repo.record_score(orphan).await.is_err());
    }
}
