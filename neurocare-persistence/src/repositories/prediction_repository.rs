use anyhow::Result;
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect,
};

use crate::entities::{predictions, prelude::*};
use neurocare_types::Prediction;

pub struct PredictionRepository {
    db: DatabaseConnection,
}

#[derive(Debug, Clone)]
pub struct NewPrediction {
    pub patient_code: String,
    pub model_version: String,
    pub risk_label: String,
    pub risk_probability: f64,
    pub input_summary: Option<serde_json::Value>,
}

impl PredictionRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_prediction(model: predictions::Model) -> Prediction {
        Prediction {
            id: model.id,
            patient_code: model.patient_code,
            model_version: model.model_version,
            risk_label: model.risk_label,
            risk_probability: model.risk_probability,
            input_summary: model.input_summary,
            computed_at: model.computed_at.to_rfc3339(),
        }
    }

    pub async fn record(&self, prediction: NewPrediction) -> Result<Prediction> {
        let model = predictions::ActiveModel {
            patient_code: ActiveValue::Set(prediction.patient_code),
            model_version: ActiveValue::Set(Some(prediction.model_version)),
            risk_label: ActiveValue::Set(prediction.risk_label),
            risk_probability: ActiveValue::Set(prediction.risk_probability),
            input_summary: ActiveValue::Set(prediction.input_summary),
            computed_at: ActiveValue::Set(super::now()),
            ..Default::default()
        };
        let result = Predictions::insert(model).exec(&self.db).await?;

        let saved = Predictions::find_by_id(result.last_insert_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created prediction"))?;
        Ok(Self::model_to_prediction(saved))
    }

    pub async fn latest(&self, patient_code: &str) -> Result<Option<Prediction>> {
        Ok(self.history(patient_code, 1).await?.pop())
    }

    /// Most recent first.
    pub async fn history(&self, patient_code: &str, limit: u64) -> Result<Vec<Prediction>> {
        let models = Predictions::find()
            .filter(predictions::Column::PatientCode.eq(patient_code))
            .order_by_desc(predictions::Column::ComputedAt)
            .order_by_desc(predictions::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Self::model_to_prediction).collect())
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(Predictions::find().count(&self.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_to_memory_database;
    use crate::{NewPatient, PatientRepository};
    use migration::{Migrator, MigratorTrait};

    async fn setup_test_db() -> PredictionRepository {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        PatientRepository::new(db.clone())
            .create_patient(NewPatient {
                patient_code: "1001".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        PredictionRepository::new(db)
    }

    fn new_prediction(label: &str, probability: f64) -> NewPrediction {
        NewPrediction {
            patient_code: "1001".to_string(),
            model_version: "heuristic-risk-v1".to_string(),
            risk_label: label.to_string(),
            risk_probability: probability,
            input_summary: Some(serde_json::json!({"age": 50})),
        }
    }

    #[tokio::test]
    async fn test_record_and_history() {
        let repo = setup_test_db().await;
        assert!(repo.latest("1001").await.unwrap().is_none());

        let first = repo.record(new_prediction("Low", 0.21)).await.unwrap();
        assert_eq!(first.model_version.as_deref(), Some("heuristic-risk-v1"));
        let second = repo.record(new_prediction("High", 0.74)).await.unwrap();

        let latest = repo.latest("1001").await.unwrap().unwrap();
        assert_eq!(latest.id, second.id);
        assert_eq!(latest.risk_label, "High");

        let history = repo.history("1001", 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[1].id, first.id);
        assert_eq!(repo.history("1001", 1).await.unwrap().len(), 1);
        assert_eq!(repo.count().await.unwrap(), 2);
    }
}
