use anyhow::Result;
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder,
};
use uuid::Uuid;

use crate::entities::{patient_reports, prelude::*};
use neurocare_types::PatientReport;

pub struct ReportRepository {
    db: DatabaseConnection,
}

impl ReportRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_report(model: patient_reports::Model) -> PatientReport {
        PatientReport {
            id: model.id,
            patient_code: model.patient_code,
            doctor_id: model.doctor_id,
            report_content: model.report_content,
            generated_at: model.generated_at.to_rfc3339(),
        }
    }

    pub async fn create_report(
        &self,
        patient_code: &str,
        doctor_id: Uuid,
        report_content: String,
        prediction_summary: Option<serde_json::Value>,
    ) -> Result<PatientReport> {
        let model = patient_reports::ActiveModel {
            patient_code: ActiveValue::Set(patient_code.to_string()),
            doctor_id: ActiveValue::Set(Some(doctor_id)),
            report_content: ActiveValue::Set(report_content),
            prediction_summary: ActiveValue::Set(prediction_summary),
            generated_at: ActiveValue::Set(super::now()),
            ..Default::default()
        };
        let result = PatientReports::insert(model).exec(&self.db).await?;

        let saved = PatientReports::find_by_id(result.last_insert_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created report"))?;
        Ok(Self::model_to_report(saved))
    }

    /// Newest first.
    pub async fn list_for_patient(&self, patient_code: &str) -> Result<Vec<PatientReport>> {
        let models = PatientReports::find()
            .filter(patient_reports::Column::PatientCode.eq(patient_code))
            .order_by_desc(patient_reports::Column::GeneratedAt)
            .order_by_desc(patient_reports::Column::Id)
            .all(&self.db)
            .await?;
        Ok(models.into_iter().map(Self::model_to_report).collect())
    }

    pub async fn latest(&self, patient_code: &str) -> Result<Option<PatientReport>> {
        let model = PatientReports::find()
            .filter(patient_reports::Column::PatientCode.eq(patient_code))
            .order_by_desc(patient_reports::Column::GeneratedAt)
            .order_by_desc(patient_reports::Column::Id)
            .one(&self.db)
            .await?;
        Ok(model.map(Self::model_to_report))
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(PatientReports::find().count(&self.db).await?)
    }
}
