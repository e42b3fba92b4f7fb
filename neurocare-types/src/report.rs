use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PatientReport {
    pub id: i32,
    pub patient_code: String,
    pub doctor_id: Option<Uuid>,
    pub report_content: String,
    pub generated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GeneratedReport {
    pub message: String,
    pub report_id: i32,
    pub report_content: String,
    pub generated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReportsResponse {
    pub reports: Vec<PatientReport>,
}
