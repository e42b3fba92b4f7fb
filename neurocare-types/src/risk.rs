use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::ParseEnumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(RiskLevel::Low),
            "Medium" => Ok(RiskLevel::Medium),
            "High" => Ok(RiskLevel::High),
            other => Err(ParseEnumError::new("risk level", other)),
        }
    }
}

/// How much data backs an assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Per-factor risk values, each 0-100.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RiskFactors {
    pub age: u32,
    pub performance: u32,
    pub variability: u32,
    pub decline: u32,
    pub engagement: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CurrentRisk {
    pub score: u32,
    pub level: RiskLevel,
    pub confidence: Confidence,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RiskProjection {
    pub score: u32,
    pub level: RiskLevel,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RiskProjections {
    pub six_month: RiskProjection,
    pub one_year: RiskProjection,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RiskAssessment {
    pub patient_code: String,
    pub current_risk: CurrentRisk,
    pub risk_factors: RiskFactors,
    pub projections: RiskProjections,
    pub recommendations: Vec<String>,
    pub assessment_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Prediction {
    pub id: i32,
    pub patient_code: String,
    pub model_version: Option<String>,
    pub risk_label: String,
    pub risk_probability: f64,
    pub input_summary: Option<serde_json::Value>,
    pub computed_at: String,
}

/// Body of `POST /api/predictions`; `patient_id` carries the patient code.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PredictionRequest {
    pub patient_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RiskHistoryResponse {
    pub history: Vec<Prediction>,
}
