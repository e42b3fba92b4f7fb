use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use uuid::Uuid;

use crate::{GameKind, GameScore, ParseEnumError, Prediction};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Patient {
    pub patient_code: String,
    pub user_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub age: Option<i32>,
    pub sex: Option<String>,
    pub education_years: Option<i32>,
    /// Linked account details, filled in when the listing joins `users`.
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PatientsResponse {
    pub patients: Vec<Patient>,
}

/// Body of `POST /api/doctor/patients`. `email` links an existing patient account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewPatientRequest {
    pub patient_code: String,
    pub age: Option<i32>,
    pub sex: Option<String>,
    pub education_years: Option<i32>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum AssignmentStatus {
    Assigned,
    InProgress,
    Completed,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Assigned => "assigned",
            AssignmentStatus::InProgress => "in_progress",
            AssignmentStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for AssignmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssignmentStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "assigned" => Ok(AssignmentStatus::Assigned),
            "in_progress" => Ok(AssignmentStatus::InProgress),
            "completed" => Ok(AssignmentStatus::Completed),
            other => Err(ParseEnumError::new("assignment status", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct GameAssignment {
    pub id: i32,
    pub patient_code: String,
    pub game_name: GameKind,
    pub status: AssignmentStatus,
    pub assigned_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AssignGamesRequest {
    pub patient_code: String,
    pub games: Vec<GameKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AssignGamesResponse {
    pub message: String,
    pub patient_code: String,
    pub games: Vec<GameKind>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AssignedGamesResponse {
    pub patient_code: String,
    pub games: Vec<GameAssignment>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PatientScoresResponse {
    pub patient_code: String,
    pub scores: Vec<GameScore>,
    pub prediction: Option<Prediction>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CaregiverAssignmentRequest {
    pub email: String,
}

/// Progress summary shown to caregivers.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CaregiverProgress {
    pub patient_code: String,
    pub completed_games: u32,
    pub total_games: u32,
    pub average_score: f64,
    pub last_activity: Option<String>,
}
