use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;
use uuid::Uuid;

use crate::{CognitiveDomain, GameKind, RiskFactors, RiskLevel};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum SortBy {
    #[default]
    Risk,
    Performance,
    Engagement,
    Name,
}

/// One row of the doctor's comparative analytics table.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ComparativePatient {
    pub user_id: Option<Uuid>,
    pub name: String,
    pub patient_code: String,
    pub email: Option<String>,
    pub age: Option<i32>,
    pub total_games: u32,
    pub avg_score: i32,
    pub score_variance: f64,
    pub last_activity: Option<String>,
    pub days_since_last_activity: i32,
    pub risk_score: u32,
    pub risk_level: RiskLevel,
    pub risk_factors: RiskFactors,
    pub trend: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ComparativeSummary {
    pub total: u32,
    pub high_risk: u32,
    pub medium_risk: u32,
    pub low_risk: u32,
    pub avg_score: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ComparativeAnalytics {
    pub success: bool,
    pub patients: Vec<ComparativePatient>,
    pub summary: ComparativeSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScoreHistoryPoint {
    pub date: String, // YYYY-MM-DD
    pub game: GameKind,
    pub avg_score: f64,
    pub games_played: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProgressStatistics {
    pub unique_games: u32,
    pub total_games: u32,
    pub overall_avg_score: Option<f64>,
    pub best_score: Option<f64>,
    pub lowest_score: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProgressTrend {
    pub correlation: f64,
    pub improvement: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameBreakdown {
    pub game: GameKind,
    pub attempts: u32,
    pub avg_score: f64,
    pub best_score: f64,
    pub score_variance: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProgressReport {
    pub score_history: Vec<ScoreHistoryPoint>,
    pub statistics: ProgressStatistics,
    pub trend: ProgressTrend,
    pub game_breakdown: Vec<GameBreakdown>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProgressSnapshot {
    pub id: i32,
    pub patient_code: String,
    pub snapshot_date: String, // YYYY-MM-DD
    pub average_score: f64,
    pub games_completed: i32,
    pub improvement_rate: f64,
    pub cognitive_domains: BTreeMap<String, f64>,
    pub notes: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SnapshotRequest {
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SnapshotsResponse {
    pub snapshots: Vec<ProgressSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TrendScore {
    pub game: GameKind,
    pub score: f64,
    pub played_at: String,
    pub metrics: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TrendStatistics {
    pub total_games: u32,
    pub avg_score: i32,
    pub min_score: f64,
    pub max_score: f64,
    pub score_variance: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TrendsResponse {
    pub success: bool,
    pub scores: Vec<TrendScore>,
    pub statistics: TrendStatistics,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DomainPoint {
    pub score: f64,
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DomainTrend {
    pub avg_score: i32,
    pub trend: f64,
    pub data_points: u32,
    pub scores: Vec<DomainPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DomainTrendsResponse {
    pub success: bool,
    pub domains: BTreeMap<CognitiveDomain, DomainTrend>,
}
