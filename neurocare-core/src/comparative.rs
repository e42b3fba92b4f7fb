use chrono::{DateTime, Utc};
use neurocare_types::{
    ComparativeAnalytics, ComparativePatient, ComparativeSummary, RiskLevel, SortBy,
};
use std::cmp::Ordering;
use uuid::Uuid;

use crate::stats::{round_half_up, round_to_tenth};
use crate::{RiskEngine, RiskInputs, RiskProfile, ScoreSample};

/// Reported when a patient has never played.
pub const NEVER_ACTIVE_DAYS: i32 = 999;

/// Identity of a patient in a doctor's cohort.
#[derive(Debug, Clone)]
pub struct CohortMember {
    pub user_id: Option<Uuid>,
    pub name: String,
    pub patient_code: String,
    pub email: Option<String>,
    pub age: Option<i32>,
}

/// Scores one cohort member over their full history.
pub fn analyze_member(
    member: CohortMember,
    samples: &[ScoreSample],
    now: DateTime<Utc>,
) -> ComparativePatient {
    let inputs = RiskInputs::cohort(member.age, samples);
    let breakdown = RiskEngine::score(RiskProfile::Cohort, &inputs);

    let last_activity = samples.iter().map(|s| s.recorded_at).max();
    let days_since_last_activity = last_activity
        .map(|last| (now - last).num_days() as i32)
        .unwrap_or(NEVER_ACTIVE_DAYS);

    ComparativePatient {
        user_id: member.user_id,
        name: member.name,
        patient_code: member.patient_code,
        email: member.email,
        age: member.age,
        total_games: inputs.game_count,
        avg_score: round_half_up(inputs.avg_score.unwrap_or(0.0)) as i32,
        score_variance: inputs.score_std_dev.unwrap_or(0.0),
        last_activity: last_activity.map(|t| t.to_rfc3339()),
        days_since_last_activity,
        risk_score: breakdown.score,
        risk_level: breakdown.level,
        risk_factors: breakdown.factors,
        trend: round_to_tenth(inputs.trend),
    }
}

fn compare(a: &ComparativePatient, b: &ComparativePatient, sort_by: SortBy) -> Ordering {
    match sort_by {
        SortBy::Risk => b.risk_score.cmp(&a.risk_score),
        SortBy::Performance => b.avg_score.cmp(&a.avg_score),
        SortBy::Engagement => b.total_games.cmp(&a.total_games),
        SortBy::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
    }
}

pub fn summarize(patients: &[ComparativePatient]) -> ComparativeSummary {
    let count_level = |level: RiskLevel| {
        patients.iter().filter(|p| p.risk_level == level).count() as u32
    };
    let avg_score = if patients.is_empty() {
        0
    } else {
        let sum: i64 = patients.iter().map(|p| p.avg_score as i64).sum();
        round_half_up(sum as f64 / patients.len() as f64) as i32
    };

    ComparativeSummary {
        total: patients.len() as u32,
        high_risk: count_level(RiskLevel::High),
        medium_risk: count_level(RiskLevel::Medium),
        low_risk: count_level(RiskLevel::Low),
        avg_score,
    }
}

/// Filters by level (when given), sorts, and summarizes the remaining rows.
pub fn build_comparative_analytics(
    mut patients: Vec<ComparativePatient>,
    level: Option<RiskLevel>,
    sort_by: SortBy,
) -> ComparativeAnalytics {
    if let Some(level) = level {
        patients.retain(|p| p.risk_level == level);
    }
    patients.sort_by(|a, b| compare(a, b, sort_by));

    let summary = summarize(&patients);
    ComparativeAnalytics {
        success: true,
        patients,
        summary,
    }
}
