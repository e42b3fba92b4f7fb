#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use neurocare_core::{CohortMember, ScoreSample};
use neurocare_types::GameKind;

/// Fixed clock so window boundaries are deterministic.
pub fn test_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 30, 15, 0, 0).unwrap()
}

pub fn score_days_ago(game: GameKind, score: f64, days_ago: i64) -> ScoreSample {
    ScoreSample::new(game, score, test_now() - Duration::days(days_ago))
}

/// One game per day for `days` days ending today, scores rising from `start`
/// by `step` each day.
pub fn daily_history(game: GameKind, days: i64, start: f64, step: f64) -> Vec<ScoreSample> {
    (0..days)
        .map(|i| score_days_ago(game, start + step * i as f64, days - 1 - i))
        .collect()
}

/// A struggling patient: falling scores with large swings over the last month.
pub fn declining_history() -> Vec<ScoreSample> {
    (0..20)
        .map(|i| {
            let swing = if i % 2 == 0 { 20.0 } else { -20.0 };
            score_days_ago(GameKind::MemoryMatch, 60.0 - i as f64 * 2.0 + swing, 19 - i)
        })
        .collect()
}

pub fn create_test_member(name: &str, code: &str, age: Option<i32>) -> CohortMember {
    CohortMember {
        user_id: None,
        name: name.to_string(),
        patient_code: code.to_string(),
        email: Some(format!("{}@example.com", name.to_lowercase())),
        age,
    }
}
