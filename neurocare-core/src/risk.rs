//! Heuristic cognitive-decline risk scoring.
//!
//! Five signals (age, average performance, score variability, trend and
//! engagement) are each bucketed into a 0-100 risk value, combined with fixed
//! weights and thresholded into Low/Medium/High.

use chrono::{DateTime, Utc};
use neurocare_types::{
    Confidence, CurrentRisk, RiskAssessment, RiskFactors, RiskLevel, RiskProjection,
    RiskProjections,
};

use crate::stats::{daily_trend_correlation, mean, percent_change, round_half_up, sample_std_dev};
use crate::{ScoreSample, scores_of, since, window_start};

pub const AGE_WEIGHT: f64 = 0.25;
pub const PERFORMANCE_WEIGHT: f64 = 0.30;
pub const VARIABILITY_WEIGHT: f64 = 0.15;
pub const DECLINE_WEIGHT: f64 = 0.25;
pub const ENGAGEMENT_WEIGHT: f64 = 0.05;

pub const HIGH_RISK_THRESHOLD: u32 = 70;
pub const MEDIUM_RISK_THRESHOLD: u32 = 40;

/// Days of scores feeding average, variability and engagement.
pub const ASSESSMENT_WINDOW_DAYS: u32 = 30;
/// Days of scores feeding the trajectory correlation.
pub const TREND_WINDOW_DAYS: u32 = 90;
/// Games compared at each end of the history for the cohort trend.
pub const COHORT_TREND_GAMES: usize = 5;

pub const MODEL_VERSION: &str = "heuristic-risk-v1";

/// Bucket tables. `Individual` drives a single patient's assessment;
/// `Cohort` ranks all of a doctor's patients against each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskProfile {
    Individual,
    Cohort,
}

/// Raw signals before bucketing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RiskInputs {
    pub age: Option<i32>,
    pub avg_score: Option<f64>,
    pub score_std_dev: Option<f64>,
    /// Correlation in [-1, 1] for `Individual`, percent change for `Cohort`.
    pub trend: f64,
    pub game_count: u32,
}

impl RiskInputs {
    /// Signals for a single assessment: averages over the last 30 days, trend
    /// over the last 90.
    pub fn individual(age: Option<i32>, samples: &[ScoreSample], now: DateTime<Utc>) -> Self {
        let recent = scores_of(since(samples, window_start(now, ASSESSMENT_WINDOW_DAYS)));
        let trend = daily_trend_correlation(since(samples, window_start(now, TREND_WINDOW_DAYS)));

        Self {
            age,
            avg_score: mean(&recent),
            score_std_dev: sample_std_dev(&recent),
            trend,
            game_count: recent.len() as u32,
        }
    }

    /// All-time signals used for cohort comparison. The trend compares the
    /// five most recent games with the five earliest.
    pub fn cohort(age: Option<i32>, samples: &[ScoreSample]) -> Self {
        let mut ordered: Vec<&ScoreSample> = samples.iter().collect();
        ordered.sort_by_key(|s| s.recorded_at);
        let scores = scores_of(ordered.iter().copied());

        let trend = if scores.len() >= COHORT_TREND_GAMES {
            let initial = mean(&scores[..COHORT_TREND_GAMES]);
            let recent = mean(&scores[scores.len() - COHORT_TREND_GAMES..]);
            match (initial, recent) {
                (Some(initial), Some(recent)) => percent_change(initial, recent).unwrap_or(0.0),
                _ => 0.0,
            }
        } else {
            0.0
        };

        Self {
            age,
            avg_score: mean(&scores),
            score_std_dev: sample_std_dev(&scores),
            trend,
            game_count: scores.len() as u32,
        }
    }
}

impl RiskProfile {
    pub fn age_risk(&self, age: Option<i32>) -> u32 {
        match self {
            RiskProfile::Individual => match age.filter(|a| *a != 0) {
                None => 30,
                Some(a) if a < 60 => 10,
                Some(a) if a < 70 => 30,
                Some(a) if a < 80 => 50,
                Some(_) => 70,
            },
            // An unknown age falls into the oldest bucket.
            RiskProfile::Cohort => match age {
                None => 90,
                Some(a) if a < 50 => 10,
                Some(a) if a < 60 => 25,
                Some(a) if a < 70 => 50,
                Some(a) if a < 80 => 75,
                Some(_) => 90,
            },
        }
    }

    pub fn performance_risk(&self, avg_score: Option<f64>) -> u32 {
        match self {
            RiskProfile::Individual => match avg_score.filter(|s| *s != 0.0) {
                None => 50,
                Some(s) if s >= 80.0 => 10,
                Some(s) if s >= 60.0 => 30,
                Some(s) if s >= 40.0 => 60,
                Some(_) => 80,
            },
            RiskProfile::Cohort => {
                let s = avg_score.filter(|s| *s != 0.0).unwrap_or(50.0);
                if s >= 80.0 {
                    10
                } else if s >= 60.0 {
                    30
                } else if s >= 40.0 {
                    60
                } else {
                    90
                }
            }
        }
    }

    pub fn variability_risk(&self, std_dev: Option<f64>) -> u32 {
        match self {
            RiskProfile::Individual => match std_dev.filter(|v| *v != 0.0) {
                None => 20,
                Some(v) if v < 10.0 => 10,
                Some(v) if v < 20.0 => 30,
                Some(v) if v < 30.0 => 50,
                Some(_) => 70,
            },
            RiskProfile::Cohort => {
                let v = std_dev.filter(|v| *v != 0.0).unwrap_or(20.0);
                if v < 10.0 {
                    10
                } else if v < 20.0 {
                    30
                } else if v < 30.0 {
                    60
                } else {
                    90
                }
            }
        }
    }

    pub fn decline_risk(&self, trend: f64) -> u32 {
        match self {
            RiskProfile::Individual => {
                if trend > 0.3 {
                    10 // improving
                } else if trend > 0.0 {
                    20
                } else if trend > -0.3 {
                    40
                } else if trend > -0.5 {
                    60
                } else {
                    80 // rapidly declining
                }
            }
            RiskProfile::Cohort => {
                if trend > 10.0 {
                    5
                } else if trend > 0.0 {
                    15
                } else if trend > -10.0 {
                    40
                } else if trend > -20.0 {
                    70
                } else {
                    95
                }
            }
        }
    }

    pub fn engagement_risk(&self, game_count: u32) -> u32 {
        match self {
            RiskProfile::Individual => match game_count {
                20.. => 10,
                10.. => 20,
                5.. => 40,
                _ => 60,
            },
            RiskProfile::Cohort => match game_count {
                50.. => 5,
                20.. => 15,
                10.. => 30,
                _ => 60,
            },
        }
    }

    pub fn factors(&self, inputs: &RiskInputs) -> RiskFactors {
        RiskFactors {
            age: self.age_risk(inputs.age),
            performance: self.performance_risk(inputs.avg_score),
            variability: self.variability_risk(inputs.score_std_dev),
            decline: self.decline_risk(inputs.trend),
            engagement: self.engagement_risk(inputs.game_count),
        }
    }
}

/// Weighted combination of the factors, rounded to an integer 0-100.
pub fn weighted_score(factors: &RiskFactors) -> u32 {
    let total = factors.age as f64 * AGE_WEIGHT
        + factors.performance as f64 * PERFORMANCE_WEIGHT
        + factors.variability as f64 * VARIABILITY_WEIGHT
        + factors.decline as f64 * DECLINE_WEIGHT
        + factors.engagement as f64 * ENGAGEMENT_WEIGHT;
    round_half_up(total).clamp(0.0, 100.0) as u32
}

pub fn classify(score: u32) -> RiskLevel {
    if score >= HIGH_RISK_THRESHOLD {
        RiskLevel::High
    } else if score >= MEDIUM_RISK_THRESHOLD {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

pub fn confidence(game_count: u32) -> Confidence {
    match game_count {
        15.. => Confidence::High,
        8.. => Confidence::Medium,
        _ => Confidence::Low,
    }
}

/// Six-month and one-year projections; a declining trend adds risk.
pub fn project(score: u32, trend: f64) -> RiskProjections {
    let (six_month_bump, one_year_bump) = if trend < -0.5 {
        (15, 25)
    } else if trend < 0.0 {
        (5, 10)
    } else {
        (0, 0)
    };

    let projection = |bump: u32| {
        let projected = (score + bump).min(100);
        RiskProjection {
            score: projected,
            level: classify(projected),
        }
    };

    RiskProjections {
        six_month: projection(six_month_bump),
        one_year: projection(one_year_bump),
    }
}

pub fn recommendations(level: RiskLevel, factors: &RiskFactors, age: Option<i32>) -> Vec<String> {
    let mut out: Vec<&str> = Vec::new();

    match level {
        RiskLevel::High => out.extend([
            "Schedule comprehensive neuropsychological evaluation",
            "Consider referral to memory clinic or neurologist",
            "Increase assessment frequency to monthly",
        ]),
        RiskLevel::Medium => out.extend([
            "Continue regular cognitive assessments (bi-monthly)",
            "Implement targeted cognitive training program",
        ]),
        RiskLevel::Low => {}
    }

    if factors.performance > 50 {
        out.extend([
            "Focus on cognitive exercises targeting weaker domains",
            "Consider cognitive rehabilitation therapy",
        ]);
    }
    if factors.decline > 60 {
        out.extend([
            "Monitor for rapid cognitive decline",
            "Review medication list for cognitive side effects",
        ]);
    }
    if factors.variability > 50 {
        out.extend([
            "Assess for delirium or acute medical conditions",
            "Evaluate sleep quality and circadian rhythm",
        ]);
    }
    if factors.engagement > 40 {
        out.extend([
            "Increase patient engagement through gamification",
            "Assess for depression or motivation issues",
        ]);
    }
    if age.is_some_and(|a| a >= 75) {
        out.extend([
            "Ensure adequate social engagement",
            "Promote physical exercise (150min/week)",
        ]);
    }

    out.extend([
        "Encourage Mediterranean diet and cognitive activities",
        "Optimize cardiovascular health management",
    ]);

    out.into_iter().map(String::from).collect()
}

/// Outcome of scoring one set of inputs.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskBreakdown {
    pub factors: RiskFactors,
    pub score: u32,
    pub level: RiskLevel,
}

pub struct RiskEngine;

impl RiskEngine {
    pub fn score(profile: RiskProfile, inputs: &RiskInputs) -> RiskBreakdown {
        let factors = profile.factors(inputs);
        let score = weighted_score(&factors);
        RiskBreakdown {
            factors,
            score,
            level: classify(score),
        }
    }

    /// Full individual assessment with projections and recommendations.
    pub fn assess(
        patient_code: &str,
        inputs: &RiskInputs,
        assessed_at: DateTime<Utc>,
    ) -> RiskAssessment {
        let breakdown = Self::score(RiskProfile::Individual, inputs);
        tracing::debug!(
            "Risk for patient {}: score={} level={} games={} trend={:.3}",
            patient_code,
            breakdown.score,
            breakdown.level,
            inputs.game_count,
            inputs.trend
        );

        RiskAssessment {
            patient_code: patient_code.to_string(),
            current_risk: CurrentRisk {
                score: breakdown.score,
                level: breakdown.level,
                confidence: confidence(inputs.game_count),
            },
            risk_factors: breakdown.factors,
            projections: project(breakdown.score, inputs.trend),
            recommendations: recommendations(breakdown.level, &breakdown.factors, inputs.age),
            assessment_date: assessed_at.to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use neurocare_types::GameKind;

    fn factors(age: u32, performance: u32, variability: u32, decline: u32, engagement: u32) -> RiskFactors {
        RiskFactors {
            age,
            performance,
            variability,
            decline,
            engagement,
        }
    }

    #[test]
    fn test_individual_buckets() {
        let p = RiskProfile::Individual;
        assert_eq!(p.age_risk(None), 30);
        assert_eq!(p.age_risk(Some(59)), 10);
        assert_eq!(p.age_risk(Some(60)), 30);
        assert_eq!(p.age_risk(Some(79)), 50);
        assert_eq!(p.age_risk(Some(80)), 70);

        assert_eq!(p.performance_risk(None), 50);
        assert_eq!(p.performance_risk(Some(0.0)), 50);
        assert_eq!(p.performance_risk(Some(80.0)), 10);
        assert_eq!(p.performance_risk(Some(59.9)), 60);
        assert_eq!(p.performance_risk(Some(12.0)), 80);

        assert_eq!(p.variability_risk(None), 20);
        assert_eq!(p.variability_risk(Some(9.9)), 10);
        assert_eq!(p.variability_risk(Some(25.0)), 50);
        assert_eq!(p.variability_risk(Some(30.0)), 70);

        assert_eq!(p.decline_risk(0.31), 10);
        assert_eq!(p.decline_risk(0.3), 20);
        assert_eq!(p.decline_risk(0.0), 40);
        assert_eq!(p.decline_risk(-0.4), 60);
        assert_eq!(p.decline_risk(-0.5), 80);

        assert_eq!(p.engagement_risk(20), 10);
        assert_eq!(p.engagement_risk(10), 20);
        assert_eq!(p.engagement_risk(5), 40);
        assert_eq!(p.engagement_risk(4), 60);
    }

    #[test]
    fn test_cohort_buckets() {
        let p = RiskProfile::Cohort;
        assert_eq!(p.age_risk(Some(45)), 10);
        assert_eq!(p.age_risk(Some(85)), 90);
        assert_eq!(p.age_risk(None), 90);
        assert_eq!(p.performance_risk(None), 60);
        assert_eq!(p.performance_risk(Some(30.0)), 90);
        assert_eq!(p.variability_risk(None), 60);
        assert_eq!(p.decline_risk(10.5), 5);
        assert_eq!(p.decline_risk(-20.0), 95);
        assert_eq!(p.engagement_risk(50), 5);
        assert_eq!(p.engagement_risk(0), 60);
    }

    #[test]
    fn test_weighted_score_and_classification() {
        // 70*.25 + 80*.30 + 70*.15 + 80*.25 + 60*.05 = 75.0
        let worst = factors(70, 80, 70, 80, 60);
        assert_eq!(weighted_score(&worst), 75);
        assert_eq!(classify(75), RiskLevel::High);

        // 10*.25 + 10*.30 + 10*.15 + 10*.25 + 10*.05 = 10
        assert_eq!(weighted_score(&factors(10, 10, 10, 10, 10)), 10);

        // 30*.25 + 50*.30 + 20*.15 + 40*.25 + 60*.05 = 38.5 -> 39
        assert_eq!(weighted_score(&factors(30, 50, 20, 40, 60)), 39);

        assert_eq!(classify(69), RiskLevel::Medium);
        assert_eq!(classify(70), RiskLevel::High);
        assert_eq!(classify(40), RiskLevel::Medium);
        assert_eq!(classify(39), RiskLevel::Low);
    }

    #[test]
    fn test_projections_cap_at_100() {
        let p = project(90, -0.8);
        assert_eq!(p.six_month.score, 100);
        assert_eq!(p.one_year.score, 100);

        let p = project(38, -0.1);
        assert_eq!(p.six_month.score, 43);
        assert_eq!(p.six_month.level, RiskLevel::Medium);
        assert_eq!(p.one_year.score, 48);

        let p = project(38, 0.0);
        assert_eq!(p.six_month.score, 38);
        assert_eq!(p.one_year.level, RiskLevel::Low);
    }

    #[test]
    fn test_confidence() {
        assert_eq!(confidence(15), Confidence::High);
        assert_eq!(confidence(8), Confidence::Medium);
        assert_eq!(confidence(7), Confidence::Low);
    }

    #[test]
    fn test_recommendations_for_high_risk_elderly_patient() {
        let f = factors(70, 80, 70, 80, 60);
        let recs = recommendations(RiskLevel::High, &f, Some(82));

        assert_eq!(recs.first().unwrap(), "Schedule comprehensive neuropsychological evaluation");
        assert!(recs.contains(&"Monitor for rapid cognitive decline".to_string()));
        assert!(recs.contains(&"Ensure adequate social engagement".to_string()));
        assert_eq!(recs.last().unwrap(), "Optimize cardiovascular health management");
        assert_eq!(recs.len(), 3 + 2 * 5 + 2);
    }

    #[test]
    fn test_recommendations_for_low_risk_patient_are_general() {
        let recs = recommendations(RiskLevel::Low, &factors(10, 10, 10, 10, 10), Some(50));
        assert_eq!(
            recs,
            vec![
                "Encourage Mediterranean diet and cognitive activities".to_string(),
                "Optimize cardiovascular health management".to_string(),
            ]
        );
    }

    #[test]
    fn test_individual_inputs_use_windows() {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
        let samples = vec![
            // Outside the 30 day window but inside the 90 day trend window.
            ScoreSample::new(GameKind::NBack, 90.0, now - Duration::days(60)),
            ScoreSample::new(GameKind::NBack, 70.0, now - Duration::days(10)),
            ScoreSample::new(GameKind::NBack, 50.0, now - Duration::days(1)),
        ];

        let inputs = RiskInputs::individual(Some(72), &samples, now);
        assert_eq!(inputs.game_count, 2);
        assert_eq!(inputs.avg_score, Some(60.0));
        assert!(inputs.trend < -0.99);
    }

    #[test]
    fn test_cohort_inputs_compare_first_and_last_five() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let samples: Vec<ScoreSample> = (0..10)
            .map(|i| {
                let score = if i < 5 { 50.0 } else { 40.0 };
                ScoreSample::new(GameKind::StroopTest, score, start + Duration::days(i))
            })
            .collect();

        let inputs = RiskInputs::cohort(Some(66), &samples);
        assert_eq!(inputs.game_count, 10);
        assert!((inputs.trend - -20.0).abs() < 1e-9);

        let few = RiskInputs::cohort(None, &samples[..4]);
        assert_eq!(few.trend, 0.0);
    }

    #[test]
    fn test_assess_with_no_history() {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 12, 0, 0).unwrap();
        let inputs = RiskInputs::individual(None, &[], now);
        let assessment = RiskEngine::assess("P-100", &inputs, now);

        // 30*.25 + 50*.30 + 20*.15 + 40*.25 + 60*.05 = 38.5 -> 39
        assert_eq!(assessment.current_risk.score, 39);
        assert_eq!(assessment.current_risk.level, RiskLevel::Low);
        assert_eq!(assessment.current_risk.confidence, Confidence::Low);
        assert_eq!(assessment.projections.six_month.score, 39);
        assert!(
            assessment
                .recommendations
                .contains(&"Increase patient engagement through gamification".to_string())
        );
    }
}
