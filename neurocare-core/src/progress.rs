use chrono::{DateTime, Utc};
use neurocare_types::{
    CognitiveDomain, DomainPoint, DomainTrend, GameBreakdown, GameKind, ProgressReport,
    ProgressStatistics, ProgressTrend, ScoreHistoryPoint, TrendStatistics,
};
use std::collections::{BTreeMap, BTreeSet};

use crate::stats::{
    daily_means, daily_trend_correlation, mean, percent_change, round_half_up, round_to_tenth,
    sample_std_dev,
};
use crate::{ScoreSample, between, scores_of, since, window_start};

pub const DEFAULT_PROGRESS_DAYS: u32 = 30;
pub const SNAPSHOT_WINDOW_DAYS: u32 = 7;
/// Scores compared on each side of a domain trend.
pub const DOMAIN_TREND_GAMES: usize = 5;

fn max_score(scores: &[f64]) -> Option<f64> {
    scores.iter().copied().reduce(f64::max)
}

fn min_score(scores: &[f64]) -> Option<f64> {
    scores.iter().copied().reduce(f64::min)
}

fn group_by_game(samples: &[&ScoreSample]) -> BTreeMap<GameKind, Vec<f64>> {
    let mut groups: BTreeMap<GameKind, Vec<f64>> = BTreeMap::new();
    for sample in samples {
        groups.entry(sample.game).or_default().push(sample.score);
    }
    groups
}

/// Progress over the last `days` days: per-day/per-game history, summary
/// statistics, trajectory and per-game breakdown.
pub fn progress_report(samples: &[ScoreSample], now: DateTime<Utc>, days: u32) -> ProgressReport {
    let window = since(samples, window_start(now, days));

    let mut history: BTreeMap<(chrono::NaiveDate, GameKind), Vec<f64>> = BTreeMap::new();
    for sample in &window {
        history
            .entry((sample.date(), sample.game))
            .or_default()
            .push(sample.score);
    }
    let mut score_history: Vec<ScoreHistoryPoint> = history
        .into_iter()
        .map(|((date, game), scores)| ScoreHistoryPoint {
            date: date.to_string(),
            game,
            avg_score: mean(&scores).unwrap_or(0.0),
            games_played: scores.len() as u32,
        })
        .collect();
    // Newest day first, games alphabetical within a day.
    score_history.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| a.game.as_str().cmp(b.game.as_str()))
    });

    let scores = scores_of(window.iter().copied());
    let unique_games: BTreeSet<GameKind> = window.iter().map(|s| s.game).collect();
    let statistics = ProgressStatistics {
        unique_games: unique_games.len() as u32,
        total_games: scores.len() as u32,
        overall_avg_score: mean(&scores),
        best_score: max_score(&scores),
        lowest_score: min_score(&scores),
    };

    let daily = daily_means(window.iter().copied());
    let improvement = match (daily.first(), daily.last()) {
        (Some((_, first)), Some((_, last))) => percent_change(*first, *last).unwrap_or(0.0),
        _ => 0.0,
    };
    let trend = ProgressTrend {
        correlation: daily_trend_correlation(window.iter().copied()),
        improvement,
    };

    let mut game_breakdown: Vec<GameBreakdown> = group_by_game(&window)
        .into_iter()
        .map(|(game, scores)| GameBreakdown {
            game,
            attempts: scores.len() as u32,
            avg_score: mean(&scores).unwrap_or(0.0),
            best_score: max_score(&scores).unwrap_or(0.0),
            score_variance: sample_std_dev(&scores),
        })
        .collect();
    game_breakdown.sort_by(|a, b| b.avg_score.total_cmp(&a.avg_score));

    ProgressReport {
        score_history,
        statistics,
        trend,
        game_breakdown,
    }
}

/// Metrics captured in a weekly progress snapshot.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SnapshotMetrics {
    /// Mean of the per-game means for the last 7 days.
    pub average_score: f64,
    /// Distinct games played in the last 7 days.
    pub games_completed: i32,
    /// Percent change of this week's mean against the previous week's.
    pub improvement_rate: f64,
    /// Per-game mean for the last 7 days, keyed by game name.
    pub cognitive_domains: BTreeMap<String, f64>,
}

pub fn snapshot_metrics(samples: &[ScoreSample], now: DateTime<Utc>) -> SnapshotMetrics {
    let week_start = window_start(now, SNAPSHOT_WINDOW_DAYS);
    let previous_start = window_start(now, SNAPSHOT_WINDOW_DAYS * 2);

    let current_week = since(samples, week_start);
    let previous_week = between(samples, previous_start, week_start);

    let cognitive_domains: BTreeMap<String, f64> = group_by_game(&current_week)
        .into_iter()
        .filter_map(|(game, scores)| mean(&scores).map(|avg| (game.as_str().to_string(), avg)))
        .collect();
    let game_means: Vec<f64> = cognitive_domains.values().copied().collect();

    let improvement_rate = match (
        mean(&scores_of(current_week.iter().copied())),
        mean(&scores_of(previous_week.iter().copied())),
    ) {
        (Some(current), Some(previous)) if previous > 0.0 => {
            percent_change(previous, current).unwrap_or(0.0)
        }
        _ => 0.0,
    };

    SnapshotMetrics {
        average_score: mean(&game_means).unwrap_or(0.0),
        games_completed: cognitive_domains.len() as i32,
        improvement_rate,
        cognitive_domains,
    }
}

/// All-time statistics for the trends view.
pub fn trend_statistics(samples: &[ScoreSample]) -> TrendStatistics {
    let scores = scores_of(samples);
    TrendStatistics {
        total_games: scores.len() as u32,
        avg_score: round_half_up(mean(&scores).unwrap_or(0.0)) as i32,
        min_score: min_score(&scores).unwrap_or(0.0),
        max_score: max_score(&scores).unwrap_or(0.0),
        score_variance: sample_std_dev(&scores).unwrap_or(0.0),
    }
}

/// Per-domain averages and short-term trend. Domains without any scores are
/// left out.
pub fn domain_trends(samples: &[ScoreSample]) -> BTreeMap<CognitiveDomain, DomainTrend> {
    let mut ordered: Vec<&ScoreSample> = samples.iter().collect();
    ordered.sort_by_key(|s| s.recorded_at);

    let mut domains = BTreeMap::new();
    for domain in CognitiveDomain::ALL {
        let games = domain.games();
        let domain_samples: Vec<&ScoreSample> = ordered
            .iter()
            .copied()
            .filter(|s| games.contains(&s.game))
            .collect();
        if domain_samples.is_empty() {
            continue;
        }

        let scores = scores_of(domain_samples.iter().copied());
        let n = scores.len();
        let recent = &scores[n.saturating_sub(DOMAIN_TREND_GAMES)..];
        let previous_end = n.saturating_sub(DOMAIN_TREND_GAMES);
        let previous_start = n.saturating_sub(DOMAIN_TREND_GAMES * 2);
        let previous = &scores[previous_start..previous_end];

        let trend = match (mean(previous), mean(recent)) {
            (Some(previous), Some(recent)) => percent_change(previous, recent).unwrap_or(0.0),
            _ => 0.0,
        };

        domains.insert(
            domain,
            DomainTrend {
                avg_score: round_half_up(mean(&scores).unwrap_or(0.0)) as i32,
                trend: round_to_tenth(trend),
                data_points: n as u32,
                scores: domain_samples
                    .iter()
                    .map(|s| DomainPoint {
                        score: s.score,
                        date: s.recorded_at.to_rfc3339(),
                    })
                    .collect(),
            },
        );
    }
    domains
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 8, 15, 18, 0, 0).unwrap()
    }

    fn sample(game: GameKind, score: f64, days_ago: i64) -> ScoreSample {
        ScoreSample::new(game, score, now() - Duration::days(days_ago))
    }

    #[test]
    fn test_progress_report_windows_and_groups() {
        let samples = vec![
            sample(GameKind::NBack, 40.0, 45), // outside 30 days
            sample(GameKind::NBack, 50.0, 3),
            sample(GameKind::NBack, 70.0, 3),
            sample(GameKind::StroopTest, 80.0, 3),
            sample(GameKind::StroopTest, 90.0, 0),
        ];

        let report = progress_report(&samples, now(), 30);
        assert_eq!(report.statistics.total_games, 4);
        assert_eq!(report.statistics.unique_games, 2);
        assert_eq!(report.statistics.best_score, Some(90.0));
        assert_eq!(report.statistics.lowest_score, Some(50.0));

        assert_eq!(report.score_history.len(), 3);
        assert_eq!(report.score_history[0].game, GameKind::StroopTest);
        assert_eq!(report.score_history[1].game, GameKind::NBack);
        assert_eq!(report.score_history[1].avg_score, 60.0);
        assert_eq!(report.score_history[1].games_played, 2);

        // Daily means: 66.67 then 90.
        assert!((report.trend.improvement - 35.0).abs() < 1e-9);
        assert!((report.trend.correlation - 1.0).abs() < 1e-9);

        assert_eq!(report.game_breakdown[0].game, GameKind::StroopTest);
        assert_eq!(report.game_breakdown[0].attempts, 2);
        assert_eq!(report.game_breakdown[1].score_variance.map(|v| v.round()), Some(14.0));
    }

    #[test]
    fn test_empty_progress_report() {
        let report = progress_report(&[], now(), 30);
        assert_eq!(report.statistics.total_games, 0);
        assert_eq!(report.statistics.overall_avg_score, None);
        assert_eq!(report.trend.correlation, 0.0);
        assert_eq!(report.trend.improvement, 0.0);
        assert!(report.game_breakdown.is_empty());
    }

    #[test]
    fn test_snapshot_metrics() {
        let samples = vec![
            sample(GameKind::NBack, 60.0, 10),
            sample(GameKind::NBack, 40.0, 9),
            sample(GameKind::NBack, 50.0, 2),
            sample(GameKind::NBack, 70.0, 1),
            sample(GameKind::VerbalFluency, 90.0, 0),
        ];

        let metrics = snapshot_metrics(&samples, now());
        // Three scores this week across two games.
        assert_eq!(metrics.games_completed, 2);
        assert_eq!(metrics.cognitive_domains.get("n_back"), Some(&60.0));
        assert_eq!(metrics.cognitive_domains.get("verbal_fluency"), Some(&90.0));
        assert_eq!(metrics.average_score, 75.0);
        // Current week mean 70 vs previous week mean 50.
        assert!((metrics.improvement_rate - 40.0).abs() < 1e-9);

        let quiet = snapshot_metrics(&samples[..2], now());
        assert_eq!(quiet, SnapshotMetrics::default());
    }

    #[test]
    fn test_trend_statistics() {
        let samples = vec![
            sample(GameKind::ReactionTime, 10.0, 3),
            sample(GameKind::ReactionTime, 21.0, 2),
        ];
        let stats = trend_statistics(&samples);
        assert_eq!(stats.total_games, 2);
        assert_eq!(stats.avg_score, 16);
        assert_eq!(stats.min_score, 10.0);
        assert_eq!(stats.max_score, 21.0);

        assert_eq!(trend_statistics(&[]), TrendStatistics::default());
    }

    #[test]
    fn test_domain_trends() {
        let mut samples: Vec<ScoreSample> = (0..10)
            .map(|i| sample(GameKind::NBack, if i < 5 { 50.0 } else { 60.0 }, 20 - i))
            .collect();
        samples.push(sample(GameKind::VerbalFluency, 70.0, 1));

        let domains = domain_trends(&samples);
        assert!(!domains.contains_key(&CognitiveDomain::Memory));

        let working = &domains[&CognitiveDomain::WorkingMemory];
        assert_eq!(working.data_points, 10);
        assert_eq!(working.avg_score, 55);
        assert_eq!(working.trend, 20.0);

        let language = &domains[&CognitiveDomain::Language];
        assert_eq!(language.data_points, 1);
        assert_eq!(language.trend, 0.0);
        assert!(domains.contains_key(&CognitiveDomain::ExecutiveFunction));
    }
}
