mod common;

use common::*;
use neurocare_core::{
    RiskEngine, RiskInputs, RiskProfile, StreakChange, StreakState, advance_streak,
    analyze_member, build_comparative_analytics, earned_for_games, earned_for_streak,
    progress_report, render_report,
};
use neurocare_types::{Confidence, GameKind, RiskLevel, SortBy};

#[test]
fn test_steady_improver_is_low_risk() {
    let samples = daily_history(GameKind::StroopTest, 25, 70.0, 1.0);
    let inputs = RiskInputs::individual(Some(55), &samples, test_now());
    assert_eq!(inputs.game_count, 25);
    assert!(inputs.trend > 0.99);

    let assessment = RiskEngine::assess("2001", &inputs, test_now());
    assert_eq!(assessment.current_risk.level, RiskLevel::Low);
    assert_eq!(assessment.current_risk.confidence, Confidence::High);
    assert_eq!(assessment.projections.six_month.score, assessment.current_risk.score);
    assert_eq!(
        assessment.recommendations.last().map(String::as_str),
        Some("Optimize cardiovascular health management")
    );
}

#[test]
fn test_declining_patient_scores_higher_than_improver() {
    let improving = daily_history(GameKind::NBack, 20, 60.0, 1.0);
    let improver = RiskInputs::individual(Some(78), &improving, test_now());
    let decliner = RiskInputs::individual(Some(78), &declining_history(), test_now());

    let improver = RiskEngine::score(RiskProfile::Individual, &improver);
    let decliner = RiskEngine::score(RiskProfile::Individual, &decliner);
    assert!(decliner.score > improver.score);
    assert!(decliner.factors.variability > improver.factors.variability);
}

#[test]
fn test_cohort_ranking() {
    let rows = vec![
        analyze_member(
            create_test_member("Dana", "3001", Some(52)),
            &daily_history(GameKind::ReactionTime, 30, 80.0, 0.5),
            test_now(),
        ),
        analyze_member(create_test_member("Eli", "3002", Some(88)), &[], test_now()),
    ];

    let analytics = build_comparative_analytics(rows, None, SortBy::Risk);
    assert_eq!(analytics.patients[0].patient_code, "3002");
    assert_eq!(analytics.patients[0].days_since_last_activity, 999);
    assert_eq!(analytics.patients[1].days_since_last_activity, 0);
    assert_eq!(analytics.summary.total, 2);

    let by_engagement = build_comparative_analytics(analytics.patients, None, SortBy::Engagement);
    assert_eq!(by_engagement.patients[0].patient_code, "3001");
}

#[test]
fn test_progress_and_report_share_samples() {
    let mut samples = daily_history(GameKind::PatternRecognition, 10, 50.0, 2.0);
    samples.push(score_days_ago(GameKind::VerbalFluency, 40.0, 2).with_level(3));

    let progress = progress_report(&samples, test_now(), 30);
    assert_eq!(progress.statistics.total_games, 11);
    assert_eq!(progress.statistics.unique_games, 2);

    let report = render_report("4001", &samples, None);
    assert!(report.contains("### PATTERN RECOGNITION\n- Games Played: 10\n- Average Score: 59.0"));
    assert!(report.contains("### VERBAL FLUENCY\n- Games Played: 1\n- Average Score: 40.0\n- Highest Level Reached: 3"));
}

#[test]
fn test_week_of_play_unlocks_streak_achievements() {
    let start = test_now().date_naive();
    let mut state = StreakState::fresh(start);
    let mut last_change = StreakChange::Started;
    for day in 0..7 {
        state.total_games_played += 1;
        (state, last_change) = advance_streak(state, start + chrono::Days::new(day));
    }

    assert_eq!(last_change, StreakChange::Extended);
    assert_eq!(state.current_streak, 7);
    assert_eq!(state.total_login_days, 7);
    assert_eq!(earned_for_streak(state.current_streak), vec!["streak_3", "streak_7"]);
    assert_eq!(earned_for_games(state.total_games_played), vec!["first_game"]);
}
