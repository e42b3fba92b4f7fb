use std::collections::HashSet;
use std::sync::Arc;

use warp::Filter;
use warp::filters::BoxedFilter;
use warp::reply::{Reply, Response};

use neurocare_core::stats::{mean, round_to_tenth};
use neurocare_types::{
    CaregiverProgress, GameAssignment, GameScore, PatientsResponse, ReportsResponse, Role,
};

use super::authorize_patient;
use crate::AppContext;
use crate::auth::AuthUser;
use crate::error::{ApiError, respond};
use crate::filters::{require_roles, with_ctx};

const CAREGIVERS: &[Role] = &[Role::Caregiver, Role::Admin];

pub fn routes(ctx: Arc<AppContext>) -> BoxedFilter<(Response,)> {
    let patients = warp::path!("api" / "caregiver" / "patients")
        .and(warp::get())
        .and(with_ctx(ctx.clone()))
        .and(require_roles(ctx.clone(), CAREGIVERS))
        .then(handle_list_patients)
        .map(respond);

    let progress = warp::path!("api" / "caregiver" / "patients" / String / "progress")
        .and(warp::get())
        .and(with_ctx(ctx.clone()))
        .and(require_roles(ctx.clone(), CAREGIVERS))
        .then(handle_patient_progress)
        .map(respond);

    let reports = warp::path!("api" / "caregiver" / "patients" / String / "reports")
        .and(warp::get())
        .and(with_ctx(ctx.clone()))
        .and(require_roles(ctx, CAREGIVERS))
        .then(handle_patient_reports)
        .map(respond);

    patients.or(progress).unify().or(reports).unify().boxed()
}

async fn handle_list_patients(ctx: Arc<AppContext>, user: AuthUser) -> Result<impl Reply, ApiError> {
    let patients = match user.role {
        Role::Admin => ctx.patients.list_all().await?,
        _ => ctx.patients.list_for_caregiver(user.id).await?,
    };
    Ok(warp::reply::json(&PatientsResponse { patients }))
}

/// `scores` must be newest first.
fn summarize_progress(
    patient_code: &str,
    assignments: &[GameAssignment],
    scores: &[GameScore],
) -> CaregiverProgress {
    let played: HashSet<_> = scores.iter().map(|s| s.game).collect();
    let completed = assignments
        .iter()
        .filter(|a| played.contains(&a.game_name))
        .count();
    let values: Vec<f64> = scores.iter().map(|s| s.score).collect();

    CaregiverProgress {
        patient_code: patient_code.to_string(),
        completed_games: completed as u32,
        total_games: assignments.len() as u32,
        average_score: mean(&values).map(round_to_tenth).unwrap_or(0.0),
        last_activity: scores.first().map(|s| s.created_at.clone()),
    }
}

async fn handle_patient_progress(
    patient_code: String,
    ctx: Arc<AppContext>,
    user: AuthUser,
) -> Result<impl Reply, ApiError> {
    authorize_patient(&ctx, &user, &patient_code).await?;

    let assignments = ctx.patients.assigned_games(&patient_code).await?;
    let scores = ctx.scores.list_for_patient(&patient_code).await?;
    Ok(warp::reply::json(&summarize_progress(
        &patient_code,
        &assignments,
        &scores,
    )))
}

async fn handle_patient_reports(
    patient_code: String,
    ctx: Arc<AppContext>,
    user: AuthUser,
) -> Result<impl Reply, ApiError> {
    authorize_patient(&ctx, &user, &patient_code).await?;

    let reports = ctx.reports.list_for_patient(&patient_code).await?;
    Ok(warp::reply::json(&ReportsResponse { reports }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use neurocare_types::{AssignmentStatus, GameKind};

    fn assignment(game: GameKind) -> GameAssignment {
        GameAssignment {
            id: 1,
            patient_code: "P001".to_string(),
            game_name: game,
            status: AssignmentStatus::Assigned,
            assigned_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn score(game: GameKind, value: f64, created_at: &str) -> GameScore {
        GameScore {
            id: 1,
            patient_code: "P001".to_string(),
            session_id: None,
            game,
            level: None,
            attempt: 1,
            score: value,
            metrics: None,
            timestamp_start: None,
            timestamp_end: None,
            device: None,
            created_at: created_at.to_string(),
        }
    }

    #[test]
    fn test_summarize_progress() {
        let assignments = vec![
            assignment(GameKind::MemoryMatch),
            assignment(GameKind::StroopTest),
            assignment(GameKind::NBack),
        ];
        let scores = vec![
            score(GameKind::MemoryMatch, 80.0, "2026-01-03T10:00:00Z"),
            score(GameKind::ReactionTime, 71.0, "2026-01-02T10:00:00Z"),
            score(GameKind::MemoryMatch, 70.0, "2026-01-01T10:00:00Z"),
        ];

        let progress = summarize_progress("P001", &assignments, &scores);
        assert_eq!(progress.completed_games, 1);
        assert_eq!(progress.total_games, 3);
        assert_eq!(progress.average_score, 73.7);
        assert_eq!(progress.last_activity.as_deref(), Some("2026-01-03T10:00:00Z"));
    }

    #[test]
    fn test_summarize_progress_without_scores() {
        let progress = summarize_progress("P001", &[assignment(GameKind::NBack)], &[]);
        assert_eq!(progress.completed_games, 0);
        assert_eq!(progress.total_games, 1);
        assert_eq!(progress.average_score, 0.0);
        assert!(progress.last_activity.is_none());
    }
}
