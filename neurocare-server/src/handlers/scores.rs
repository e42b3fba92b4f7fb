use std::sync::Arc;

use chrono::Utc;
use warp::Filter;
use warp::filters::BoxedFilter;
use warp::http::StatusCode;
use warp::reply::{Reply, Response};

use neurocare_persistence::NewScore;
use neurocare_types::{Role, ScoreSubmission, ScoreSubmitted};

use super::gamification::{check_game_achievements, record_activity};
use crate::AppContext;
use crate::auth::AuthUser;
use crate::error::{ApiError, respond};
use crate::filters::{authenticated, json_body, with_ctx};

pub fn routes(ctx: Arc<AppContext>) -> BoxedFilter<(Response,)> {
    warp::path!("api" / "scores")
        .and(warp::post())
        .and(with_ctx(ctx.clone()))
        .and(authenticated(ctx))
        .and(json_body::<ScoreSubmission>())
        .then(handle_submit_score)
        .map(respond)
        .boxed()
}

async fn handle_submit_score(
    ctx: Arc<AppContext>,
    user: AuthUser,
    submission: ScoreSubmission,
) -> Result<impl Reply, ApiError> {
    let (Some(patient_code), Some(game), Some(score)) =
        (submission.patient_id, submission.game, submission.score)
    else {
        return Err(ApiError::bad_request("Missing required fields"));
    };
    if !score.is_finite() {
        return Err(ApiError::bad_request("Score must be a finite number"));
    }

    let access = ctx
        .patients
        .access(&patient_code)
        .await?
        .ok_or_else(|| ApiError::not_found("Patient not found"))?;
    let allowed = match user.role {
        Role::Admin => true,
        Role::Patient => access.user_id == Some(user.id),
        Role::Doctor => access.is_doctor(user.id),
        Role::Caregiver => false,
    };
    if !allowed {
        tracing::warn!(
            "User {} ({}) tried to submit a score for patient {}",
            user.id,
            user.role,
            patient_code
        );
        return Err(ApiError::forbidden("Not allowed to submit scores for this patient"));
    }

    let id = ctx
        .scores
        .record_score(NewScore {
            patient_code: patient_code.clone(),
            session_id: submission.session_id,
            game,
            level: submission.level,
            attempt: submission.attempt.unwrap_or(1),
            score,
            metrics: submission.metrics,
            timestamp_start: submission.timestamp_start,
            timestamp_end: submission.timestamp_end,
            device: submission.device,
        })
        .await?;
    tracing::debug!("Recorded {} score {} for patient {}", game, score, patient_code);

    // The score is stored; streak bookkeeping failures are logged, not returned.
    if user.role == Role::Patient {
        let today = Utc::now().date_naive();
        if let Err(err) = record_activity(&ctx, user.id, today).await {
            tracing::error!("Failed to update streak for user {}: {:#}", user.id, err);
        } else if let Err(err) = check_game_achievements(&ctx, user.id).await {
            tracing::error!("Failed to check achievements for user {}: {:#}", user.id, err);
        }
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&ScoreSubmitted {
            message: "Score submitted successfully".to_string(),
            id,
        }),
        StatusCode::CREATED,
    ))
}
