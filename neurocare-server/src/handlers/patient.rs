use std::sync::Arc;

use warp::Filter;
use warp::filters::BoxedFilter;
use warp::reply::{Reply, Response};

use neurocare_types::{AssignedGamesResponse, Role};

use crate::AppContext;
use crate::auth::AuthUser;
use crate::error::{ApiError, respond};
use crate::filters::{require_roles, with_ctx};

pub fn routes(ctx: Arc<AppContext>) -> BoxedFilter<(Response,)> {
    warp::path!("api" / "patient" / "games")
        .and(warp::get())
        .and(with_ctx(ctx.clone()))
        .and(require_roles(ctx, &[Role::Patient]))
        .then(handle_assigned_games)
        .map(respond)
        .boxed()
}

async fn handle_assigned_games(
    ctx: Arc<AppContext>,
    patient: AuthUser,
) -> Result<impl Reply, ApiError> {
    let profile = ctx
        .patients
        .find_by_user(patient.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Patient profile not found"))?;

    let games = ctx.patients.assigned_games(&profile.patient_code).await?;
    Ok(warp::reply::json(&AssignedGamesResponse {
        patient_code: profile.patient_code,
        games,
    }))
}
