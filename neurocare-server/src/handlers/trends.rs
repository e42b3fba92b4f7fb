use std::sync::Arc;

use chrono::Utc;
use warp::Filter;
use warp::filters::BoxedFilter;
use warp::reply::{Reply, Response};

use neurocare_core::{domain_trends, trend_statistics, window_start};
use neurocare_types::{DomainTrendsResponse, TrendScore, TrendsResponse};

use super::{DaysQuery, authorize_patient};
use crate::AppContext;
use crate::auth::AuthUser;
use crate::error::{ApiError, respond};
use crate::filters::{authenticated, with_ctx};

pub const DEFAULT_TREND_DAYS: u32 = 30;

pub fn routes(ctx: Arc<AppContext>) -> BoxedFilter<(Response,)> {
    let trends = warp::path!("api" / "trends" / String)
        .and(warp::get())
        .and(warp::query::<DaysQuery>())
        .and(with_ctx(ctx.clone()))
        .and(authenticated(ctx.clone()))
        .then(handle_trends)
        .map(respond);

    let domains = warp::path!("api" / "trends" / String / "domains")
        .and(warp::get())
        .and(with_ctx(ctx.clone()))
        .and(authenticated(ctx))
        .then(handle_domains)
        .map(respond);

    trends.or(domains).unify().boxed()
}

async fn handle_trends(
    patient_code: String,
    query: DaysQuery,
    ctx: Arc<AppContext>,
    user: AuthUser,
) -> Result<impl Reply, ApiError> {
    authorize_patient(&ctx, &user, &patient_code).await?;

    let start = window_start(Utc::now(), query.window(DEFAULT_TREND_DAYS));
    let scores = ctx
        .scores
        .list_since(&patient_code, start)
        .await?
        .into_iter()
        .map(|score| TrendScore {
            game: score.game,
            score: score.score,
            played_at: score.created_at,
            metrics: score.metrics,
        })
        .collect();

    // Statistics cover the whole history, not just the window.
    let samples = ctx.scores.samples_for_patient(&patient_code).await?;
    Ok(warp::reply::json(&TrendsResponse {
        success: true,
        scores,
        statistics: trend_statistics(&samples),
    }))
}

async fn handle_domains(
    patient_code: String,
    ctx: Arc<AppContext>,
    user: AuthUser,
) -> Result<impl Reply, ApiError> {
    authorize_patient(&ctx, &user, &patient_code).await?;

    let samples = ctx.scores.samples_for_patient(&patient_code).await?;
    Ok(warp::reply::json(&DomainTrendsResponse {
        success: true,
        domains: domain_trends(&samples),
    }))
}
