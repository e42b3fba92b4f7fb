use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use warp::Filter;
use warp::filters::BoxedFilter;
use warp::http::StatusCode;
use warp::reply::{Reply, Response};

use neurocare_core::{
    CohortMember, DEFAULT_PROGRESS_DAYS, analyze_member, build_comparative_analytics,
    progress_report, snapshot_metrics,
};
use neurocare_types::{RiskLevel, Role, SnapshotRequest, SnapshotsResponse, SortBy};

use super::{DaysQuery, authorize_patient};
use crate::AppContext;
use crate::auth::AuthUser;
use crate::error::{ApiError, respond};
use crate::filters::{authenticated, json_body, require_roles, with_ctx};

const CLINICIANS: &[Role] = &[Role::Doctor, Role::Admin];
pub const SNAPSHOT_HISTORY_LIMIT: u64 = 90;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ComparativeQuery {
    risk_level: Option<String>,
    sort_by: Option<SortBy>,
}

pub fn routes(ctx: Arc<AppContext>) -> BoxedFilter<(Response,)> {
    let patient_progress = warp::path!("api" / "progress" / "patient" / String)
        .and(warp::get())
        .and(warp::query::<DaysQuery>())
        .and(with_ctx(ctx.clone()))
        .and(authenticated(ctx.clone()))
        .then(handle_patient_progress)
        .map(respond);

    let create_snapshot = warp::path!("api" / "progress" / "patient" / String / "snapshot")
        .and(warp::post())
        .and(with_ctx(ctx.clone()))
        .and(require_roles(ctx.clone(), CLINICIANS))
        .and(json_body::<SnapshotRequest>())
        .then(handle_create_snapshot)
        .map(respond);

    let snapshots = warp::path!("api" / "progress" / "patient" / String / "snapshots")
        .and(warp::get())
        .and(with_ctx(ctx.clone()))
        .and(authenticated(ctx.clone()))
        .then(handle_snapshots)
        .map(respond);

    let comparative = warp::path!("api" / "progress" / "comparative")
        .and(warp::get())
        .and(warp::query::<ComparativeQuery>())
        .and(with_ctx(ctx.clone()))
        .and(require_roles(ctx, CLINICIANS))
        .then(handle_comparative)
        .map(respond);

    patient_progress
        .or(create_snapshot)
        .unify()
        .or(snapshots)
        .unify()
        .or(comparative)
        .unify()
        .boxed()
}

async fn handle_patient_progress(
    patient_code: String,
    query: DaysQuery,
    ctx: Arc<AppContext>,
    user: AuthUser,
) -> Result<impl Reply, ApiError> {
    authorize_patient(&ctx, &user, &patient_code).await?;

    let samples = ctx.scores.samples_for_patient(&patient_code).await?;
    let report = progress_report(&samples, Utc::now(), query.window(DEFAULT_PROGRESS_DAYS));
    Ok(warp::reply::json(&report))
}

async fn handle_create_snapshot(
    patient_code: String,
    ctx: Arc<AppContext>,
    user: AuthUser,
    request: SnapshotRequest,
) -> Result<impl Reply, ApiError> {
    authorize_patient(&ctx, &user, &patient_code).await?;

    let now = Utc::now();
    let samples = ctx.scores.samples_for_patient(&patient_code).await?;
    let metrics = snapshot_metrics(&samples, now);
    let notes = request.notes.filter(|n| !n.trim().is_empty());

    let snapshot = ctx
        .progress
        .upsert_snapshot(&patient_code, now.date_naive(), &metrics, notes)
        .await?;
    tracing::info!(
        "Progress snapshot for patient {} on {}: {} games",
        patient_code,
        snapshot.snapshot_date,
        snapshot.games_completed
    );

    Ok(warp::reply::with_status(
        warp::reply::json(&snapshot),
        StatusCode::CREATED,
    ))
}

async fn handle_snapshots(
    patient_code: String,
    ctx: Arc<AppContext>,
    user: AuthUser,
) -> Result<impl Reply, ApiError> {
    authorize_patient(&ctx, &user, &patient_code).await?;

    let snapshots = ctx
        .progress
        .list_snapshots(&patient_code, SNAPSHOT_HISTORY_LIMIT)
        .await?;
    Ok(warp::reply::json(&SnapshotsResponse { snapshots }))
}

fn parse_risk_filter(value: Option<&str>) -> Result<Option<RiskLevel>, ApiError> {
    match value {
        None | Some("") | Some("all") => Ok(None),
        Some(level) => level
            .parse()
            .map(Some)
            .map_err(|_| ApiError::bad_request(format!("Invalid riskLevel '{level}'"))),
    }
}

async fn handle_comparative(
    query: ComparativeQuery,
    ctx: Arc<AppContext>,
    user: AuthUser,
) -> Result<impl Reply, ApiError> {
    let level = parse_risk_filter(query.risk_level.as_deref())?;

    let patients = match user.role {
        Role::Admin => ctx.patients.list_all().await?,
        _ => ctx.patients.list_for_doctor(user.id).await?,
    };

    let now = Utc::now();
    let mut rows = Vec::with_capacity(patients.len());
    for patient in patients {
        let samples = ctx.scores.samples_for_patient(&patient.patient_code).await?;
        let member = CohortMember {
            user_id: patient.user_id,
            name: patient
                .full_name
                .unwrap_or_else(|| format!("Patient {}", patient.patient_code)),
            patient_code: patient.patient_code,
            email: patient.email,
            age: patient.age,
        };
        rows.push(analyze_member(member, &samples, now));
    }

    let analytics = build_comparative_analytics(rows, level, query.sort_by.unwrap_or_default());
    Ok(warp::reply::json(&analytics))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_risk_filter() {
        assert_eq!(parse_risk_filter(None).unwrap(), None);
        assert_eq!(parse_risk_filter(Some("all")).unwrap(), None);
        assert_eq!(parse_risk_filter(Some("High")).unwrap(), Some(RiskLevel::High));
        assert_eq!(parse_risk_filter(Some("Low")).unwrap(), Some(RiskLevel::Low));
        assert!(parse_risk_filter(Some("severe")).is_err());
    }
}
