use std::sync::Arc;

use uuid::Uuid;
use warp::Filter;
use warp::filters::BoxedFilter;
use warp::http::StatusCode;
use warp::reply::{Reply, Response};

use neurocare_core::render_report;
use neurocare_persistence::NewNotification;
use neurocare_types::{
    GeneratedReport, NotificationCategory, NotificationChannel, PatientReport, Role,
};

use super::{authorize_patient, owned_patient};
use crate::AppContext;
use crate::auth::AuthUser;
use crate::error::{ApiError, respond};
use crate::filters::{authenticated, require_roles, with_ctx};

pub fn routes(ctx: Arc<AppContext>) -> BoxedFilter<(Response,)> {
    let generate = warp::path!("api" / "reports" / "generate" / String)
        .and(warp::post())
        .and(with_ctx(ctx.clone()))
        .and(require_roles(ctx.clone(), &[Role::Doctor]))
        .then(handle_generate_report)
        .map(respond);

    let latest = warp::path!("api" / "reports" / "patient" / String / "latest")
        .and(warp::get())
        .and(with_ctx(ctx.clone()))
        .and(authenticated(ctx))
        .then(handle_latest_report)
        .map(respond);

    generate.or(latest).unify().boxed()
}

async fn handle_generate_report(
    patient_code: String,
    ctx: Arc<AppContext>,
    doctor: AuthUser,
) -> Result<impl Reply, ApiError> {
    let access = owned_patient(&ctx, &doctor, &patient_code).await?;

    let samples = ctx.scores.samples_for_patient(&patient_code).await?;
    if samples.is_empty() {
        return Err(ApiError::bad_request("No scores available for this patient"));
    }
    let prediction = ctx.predictions.latest(&patient_code).await?;

    let content = render_report(&patient_code, &samples, prediction.as_ref());
    let summary = prediction.as_ref().map(|p| {
        serde_json::json!({
            "risk_label": p.risk_label,
            "risk_probability": p.risk_probability,
        })
    });
    let report = ctx
        .reports
        .create_report(&patient_code, doctor.id, content, summary)
        .await?;
    tracing::info!(
        "Doctor {} generated report {} for patient {}",
        doctor.id,
        report.id,
        patient_code
    );

    if let Some(account) = access.user_id {
        notify_patient(&ctx, account, &report).await?;
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&GeneratedReport {
            message: "Report generated successfully".to_string(),
            report_id: report.id,
            report_content: report.report_content,
            generated_at: report.generated_at,
        }),
        StatusCode::CREATED,
    ))
}

/// Posts the in-app notice; an opted-in e-mail is logged.
async fn notify_patient(
    ctx: &AppContext,
    account: Uuid,
    report: &PatientReport,
) -> Result<(), ApiError> {
    let subject = "New Cognitive Assessment Report";
    let message = "Your doctor has generated a new cognitive assessment report.";
    let data = serde_json::json!({
        "report_id": report.id,
        "patient_code": report.patient_code,
    });

    ctx.notifications
        .create(NewNotification {
            user_id: account,
            channel: NotificationChannel::InApp,
            category: NotificationCategory::Report,
            subject: subject.to_string(),
            message: message.to_string(),
            data: Some(data.clone()),
        })
        .await?;

    let preferences = ctx.notifications.preferences(account).await?;
    if preferences.email_reports {
        // No mail transport is configured; the dispatch is only logged.
        tracing::info!(
            "Report e-mail for user {}: {} ({})",
            account,
            subject,
            data
        );
    }
    Ok(())
}

async fn handle_latest_report(
    patient_code: String,
    ctx: Arc<AppContext>,
    user: AuthUser,
) -> Result<impl Reply, ApiError> {
    authorize_patient(&ctx, &user, &patient_code).await?;

    let report = ctx
        .reports
        .latest(&patient_code)
        .await?
        .ok_or_else(|| ApiError::not_found("No report found"))?;
    Ok(warp::reply::json(&report))
}
