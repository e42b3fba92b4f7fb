use std::sync::Arc;

use chrono::Utc;
use warp::Filter;
use warp::filters::BoxedFilter;
use warp::http::StatusCode;
use warp::reply::{Reply, Response};

use neurocare_core::{MODEL_VERSION, RiskEngine, RiskInputs};
use neurocare_persistence::{NewNotification, NewPrediction};
use neurocare_types::{
    NotificationCategory, NotificationChannel, PredictionRequest, RiskAssessment, RiskHistoryResponse,
    RiskLevel, Role,
};

use super::authorize_patient;
use crate::AppContext;
use crate::auth::AuthUser;
use crate::error::{ApiError, respond};
use crate::filters::{authenticated, json_body, require_roles, with_ctx};

pub const RISK_HISTORY_LIMIT: u64 = 10;

pub fn routes(ctx: Arc<AppContext>) -> BoxedFilter<(Response,)> {
    let assess = warp::path!("api" / "risk" / "patient" / String)
        .and(warp::get())
        .and(with_ctx(ctx.clone()))
        .and(authenticated(ctx.clone()))
        .then(handle_risk_assessment)
        .map(respond);

    let history = warp::path!("api" / "risk" / "patient" / String / "history")
        .and(warp::get())
        .and(with_ctx(ctx.clone()))
        .and(authenticated(ctx.clone()))
        .then(handle_risk_history)
        .map(respond);

    let predict = warp::path!("api" / "predictions")
        .and(warp::post())
        .and(with_ctx(ctx.clone()))
        .and(require_roles(ctx, &[Role::Doctor, Role::Admin]))
        .and(json_body::<PredictionRequest>())
        .then(handle_create_prediction)
        .map(respond);

    assess.or(history).unify().or(predict).unify().boxed()
}

/// Scores the patient's current history without persisting anything.
async fn assess_patient(ctx: &AppContext, patient_code: &str) -> Result<RiskAssessment, ApiError> {
    let age = ctx
        .patients
        .find_by_code(patient_code)
        .await?
        .and_then(|patient| patient.age);
    let samples = ctx.scores.samples_for_patient(patient_code).await?;

    let now = Utc::now();
    let inputs = RiskInputs::individual(age, &samples, now);
    Ok(RiskEngine::assess(patient_code, &inputs, now))
}

async fn handle_risk_assessment(
    patient_code: String,
    ctx: Arc<AppContext>,
    user: AuthUser,
) -> Result<impl Reply, ApiError> {
    authorize_patient(&ctx, &user, &patient_code).await?;

    let assessment = assess_patient(&ctx, &patient_code).await?;
    Ok(warp::reply::json(&assessment))
}

async fn handle_risk_history(
    patient_code: String,
    ctx: Arc<AppContext>,
    user: AuthUser,
) -> Result<impl Reply, ApiError> {
    authorize_patient(&ctx, &user, &patient_code).await?;

    let history = ctx
        .predictions
        .history(&patient_code, RISK_HISTORY_LIMIT)
        .await?;
    Ok(warp::reply::json(&RiskHistoryResponse { history }))
}

async fn handle_create_prediction(
    ctx: Arc<AppContext>,
    user: AuthUser,
    request: PredictionRequest,
) -> Result<impl Reply, ApiError> {
    let patient_code = request
        .patient_id
        .filter(|code| !code.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("patientId is required"))?;
    let access = authorize_patient(&ctx, &user, &patient_code).await?;

    let assessment = assess_patient(&ctx, &patient_code).await?;
    let risk = &assessment.current_risk;
    let prediction = ctx
        .predictions
        .record(NewPrediction {
            patient_code: patient_code.clone(),
            model_version: MODEL_VERSION.to_string(),
            risk_label: risk.level.to_string(),
            risk_probability: f64::from(risk.score) / 100.0,
            input_summary: Some(serde_json::json!(assessment.risk_factors)),
        })
        .await?;
    tracing::info!(
        "Prediction {} for patient {}: {} ({})",
        prediction.id,
        patient_code,
        risk.level,
        risk.score
    );

    if risk.level == RiskLevel::High {
        if let Some(doctor_id) = access.doctor_id {
            ctx.notifications
                .create(NewNotification {
                    user_id: doctor_id,
                    channel: NotificationChannel::InApp,
                    category: NotificationCategory::Alert,
                    subject: "High Risk Alert".to_string(),
                    message: format!(
                        "Patient {} was assessed at high cognitive risk (score {}).",
                        patient_code, risk.score
                    ),
                    data: Some(serde_json::json!({
                        "patient_code": patient_code,
                        "prediction_id": prediction.id,
                        "risk_score": risk.score,
                    })),
                })
                .await?;
        }
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&prediction),
        StatusCode::CREATED,
    ))
}
