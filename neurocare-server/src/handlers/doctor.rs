use std::sync::Arc;

use warp::Filter;
use warp::filters::BoxedFilter;
use warp::http::StatusCode;
use warp::reply::{Reply, Response};

use neurocare_persistence::{NewPatient, is_unique_violation};
use neurocare_types::{
    AssignGamesRequest, AssignGamesResponse, CaregiverAssignmentRequest, GameKind,
    MessageResponse, NewPatientRequest, PatientScoresResponse, PatientsResponse, Role,
};

use super::{auth::normalize_email, owned_patient};
use crate::AppContext;
use crate::auth::AuthUser;
use crate::error::{ApiError, respond};
use crate::filters::{json_body, require_roles, with_ctx};

const DOCTOR: &[Role] = &[Role::Doctor];

pub fn routes(ctx: Arc<AppContext>) -> BoxedFilter<(Response,)> {
    let list_patients = warp::path!("api" / "doctor" / "patients")
        .and(warp::get())
        .and(with_ctx(ctx.clone()))
        .and(require_roles(ctx.clone(), DOCTOR))
        .then(handle_list_patients)
        .map(respond);

    let create_patient = warp::path!("api" / "doctor" / "patients")
        .and(warp::post())
        .and(with_ctx(ctx.clone()))
        .and(require_roles(ctx.clone(), DOCTOR))
        .and(json_body::<NewPatientRequest>())
        .then(handle_create_patient)
        .map(respond);

    let assign_games = warp::path!("api" / "doctor" / "assign-games")
        .and(warp::post())
        .and(with_ctx(ctx.clone()))
        .and(require_roles(ctx.clone(), DOCTOR))
        .and(json_body::<AssignGamesRequest>())
        .then(handle_assign_games)
        .map(respond);

    let patient_scores = warp::path!("api" / "doctor" / "patients" / String / "scores")
        .and(warp::get())
        .and(with_ctx(ctx.clone()))
        .and(require_roles(ctx.clone(), DOCTOR))
        .then(handle_patient_scores)
        .map(respond);

    let assign_caregiver = warp::path!("api" / "doctor" / "patients" / String / "caregivers")
        .and(warp::post())
        .and(with_ctx(ctx.clone()))
        .and(require_roles(ctx, DOCTOR))
        .and(json_body::<CaregiverAssignmentRequest>())
        .then(handle_assign_caregiver)
        .map(respond);

    list_patients
        .or(create_patient)
        .unify()
        .or(assign_games)
        .unify()
        .or(patient_scores)
        .unify()
        .or(assign_caregiver)
        .unify()
        .boxed()
}

async fn handle_list_patients(
    ctx: Arc<AppContext>,
    doctor: AuthUser,
) -> Result<impl Reply, ApiError> {
    let patients = ctx.patients.list_for_doctor(doctor.id).await?;
    Ok(warp::reply::json(&PatientsResponse { patients }))
}

async fn handle_create_patient(
    ctx: Arc<AppContext>,
    doctor: AuthUser,
    request: NewPatientRequest,
) -> Result<impl Reply, ApiError> {
    let patient_code = request.patient_code.trim().to_string();
    if patient_code.is_empty() {
        return Err(ApiError::bad_request("Patient code is required"));
    }
    if ctx.patients.find_by_code(&patient_code).await?.is_some() {
        return Err(ApiError::conflict("Patient code already exists"));
    }

    let user_id = match request.email.as_deref().map(normalize_email) {
        Some(email) if !email.is_empty() => {
            let account = ctx
                .users
                .find_by_email(&email)
                .await?
                .ok_or_else(|| ApiError::not_found("No account found for that email"))?;
            if account.role != Role::Patient {
                return Err(ApiError::bad_request("Account is not a patient account"));
            }
            if ctx.patients.find_by_user(account.id).await?.is_some() {
                return Err(ApiError::conflict(
                    "Account is already linked to a patient profile",
                ));
            }
            Some(account.id)
        }
        _ => None,
    };

    let created = ctx
        .patients
        .create_patient(NewPatient {
            patient_code: patient_code.clone(),
            user_id,
            doctor_id: Some(doctor.id),
            age: request.age,
            sex: request.sex,
            education_years: request.education_years,
        })
        .await;
    let patient = match created {
        Ok(patient) => patient,
        // A concurrent request took the code or the account first.
        Err(err) if is_unique_violation(&err) => {
            return Err(if ctx.patients.find_by_code(&patient_code).await?.is_some() {
                ApiError::conflict("Patient code already exists")
            } else {
                ApiError::conflict("Account is already linked to a patient profile")
            });
        }
        Err(err) => return Err(err.into()),
    };
    tracing::info!(
        "Doctor {} registered patient {}",
        doctor.id,
        patient.patient_code
    );

    Ok(warp::reply::with_status(
        warp::reply::json(&patient),
        StatusCode::CREATED,
    ))
}

async fn handle_assign_games(
    ctx: Arc<AppContext>,
    doctor: AuthUser,
    request: AssignGamesRequest,
) -> Result<impl Reply, ApiError> {
    owned_patient(&ctx, &doctor, &request.patient_code).await?;

    let mut games: Vec<GameKind> = Vec::with_capacity(request.games.len());
    for game in request.games {
        if !games.contains(&game) {
            games.push(game);
        }
    }

    ctx.patients
        .replace_game_assignments(&request.patient_code, doctor.id, &games)
        .await?;
    tracing::debug!(
        "Assigned {} games to patient {}",
        games.len(),
        request.patient_code
    );

    Ok(warp::reply::json(&AssignGamesResponse {
        message: "Games assigned successfully".to_string(),
        patient_code: request.patient_code,
        games,
    }))
}

async fn handle_patient_scores(
    patient_code: String,
    ctx: Arc<AppContext>,
    doctor: AuthUser,
) -> Result<impl Reply, ApiError> {
    owned_patient(&ctx, &doctor, &patient_code).await?;

    let scores = ctx.scores.list_for_patient(&patient_code).await?;
    let prediction = ctx.predictions.latest(&patient_code).await?;
    Ok(warp::reply::json(&PatientScoresResponse {
        patient_code,
        scores,
        prediction,
    }))
}

async fn handle_assign_caregiver(
    patient_code: String,
    ctx: Arc<AppContext>,
    doctor: AuthUser,
    request: CaregiverAssignmentRequest,
) -> Result<impl Reply, ApiError> {
    owned_patient(&ctx, &doctor, &patient_code).await?;

    let caregiver = ctx
        .users
        .find_by_email(&normalize_email(&request.email))
        .await?
        .ok_or_else(|| ApiError::not_found("Caregiver not found"))?;
    if caregiver.role != Role::Caregiver {
        return Err(ApiError::bad_request("User is not a caregiver"));
    }

    let (message, status) = if ctx
        .patients
        .assign_caregiver(&patient_code, caregiver.id)
        .await?
    {
        tracing::info!("Caregiver {} assigned to patient {}", caregiver.id, patient_code);
        ("Caregiver assigned successfully", StatusCode::CREATED)
    } else {
        ("Caregiver already assigned", StatusCode::OK)
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&MessageResponse::new(message)),
        status,
    ))
}
