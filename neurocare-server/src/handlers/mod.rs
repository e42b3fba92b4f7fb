use serde::Deserialize;

use neurocare_core::{PatientAccess, can_view_patient};

use crate::AppContext;
use crate::auth::AuthUser;
use crate::error::ApiError;

pub mod admin;
pub mod auth;
pub mod caregiver;
pub mod doctor;
pub mod gamification;
pub mod notifications;
pub mod patient;
pub mod progress;
pub mod reports;
pub mod risk;
pub mod scores;
pub mod trends;

pub(crate) const PATIENT_NOT_ASSIGNED: &str = "Patient not found or not assigned to you";

/// Checks the caller may read this patient's data.
pub(crate) async fn authorize_patient(
    ctx: &AppContext,
    user: &AuthUser,
    patient_code: &str,
) -> Result<PatientAccess, ApiError> {
    let access = ctx
        .patients
        .access(patient_code)
        .await?
        .ok_or_else(|| ApiError::not_found("Patient not found"))?;

    if !can_view_patient(user.id, user.role, &access) {
        tracing::warn!(
            "User {} ({}) denied access to patient {}",
            user.id,
            user.role,
            patient_code
        );
        return Err(ApiError::forbidden("Access denied"));
    }
    Ok(access)
}

/// A patient assigned to the calling doctor. Unknown and foreign patients
/// look the same to the caller.
pub(crate) async fn owned_patient(
    ctx: &AppContext,
    doctor: &AuthUser,
    patient_code: &str,
) -> Result<PatientAccess, ApiError> {
    match ctx.patients.access(patient_code).await? {
        Some(access) if access.is_doctor(doctor.id) => Ok(access),
        _ => Err(ApiError::not_found(PATIENT_NOT_ASSIGNED)),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DaysQuery {
    pub days: Option<u32>,
}

impl DaysQuery {
    /// The requested window, clamped to 1..=365 days.
    pub fn window(&self, default: u32) -> u32 {
        self.days.unwrap_or(default).clamp(1, 365)
    }
}
