pub mod gamification_repository;
pub mod notification_repository;
pub mod patient_repository;
pub mod prediction_repository;
pub mod progress_repository;
pub mod report_repository;
pub mod score_repository;
pub mod user_repository;

pub use gamification_repository::GamificationRepository;
pub use notification_repository::{NewNotification, NotificationRepository};
pub use patient_repository::{NewPatient, PatientRepository};
pub use prediction_repository::{NewPrediction, PredictionRepository};
pub use progress_repository::ProgressRepository;
pub use report_repository::ReportRepository;
pub use score_repository::{NewScore, ScoreRepository};
pub use user_repository::{NewUser, UserCredentials, UserRepository};

use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::{DbErr, SqlErr};

pub(crate) fn now() -> DateTimeWithTimeZone {
    chrono::Utc::now().into()
}

/// Whether a repository error came from a unique index, e.g. a second
/// insert of the same email that slipped past the existence check.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    err.downcast_ref::<DbErr>()
        .and_then(DbErr::sql_err)
        .is_some_and(|e| matches!(e, SqlErr::UniqueConstraintViolation(_)))
}
