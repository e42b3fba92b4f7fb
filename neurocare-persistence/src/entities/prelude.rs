pub use super::achievements::Entity as Achievements;
pub use super::activity_streaks::Entity as ActivityStreaks;
pub use super::caregiver_assignments::Entity as CaregiverAssignments;
pub use super::game_assignments::Entity as GameAssignments;
pub use super::game_scores::Entity as GameScores;
pub use super::notification_preferences::Entity as NotificationPreferences;
pub use super::notifications::Entity as Notifications;
pub use super::patient_reports::Entity as PatientReports;
pub use super::patients::Entity as Patients;
pub use super::predictions::Entity as Predictions;
pub use super::progress_snapshots::Entity as ProgressSnapshots;
pub use super::user_achievements::Entity as UserAchievements;
pub use super::users::Entity as Users;
