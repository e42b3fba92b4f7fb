pub mod prelude;

pub mod achievements;
pub mod activity_streaks;
pub mod caregiver_assignments;
pub mod game_assignments;
pub mod game_scores;
pub mod notification_preferences;
pub mod notifications;
pub mod patient_reports;
pub mod patients;
pub mod predictions;
pub mod progress_snapshots;
pub mod user_achievements;
pub mod users;
