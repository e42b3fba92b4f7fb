use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Achievement {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub icon: Option<String>,
    pub points: i32,
    pub requirement: i32,
}

/// An achievement from the catalog together with one user's progress on it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AchievementStatus {
    pub achievement: Achievement,
    pub earned_at: Option<String>,
    pub progress: i32,
    pub is_earned: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct AchievementsResponse {
    pub achievements: Vec<AchievementStatus>,
    pub total_earned: u32,
    pub total_points: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CheckAchievementsResponse {
    pub newly_earned: Vec<Achievement>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ActivityStreak {
    pub user_id: Uuid,
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_activity_date: String, // YYYY-MM-DD
    pub total_games_played: i32,
    pub total_login_days: i32,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StreakUpdateResponse {
    pub streak: ActivityStreak,
    pub new_achievements: Vec<Achievement>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LeaderboardEntry {
    pub user_id: Uuid,
    pub full_name: Option<String>,
    pub achievements_earned: u32,
    pub total_points: i32,
    pub rank: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LeaderboardResponse {
    pub leaderboard: Vec<LeaderboardEntry>,
}
