/// A threshold an achievement code unlocks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AchievementRule {
    pub code: &'static str,
    pub required: i32,
}

pub const GAME_COUNT_ACHIEVEMENTS: [AchievementRule; 4] = [
    AchievementRule { code: "first_game", required: 1 },
    AchievementRule { code: "games_10", required: 10 },
    AchievementRule { code: "games_50", required: 50 },
    AchievementRule { code: "games_100", required: 100 },
];

pub const STREAK_ACHIEVEMENTS: [AchievementRule; 3] = [
    AchievementRule { code: "streak_3", required: 3 },
    AchievementRule { code: "streak_7", required: 7 },
    AchievementRule { code: "streak_30", required: 30 },
];

pub const ACHIEVEMENT_SUBJECT: &str = "Achievement Unlocked!";

fn earned(rules: &[AchievementRule], value: i32) -> Vec<&'static str> {
    rules
        .iter()
        .filter(|rule| value >= rule.required)
        .map(|rule| rule.code)
        .collect()
}

/// Codes a player with `games_played` completed games qualifies for.
pub fn earned_for_games(games_played: i32) -> Vec<&'static str> {
    earned(&GAME_COUNT_ACHIEVEMENTS, games_played)
}

/// Codes a streak of `current_streak` consecutive days qualifies for.
pub fn earned_for_streak(current_streak: i32) -> Vec<&'static str> {
    earned(&STREAK_ACHIEVEMENTS, current_streak)
}

pub fn unlock_message(name: &str) -> String {
    format!("Congratulations! You've earned the \"{name}\" achievement.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_count_thresholds() {
        assert!(earned_for_games(0).is_empty());
        assert_eq!(earned_for_games(1), vec!["first_game"]);
        assert_eq!(earned_for_games(12), vec!["first_game", "games_10"]);
        assert_eq!(earned_for_games(100).len(), 4);
    }

    #[test]
    fn test_streak_thresholds() {
        assert!(earned_for_streak(2).is_empty());
        assert_eq!(earned_for_streak(7), vec!["streak_3", "streak_7"]);
        assert_eq!(earned_for_streak(45).len(), 3);
    }

    #[test]
    fn test_unlock_message() {
        assert_eq!(
            unlock_message("First Steps"),
            "Congratulations! You've earned the \"First Steps\" achievement."
        );
    }
}
