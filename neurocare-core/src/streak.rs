use chrono::NaiveDate;

/// Streak counters as stored per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakState {
    pub current_streak: i32,
    pub longest_streak: i32,
    pub last_activity_date: NaiveDate,
    pub total_games_played: i32,
    pub total_login_days: i32,
}

impl StreakState {
    /// Zeroed counters, as created when a user first opens their streak.
    pub fn fresh(today: NaiveDate) -> Self {
        Self {
            current_streak: 0,
            longest_streak: 0,
            last_activity_date: today,
            total_games_played: 0,
            total_login_days: 0,
        }
    }
}

/// What a completed game did to the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreakChange {
    Started,
    SameDay,
    Extended,
    Reset,
}

impl StreakChange {
    /// Only a consecutive day can unlock streak achievements.
    pub fn extends(&self) -> bool {
        matches!(self, StreakChange::Extended)
    }
}

/// Moves the streak to `today`, the day a game was completed. The game
/// counter is bumped by the store, so it passes through untouched here.
pub fn advance_streak(mut state: StreakState, today: NaiveDate) -> (StreakState, StreakChange) {
    // A zeroed row has never recorded a game, so today starts it.
    if state.current_streak == 0 {
        state.current_streak = 1;
        state.longest_streak = state.longest_streak.max(1);
        state.total_login_days += 1;
        state.last_activity_date = today;
        return (state, StreakChange::Started);
    }

    let gap = (today - state.last_activity_date).num_days();
    let change = match gap {
        0 => StreakChange::SameDay,
        1 => {
            state.current_streak += 1;
            state.longest_streak = state.longest_streak.max(state.current_streak);
            state.total_login_days += 1;
            StreakChange::Extended
        }
        _ => {
            state.current_streak = 1;
            StreakChange::Reset
        }
    };
    state.last_activity_date = today;
    (state, change)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    /// One game per listed day, starting from a zeroed row.
    fn play(days: &[u32]) -> (StreakState, StreakChange) {
        let mut state = StreakState::fresh(day(days[0]));
        let mut change = StreakChange::Started;
        for d in days {
            (state, change) = advance_streak(state, day(*d));
        }
        (state, change)
    }

    #[test]
    fn test_zeroed_row_starts_streak() {
        let (state, change) = advance_streak(StreakState::fresh(day(5)), day(5));
        assert_eq!(change, StreakChange::Started);
        assert_eq!(state.current_streak, 1);
        assert_eq!(state.longest_streak, 1);
        assert_eq!(state.total_login_days, 1);
        assert_eq!(state.total_games_played, 0);
    }

    #[test]
    fn test_same_day_keeps_counters() {
        let (state, change) = play(&[1, 1]);
        assert_eq!(change, StreakChange::SameDay);
        assert_eq!(state.current_streak, 1);
        assert_eq!(state.total_login_days, 1);
    }

    #[test]
    fn test_consecutive_days_extend() {
        let (state, change) = play(&[1, 2, 3, 4]);
        assert!(change.extends());
        assert_eq!(state.current_streak, 4);
        assert_eq!(state.longest_streak, 4);
        assert_eq!(state.total_login_days, 4);
    }

    #[test]
    fn test_gap_resets_but_keeps_longest() {
        let (state, change) = play(&[1, 2, 5]);
        assert_eq!(change, StreakChange::Reset);
        assert_eq!(state.current_streak, 1);
        assert_eq!(state.longest_streak, 2);
        assert_eq!(state.total_login_days, 2);
        assert_eq!(state.last_activity_date, day(5));

        // Clock moved backwards.
        let (state, change) = advance_streak(state, day(3));
        assert_eq!(change, StreakChange::Reset);
        assert_eq!(state.current_streak, 1);
        assert_eq!(state.total_login_days, 2);
    }
}
