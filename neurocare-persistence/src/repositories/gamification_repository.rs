use anyhow::Result;
use chrono::NaiveDate;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait, TryInsertResult,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::entities::{
    achievements, activity_streaks, notifications, prelude::*, user_achievements, users,
};
use neurocare_core::{ACHIEVEMENT_SUBJECT, StreakChange, StreakState, advance_streak, unlock_message};
use neurocare_types::{
    Achievement, AchievementStatus, ActivityStreak, LeaderboardEntry, NotificationCategory,
    NotificationChannel, Role,
};

/// Progress recorded on an earned achievement.
const EARNED_PROGRESS: i32 = 100;

pub struct GamificationRepository {
    db: DatabaseConnection,
}

impl GamificationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_achievement(model: achievements::Model) -> Achievement {
        Achievement {
            id: model.id,
            code: model.code,
            name: model.name,
            description: model.description,
            category: model.category,
            icon: model.icon,
            points: model.points,
            requirement: model.requirement,
        }
    }

    fn model_to_streak(model: activity_streaks::Model) -> ActivityStreak {
        ActivityStreak {
            user_id: model.user_id,
            current_streak: model.current_streak,
            longest_streak: model.longest_streak,
            last_activity_date: model.last_activity_date.to_string(),
            total_games_played: model.total_games_played,
            total_login_days: model.total_login_days,
            updated_at: model.updated_at.to_rfc3339(),
        }
    }

    /// The catalog with this user's progress, by category then points.
    pub async fn achievements_for_user(&self, user_id: Uuid) -> Result<Vec<AchievementStatus>> {
        let catalog = Achievements::find()
            .order_by_asc(achievements::Column::Category)
            .order_by_asc(achievements::Column::Points)
            .all(&self.db)
            .await?;
        let earned: HashMap<i32, user_achievements::Model> = UserAchievements::find()
            .filter(user_achievements::Column::UserId.eq(user_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|ua| (ua.achievement_id, ua))
            .collect();

        Ok(catalog
            .into_iter()
            .map(|achievement| {
                let record = earned.get(&achievement.id);
                AchievementStatus {
                    earned_at: record.map(|ua| ua.earned_at.to_rfc3339()),
                    progress: record.map(|ua| ua.progress).unwrap_or(0),
                    is_earned: record.is_some(),
                    achievement: Self::model_to_achievement(achievement),
                }
            })
            .collect())
    }

    /// Grants an achievement and posts the unlock notification. Returns `None`
    /// when the code is unknown or the user already holds it.
    pub async fn award(&self, user_id: Uuid, code: &str) -> Result<Option<Achievement>> {
        let Some(achievement) = Achievements::find()
            .filter(achievements::Column::Code.eq(code))
            .one(&self.db)
            .await?
        else {
            tracing::warn!("Unknown achievement code {}", code);
            return Ok(None);
        };

        let now = super::now();
        let txn = self.db.begin().await?;
        let inserted = UserAchievements::insert(user_achievements::ActiveModel {
            user_id: ActiveValue::Set(user_id),
            achievement_id: ActiveValue::Set(achievement.id),
            progress: ActiveValue::Set(EARNED_PROGRESS),
            earned_at: ActiveValue::Set(now),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([
                user_achievements::Column::UserId,
                user_achievements::Column::AchievementId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .do_nothing()
        .exec(&txn)
        .await?;
        if !matches!(inserted, TryInsertResult::Inserted(_)) {
            txn.rollback().await?;
            return Ok(None);
        }

        Notifications::insert(notifications::ActiveModel {
            user_id: ActiveValue::Set(user_id),
            channel: ActiveValue::Set(NotificationChannel::InApp.as_str().to_string()),
            category: ActiveValue::Set(NotificationCategory::Achievement.as_str().to_string()),
            subject: ActiveValue::Set(ACHIEVEMENT_SUBJECT.to_string()),
            message: ActiveValue::Set(unlock_message(&achievement.name)),
            data: ActiveValue::Set(Some(serde_json::json!({
                "achievement_code": achievement.code,
                "points": achievement.points,
            }))),
            is_read: ActiveValue::Set(false),
            sent_at: ActiveValue::Set(now),
            read_at: ActiveValue::Set(None),
            ..Default::default()
        })
        .exec(&txn)
        .await?;
        txn.commit().await?;

        tracing::info!("User {} earned achievement {}", user_id, achievement.code);
        Ok(Some(Self::model_to_achievement(achievement)))
    }

    /// Awards every code in `codes` the user does not hold yet.
    pub async fn award_all(&self, user_id: Uuid, codes: &[&str]) -> Result<Vec<Achievement>> {
        let mut newly_earned = Vec::new();
        for code in codes {
            if let Some(achievement) = self.award(user_id, code).await? {
                newly_earned.push(achievement);
            }
        }
        Ok(newly_earned)
    }

    fn model_to_state(model: &activity_streaks::Model) -> StreakState {
        StreakState {
            current_streak: model.current_streak,
            longest_streak: model.longest_streak,
            last_activity_date: model.last_activity_date,
            total_games_played: model.total_games_played,
            total_login_days: model.total_login_days,
        }
    }

    pub async fn streak_state(&self, user_id: Uuid) -> Result<Option<StreakState>> {
        let model = ActivityStreaks::find()
            .filter(activity_streaks::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        Ok(model.as_ref().map(Self::model_to_state))
    }

    /// Inserts a zeroed row unless the user already has one.
    async fn ensure_streak<C: ConnectionTrait>(conn: &C, user_id: Uuid, today: NaiveDate) -> Result<()> {
        let fresh = StreakState::fresh(today);
        ActivityStreaks::insert(activity_streaks::ActiveModel {
            user_id: ActiveValue::Set(user_id),
            current_streak: ActiveValue::Set(fresh.current_streak),
            longest_streak: ActiveValue::Set(fresh.longest_streak),
            last_activity_date: ActiveValue::Set(fresh.last_activity_date),
            total_games_played: ActiveValue::Set(fresh.total_games_played),
            total_login_days: ActiveValue::Set(fresh.total_login_days),
            updated_at: ActiveValue::Set(super::now()),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::column(activity_streaks::Column::UserId)
                .do_nothing()
                .to_owned(),
        )
        .do_nothing()
        .exec(conn)
        .await?;
        Ok(())
    }

    /// The user's streak, created zeroed with `today` as last activity if absent.
    pub async fn get_or_create_streak(&self, user_id: Uuid, today: NaiveDate) -> Result<ActivityStreak> {
        Self::ensure_streak(&self.db, user_id, today).await?;
        let model = ActivityStreaks::find()
            .filter(activity_streaks::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve streak for user {}", user_id))?;
        Ok(Self::model_to_streak(model))
    }

    /// Counts one completed game played on `today` and moves the streak.
    /// The counter is bumped in SQL and the row stays locked until commit.
    pub async fn record_game(
        &self,
        user_id: Uuid,
        today: NaiveDate,
    ) -> Result<(ActivityStreak, StreakChange)> {
        let txn = self.db.begin().await?;
        Self::ensure_streak(&txn, user_id, today).await?;

        ActivityStreaks::update_many()
            .col_expr(
                activity_streaks::Column::TotalGamesPlayed,
                Expr::col(activity_streaks::Column::TotalGamesPlayed).add(1),
            )
            .filter(activity_streaks::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;

        let model = ActivityStreaks::find()
            .filter(activity_streaks::Column::UserId.eq(user_id))
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve streak for user {}", user_id))?;

        let (state, change) = advance_streak(Self::model_to_state(&model), today);
        let mut active: activity_streaks::ActiveModel = model.into();
        active.current_streak = ActiveValue::Set(state.current_streak);
        active.longest_streak = ActiveValue::Set(state.longest_streak);
        active.last_activity_date = ActiveValue::Set(state.last_activity_date);
        active.total_login_days = ActiveValue::Set(state.total_login_days);
        active.updated_at = ActiveValue::Set(super::now());
        let saved = active.update(&txn).await?;
        txn.commit().await?;

        Ok((Self::model_to_streak(saved), change))
    }

    /// Patients ranked by achievement points, only those with at least one
    /// achievement.
    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let earned = UserAchievements::find()
            .find_also_related(Achievements)
            .all(&self.db)
            .await?;

        let mut totals: HashMap<Uuid, (u32, i32)> = HashMap::new();
        for (record, achievement) in earned {
            let entry = totals.entry(record.user_id).or_default();
            entry.0 += 1;
            entry.1 += achievement.map(|a| a.points).unwrap_or(0);
        }
        if totals.is_empty() {
            return Ok(Vec::new());
        }

        let patients = Users::find()
            .filter(users::Column::Id.is_in(totals.keys().copied().collect::<Vec<_>>()))
            .filter(users::Column::Role.eq(Role::Patient.as_str()))
            .all(&self.db)
            .await?;

        let mut entries: Vec<LeaderboardEntry> = patients
            .into_iter()
            .filter_map(|user| {
                let (count, points) = totals.get(&user.id).copied()?;
                Some(LeaderboardEntry {
                    user_id: user.id,
                    full_name: user.full_name,
                    achievements_earned: count,
                    total_points: points,
                    rank: 0,
                })
            })
            .collect();
        entries.sort_by(|a, b| {
            b.total_points
                .cmp(&a.total_points)
                .then(b.achievements_earned.cmp(&a.achievements_earned))
        });
        entries.truncate(limit);
        for (index, entry) in entries.iter_mut().enumerate() {
            entry.rank = (index + 1) as u32;
        }

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_to_memory_database;
    use crate::{NewUser, NotificationRepository, UserRepository};
    use migration::{Migrator, MigratorTrait};

    async fn setup_test_db() -> DatabaseConnection {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn create_user(db: &DatabaseConnection, name: &str, role: Role) -> Uuid {
        UserRepository::new(db.clone())
            .create_user(NewUser {
                email: format!("{}@example.com", name.to_lowercase()),
                password_hash: "hash".to_string(),
                full_name: Some(name.to_string()),
                role,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_catalog_is_seeded() {
        let db = setup_test_db().await;
        let user = create_user(&db, "Ann", Role::Patient).await;
        let repo = GamificationRepository::new(db);

        let statuses = repo.achievements_for_user(user).await.unwrap();
        assert_eq!(statuses.len(), 7);
        assert!(statuses.iter().all(|s| !s.is_earned && s.progress == 0));
        // "games" sorts before "streak", cheapest first within a category.
        assert_eq!(statuses[0].achievement.code, "first_game");
        assert_eq!(statuses[4].achievement.code, "streak_3");
    }

    #[tokio::test]
    async fn test_award_is_idempotent_and_notifies() {
        let db = setup_test_db().await;
        let user = create_user(&db, "Ann", Role::Patient).await;
        let repo = GamificationRepository::new(db.clone());

        let first = repo.award(user, "first_game").await.unwrap().unwrap();
        assert_eq!(first.points, 10);
        assert!(repo.award(user, "first_game").await.unwrap().is_none());
        assert!(repo.award(user, "no_such_code").await.unwrap().is_none());

        let statuses = repo.achievements_for_user(user).await.unwrap();
        let earned: Vec<_> = statuses.iter().filter(|s| s.is_earned).collect();
        assert_eq!(earned.len(), 1);
        assert_eq!(earned[0].progress, 100);

        let notifications = NotificationRepository::new(db)
            .list(user, 50, false)
            .await
            .unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].subject, "Achievement Unlocked!");
        assert_eq!(notifications[0].category, NotificationCategory::Achievement);
    }

    #[tokio::test]
    async fn test_streak_round_trip() {
        let db = setup_test_db().await;
        let user = create_user(&db, "Ann", Role::Patient).await;
        let repo = GamificationRepository::new(db);
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        assert!(repo.streak_state(user).await.unwrap().is_none());
        let fresh = repo.get_or_create_streak(user, today).await.unwrap();
        assert_eq!(fresh.current_streak, 0);
        assert_eq!(fresh.last_activity_date, "2024-06-01");

        let (saved, change) = repo.record_game(user, today).await.unwrap();
        assert_eq!(change, StreakChange::Started);
        assert_eq!(saved.current_streak, 1);
        assert_eq!(saved.total_games_played, 1);
        assert_eq!(saved.total_login_days, 1);

        let again = repo.get_or_create_streak(user, today).await.unwrap();
        assert_eq!(again.total_games_played, 1);
    }

    #[tokio::test]
    async fn test_record_game_without_row_starts_streak() {
        let db = setup_test_db().await;
        let user = create_user(&db, "Ann", Role::Patient).await;
        let repo = GamificationRepository::new(db);
        let day = |d| NaiveDate::from_ymd_opt(2024, 6, d).unwrap();

        let (streak, change) = repo.record_game(user, day(1)).await.unwrap();
        assert_eq!(change, StreakChange::Started);
        assert_eq!(streak.total_games_played, 1);

        let (streak, change) = repo.record_game(user, day(2)).await.unwrap();
        assert_eq!(change, StreakChange::Extended);
        assert_eq!(streak.current_streak, 2);

        let (streak, change) = repo.record_game(user, day(6)).await.unwrap();
        assert_eq!(change, StreakChange::Reset);
        assert_eq!(streak.current_streak, 1);
        assert_eq!(streak.longest_streak, 2);
        assert_eq!(streak.total_games_played, 3);
        assert_eq!(streak.total_login_days, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_games_are_all_counted() {
        let db = setup_test_db().await;
        let user = create_user(&db, "Ann", Role::Patient).await;
        let repo = std::sync::Arc::new(GamificationRepository::new(db));
        let today = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.record_game(user, today).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let state = repo.streak_state(user).await.unwrap().unwrap();
        assert_eq!(state.total_games_played, 8);
        assert_eq!(state.current_streak, 1);
        assert_eq!(state.total_login_days, 1);
    }

    #[tokio::test]
    async fn test_leaderboard_ranks_patients_only() {
        let db = setup_test_db().await;
        let ann = create_user(&db, "Ann", Role::Patient).await;
        let ben = create_user(&db, "Ben", Role::Patient).await;
        let doc = create_user(&db, "Doc", Role::Doctor).await;
        create_user(&db, "Cal", Role::Patient).await;
        let repo = GamificationRepository::new(db);

        repo.award_all(ann, &["first_game"]).await.unwrap();
        repo.award_all(ben, &["first_game", "games_10"]).await.unwrap();
        repo.award_all(doc, &["games_100"]).await.unwrap();

        let board = repo.leaderboard(50).await.unwrap();
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].user_id, ben);
        assert_eq!(board[0].total_points, 35);
        assert_eq!(board[0].achievements_earned, 2);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[1].user_id, ann);
        assert_eq!(board[1].rank, 2);

        assert_eq!(repo.leaderboard(1).await.unwrap().len(), 1);
    }
}
