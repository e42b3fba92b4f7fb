use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;
use warp::Filter;
use warp::filters::BoxedFilter;
use warp::reply::{Reply, Response};

use neurocare_core::{earned_for_games, earned_for_streak};
use neurocare_types::{
    AchievementsResponse, CheckAchievementsResponse, LeaderboardResponse, StreakUpdateResponse,
};

use crate::AppContext;
use crate::auth::AuthUser;
use crate::error::{ApiError, respond};
use crate::filters::{authenticated, with_ctx};

pub const LEADERBOARD_SIZE: usize = 50;

pub fn routes(ctx: Arc<AppContext>) -> BoxedFilter<(Response,)> {
    let achievements = warp::path!("api" / "gamification" / "achievements")
        .and(warp::get())
        .and(with_ctx(ctx.clone()))
        .and(authenticated(ctx.clone()))
        .then(handle_achievements)
        .map(respond);

    let check = warp::path!("api" / "gamification" / "achievements" / "check")
        .and(warp::post())
        .and(with_ctx(ctx.clone()))
        .and(authenticated(ctx.clone()))
        .then(handle_check_achievements)
        .map(respond);

    let streak = warp::path!("api" / "gamification" / "streak")
        .and(warp::get())
        .and(with_ctx(ctx.clone()))
        .and(authenticated(ctx.clone()))
        .then(handle_streak)
        .map(respond);

    let update_streak = warp::path!("api" / "gamification" / "streak" / "update")
        .and(warp::post())
        .and(with_ctx(ctx.clone()))
        .and(authenticated(ctx.clone()))
        .then(handle_update_streak)
        .map(respond);

    let leaderboard = warp::path!("api" / "gamification" / "leaderboard")
        .and(warp::get())
        .and(with_ctx(ctx.clone()))
        .and(authenticated(ctx))
        .then(handle_leaderboard)
        .map(respond);

    achievements
        .or(check)
        .unify()
        .or(streak)
        .unify()
        .or(update_streak)
        .unify()
        .or(leaderboard)
        .unify()
        .boxed()
}

/// Applies one completed game played on `today` and awards the streak
/// achievements a consecutive day unlocks.
pub(crate) async fn record_activity(
    ctx: &AppContext,
    user_id: Uuid,
    today: NaiveDate,
) -> anyhow::Result<StreakUpdateResponse> {
    let (streak, change) = ctx.gamification.record_game(user_id, today).await?;
    tracing::debug!(
        "Streak for user {}: {:?}, now {} days",
        user_id,
        change,
        streak.current_streak
    );

    let new_achievements = if change.extends() {
        let codes = earned_for_streak(streak.current_streak);
        ctx.gamification.award_all(user_id, &codes).await?
    } else {
        Vec::new()
    };

    Ok(StreakUpdateResponse {
        streak,
        new_achievements,
    })
}

/// Awards the game-count achievements the user's total now qualifies for.
pub(crate) async fn check_game_achievements(
    ctx: &AppContext,
    user_id: Uuid,
) -> anyhow::Result<CheckAchievementsResponse> {
    let games_played = ctx
        .gamification
        .streak_state(user_id)
        .await?
        .map(|state| state.total_games_played)
        .unwrap_or(0);

    let codes = earned_for_games(games_played);
    let newly_earned = ctx.gamification.award_all(user_id, &codes).await?;
    Ok(CheckAchievementsResponse { newly_earned })
}

async fn handle_achievements(ctx: Arc<AppContext>, user: AuthUser) -> Result<impl Reply, ApiError> {
    let achievements = ctx.gamification.achievements_for_user(user.id).await?;
    let earned = achievements.iter().filter(|a| a.is_earned);
    let total_earned = earned.clone().count() as u32;
    let total_points = earned.map(|a| a.achievement.points).sum();

    Ok(warp::reply::json(&AchievementsResponse {
        achievements,
        total_earned,
        total_points,
    }))
}

async fn handle_check_achievements(
    ctx: Arc<AppContext>,
    user: AuthUser,
) -> Result<impl Reply, ApiError> {
    let response = check_game_achievements(&ctx, user.id).await?;
    Ok(warp::reply::json(&response))
}

async fn handle_streak(ctx: Arc<AppContext>, user: AuthUser) -> Result<impl Reply, ApiError> {
    let today = Utc::now().date_naive();
    let streak = ctx.gamification.get_or_create_streak(user.id, today).await?;
    Ok(warp::reply::json(&streak))
}

async fn handle_update_streak(ctx: Arc<AppContext>, user: AuthUser) -> Result<impl Reply, ApiError> {
    let today = Utc::now().date_naive();
    let response = record_activity(&ctx, user.id, today).await?;
    Ok(warp::reply::json(&response))
}

async fn handle_leaderboard(ctx: Arc<AppContext>, _user: AuthUser) -> Result<impl Reply, ApiError> {
    let leaderboard = ctx.gamification.leaderboard(LEADERBOARD_SIZE).await?;
    Ok(warp::reply::json(&LeaderboardResponse { leaderboard }))
}
