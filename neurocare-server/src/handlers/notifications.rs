use std::sync::Arc;

use serde::Deserialize;
use warp::Filter;
use warp::filters::BoxedFilter;
use warp::reply::{Reply, Response};

use neurocare_types::{MessageResponse, NotificationsResponse, UpdatePreferencesRequest};

use crate::AppContext;
use crate::auth::AuthUser;
use crate::error::{ApiError, respond};
use crate::filters::{authenticated, json_body, with_ctx};

pub const DEFAULT_NOTIFICATION_LIMIT: u64 = 50;
pub const MAX_NOTIFICATION_LIMIT: u64 = 200;
pub const REMINDER_FREQUENCIES: [&str; 3] = ["daily", "weekly", "never"];

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotificationsQuery {
    limit: Option<u64>,
    unread_only: Option<bool>,
}

pub fn routes(ctx: Arc<AppContext>) -> BoxedFilter<(Response,)> {
    let list = warp::path!("api" / "notifications")
        .and(warp::get())
        .and(warp::query::<NotificationsQuery>())
        .and(with_ctx(ctx.clone()))
        .and(authenticated(ctx.clone()))
        .then(handle_list_notifications)
        .map(respond);

    let mark_read = warp::path!("api" / "notifications" / i32 / "read")
        .and(warp::patch())
        .and(with_ctx(ctx.clone()))
        .and(authenticated(ctx.clone()))
        .then(handle_mark_read)
        .map(respond);

    let mark_all_read = warp::path!("api" / "notifications" / "mark-all-read")
        .and(warp::post())
        .and(with_ctx(ctx.clone()))
        .and(authenticated(ctx.clone()))
        .then(handle_mark_all_read)
        .map(respond);

    let preferences = warp::path!("api" / "notifications" / "preferences")
        .and(warp::get())
        .and(with_ctx(ctx.clone()))
        .and(authenticated(ctx.clone()))
        .then(handle_get_preferences)
        .map(respond);

    let update_preferences = warp::path!("api" / "notifications" / "preferences")
        .and(warp::put())
        .and(with_ctx(ctx.clone()))
        .and(authenticated(ctx))
        .and(json_body::<UpdatePreferencesRequest>())
        .then(handle_update_preferences)
        .map(respond);

    list.or(mark_read)
        .unify()
        .or(mark_all_read)
        .unify()
        .or(preferences)
        .unify()
        .or(update_preferences)
        .unify()
        .boxed()
}

async fn handle_list_notifications(
    query: NotificationsQuery,
    ctx: Arc<AppContext>,
    user: AuthUser,
) -> Result<impl Reply, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_NOTIFICATION_LIMIT)
        .clamp(1, MAX_NOTIFICATION_LIMIT);
    let notifications = ctx
        .notifications
        .list(user.id, limit, query.unread_only.unwrap_or(false))
        .await?;
    Ok(warp::reply::json(&NotificationsResponse { notifications }))
}

async fn handle_mark_read(
    notification_id: i32,
    ctx: Arc<AppContext>,
    user: AuthUser,
) -> Result<impl Reply, ApiError> {
    let notification = ctx
        .notifications
        .mark_read(user.id, notification_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Notification not found"))?;
    Ok(warp::reply::json(&notification))
}

async fn handle_mark_all_read(ctx: Arc<AppContext>, user: AuthUser) -> Result<impl Reply, ApiError> {
    let updated = ctx.notifications.mark_all_read(user.id).await?;
    Ok(warp::reply::json(&MessageResponse::new(format!(
        "Marked {updated} notifications as read"
    ))))
}

async fn handle_get_preferences(ctx: Arc<AppContext>, user: AuthUser) -> Result<impl Reply, ApiError> {
    let preferences = ctx.notifications.preferences(user.id).await?;
    Ok(warp::reply::json(&preferences))
}

async fn handle_update_preferences(
    ctx: Arc<AppContext>,
    user: AuthUser,
    request: UpdatePreferencesRequest,
) -> Result<impl Reply, ApiError> {
    if let Some(frequency) = request.reminder_frequency.as_deref() {
        if !REMINDER_FREQUENCIES.contains(&frequency) {
            return Err(ApiError::bad_request(format!(
                "reminderFrequency must be one of {}",
                REMINDER_FREQUENCIES.join(", ")
            )));
        }
    }

    let preferences = ctx
        .notifications
        .update_preferences(user.id, request)
        .await?;
    Ok(warp::reply::json(&preferences))
}
