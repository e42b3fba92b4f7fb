use std::sync::Arc;

use serde::Deserialize;
use uuid::Uuid;
use warp::Filter;
use warp::filters::BoxedFilter;
use warp::reply::{Reply, Response};

use neurocare_core::Permission;
use neurocare_types::{
    RoleChangeRequest, RoleInfo, RolesResponse, Role, SystemAnalytics, UsersResponse,
};

use crate::AppContext;
use crate::auth::AuthUser;
use crate::error::{ApiError, respond};
use crate::filters::{json_body, require_permission, with_ctx};

#[derive(Debug, Default, Deserialize)]
struct UsersQuery {
    role: Option<String>,
}

pub fn routes(ctx: Arc<AppContext>) -> BoxedFilter<(Response,)> {
    let users = warp::path!("api" / "admin" / "users")
        .and(warp::get())
        .and(warp::query::<UsersQuery>())
        .and(with_ctx(ctx.clone()))
        .and(require_permission(ctx.clone(), Permission::ManageUsers))
        .then(handle_list_users)
        .map(respond);

    let change_role = warp::path!("api" / "admin" / "users" / Uuid / "role")
        .and(warp::post())
        .and(with_ctx(ctx.clone()))
        .and(require_permission(ctx.clone(), Permission::ManageRoles))
        .and(json_body::<RoleChangeRequest>())
        .then(handle_change_role)
        .map(respond);

    let roles = warp::path!("api" / "admin" / "roles")
        .and(warp::get())
        .and(require_permission(ctx.clone(), Permission::ManageRoles))
        .then(handle_roles)
        .map(respond);

    let analytics = warp::path!("api" / "admin" / "analytics")
        .and(warp::get())
        .and(with_ctx(ctx.clone()))
        .and(require_permission(ctx, Permission::ViewSystemAnalytics))
        .then(handle_analytics)
        .map(respond);

    users
        .or(change_role)
        .unify()
        .or(roles)
        .unify()
        .or(analytics)
        .unify()
        .boxed()
}

async fn handle_list_users(
    query: UsersQuery,
    ctx: Arc<AppContext>,
    _admin: AuthUser,
) -> Result<impl Reply, ApiError> {
    let role = match query.role.as_deref() {
        None | Some("") => None,
        Some(value) => Some(
            value
                .parse::<Role>()
                .map_err(|_| ApiError::bad_request(format!("Invalid role '{value}'")))?,
        ),
    };

    let users = ctx.users.list_users(role).await?;
    Ok(warp::reply::json(&UsersResponse { users }))
}

async fn handle_change_role(
    user_id: Uuid,
    ctx: Arc<AppContext>,
    admin: AuthUser,
    request: RoleChangeRequest,
) -> Result<impl Reply, ApiError> {
    let user = ctx
        .users
        .update_role(user_id, request.role)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    tracing::info!(
        "Admin {} changed role of {} to {}",
        admin.id,
        user.id,
        user.role
    );
    Ok(warp::reply::json(&user))
}

async fn handle_roles(_admin: AuthUser) -> Result<impl Reply, ApiError> {
    let roles = Role::ALL
        .iter()
        .map(|role| RoleInfo {
            name: *role,
            description: role.description().to_string(),
        })
        .collect();
    Ok(warp::reply::json(&RolesResponse { roles }))
}

async fn handle_analytics(ctx: Arc<AppContext>, _admin: AuthUser) -> Result<impl Reply, ApiError> {
    let analytics = SystemAnalytics {
        total_users: ctx.users.count().await? as u32,
        total_doctors: ctx.users.count_by_role(Role::Doctor).await? as u32,
        total_patients: ctx.users.count_by_role(Role::Patient).await? as u32,
        total_caregivers: ctx.users.count_by_role(Role::Caregiver).await? as u32,
        total_admins: ctx.users.count_by_role(Role::Admin).await? as u32,
        patient_profiles: ctx.patients.count().await? as u32,
        completed_assessments: ctx.scores.count().await? as u32,
        total_reports: ctx.reports.count().await? as u32,
        total_predictions: ctx.predictions.count().await? as u32,
    };
    Ok(warp::reply::json(&analytics))
}
