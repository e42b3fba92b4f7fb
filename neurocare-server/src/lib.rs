use std::sync::Arc;

use sea_orm::DatabaseConnection;
use warp::Filter;

use crate::auth::AuthService;
use crate::error::handle_rejection;
use neurocare_persistence::{
    GamificationRepository, NotificationRepository, PatientRepository, PredictionRepository,
    ProgressRepository, ReportRepository, ScoreRepository, UserRepository,
};

pub mod auth;
pub mod config;
pub mod error;
pub mod filters;
pub mod handlers;
pub mod password;

pub const SERVICE_NAME: &str = "neurocare-server";

/// Services shared by every request.
pub struct AppContext {
    pub auth: AuthService,
    pub users: UserRepository,
    pub patients: PatientRepository,
    pub scores: ScoreRepository,
    pub predictions: PredictionRepository,
    pub reports: ReportRepository,
    pub gamification: GamificationRepository,
    pub notifications: NotificationRepository,
    pub progress: ProgressRepository,
}

impl AppContext {
    pub fn new(db: DatabaseConnection, auth: AuthService) -> Self {
        Self {
            auth,
            users: UserRepository::new(db.clone()),
            patients: PatientRepository::new(db.clone()),
            scores: ScoreRepository::new(db.clone()),
            predictions: PredictionRepository::new(db.clone()),
            reports: ReportRepository::new(db.clone()),
            gamification: GamificationRepository::new(db.clone()),
            notifications: NotificationRepository::new(db.clone()),
            progress: ProgressRepository::new(db),
        }
    }
}

pub fn create_routes(
    ctx: Arc<AppContext>,
    cors_origin: Option<String>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    // Health check endpoint
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| {
            warp::reply::json(&serde_json::json!({
                "status": "healthy",
                "service": SERVICE_NAME,
                "version": env!("CARGO_PKG_VERSION"),
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }))
        });

    let api = handlers::auth::routes(ctx.clone())
        .or(handlers::doctor::routes(ctx.clone()))
        .unify()
        .or(handlers::patient::routes(ctx.clone()))
        .unify()
        .or(handlers::scores::routes(ctx.clone()))
        .unify()
        .or(handlers::gamification::routes(ctx.clone()))
        .unify()
        .or(handlers::progress::routes(ctx.clone()))
        .unify()
        .or(handlers::trends::routes(ctx.clone()))
        .unify()
        .or(handlers::risk::routes(ctx.clone()))
        .unify()
        .or(handlers::reports::routes(ctx.clone()))
        .unify()
        .or(handlers::notifications::routes(ctx.clone()))
        .unify()
        .or(handlers::caregiver::routes(ctx.clone()))
        .unify()
        .or(handlers::admin::routes(ctx))
        .unify();

    // CORS configuration
    let cors = warp::cors()
        .allow_headers(vec!["content-type", "authorization"])
        .allow_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE"]);
    let cors = match cors_origin.as_deref() {
        Some(origin) => cors.allow_origin(origin),
        None => cors.allow_any_origin(),
    };

    health
        .or(api)
        .recover(handle_rejection)
        .with(cors)
        .with(warp::log("neurocare"))
}
