#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, Utc};
use migration::{Migrator, MigratorTrait};
use neurocare_persistence::entities::game_scores;
use neurocare_persistence::{NewUser, connect_to_memory_database};
use sea_orm::{ActiveValue, DatabaseConnection, EntityTrait};
use neurocare_server::{AppContext, auth::AuthService, create_routes};
use neurocare_types::Role;
use serde_json::{Value, json};

pub const TEST_PASSWORD: &str = "secret123";

/// A fresh in-memory server with its shared context.
pub struct TestApp {
    pub ctx: Arc<AppContext>,
    pub db: DatabaseConnection,
}

/// Status code and decoded JSON body (`Null` when the body is empty).
pub struct TestResponse {
    pub status: u16,
    pub body: Value,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let auth = AuthService::new("test-secret", 24, 1000);
        Self {
            ctx: Arc::new(AppContext::new(db.clone(), auth)),
            db,
        }
    }

    pub async fn request(
        &self,
        method: &str,
        path: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let app = create_routes(self.ctx.clone(), None);
        let mut request = warp::test::request().method(method).path(path);
        if let Some(token) = token {
            request = request.header("authorization", format!("Bearer {token}"));
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request.reply(&app).await;
        TestResponse {
            status: response.status().as_u16(),
            body: serde_json::from_slice(response.body()).unwrap_or(Value::Null),
        }
    }

    pub async fn get(&self, path: &str, token: &str) -> TestResponse {
        self.request("GET", path, Some(token), None).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(token), Some(body)).await
    }

    /// Signs up through the API and returns the session token.
    pub async fn signup(&self, email: &str, role: Role) -> String {
        let response = self
            .request(
                "POST",
                "/api/auth/signup",
                None,
                Some(json!({
                    "email": email,
                    "password": TEST_PASSWORD,
                    "fullName": "Test User",
                    "role": role,
                })),
            )
            .await;
        assert_eq!(response.status, 201, "signup failed: {}", response.body);
        response.body["token"].as_str().unwrap().to_string()
    }

    /// Creates an account directly, for roles that cannot self-register.
    pub async fn provision(&self, email: &str, role: Role) -> String {
        let user = self
            .ctx
            .users
            .create_user(NewUser {
                email: email.to_string(),
                password_hash: self.ctx.auth.hash_password(TEST_PASSWORD).await.unwrap(),
                full_name: Some("Provisioned User".to_string()),
                role,
            })
            .await
            .unwrap();
        self.ctx.auth.issue_token(&user).unwrap()
    }

    /// A doctor with patient `code` linked to a fresh patient account.
    /// Returns `(doctor_token, patient_token)`.
    pub async fn doctor_with_patient(&self, code: &str) -> (String, String) {
        self.doctor_with_patient_aged(code, 70).await
    }

    pub async fn doctor_with_patient_aged(&self, code: &str, age: i32) -> (String, String) {
        let doctor = self.signup(&format!("doctor-{code}@example.com"), Role::Doctor).await;
        let patient_email = format!("patient-{code}@example.com");
        let patient = self.signup(&patient_email, Role::Patient).await;

        let response = self
            .post(
                "/api/doctor/patients",
                &doctor,
                json!({"patientCode": code, "age": age, "email": patient_email}),
            )
            .await;
        assert_eq!(response.status, 201, "{}", response.body);
        (doctor, patient)
    }

    pub async fn submit_score(&self, token: &str, code: &str, game: &str, score: f64) {
        let response = self
            .post(
                "/api/scores",
                token,
                json!({"patientId": code, "game": game, "score": score}),
            )
            .await;
        assert_eq!(response.status, 201, "{}", response.body);
    }

    /// Stores a score as if it had been played `days_ago` days back.
    pub async fn backdate_score(&self, code: &str, game: &str, score: f64, days_ago: i64) {
        let recorded_at = Utc::now() - Duration::days(days_ago);
        game_scores::Entity::insert(game_scores::ActiveModel {
            patient_code: ActiveValue::Set(code.to_string()),
            game: ActiveValue::Set(game.to_string()),
            attempt: ActiveValue::Set(1),
            score: ActiveValue::Set(score),
            created_at: ActiveValue::Set(recorded_at.into()),
            ..Default::default()
        })
        .exec(&self.db)
        .await
        .unwrap();
    }
}
