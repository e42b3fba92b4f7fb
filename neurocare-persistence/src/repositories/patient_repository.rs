use anyhow::Result;
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, TransactionTrait,
};
use std::collections::HashMap;
use uuid::Uuid;

use crate::entities::{caregiver_assignments, game_assignments, patients, prelude::*, users};
use neurocare_core::PatientAccess;
use neurocare_types::{AssignmentStatus, GameAssignment, GameKind, Patient};

pub struct PatientRepository {
    db: DatabaseConnection,
}

#[derive(Debug, Clone, Default)]
pub struct NewPatient {
    pub patient_code: String,
    pub user_id: Option<Uuid>,
    pub doctor_id: Option<Uuid>,
    pub age: Option<i32>,
    pub sex: Option<String>,
    pub education_years: Option<i32>,
}

impl PatientRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_patient(model: patients::Model, account: Option<&users::Model>) -> Patient {
        Patient {
            patient_code: model.patient_code,
            user_id: model.user_id,
            doctor_id: model.doctor_id,
            age: model.age,
            sex: model.sex,
            education_years: model.education_years,
            email: account.map(|a| a.email.clone()),
            full_name: account.and_then(|a| a.full_name.clone()),
            created_at: model.created_at.to_rfc3339(),
        }
    }

    fn model_to_assignment(model: game_assignments::Model) -> Result<GameAssignment> {
        Ok(GameAssignment {
            id: model.id,
            patient_code: model.patient_code,
            game_name: model.game_name.parse()?,
            status: model.status.parse()?,
            assigned_at: model.assigned_at.to_rfc3339(),
        })
    }

    /// Resolves linked accounts for a batch of patient rows.
    async fn with_accounts(&self, models: Vec<patients::Model>) -> Result<Vec<Patient>> {
        let account_ids: Vec<Uuid> = models.iter().filter_map(|m| m.user_id).collect();
        let accounts: HashMap<Uuid, users::Model> = if account_ids.is_empty() {
            HashMap::new()
        } else {
            Users::find()
                .filter(users::Column::Id.is_in(account_ids))
                .all(&self.db)
                .await?
                .into_iter()
                .map(|u| (u.id, u))
                .collect()
        };

        Ok(models
            .into_iter()
            .map(|model| {
                let account = model.user_id.and_then(|id| accounts.get(&id));
                Self::model_to_patient(model, account)
            })
            .collect())
    }

    pub async fn create_patient(&self, patient: NewPatient) -> Result<Patient> {
        let model = patients::ActiveModel {
            patient_code: ActiveValue::Set(patient.patient_code.clone()),
            user_id: ActiveValue::Set(patient.user_id),
            doctor_id: ActiveValue::Set(patient.doctor_id),
            age: ActiveValue::Set(patient.age),
            sex: ActiveValue::Set(patient.sex),
            education_years: ActiveValue::Set(patient.education_years),
            created_at: ActiveValue::Set(super::now()),
            ..Default::default()
        };
        Patients::insert(model).exec(&self.db).await?;

        self.find_by_code(&patient.patient_code)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created patient"))
    }

    pub async fn find_by_code(&self, patient_code: &str) -> Result<Option<Patient>> {
        let Some(model) = Patients::find()
            .filter(patients::Column::PatientCode.eq(patient_code))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };
        Ok(self.with_accounts(vec![model]).await?.pop())
    }

    /// The profile linked to a patient's own account.
    pub async fn find_by_user(&self, user_id: Uuid) -> Result<Option<Patient>> {
        let Some(model) = Patients::find()
            .filter(patients::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };
        Ok(self.with_accounts(vec![model]).await?.pop())
    }

    pub async fn list_for_doctor(&self, doctor_id: Uuid) -> Result<Vec<Patient>> {
        let models = Patients::find()
            .filter(patients::Column::DoctorId.eq(doctor_id))
            .order_by_asc(patients::Column::PatientCode)
            .all(&self.db)
            .await?;
        self.with_accounts(models).await
    }

    pub async fn list_all(&self) -> Result<Vec<Patient>> {
        let models = Patients::find()
            .order_by_asc(patients::Column::PatientCode)
            .all(&self.db)
            .await?;
        self.with_accounts(models).await
    }

    pub async fn list_for_caregiver(&self, caregiver_id: Uuid) -> Result<Vec<Patient>> {
        let codes: Vec<String> = CaregiverAssignments::find()
            .filter(caregiver_assignments::Column::CaregiverId.eq(caregiver_id))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|a| a.patient_code)
            .collect();
        if codes.is_empty() {
            return Ok(Vec::new());
        }

        let models = Patients::find()
            .filter(patients::Column::PatientCode.is_in(codes))
            .order_by_asc(patients::Column::PatientCode)
            .all(&self.db)
            .await?;
        self.with_accounts(models).await
    }

    /// Everyone attached to a patient code, or `None` if the code is unknown.
    pub async fn access(&self, patient_code: &str) -> Result<Option<PatientAccess>> {
        let Some(patient) = Patients::find()
            .filter(patients::Column::PatientCode.eq(patient_code))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let caregiver_ids = CaregiverAssignments::find()
            .filter(caregiver_assignments::Column::PatientCode.eq(patient_code))
            .all(&self.db)
            .await?
            .into_iter()
            .map(|a| a.caregiver_id)
            .collect();

        Ok(Some(PatientAccess {
            user_id: patient.user_id,
            doctor_id: patient.doctor_id,
            caregiver_ids,
        }))
    }

    /// Links a caregiver; returns false when the link already existed.
    pub async fn assign_caregiver(&self, patient_code: &str, caregiver_id: Uuid) -> Result<bool> {
        let existing = CaregiverAssignments::find()
            .filter(caregiver_assignments::Column::PatientCode.eq(patient_code))
            .filter(caregiver_assignments::Column::CaregiverId.eq(caregiver_id))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Ok(false);
        }

        let assignment = caregiver_assignments::ActiveModel {
            caregiver_id: ActiveValue::Set(caregiver_id),
            patient_code: ActiveValue::Set(patient_code.to_string()),
            assigned_at: ActiveValue::Set(super::now()),
            ..Default::default()
        };
        CaregiverAssignments::insert(assignment)
            .exec(&self.db)
            .await?;
        Ok(true)
    }

    /// Replaces every game assigned to the patient in one transaction.
    pub async fn replace_game_assignments(
        &self,
        patient_code: &str,
        doctor_id: Uuid,
        games: &[GameKind],
    ) -> Result<()> {
        let txn = self.db.begin().await?;

        GameAssignments::delete_many()
            .filter(game_assignments::Column::PatientCode.eq(patient_code))
            .exec(&txn)
            .await?;

        let now = super::now();
        let rows: Vec<game_assignments::ActiveModel> = games
            .iter()
            .map(|game| game_assignments::ActiveModel {
                patient_code: ActiveValue::Set(patient_code.to_string()),
                doctor_id: ActiveValue::Set(Some(doctor_id)),
                game_name: ActiveValue::Set(game.as_str().to_string()),
                status: ActiveValue::Set(AssignmentStatus::Assigned.as_str().to_string()),
                assigned_at: ActiveValue::Set(now),
                ..Default::default()
            })
            .collect();
        if !rows.is_empty() {
            GameAssignments::insert_many(rows).exec(&txn).await?;
        }

        txn.commit().await?;
        Ok(())
    }

    /// Newest assignments first.
    pub async fn assigned_games(&self, patient_code: &str) -> Result<Vec<GameAssignment>> {
        GameAssignments::find()
            .filter(game_assignments::Column::PatientCode.eq(patient_code))
            .order_by_desc(game_assignments::Column::AssignedAt)
            .order_by_desc(game_assignments::Column::Id)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Self::model_to_assignment)
            .collect()
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(Patients::find().count(&self.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_to_memory_database;
    use crate::{NewUser, UserRepository};
    use migration::{Migrator, MigratorTrait};
    use neurocare_types::Role;

    async fn setup_test_db() -> DatabaseConnection {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn create_user(db: &DatabaseConnection, email: &str, role: Role) -> Uuid {
        UserRepository::new(db.clone())
            .create_user(NewUser {
                email: email.to_string(),
                password_hash: "hash".to_string(),
                full_name: Some(email.split('@').next().unwrap().to_string()),
                role,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_create_patient_with_account() {
        let db = setup_test_db().await;
        let doctor = create_user(&db, "doc@example.com", Role::Doctor).await;
        let account = create_user(&db, "pat@example.com", Role::Patient).await;
        let repo = PatientRepository::new(db);

        let patient = repo
            .create_patient(NewPatient {
                patient_code: "1001".to_string(),
                user_id: Some(account),
                doctor_id: Some(doctor),
                age: Some(72),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(patient.email.as_deref(), Some("pat@example.com"));
        assert_eq!(patient.full_name.as_deref(), Some("pat"));

        let by_user = repo.find_by_user(account).await.unwrap().unwrap();
        assert_eq!(by_user.patient_code, "1001");
        assert_eq!(repo.list_for_doctor(doctor).await.unwrap().len(), 1);
        assert!(repo.list_for_doctor(account).await.unwrap().is_empty());

        let duplicate = repo
            .create_patient(NewPatient {
                patient_code: "1001".to_string(),
                ..Default::default()
            })
            .await
            .unwrap_err();
        assert!(crate::is_unique_violation(&duplicate));
    }

    #[tokio::test]
    async fn test_replace_game_assignments() {
        let db = setup_test_db().await;
        let doctor = create_user(&db, "doc@example.com", Role::Doctor).await;
        let repo = PatientRepository::new(db);
        repo.create_patient(NewPatient {
            patient_code: "2002".to_string(),
            doctor_id: Some(doctor),
            ..Default::default()
        })
        .await
        .unwrap();

        repo.replace_game_assignments("2002", doctor, &[GameKind::NBack, GameKind::StroopTest])
            .await
            .unwrap();
        repo.replace_game_assignments("2002", doctor, &[GameKind::MemoryMatch])
            .await
            .unwrap();

        let games = repo.assigned_games("2002").await.unwrap();
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].game_name, GameKind::MemoryMatch);
        assert_eq!(games[0].status, AssignmentStatus::Assigned);

        repo.replace_game_assignments("2002", doctor, &[]).await.unwrap();
        assert!(repo.assigned_games("2002").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_caregiver_access() {
        let db = setup_test_db().await;
        let doctor = create_user(&db, "doc@example.com", Role::Doctor).await;
        let caregiver = create_user(&db, "care@example.com", Role::Caregiver).await;
        let repo = PatientRepository::new(db);
        repo.create_patient(NewPatient {
            patient_code: "3003".to_string(),
            doctor_id: Some(doctor),
            ..Default::default()
        })
        .await
        .unwrap();

        assert!(repo.assign_caregiver("3003", caregiver).await.unwrap());
        assert!(!repo.assign_caregiver("3003", caregiver).await.unwrap());

        let access = repo.access("3003").await.unwrap().unwrap();
        assert_eq!(access.doctor_id, Some(doctor));
        assert_eq!(access.caregiver_ids, vec![caregiver]);
        assert!(repo.access("missing").await.unwrap().is_none());

        let patients = repo.list_for_caregiver(caregiver).await.unwrap();
        assert_eq!(patients.len(), 1);
        assert!(repo.list_for_caregiver(doctor).await.unwrap().is_empty());
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
        assert_eq!(repo.count().await.unwrap(), 1);
    }
}
