use anyhow::Result;
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::entities::{prelude::*, users};
use neurocare_types::{Role, User};

pub struct UserRepository {
    db: DatabaseConnection,
}

/// Fields needed to open an account. The email is stored as given.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub role: Role,
}

/// A user together with the stored password hash, for login checks.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub(crate) fn model_to_user(model: users::Model) -> Result<User> {
        Ok(User {
            id: model.id,
            email: model.email,
            full_name: model.full_name,
            role: model.role.parse()?,
            created_at: model.created_at.to_rfc3339(),
        })
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Users::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Self::model_to_user)
            .transpose()
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await?
            .map(Self::model_to_user)
            .transpose()
    }

    pub async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>> {
        let Some(model) = Users::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let password_hash = model.password_hash.clone();
        Ok(Some(UserCredentials {
            user: Self::model_to_user(model)?,
            password_hash,
        }))
    }

    pub async fn create_user(&self, user: NewUser) -> Result<User> {
        let now = super::now();
        let id = Uuid::new_v4();

        let user_model = users::ActiveModel {
            id: ActiveValue::Set(id),
            email: ActiveValue::Set(user.email),
            password_hash: ActiveValue::Set(user.password_hash),
            full_name: ActiveValue::Set(user.full_name),
            role: ActiveValue::Set(user.role.as_str().to_string()),
            created_at: ActiveValue::Set(now),
            updated_at: ActiveValue::Set(now),
        };

        Users::insert(user_model).exec(&self.db).await?;

        let created_user = Users::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created user"))?;

        Self::model_to_user(created_user)
    }

    /// Newest accounts first, optionally restricted to one role.
    pub async fn list_users(&self, role: Option<Role>) -> Result<Vec<User>> {
        let mut query = Users::find().order_by_desc(users::Column::CreatedAt);
        if let Some(role) = role {
            query = query.filter(users::Column::Role.eq(role.as_str()));
        }

        query
            .all(&self.db)
            .await?
            .into_iter()
            .map(Self::model_to_user)
            .collect()
    }

    pub async fn update_role(&self, id: Uuid, role: Role) -> Result<Option<User>> {
        let Some(model) = Users::find_by_id(id).one(&self.db).await? else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = model.into();
        active.role = ActiveValue::Set(role.as_str().to_string());
        active.updated_at = ActiveValue::Set(super::now());
        let updated = active.update(&self.db).await?;

        Self::model_to_user(updated).map(Some)
    }

    pub async fn count_by_role(&self, role: Role) -> Result<u64> {
        Ok(Users::find()
            .filter(users::Column::Role.eq(role.as_str()))
            .count(&self.db)
            .await?)
    }

    pub async fn count(&self) -> Result<u64> {
        Ok(Users::find().count(&self.db).await?)
    }
}
