use anyhow::Result;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveValue, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use uuid::Uuid;

use crate::entities::{notification_preferences, notifications, prelude::Notifications};
use neurocare_types::{
    Notification, NotificationCategory, NotificationChannel, NotificationPreferences,
    UpdatePreferencesRequest,
};

pub const DEFAULT_REMINDER_FREQUENCY: &str = "daily";

pub struct NotificationRepository {
    db: DatabaseConnection,
}

#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub channel: NotificationChannel,
    pub category: NotificationCategory,
    pub subject: String,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

impl NotificationRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn model_to_notification(model: notifications::Model) -> Result<Notification> {
        Ok(Notification {
            id: model.id,
            user_id: model.user_id,
            channel: model.channel.parse()?,
            category: model.category.parse()?,
            subject: model.subject,
            message: model.message,
            data: model.data,
            is_read: model.is_read,
            sent_at: model.sent_at.to_rfc3339(),
            read_at: model.read_at.map(|t| t.to_rfc3339()),
        })
    }

    fn model_to_preferences(model: notification_preferences::Model) -> NotificationPreferences {
        NotificationPreferences {
            user_id: model.user_id,
            email_reminders: model.email_reminders,
            email_reports: model.email_reports,
            email_achievements: model.email_achievements,
            email_alerts: model.email_alerts,
            in_app_notifications: model.in_app_notifications,
            reminder_frequency: model.reminder_frequency,
            updated_at: model.updated_at.to_rfc3339(),
        }
    }

    pub async fn create(&self, notification: NewNotification) -> Result<Notification> {
        let model = notifications::ActiveModel {
            user_id: ActiveValue::Set(notification.user_id),
            channel: ActiveValue::Set(notification.channel.as_str().to_string()),
            category: ActiveValue::Set(notification.category.as_str().to_string()),
            subject: ActiveValue::Set(notification.subject),
            message: ActiveValue::Set(notification.message),
            data: ActiveValue::Set(notification.data),
            is_read: ActiveValue::Set(false),
            sent_at: ActiveValue::Set(super::now()),
            read_at: ActiveValue::Set(None),
            ..Default::default()
        };
        let result = Notifications::insert(model).exec(&self.db).await?;

        let saved = Notifications::find_by_id(result.last_insert_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve created notification"))?;
        Self::model_to_notification(saved)
    }

    /// Newest first.
    pub async fn list(&self, user_id: Uuid, limit: u64, unread_only: bool) -> Result<Vec<Notification>> {
        let mut query = Notifications::find().filter(notifications::Column::UserId.eq(user_id));
        if unread_only {
            query = query.filter(notifications::Column::IsRead.eq(false));
        }

        query
            .order_by_desc(notifications::Column::SentAt)
            .order_by_desc(notifications::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Self::model_to_notification)
            .collect()
    }

    /// Marks one of the user's notifications read. `None` if it is not theirs.
    pub async fn mark_read(&self, user_id: Uuid, id: i32) -> Result<Option<Notification>> {
        let result = Notifications::update_many()
            .col_expr(notifications::Column::IsRead, Expr::value(true))
            .col_expr(notifications::Column::ReadAt, Expr::value(super::now()))
            .filter(notifications::Column::Id.eq(id))
            .filter(notifications::Column::UserId.eq(user_id))
            .exec(&self.db)
            .await?;
        if result.rows_affected == 0 {
            return Ok(None);
        }

        Notifications::find_by_id(id)
            .one(&self.db)
            .await?
            .map(Self::model_to_notification)
            .transpose()
    }

    /// Returns how many notifications changed.
    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let result = Notifications::update_many()
            .col_expr(notifications::Column::IsRead, Expr::value(true))
            .col_expr(notifications::Column::ReadAt, Expr::value(super::now()))
            .filter(notifications::Column::UserId.eq(user_id))
            .filter(notifications::Column::IsRead.eq(false))
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected)
    }

    /// Stored preferences, or the defaults (everything on, daily reminders)
    /// saved on first access.
    pub async fn preferences(&self, user_id: Uuid) -> Result<NotificationPreferences> {
        let existing = notification_preferences::Entity::find()
            .filter(notification_preferences::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        match existing {
            Some(model) => Ok(Self::model_to_preferences(model)),
            None => self.update_preferences(user_id, UpdatePreferencesRequest::default()).await,
        }
    }

    /// Applies the given fields over the current preferences (or the defaults).
    pub async fn update_preferences(
        &self,
        user_id: Uuid,
        update: UpdatePreferencesRequest,
    ) -> Result<NotificationPreferences> {
        let current = notification_preferences::Entity::find()
            .filter(notification_preferences::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?;
        let pick = |new: Option<bool>, old: Option<bool>| new.or(old).unwrap_or(true);

        let model = notification_preferences::ActiveModel {
            user_id: ActiveValue::Set(user_id),
            email_reminders: ActiveValue::Set(pick(
                update.email_reminders,
                current.as_ref().map(|c| c.email_reminders),
            )),
            email_reports: ActiveValue::Set(pick(
                update.email_reports,
                current.as_ref().map(|c| c.email_reports),
            )),
            email_achievements: ActiveValue::Set(pick(
                update.email_achievements,
                current.as_ref().map(|c| c.email_achievements),
            )),
            email_alerts: ActiveValue::Set(pick(
                update.email_alerts,
                current.as_ref().map(|c| c.email_alerts),
            )),
            in_app_notifications: ActiveValue::Set(pick(
                update.in_app_notifications,
                current.as_ref().map(|c| c.in_app_notifications),
            )),
            reminder_frequency: ActiveValue::Set(
                update
                    .reminder_frequency
                    .or_else(|| current.as_ref().map(|c| c.reminder_frequency.clone()))
                    .unwrap_or_else(|| DEFAULT_REMINDER_FREQUENCY.to_string()),
            ),
            updated_at: ActiveValue::Set(super::now()),
            ..Default::default()
        };

        notification_preferences::Entity::insert(model)
            .on_conflict(
                OnConflict::column(notification_preferences::Column::UserId)
                    .update_columns([
                        notification_preferences::Column::EmailReminders,
                        notification_preferences::Column::EmailReports,
                        notification_preferences::Column::EmailAchievements,
                        notification_preferences::Column::EmailAlerts,
                        notification_preferences::Column::InAppNotifications,
                        notification_preferences::Column::ReminderFrequency,
                        notification_preferences::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec(&self.db)
            .await?;

        let saved = notification_preferences::Entity::find()
            .filter(notification_preferences::Column::UserId.eq(user_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Failed to retrieve notification preferences"))?;
        Ok(Self::model_to_preferences(saved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::connect_to_memory_database;
    use crate::{NewUser, UserRepository};
    use migration::{Migrator, MigratorTrait};
    use neurocare_types::Role;

    async fn setup_test_db() -> (NotificationRepository, Uuid) {
        let db = connect_to_memory_database().await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        let user = UserRepository::new(db.clone())
            .create_user(NewUser {
                email: "ann@example.com".to_string(),
                password_hash: "hash".to_string(),
                full_name: None,
                role: Role::Patient,
            })
            .await
            .unwrap();
        (NotificationRepository::new(db), user.id)
    }

    fn reminder(user_id: Uuid, subject: &str) -> NewNotification {
        NewNotification {
            user_id,
            channel: NotificationChannel::InApp,
            category: NotificationCategory::Reminder,
            subject: subject.to_string(),
            message: "Time for today's games".to_string(),
            data: None,
        }
    }

    #[tokio::test]
    async fn test_list_and_mark_read() {
        let (repo, user) = setup_test_db().await;
        let first = repo.create(reminder(user, "first")).await.unwrap();
        let second = repo.create(reminder(user, "second")).await.unwrap();

        let all = repo.list(user, 50, false).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);

        let read = repo.mark_read(user, first.id).await.unwrap().unwrap();
        assert!(read.is_read);
        assert!(read.read_at.is_some());
        assert!(repo.mark_read(Uuid::new_v4(), second.id).await.unwrap().is_none());

        let unread = repo.list(user, 50, true).await.unwrap();
        assert_eq!(unread.len(), 1);
        assert_eq!(unread[0].id, second.id);

        assert_eq!(repo.mark_all_read(user).await.unwrap(), 1);
        assert!(repo.list(user, 50, true).await.unwrap().is_empty());
        assert_eq!(repo.list(user, 1, false).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_preferences_defaults_and_update() {
        let (repo, user) = setup_test_db().await;

        let defaults = repo.preferences(user).await.unwrap();
        assert!(defaults.email_reports);
        assert!(defaults.in_app_notifications);
        assert_eq!(defaults.reminder_frequency, "daily");

        let updated = repo
            .update_preferences(
                user,
                UpdatePreferencesRequest {
                    email_reports: Some(false),
                    reminder_frequency: Some("weekly".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!updated.email_reports);
        assert!(updated.email_alerts);
        assert_eq!(updated.reminder_frequency, "weekly");

        // Unspecified fields keep their stored values.
        let again = repo
            .update_preferences(
                user,
                UpdatePreferencesRequest {
                    email_alerts: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!again.email_reports);
        assert!(!again.email_alerts);
        assert_eq!(again.reminder_frequency, "weekly");
    }
}
