use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use uuid::Uuid;

use crate::ParseEnumError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum NotificationChannel {
    Email,
    InApp,
    Sms,
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationChannel::Email => "email",
            NotificationChannel::InApp => "in_app",
            NotificationChannel::Sms => "sms",
        }
    }
}

impl FromStr for NotificationChannel {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "email" => Ok(NotificationChannel::Email),
            "in_app" => Ok(NotificationChannel::InApp),
            "sms" => Ok(NotificationChannel::Sms),
            other => Err(ParseEnumError::new("notification channel", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum NotificationCategory {
    Reminder,
    Alert,
    Report,
    Achievement,
    System,
}

impl NotificationCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationCategory::Reminder => "reminder",
            NotificationCategory::Alert => "alert",
            NotificationCategory::Report => "report",
            NotificationCategory::Achievement => "achievement",
            NotificationCategory::System => "system",
        }
    }
}

impl fmt::Display for NotificationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationCategory {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reminder" => Ok(NotificationCategory::Reminder),
            "alert" => Ok(NotificationCategory::Alert),
            "report" => Ok(NotificationCategory::Report),
            "achievement" => Ok(NotificationCategory::Achievement),
            "system" => Ok(NotificationCategory::System),
            other => Err(ParseEnumError::new("notification category", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Notification {
    pub id: i32,
    pub user_id: Uuid,
    pub channel: NotificationChannel,
    pub category: NotificationCategory,
    pub subject: String,
    pub message: String,
    pub data: Option<serde_json::Value>,
    pub is_read: bool,
    pub sent_at: String,
    pub read_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NotificationsResponse {
    pub notifications: Vec<Notification>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NotificationPreferences {
    pub user_id: Uuid,
    pub email_reminders: bool,
    pub email_reports: bool,
    pub email_achievements: bool,
    pub email_alerts: bool,
    pub in_app_notifications: bool,
    pub reminder_frequency: String,
    pub updated_at: String,
}

/// Body of `PUT /api/notifications/preferences`; omitted fields keep their value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct UpdatePreferencesRequest {
    pub email_reminders: Option<bool>,
    pub email_reports: Option<bool>,
    pub email_achievements: Option<bool>,
    pub email_alerts: Option<bool>,
    pub in_app_notifications: Option<bool>,
    pub reminder_frequency: Option<String>,
}
