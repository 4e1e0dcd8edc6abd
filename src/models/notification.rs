use crate::entities::{NotificationType, notification_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, de};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationAction {
    Count,
    #[default]
    List,
    Read,
    ReadAll,
    Delete,
}

/// Parameters of the `/notifications` endpoint, from the query string or a JSON body
#[derive(Debug, Default, Serialize, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotificationRequest {
    #[serde(default)]
    pub action: NotificationAction,
    pub notification_id: Option<i64>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub unread_only: bool,
}

/// Accepts `true`/`false` as well as the `1`/`0` form used by query-string flags.
fn deserialize_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(u8),
        Text(String),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(value) => Ok(value),
        Flag::Int(0) => Ok(false),
        Flag::Int(1) => Ok(true),
        Flag::Int(other) => Err(de::Error::custom(format!("invalid flag value: {other}"))),
        Flag::Text(text) => match text.as_str() {
            "1" | "true" => Ok(true),
            "0" | "false" | "" => Ok(false),
            other => Err(de::Error::custom(format!("invalid flag value: {other}"))),
        },
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationResponse {
    pub id: i64,
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub related_id: Option<i64>,
    pub is_read: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<notification_entity::Model> for NotificationResponse {
    fn from(m: notification_entity::Model) -> Self {
        Self {
            id: m.id,
            title: m.title,
            message: m.message,
            notification_type: m.notification_type,
            related_id: m.related_id,
            is_read: m.is_read,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub unread_count: u64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct NotificationCountResponse {
    pub count: u64,
}
