use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Internal user record, linked 1:1 to an identity-provider subject.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub external_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile fields reported by the presentation layer when it provisions a user.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SyncUserRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub image_url: Option<String>,
}
