use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Row in the embedded user directory. Employees reference these by the
/// opaque `id`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}
