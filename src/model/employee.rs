use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum EmployeeRole {
    Employee,
    Admin,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Employee {
    pub id: u64,

    /// Opaque identifier minted by the user directory; also the caller
    /// identity carried in the request header.
    pub user_id: String,

    pub name: String,
    pub email: String,
    pub role: EmployeeRole,
    pub is_active: bool,
    pub salary_monthly: i64,

    #[schema(value_type = Option<String>, format = "date")]
    pub join_date: Option<NaiveDate>,

    // Device binding. The three fields are set together and cleared
    // together; all null means no device is bound.
    pub device_public_key: Option<String>,
    pub device_fingerprint: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub device_registered_at: Option<DateTime<Utc>>,
}

impl Employee {
    pub fn has_bound_device(&self) -> bool {
        self.device_public_key.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub role: EmployeeRole,
    pub is_active: bool,
    pub salary_monthly: i64,
    pub join_date: Option<NaiveDate>,
}
