use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const LEAVE_STATUS_APPROVED: &str = "approved";

/// One approved or pending leave day. Only `approved` rows participate
/// in payroll.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Leave {
    pub id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub status: String,
}
