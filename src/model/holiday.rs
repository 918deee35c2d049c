use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Holiday {
    pub id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewHoliday {
    pub date: NaiveDate,
    pub name: String,
    pub description: Option<String>,
}
