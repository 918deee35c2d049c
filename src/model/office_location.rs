use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_OFFICE_RADIUS_M: f64 = 100.0;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct OfficeLocation {
    pub id: u64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewOfficeLocation {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_meters: f64,
    pub is_active: bool,
}
