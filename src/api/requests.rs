use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::engine::attendance::{AttendanceChanges, Location};

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    pub email: String,
    /// Base64 RSA-SHA256 signature over `data_to_verify`, produced by
    /// the bound device.
    pub signature: String,
    pub data_to_verify: String,
    #[serde(default)]
    pub location: Option<Location>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDeviceRequest {
    pub email: String,
    pub public_key: String,
    #[serde(default)]
    pub device_fingerprint: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthQueryRequest {
    #[serde(default)]
    pub month: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeRequest {
    pub data: CreateEmployeeData,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeData {
    pub email: String,
    pub password: String,
    pub name: String,
    pub salary: i64,
    #[serde(default)]
    #[schema(value_type = Option<String>, format = "date")]
    pub join_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ModifyAttendanceRequest {
    pub attendance_id: u64,
    pub reason: String,
    pub modifications: AttendanceChanges,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResetDeviceRequest {
    pub employee_id: u64,
    pub reason: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateHolidayRequest {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeleteHolidayRequest {
    pub holiday_id: u64,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddOfficeLocationRequest {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub radius_meters: Option<f64>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePayrollRequest {
    pub month: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayrollReasonRequest {
    pub month: String,
    pub reason: String,
}
