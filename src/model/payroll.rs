use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::attendance::AttendanceStatus;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Payroll {
    pub id: u64,
    pub employee_id: u64,

    /// Month key in `YYYY-MM` form.
    pub month: String,

    pub base_salary: i64,
    /// Base salary spread over calendar days of the month.
    pub daily_rate: f64,
    pub total_working_days: u32,

    pub present_days: u32,
    pub half_days: u32,
    pub absent_days: u32,
    pub sunday_days: u32,
    pub holiday_days: u32,
    pub leave_days: u32,

    pub net_salary: f64,

    pub is_locked: bool,
    pub generated_by: String,
    #[schema(value_type = String, format = "date-time")]
    pub generated_at: DateTime<Utc>,
    pub unlocked_by: Option<String>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub unlocked_at: Option<DateTime<Utc>>,
    pub unlock_reason: Option<String>,
}

impl Payroll {
    /// Days contributing to net salary: present, Sunday, holiday and
    /// leave count one each; half days count one half; absent counts
    /// nothing.
    pub fn paid_days(&self) -> f64 {
        f64::from(self.present_days + self.sunday_days + self.holiday_days + self.leave_days)
            + 0.5 * f64::from(self.half_days)
    }

    pub fn counter_mut(&mut self, status: AttendanceStatus) -> &mut u32 {
        match status {
            AttendanceStatus::Present => &mut self.present_days,
            AttendanceStatus::HalfDay => &mut self.half_days,
            AttendanceStatus::Absent => &mut self.absent_days,
            AttendanceStatus::Sunday => &mut self.sunday_days,
            AttendanceStatus::Holiday => &mut self.holiday_days,
            AttendanceStatus::Leave => &mut self.leave_days,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewPayroll {
    pub employee_id: u64,
    pub month: String,
    pub base_salary: i64,
    pub daily_rate: f64,
    pub total_working_days: u32,
    pub present_days: u32,
    pub half_days: u32,
    pub absent_days: u32,
    pub sunday_days: u32,
    pub holiday_days: u32,
    pub leave_days: u32,
    pub net_salary: f64,
    pub is_locked: bool,
    pub generated_by: String,
    pub generated_at: DateTime<Utc>,
}
