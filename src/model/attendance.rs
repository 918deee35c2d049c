use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Daily outcome for one employee. Closed set; both engines branch
/// exhaustively on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    HalfDay,
    Absent,
    Sunday,
    Holiday,
    Leave,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::HalfDay => "half_day",
            Self::Absent => "absent",
            Self::Sunday => "sunday",
            Self::Holiday => "holiday",
            Self::Leave => "leave",
        }
    }

    /// Band rule applied after checkout: under 4 hours counts as absent,
    /// under 6 as a half day, 6 and over as present.
    pub fn for_work_hours(hours: f64) -> Self {
        if hours < 4.0 {
            Self::Absent
        } else if hours < 6.0 {
            Self::HalfDay
        } else {
            Self::Present
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Attendance {
    pub id: u64,
    pub employee_id: u64,

    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,

    pub status: AttendanceStatus,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_in_time: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_out_time: Option<DateTime<Utc>>,

    pub check_in_lat: Option<f64>,
    pub check_in_lng: Option<f64>,
    pub check_in_accuracy: Option<f64>,
    pub check_out_lat: Option<f64>,
    pub check_out_lng: Option<f64>,
    pub check_out_accuracy: Option<f64>,

    pub work_hours: f64,
    pub is_location_flagged: bool,

    /// True until an admin edits the row. Backfilled payroll rows stay
    /// auto-calculated and are the ones payroll deletion may remove.
    pub is_auto_calculated: bool,

    /// Mirrors the covering payroll's lock.
    pub is_locked: bool,

    pub notes: Option<String>,
}

impl Attendance {
    /// Hours between check-in and check-out, clamped at zero and rounded
    /// to two decimals.
    pub fn work_hours_between(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> f64 {
        let hours = (check_out - check_in).num_milliseconds() as f64 / 3_600_000.0;
        round2(hours.max(0.0))
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub employee_id: u64,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub check_in_lat: Option<f64>,
    pub check_in_lng: Option<f64>,
    pub check_in_accuracy: Option<f64>,
    pub work_hours: f64,
    pub is_location_flagged: bool,
    pub is_auto_calculated: bool,
    pub is_locked: bool,
    pub notes: Option<String>,
}

impl NewAttendance {
    /// Row shape used when payroll backfills a day nobody touched.
    pub fn backfill(employee_id: u64, date: NaiveDate, status: AttendanceStatus) -> Self {
        Self {
            employee_id,
            date,
            status,
            check_in_time: None,
            check_out_time: None,
            check_in_lat: None,
            check_in_lng: None,
            check_in_accuracy: None,
            work_hours: 0.0,
            is_location_flagged: false,
            is_auto_calculated: true,
            is_locked: true,
            notes: None,
        }
    }
}

/// Audit record of an admin edit to an attendance row.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceModification {
    pub id: u64,
    pub attendance_id: u64,
    pub employee_id: u64,
    pub modified_by: String,
    #[schema(value_type = String, format = "date-time")]
    pub modified_at: DateTime<Utc>,
    pub reason: String,
    /// Comma-separated names of the fields that changed.
    pub field_changed: String,
    pub original_value: String,
    pub new_value: String,
}

#[derive(Debug, Clone)]
pub struct NewAttendanceModification {
    pub attendance_id: u64,
    pub employee_id: u64,
    pub modified_by: String,
    pub modified_at: DateTime<Utc>,
    pub reason: String,
    pub field_changed: String,
    pub original_value: String,
    pub new_value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn band_rule_boundaries() {
        assert_eq!(AttendanceStatus::for_work_hours(0.0), AttendanceStatus::Absent);
        assert_eq!(AttendanceStatus::for_work_hours(3.99), AttendanceStatus::Absent);
        assert_eq!(AttendanceStatus::for_work_hours(4.0), AttendanceStatus::HalfDay);
        assert_eq!(AttendanceStatus::for_work_hours(5.99), AttendanceStatus::HalfDay);
        assert_eq!(AttendanceStatus::for_work_hours(6.0), AttendanceStatus::Present);
        assert_eq!(AttendanceStatus::for_work_hours(9.5), AttendanceStatus::Present);
    }

    #[test]
    fn work_hours_round_to_two_decimals_and_clamp() {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 15, 3, 30, 0).unwrap();
        let t1 = Utc.with_ymd_and_hms(2024, 1, 15, 12, 40, 0).unwrap();
        assert_eq!(Attendance::work_hours_between(t0, t1), 9.17);
        // Reversed order clamps to zero rather than going negative.
        assert_eq!(Attendance::work_hours_between(t1, t0), 0.0);
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&AttendanceStatus::HalfDay).unwrap(),
            "\"half_day\""
        );
    }
}
