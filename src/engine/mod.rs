use chrono::{Datelike, Days, Months, NaiveDate};

pub mod attendance;
pub mod payroll;

pub use attendance::AttendanceEngine;
pub use payroll::PayrollEngine;

/// Transport-level facts about the caller, recorded on audit events.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
}

/// Parses a `YYYY-MM` month key into its first and last calendar day.
pub fn month_bounds(month: &str) -> Option<(NaiveDate, NaiveDate)> {
    let first = NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d").ok()?;
    // Reject shorthand like "2024-2" so month keys stay canonical.
    if first.format("%Y-%m").to_string() != month {
        return None;
    }
    let last = first
        .checked_add_months(Months::new(1))?
        .checked_sub_days(Days::new(1))?;
    Some((first, last))
}

/// Month key for a date, in the canonical `YYYY-MM` form.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}
