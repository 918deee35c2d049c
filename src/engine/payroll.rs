use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::Serialize;
use serde_json::{json, Value};
use utoipa::ToSchema;

use super::{month_bounds, month_key, RequestContext};
use crate::audit::{AuditEntry, AuditWriter};
use crate::clock::{office_offset, Clock};
use crate::error::{ApiError, ErrorCode};
use crate::model::attendance::{round2, Attendance, AttendanceStatus, NewAttendance};
use crate::model::payroll::NewPayroll;
use crate::store::{Store, StoreError};
use crate::utils::report_cache;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayrollRunSummary {
    pub month: String,
    pub employees: u32,
    pub total_net_salary: f64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayrollDeleteSummary {
    pub month: String,
    pub payrolls_deleted: u64,
    pub attendance_deleted: u64,
}

#[derive(Default)]
struct DayCounters {
    present: u32,
    half: u32,
    absent: u32,
    sunday: u32,
    holiday: u32,
    leave: u32,
}

impl DayCounters {
    fn bump(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::HalfDay => self.half += 1,
            AttendanceStatus::Absent => self.absent += 1,
            AttendanceStatus::Sunday => self.sunday += 1,
            AttendanceStatus::Holiday => self.holiday += 1,
            AttendanceStatus::Leave => self.leave += 1,
        }
    }

    fn paid_days(&self) -> f64 {
        f64::from(self.present + self.sunday + self.holiday + self.leave)
            + 0.5 * f64::from(self.half)
    }
}

/// Month-end payroll: scans attendance, backfills untouched days,
/// computes pro-rated net pay, and locks everything it covered.
#[derive(Clone)]
pub struct PayrollEngine {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    audit: AuditWriter,
}

impl PayrollEngine {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        let audit = AuditWriter::new(store.clone(), clock.clone());
        Self {
            store,
            clock,
            audit,
        }
    }

    fn parse_month(month: &str) -> Result<(NaiveDate, NaiveDate), ApiError> {
        month_bounds(month).ok_or_else(|| {
            ApiError::business(ErrorCode::ValidationError, "Month must be in YYYY-MM form")
        })
    }

    pub async fn generate(
        &self,
        caller: &str,
        month: &str,
        ctx: &RequestContext,
    ) -> Result<PayrollRunSummary, ApiError> {
        let (first, last) = Self::parse_month(month)?;
        let days_in_month = last.day();

        // A locked month must be explicitly unlocked or deleted first.
        // Unlocked leftovers mean an admin is regenerating; they are
        // superseded here.
        let existing = self.store.payrolls_for_month(month).await?;
        if existing.iter().any(|p| p.is_locked) {
            return Err(ApiError::business(
                ErrorCode::AlreadyExists,
                format!("Payroll for {month} is already generated; unlock or delete it first"),
            ));
        }
        for stale in &existing {
            self.store.delete_payroll(stale.id).await?;
        }

        let (employees, holidays, leaves) = futures::try_join!(
            self.store.list_employees(100),
            self.store.holidays_in_range(first, last),
            self.store.approved_leaves_in_range(first, last),
        )?;

        let holiday_dates: HashSet<NaiveDate> = holidays.iter().map(|h| h.date).collect();
        let leave_days: HashSet<(u64, NaiveDate)> =
            leaves.iter().map(|l| (l.employee_id, l.date)).collect();

        let today = self.clock.today();
        let last_billable_day = if month_key(today) == month {
            today.day()
        } else {
            days_in_month
        };

        let now = self.clock.now().with_timezone(&Utc);
        let mut processed: u32 = 0;
        let mut total_net = 0.0;

        for employee in &employees {
            let rows = self
                .store
                .attendance_in_range(employee.id, first, last)
                .await?;
            if !employee.is_active && rows.is_empty() {
                continue;
            }

            let join_date = employee.join_date.unwrap_or(first);
            if join_date > last {
                continue;
            }
            let first_working_day = if join_date >= first { join_date.day() } else { 1 };

            let by_date: HashMap<NaiveDate, &Attendance> =
                rows.iter().map(|a| (a.date, a)).collect();

            let mut counters = DayCounters::default();
            let mut total_working_days: u32 = 0;

            for day in first_working_day..=last_billable_day {
                let Some(date) = first.with_day(day) else {
                    continue;
                };
                total_working_days += 1;

                if let Some(att) = by_date.get(&date) {
                    counters.bump(att.status);
                    continue;
                }

                let status = if date.weekday() == Weekday::Sun {
                    AttendanceStatus::Sunday
                } else if holiday_dates.contains(&date) {
                    AttendanceStatus::Holiday
                } else if leave_days.contains(&(employee.id, date)) {
                    AttendanceStatus::Leave
                } else {
                    AttendanceStatus::Absent
                };
                self.store
                    .insert_attendance(&NewAttendance::backfill(employee.id, date, status))
                    .await?;
                counters.bump(status);
            }

            let daily_rate = employee.salary_monthly as f64 / f64::from(days_in_month);
            let net_salary = round2(daily_rate * counters.paid_days());

            let inserted = self
                .store
                .insert_payroll(&NewPayroll {
                    employee_id: employee.id,
                    month: month.to_string(),
                    base_salary: employee.salary_monthly,
                    daily_rate,
                    total_working_days,
                    present_days: counters.present,
                    half_days: counters.half,
                    absent_days: counters.absent,
                    sunday_days: counters.sunday,
                    holiday_days: counters.holiday,
                    leave_days: counters.leave,
                    net_salary,
                    is_locked: true,
                    generated_by: caller.to_string(),
                    generated_at: now,
                })
                .await;
            match inserted {
                Ok(_) => {}
                // Another generate slipped in between the guard and here.
                Err(StoreError::Duplicate(_)) => {
                    return Err(ApiError::business(
                        ErrorCode::AlreadyExists,
                        format!("Payroll for {month} is already generated; unlock or delete it first"),
                    ));
                }
                Err(e) => return Err(e.into()),
            }

            self.store
                .set_attendance_locked_in_range(employee.id, first, last, true)
                .await?;

            processed += 1;
            total_net += net_salary;
        }

        report_cache::invalidate_all();

        self.audit
            .record(AuditEntry {
                actor_id: caller,
                action: "payroll-generated",
                target_id: month.to_string(),
                target_type: "payroll",
                payload: json!({
                    "month": month,
                    "employees": processed,
                    "totalNetSalary": round2(total_net),
                }),
                signature: None,
                signature_verified: false,
                device_info: ctx.device_info.as_deref(),
                ip_address: ctx.ip_address.as_deref(),
            })
            .await;

        Ok(PayrollRunSummary {
            month: month.to_string(),
            employees: processed,
            total_net_salary: round2(total_net),
        })
    }

    pub async fn unlock(
        &self,
        caller: &str,
        month: &str,
        reason: &str,
        ctx: &RequestContext,
    ) -> Result<u32, ApiError> {
        if reason.chars().count() < 10 {
            return Err(ApiError::business(
                ErrorCode::MissingReason,
                "Reason must be at least 10 characters",
            ));
        }
        let (first, last) = Self::parse_month(month)?;

        let payrolls = self.store.payrolls_for_month(month).await?;
        if payrolls.is_empty() {
            return Err(ApiError::business(
                ErrorCode::NotFound,
                format!("No payroll found for {month}"),
            ));
        }

        let now = self.clock.now().with_timezone(&Utc);
        let mut unlocked: u32 = 0;
        for mut payroll in payrolls {
            payroll.is_locked = false;
            payroll.unlocked_by = Some(caller.to_string());
            payroll.unlocked_at = Some(now);
            payroll.unlock_reason = Some(reason.to_string());
            self.store.update_payroll(&payroll).await?;

            self.store
                .set_attendance_locked_in_range(payroll.employee_id, first, last, false)
                .await?;
            unlocked += 1;
        }

        report_cache::invalidate_all();

        self.audit
            .record(AuditEntry {
                actor_id: caller,
                action: "payroll-unlocked",
                target_id: month.to_string(),
                target_type: "payroll",
                payload: json!({ "month": month, "employees": unlocked, "reason": reason }),
                signature: None,
                signature_verified: false,
                device_info: ctx.device_info.as_deref(),
                ip_address: ctx.ip_address.as_deref(),
            })
            .await;

        Ok(unlocked)
    }

    /// Deletes the month's payroll and its auto-calculated attendance.
    /// Admin-edited attendance survives so corrections are never lost.
    pub async fn delete(
        &self,
        caller: &str,
        month: &str,
        reason: &str,
        ctx: &RequestContext,
    ) -> Result<PayrollDeleteSummary, ApiError> {
        if reason.chars().count() < 10 {
            return Err(ApiError::business(
                ErrorCode::MissingReason,
                "Reason must be at least 10 characters",
            ));
        }
        let (first, last) = Self::parse_month(month)?;

        let payrolls = self.store.payrolls_for_month(month).await?;
        if payrolls.is_empty() {
            return Err(ApiError::business(
                ErrorCode::NotFound,
                format!("No payroll found for {month}"),
            ));
        }

        let mut payrolls_deleted: u64 = 0;
        let mut attendance_deleted: u64 = 0;
        for payroll in payrolls {
            self.store.delete_payroll(payroll.id).await?;
            payrolls_deleted += 1;
            attendance_deleted += self
                .store
                .delete_auto_calculated_in_range(payroll.employee_id, first, last)
                .await?;
        }

        report_cache::invalidate_all();

        self.audit
            .record(AuditEntry {
                actor_id: caller,
                action: "payroll-deleted",
                target_id: month.to_string(),
                target_type: "payroll",
                payload: json!({
                    "month": month,
                    "payrollsDeleted": payrolls_deleted,
                    "attendanceDeleted": attendance_deleted,
                    "reason": reason,
                }),
                signature: None,
                signature_verified: false,
                device_info: ctx.device_info.as_deref(),
                ip_address: ctx.ip_address.as_deref(),
            })
            .await;

        Ok(PayrollDeleteSummary {
            month: month.to_string(),
            payrolls_deleted,
            attendance_deleted,
        })
    }

    /// Per-employee month summary with a daily breakdown, times rendered
    /// in the office timezone. Served through the report cache.
    pub async fn report(&self, month: Option<&str>) -> Result<Value, ApiError> {
        let month = match month {
            Some(m) => m.to_string(),
            None => month_key(self.clock.today()),
        };
        let (first, last) = Self::parse_month(&month)?;

        if let Some(cached) = report_cache::get(&month).await {
            return Ok(cached);
        }

        let (employees, payrolls) = futures::try_join!(
            self.store.list_employees(100),
            self.store.payrolls_for_month(&month),
        )?;
        let payroll_by_employee: HashMap<u64, _> =
            payrolls.into_iter().map(|p| (p.employee_id, p)).collect();

        let mut entries = Vec::new();
        for employee in &employees {
            let rows = self
                .store
                .attendance_in_range(employee.id, first, last)
                .await?;
            let payroll = payroll_by_employee.get(&employee.id);
            if payroll.is_none() && rows.is_empty() {
                continue;
            }

            let days: Vec<Value> = rows
                .iter()
                .map(|a| {
                    json!({
                        "date": a.date,
                        "status": a.status,
                        "checkIn": a.check_in_time.map(office_time),
                        "checkOut": a.check_out_time.map(office_time),
                        "workHours": a.work_hours,
                        "locationFlagged": a.is_location_flagged,
                        "isLocked": a.is_locked,
                    })
                })
                .collect();

            entries.push(json!({
                "employee": {
                    "id": employee.id,
                    "name": employee.name,
                    "email": employee.email,
                },
                "payroll": payroll.map(|p| json!({
                    "baseSalary": p.base_salary,
                    "dailyRate": round2(p.daily_rate),
                    "totalWorkingDays": p.total_working_days,
                    "presentDays": p.present_days,
                    "halfDays": p.half_days,
                    "absentDays": p.absent_days,
                    "sundayDays": p.sunday_days,
                    "holidayDays": p.holiday_days,
                    "leaveDays": p.leave_days,
                    "netSalary": p.net_salary,
                    "isLocked": p.is_locked,
                })),
                "days": days,
            }));
        }

        let report = json!({ "month": month, "employees": entries });
        report_cache::put(&month, report.clone()).await;
        Ok(report)
    }
}

fn office_time(dt: DateTime<Utc>) -> String {
    dt.with_timezone(&office_offset()).to_rfc3339()
}
