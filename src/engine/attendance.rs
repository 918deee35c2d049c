use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use super::{month_bounds, month_key, RequestContext};
use crate::audit::{AuditEntry, AuditWriter};
use crate::auth::signature::SignatureVerifier;
use crate::clock::Clock;
use crate::error::{ApiError, ErrorCode};
use crate::geofence;
use crate::model::attendance::{
    round2, Attendance, AttendanceStatus, NewAttendance, NewAttendanceModification,
};
use crate::model::employee::Employee;
use crate::model::payroll::Payroll;
use crate::store::{Store, StoreError};
use crate::utils::report_cache;

/// GPS fix supplied by the device alongside a check-in or check-out.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResult {
    pub attendance_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = String, format = "date-time")]
    pub check_in_time: DateTime<Utc>,
    pub location_flagged: bool,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutResult {
    pub status: AttendanceStatus,
    pub work_hours: f64,
}

/// Admin-supplied subset of attendance fields to overwrite.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceChanges {
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_in_time: Option<DateTime<Utc>>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub check_out_time: Option<DateTime<Utc>>,
    pub status: Option<AttendanceStatus>,
}

impl AttendanceChanges {
    fn is_empty(&self) -> bool {
        self.check_in_time.is_none() && self.check_out_time.is_none() && self.status.is_none()
    }
}

/// Per-day attendance state machine: check-in, check-out, device
/// binding, and the admin override path.
#[derive(Clone)]
pub struct AttendanceEngine {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    verifier: Arc<dyn SignatureVerifier>,
    audit: AuditWriter,
}

impl AttendanceEngine {
    pub fn new(
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        verifier: Arc<dyn SignatureVerifier>,
    ) -> Self {
        let audit = AuditWriter::new(store.clone(), clock.clone());
        Self {
            store,
            clock,
            verifier,
            audit,
        }
    }

    /// Resolves the employee and verifies the device signature; shared
    /// preamble of check-in and check-out.
    async fn authenticate(
        &self,
        email: &str,
        data_to_verify: &str,
        signature: &str,
    ) -> Result<Employee, ApiError> {
        let employee = self
            .store
            .employee_by_email(email)
            .await?
            .ok_or_else(|| ApiError::not_found("Employee"))?;

        let Some(public_key) = employee.device_public_key.as_deref() else {
            return Err(ApiError::business(
                ErrorCode::DeviceNotRegistered,
                "No device is registered for this employee",
            ));
        };

        if !self.verifier.verify(public_key, data_to_verify, signature) {
            return Err(ApiError::business(
                ErrorCode::InvalidSignature,
                "Device signature verification failed",
            ));
        }

        Ok(employee)
    }

    pub async fn check_in(
        &self,
        email: &str,
        signature: &str,
        data_to_verify: &str,
        location: Option<Location>,
        ctx: &RequestContext,
    ) -> Result<CheckInResult, ApiError> {
        if !self.clock.check_in_allowed() {
            return Err(ApiError::business(
                ErrorCode::LateCheckIn,
                "Check-in window closed at 09:05",
            ));
        }

        let employee = self.authenticate(email, data_to_verify, signature).await?;

        let today = self.clock.today();
        let existing = self.store.attendance_for_day(employee.id, today).await?;
        if existing
            .as_ref()
            .is_some_and(|row| row.check_in_time.is_some())
        {
            return Err(ApiError::business(
                ErrorCode::DuplicateCheckIn,
                "Already checked in today",
            ));
        }

        let check = match location {
            Some(loc) => {
                let offices = self.store.active_offices().await?;
                geofence::evaluate(loc.latitude, loc.longitude, loc.accuracy, &offices)
            }
            None => geofence::GeofenceCheck {
                valid: true,
                flagged: false,
                reason: None,
            },
        };

        let now = self.clock.now().with_timezone(&Utc);

        let attendance_id = match existing {
            Some(mut row) => {
                row.check_in_time = Some(now);
                row.check_in_lat = location.map(|l| l.latitude);
                row.check_in_lng = location.map(|l| l.longitude);
                row.check_in_accuracy = location.and_then(|l| l.accuracy);
                row.status = AttendanceStatus::Absent;
                row.is_location_flagged = check.flagged;
                row.is_auto_calculated = true;
                row.is_locked = false;
                row.notes = check.reason.clone();
                self.store.update_attendance(&row).await?;
                row.id
            }
            None => {
                let new = NewAttendance {
                    employee_id: employee.id,
                    date: today,
                    // Placeholder until checkout derives the real status.
                    status: AttendanceStatus::Absent,
                    check_in_time: Some(now),
                    check_out_time: None,
                    check_in_lat: location.map(|l| l.latitude),
                    check_in_lng: location.map(|l| l.longitude),
                    check_in_accuracy: location.and_then(|l| l.accuracy),
                    work_hours: 0.0,
                    is_location_flagged: check.flagged,
                    is_auto_calculated: true,
                    is_locked: false,
                    notes: check.reason.clone(),
                };
                match self.store.insert_attendance(&new).await {
                    Ok(id) => id,
                    // A concurrent check-in won the unique index.
                    Err(StoreError::Duplicate(_)) => {
                        return Err(ApiError::business(
                            ErrorCode::DuplicateCheckIn,
                            "Already checked in today",
                        ));
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        };

        report_cache::invalidate_all();

        self.audit
            .record(AuditEntry {
                actor_id: &employee.user_id,
                action: "check-in",
                target_id: attendance_id.to_string(),
                target_type: "attendance",
                payload: json!({
                    "date": today,
                    "locationFlagged": check.flagged,
                    "reason": check.reason,
                }),
                signature: Some(signature),
                signature_verified: true,
                device_info: ctx.device_info.as_deref(),
                ip_address: ctx.ip_address.as_deref(),
            })
            .await;

        Ok(CheckInResult {
            attendance_id,
            date: today,
            check_in_time: now,
            location_flagged: check.flagged,
        })
    }

    pub async fn check_out(
        &self,
        email: &str,
        signature: &str,
        data_to_verify: &str,
        location: Option<Location>,
        ctx: &RequestContext,
    ) -> Result<CheckOutResult, ApiError> {
        if !self.clock.check_out_allowed() {
            return Err(ApiError::business(
                ErrorCode::CheckoutWindowBlocked,
                "Check-out is blocked between 16:00 and 17:25",
            ));
        }

        let employee = self.authenticate(email, data_to_verify, signature).await?;

        let today = self.clock.today();
        let mut row = self
            .store
            .attendance_for_day(employee.id, today)
            .await?
            .ok_or_else(|| {
                ApiError::business(ErrorCode::MissingCheckIn, "No check-in found for today")
            })?;
        let Some(check_in_time) = row.check_in_time else {
            return Err(ApiError::business(
                ErrorCode::MissingCheckIn,
                "No check-in found for today",
            ));
        };
        if row.check_out_time.is_some() {
            return Err(ApiError::business(
                ErrorCode::DuplicateCheckOut,
                "Already checked out today",
            ));
        }

        let check = match location {
            Some(loc) => {
                let offices = self.store.active_offices().await?;
                geofence::evaluate(loc.latitude, loc.longitude, loc.accuracy, &offices)
            }
            None => geofence::GeofenceCheck {
                valid: true,
                flagged: false,
                reason: None,
            },
        };

        let now = self.clock.now().with_timezone(&Utc);
        let work_hours = Attendance::work_hours_between(check_in_time, now);
        let status = AttendanceStatus::for_work_hours(work_hours);

        row.check_out_time = Some(now);
        row.check_out_lat = location.map(|l| l.latitude);
        row.check_out_lng = location.map(|l| l.longitude);
        row.check_out_accuracy = location.and_then(|l| l.accuracy);
        row.work_hours = work_hours;
        row.status = status;
        row.is_location_flagged = row.is_location_flagged || check.flagged;
        if row.notes.is_none() {
            row.notes = check.reason.clone();
        }
        self.store.update_attendance(&row).await?;

        report_cache::invalidate_all();

        self.audit
            .record(AuditEntry {
                actor_id: &employee.user_id,
                action: "check-out",
                target_id: row.id.to_string(),
                target_type: "attendance",
                payload: json!({
                    "date": today,
                    "workHours": work_hours,
                    "status": status,
                    "locationFlagged": check.flagged,
                }),
                signature: Some(signature),
                signature_verified: true,
                device_info: ctx.device_info.as_deref(),
                ip_address: ctx.ip_address.as_deref(),
            })
            .await;

        Ok(CheckOutResult { status, work_hours })
    }

    pub async fn register_device(
        &self,
        email: &str,
        public_key: &str,
        device_fingerprint: Option<&str>,
        ctx: &RequestContext,
    ) -> Result<(), ApiError> {
        let employee = self
            .store
            .employee_by_email(email)
            .await?
            .ok_or_else(|| ApiError::not_found("Employee"))?;

        if employee.has_bound_device() {
            return Err(ApiError::business(
                ErrorCode::AlreadyExists,
                "A device is already registered; it must be reset before re-binding",
            ));
        }

        if !self.verifier.validate_public_key(public_key) {
            return Err(ApiError::business(
                ErrorCode::ValidationError,
                "Public key is not a valid RSA PEM",
            ));
        }

        let now = self.clock.now().with_timezone(&Utc);
        self.store
            .bind_device(employee.id, public_key, device_fingerprint, now)
            .await?;

        self.audit
            .record(AuditEntry {
                actor_id: &employee.user_id,
                action: "device-registered",
                target_id: employee.user_id.clone(),
                target_type: "employee",
                payload: json!({ "fingerprint": device_fingerprint }),
                signature: None,
                signature_verified: false,
                device_info: ctx.device_info.as_deref(),
                ip_address: ctx.ip_address.as_deref(),
            })
            .await;

        Ok(())
    }

    /// Clears the device binding so the employee must re-register.
    pub async fn reset_device(
        &self,
        caller: &str,
        employee_id: u64,
        reason: &str,
        ctx: &RequestContext,
    ) -> Result<(), ApiError> {
        let employee = self
            .store
            .employee_by_id(employee_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Employee"))?;

        self.store.clear_device(employee.id).await?;

        self.audit
            .record(AuditEntry {
                actor_id: caller,
                action: "device-reset",
                target_id: employee.user_id.clone(),
                target_type: "employee",
                payload: json!({ "reason": reason }),
                signature: None,
                signature_verified: false,
                device_info: ctx.device_info.as_deref(),
                ip_address: ctx.ip_address.as_deref(),
            })
            .await;

        Ok(())
    }

    pub async fn modify_attendance(
        &self,
        caller: &str,
        attendance_id: u64,
        reason: &str,
        changes: AttendanceChanges,
        ctx: &RequestContext,
    ) -> Result<Attendance, ApiError> {
        if reason.chars().count() < 10 {
            return Err(ApiError::business(
                ErrorCode::MissingReason,
                "Reason must be at least 10 characters",
            ));
        }

        let mut row = self
            .store
            .attendance_by_id(attendance_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Attendance record"))?;

        if row.is_locked {
            return Err(ApiError::business(
                ErrorCode::AttendanceLocked,
                "Attendance is locked by a generated payroll",
            ));
        }

        if changes.is_empty() {
            return Err(ApiError::business(
                ErrorCode::ValidationError,
                "No modifiable fields supplied",
            ));
        }

        let original = snapshot(&row);
        let old_status = row.status;

        let mut fields = Vec::new();
        let mut times_changed = false;
        if let Some(check_in) = changes.check_in_time {
            row.check_in_time = Some(check_in);
            fields.push("checkInTime");
            times_changed = true;
        }
        if let Some(check_out) = changes.check_out_time {
            row.check_out_time = Some(check_out);
            fields.push("checkOutTime");
            times_changed = true;
        }

        if times_changed {
            row.work_hours = match (row.check_in_time, row.check_out_time) {
                (Some(check_in), Some(check_out)) => {
                    Attendance::work_hours_between(check_in, check_out)
                }
                _ => 0.0,
            };
        }

        match changes.status {
            Some(status) => {
                row.status = status;
                fields.push("status");
            }
            None if times_changed => {
                row.status = AttendanceStatus::for_work_hours(row.work_hours);
            }
            None => {}
        }

        row.is_auto_calculated = false;
        self.store.update_attendance(&row).await?;

        self.store
            .insert_modification(&NewAttendanceModification {
                attendance_id: row.id,
                employee_id: row.employee_id,
                modified_by: caller.to_string(),
                modified_at: self.clock.now().with_timezone(&Utc),
                reason: reason.to_string(),
                field_changed: fields.join(","),
                original_value: original.to_string(),
                new_value: snapshot(&row).to_string(),
            })
            .await?;

        self.reconcile_payroll(&row, old_status).await?;

        report_cache::invalidate_all();

        self.audit
            .record(AuditEntry {
                actor_id: caller,
                action: "attendance-modified",
                target_id: row.id.to_string(),
                target_type: "attendance",
                payload: json!({
                    "employeeId": row.employee_id,
                    "date": row.date,
                    "fields": fields,
                    "reason": reason,
                }),
                signature: None,
                signature_verified: false,
                device_info: ctx.device_info.as_deref(),
                ip_address: ctx.ip_address.as_deref(),
            })
            .await;

        Ok(row)
    }

    /// Folds a status change into the covering payroll, when one exists.
    /// Locked payrolls can never reach here: their attendance rows are
    /// locked and rejected above.
    async fn reconcile_payroll(
        &self,
        row: &Attendance,
        old_status: AttendanceStatus,
    ) -> Result<(), ApiError> {
        if row.status == old_status {
            return Ok(());
        }
        let month = month_key(row.date);
        let Some(mut payroll) = self
            .store
            .payroll_for_employee_month(row.employee_id, &month)
            .await?
        else {
            return Ok(());
        };

        let old_counter = payroll.counter_mut(old_status);
        *old_counter = old_counter.saturating_sub(1);
        *payroll.counter_mut(row.status) += 1;
        payroll.net_salary = recompute_net(&payroll);

        self.store.update_payroll(&payroll).await?;
        Ok(())
    }

    /// Self-service month view for the calling employee.
    pub async fn my_attendance(
        &self,
        user_id: &str,
        month: Option<&str>,
    ) -> Result<Vec<Attendance>, ApiError> {
        let employee = self
            .store
            .employee_by_user_id(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Employee"))?;

        let month = match month {
            Some(m) => m.to_string(),
            None => month_key(self.clock.today()),
        };
        let (from, to) = month_bounds(&month).ok_or_else(|| {
            ApiError::business(ErrorCode::ValidationError, "Month must be in YYYY-MM form")
        })?;

        Ok(self.store.attendance_in_range(employee.id, from, to).await?)
    }
}

fn snapshot(row: &Attendance) -> serde_json::Value {
    json!({
        "checkInTime": row.check_in_time,
        "checkOutTime": row.check_out_time,
        "status": row.status,
        "workHours": row.work_hours,
    })
}

fn recompute_net(payroll: &Payroll) -> f64 {
    round2(payroll.daily_rate * payroll.paid_days())
}
