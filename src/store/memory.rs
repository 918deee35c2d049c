use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use super::{Store, StoreError, StoreResult};
use crate::model::attendance::{
    Attendance, AttendanceModification, NewAttendance, NewAttendanceModification,
};
use crate::model::audit_event::{AuditEvent, NewAuditEvent};
use crate::model::employee::{Employee, NewEmployee};
use crate::model::holiday::{Holiday, NewHoliday};
use crate::model::leave::{Leave, LEAVE_STATUS_APPROVED};
use crate::model::office_location::{NewOfficeLocation, OfficeLocation};
use crate::model::payroll::{NewPayroll, Payroll};
use crate::model::user::User;

/// Deterministic in-memory store. Upholds the same unique indexes as the
/// MySQL schema so engine tests exercise the duplicate paths.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: Vec<User>,
    employees: Vec<Employee>,
    attendance: Vec<Attendance>,
    modifications: Vec<AttendanceModification>,
    holidays: Vec<Holiday>,
    leaves: Vec<Leave>,
    offices: Vec<OfficeLocation>,
    payrolls: Vec<Payroll>,
    audit: Vec<AuditEvent>,
    admin_members: Vec<(String, String)>,
    next_id: u64,
}

impl Inner {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("memory store lock")
    }

    // Seeding helpers for data the engines only ever read.

    pub fn seed_admin_member(&self, team_id: &str, user_id: &str) {
        self.lock()
            .admin_members
            .push((team_id.to_string(), user_id.to_string()));
    }

    pub fn seed_leave(&self, employee_id: u64, date: NaiveDate, status: &str) {
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.leaves.push(Leave {
            id,
            employee_id,
            date,
            status: status.to_string(),
        });
    }

    /// Snapshot of the audit log, oldest first.
    pub fn audit_log(&self) -> Vec<AuditEvent> {
        self.lock().audit.clone()
    }

    pub fn users_snapshot(&self) -> Vec<User> {
        self.lock().users.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: &User) -> StoreResult<()> {
        let mut inner = self.lock();
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("users.email"));
        }
        inner.users.push(user.clone());
        Ok(())
    }

    async fn delete_user(&self, user_id: &str) -> StoreResult<()> {
        self.lock().users.retain(|u| u.id != user_id);
        Ok(())
    }

    async fn insert_employee(&self, new: &NewEmployee) -> StoreResult<u64> {
        let mut inner = self.lock();
        if inner.employees.iter().any(|e| e.email == new.email) {
            return Err(StoreError::Duplicate("employees.email"));
        }
        if inner.employees.iter().any(|e| e.user_id == new.user_id) {
            return Err(StoreError::Duplicate("employees.user_id"));
        }
        let id = inner.next_id();
        inner.employees.push(Employee {
            id,
            user_id: new.user_id.clone(),
            name: new.name.clone(),
            email: new.email.clone(),
            role: new.role,
            is_active: new.is_active,
            salary_monthly: new.salary_monthly,
            join_date: new.join_date,
            device_public_key: None,
            device_fingerprint: None,
            device_registered_at: None,
        });
        Ok(id)
    }

    async fn employee_by_email(&self, email: &str) -> StoreResult<Option<Employee>> {
        Ok(self
            .lock()
            .employees
            .iter()
            .find(|e| e.email == email)
            .cloned())
    }

    async fn employee_by_user_id(&self, user_id: &str) -> StoreResult<Option<Employee>> {
        Ok(self
            .lock()
            .employees
            .iter()
            .find(|e| e.user_id == user_id)
            .cloned())
    }

    async fn employee_by_id(&self, id: u64) -> StoreResult<Option<Employee>> {
        Ok(self.lock().employees.iter().find(|e| e.id == id).cloned())
    }

    async fn list_employees(&self, limit: u32) -> StoreResult<Vec<Employee>> {
        Ok(self
            .lock()
            .employees
            .iter()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn bind_device(
        &self,
        employee_id: u64,
        public_key: &str,
        fingerprint: Option<&str>,
        registered_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut inner = self.lock();
        if let Some(emp) = inner.employees.iter_mut().find(|e| e.id == employee_id) {
            emp.device_public_key = Some(public_key.to_string());
            emp.device_fingerprint = fingerprint.map(str::to_string);
            emp.device_registered_at = Some(registered_at);
        }
        Ok(())
    }

    async fn clear_device(&self, employee_id: u64) -> StoreResult<()> {
        let mut inner = self.lock();
        if let Some(emp) = inner.employees.iter_mut().find(|e| e.id == employee_id) {
            emp.device_public_key = None;
            emp.device_fingerprint = None;
            emp.device_registered_at = None;
        }
        Ok(())
    }

    async fn attendance_by_id(&self, id: u64) -> StoreResult<Option<Attendance>> {
        Ok(self.lock().attendance.iter().find(|a| a.id == id).cloned())
    }

    async fn attendance_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> StoreResult<Option<Attendance>> {
        Ok(self
            .lock()
            .attendance
            .iter()
            .find(|a| a.employee_id == employee_id && a.date == date)
            .cloned())
    }

    async fn insert_attendance(&self, new: &NewAttendance) -> StoreResult<u64> {
        let mut inner = self.lock();
        if inner
            .attendance
            .iter()
            .any(|a| a.employee_id == new.employee_id && a.date == new.date)
        {
            return Err(StoreError::Duplicate("attendance.employee_id+date"));
        }
        let id = inner.next_id();
        inner.attendance.push(Attendance {
            id,
            employee_id: new.employee_id,
            date: new.date,
            status: new.status,
            check_in_time: new.check_in_time,
            check_out_time: new.check_out_time,
            check_in_lat: new.check_in_lat,
            check_in_lng: new.check_in_lng,
            check_in_accuracy: new.check_in_accuracy,
            check_out_lat: None,
            check_out_lng: None,
            check_out_accuracy: None,
            work_hours: new.work_hours,
            is_location_flagged: new.is_location_flagged,
            is_auto_calculated: new.is_auto_calculated,
            is_locked: new.is_locked,
            notes: new.notes.clone(),
        });
        Ok(id)
    }

    async fn update_attendance(&self, row: &Attendance) -> StoreResult<()> {
        let mut inner = self.lock();
        if let Some(existing) = inner.attendance.iter_mut().find(|a| a.id == row.id) {
            *existing = row.clone();
        }
        Ok(())
    }

    async fn attendance_in_range(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Attendance>> {
        let mut rows: Vec<Attendance> = self
            .lock()
            .attendance
            .iter()
            .filter(|a| a.employee_id == employee_id && a.date >= from && a.date <= to)
            .cloned()
            .collect();
        rows.sort_by_key(|a| a.date);
        Ok(rows)
    }

    async fn set_attendance_locked_in_range(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
        locked: bool,
    ) -> StoreResult<u64> {
        let mut inner = self.lock();
        let mut touched = 0;
        for a in inner
            .attendance
            .iter_mut()
            .filter(|a| a.employee_id == employee_id && a.date >= from && a.date <= to)
        {
            a.is_locked = locked;
            touched += 1;
        }
        Ok(touched)
    }

    async fn delete_auto_calculated_in_range(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<u64> {
        let mut inner = self.lock();
        let before = inner.attendance.len();
        inner.attendance.retain(|a| {
            !(a.employee_id == employee_id
                && a.date >= from
                && a.date <= to
                && a.is_auto_calculated)
        });
        Ok((before - inner.attendance.len()) as u64)
    }

    async fn insert_modification(&self, new: &NewAttendanceModification) -> StoreResult<u64> {
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.modifications.push(AttendanceModification {
            id,
            attendance_id: new.attendance_id,
            employee_id: new.employee_id,
            modified_by: new.modified_by.clone(),
            modified_at: new.modified_at,
            reason: new.reason.clone(),
            field_changed: new.field_changed.clone(),
            original_value: new.original_value.clone(),
            new_value: new.new_value.clone(),
        });
        Ok(id)
    }

    async fn modifications_for_attendance(
        &self,
        attendance_id: u64,
    ) -> StoreResult<Vec<AttendanceModification>> {
        Ok(self
            .lock()
            .modifications
            .iter()
            .filter(|m| m.attendance_id == attendance_id)
            .cloned()
            .collect())
    }

    async fn insert_holiday(&self, new: &NewHoliday) -> StoreResult<u64> {
        let mut inner = self.lock();
        if inner.holidays.iter().any(|h| h.date == new.date) {
            return Err(StoreError::Duplicate("holidays.date"));
        }
        let id = inner.next_id();
        inner.holidays.push(Holiday {
            id,
            date: new.date,
            name: new.name.clone(),
            description: new.description.clone(),
        });
        Ok(id)
    }

    async fn delete_holiday(&self, id: u64) -> StoreResult<bool> {
        let mut inner = self.lock();
        let before = inner.holidays.len();
        inner.holidays.retain(|h| h.id != id);
        Ok(inner.holidays.len() < before)
    }

    async fn holidays_in_range(&self, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<Holiday>> {
        Ok(self
            .lock()
            .holidays
            .iter()
            .filter(|h| h.date >= from && h.date <= to)
            .cloned()
            .collect())
    }

    async fn approved_leaves_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Leave>> {
        Ok(self
            .lock()
            .leaves
            .iter()
            .filter(|l| l.status == LEAVE_STATUS_APPROVED && l.date >= from && l.date <= to)
            .cloned()
            .collect())
    }

    async fn active_offices(&self) -> StoreResult<Vec<OfficeLocation>> {
        Ok(self
            .lock()
            .offices
            .iter()
            .filter(|o| o.is_active)
            .cloned()
            .collect())
    }

    async fn insert_office(&self, new: &NewOfficeLocation) -> StoreResult<u64> {
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.offices.push(OfficeLocation {
            id,
            name: new.name.clone(),
            latitude: new.latitude,
            longitude: new.longitude,
            radius_meters: new.radius_meters,
            is_active: new.is_active,
        });
        Ok(id)
    }

    async fn payrolls_for_month(&self, month: &str) -> StoreResult<Vec<Payroll>> {
        let mut rows: Vec<Payroll> = self
            .lock()
            .payrolls
            .iter()
            .filter(|p| p.month == month)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.employee_id);
        Ok(rows)
    }

    async fn payroll_for_employee_month(
        &self,
        employee_id: u64,
        month: &str,
    ) -> StoreResult<Option<Payroll>> {
        Ok(self
            .lock()
            .payrolls
            .iter()
            .find(|p| p.employee_id == employee_id && p.month == month)
            .cloned())
    }

    async fn insert_payroll(&self, new: &NewPayroll) -> StoreResult<u64> {
        let mut inner = self.lock();
        if inner
            .payrolls
            .iter()
            .any(|p| p.employee_id == new.employee_id && p.month == new.month)
        {
            return Err(StoreError::Duplicate("payroll.employee_id+month"));
        }
        let id = inner.next_id();
        inner.payrolls.push(Payroll {
            id,
            employee_id: new.employee_id,
            month: new.month.clone(),
            base_salary: new.base_salary,
            daily_rate: new.daily_rate,
            total_working_days: new.total_working_days,
            present_days: new.present_days,
            half_days: new.half_days,
            absent_days: new.absent_days,
            sunday_days: new.sunday_days,
            holiday_days: new.holiday_days,
            leave_days: new.leave_days,
            net_salary: new.net_salary,
            is_locked: new.is_locked,
            generated_by: new.generated_by.clone(),
            generated_at: new.generated_at,
            unlocked_by: None,
            unlocked_at: None,
            unlock_reason: None,
        });
        Ok(id)
    }

    async fn update_payroll(&self, row: &Payroll) -> StoreResult<()> {
        let mut inner = self.lock();
        if let Some(existing) = inner.payrolls.iter_mut().find(|p| p.id == row.id) {
            *existing = row.clone();
        }
        Ok(())
    }

    async fn delete_payroll(&self, id: u64) -> StoreResult<()> {
        self.lock().payrolls.retain(|p| p.id != id);
        Ok(())
    }

    async fn append_audit(&self, event: &NewAuditEvent) -> StoreResult<u64> {
        let mut inner = self.lock();
        let id = inner.next_id();
        inner.audit.push(AuditEvent {
            id,
            actor_id: event.actor_id.clone(),
            action: event.action.clone(),
            target_id: event.target_id.clone(),
            target_type: event.target_type.clone(),
            payload: event.payload.clone(),
            signature: event.signature.clone(),
            signature_verified: event.signature_verified,
            hash: event.hash.clone(),
            device_info: event.device_info.clone(),
            ip_address: event.ip_address.clone(),
            timestamp: event.timestamp,
        });
        Ok(id)
    }

    async fn admin_membership_count(&self, team_id: &str, user_id: &str) -> StoreResult<u64> {
        Ok(self
            .lock()
            .admin_members
            .iter()
            .filter(|(t, u)| t == team_id && u == user_id)
            .count() as u64)
    }
}
