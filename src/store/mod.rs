use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::model::attendance::{
    Attendance, AttendanceModification, NewAttendance, NewAttendanceModification,
};
use crate::model::audit_event::NewAuditEvent;
use crate::model::employee::{Employee, NewEmployee};
use crate::model::holiday::{Holiday, NewHoliday};
use crate::model::leave::Leave;
use crate::model::office_location::{NewOfficeLocation, OfficeLocation};
use crate::model::payroll::{NewPayroll, Payroll};
use crate::model::user::User;

pub mod memory;
pub mod mysql;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique index rejected the write. The engines map these to the
    /// domain duplicate codes.
    #[error("duplicate key on {0}")]
    Duplicate(&'static str),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Every read and write the engines perform, behind one seam so tests
/// can run against the in-memory implementation.
#[async_trait]
pub trait Store: Send + Sync {
    // User directory
    async fn create_user(&self, user: &User) -> StoreResult<()>;
    async fn delete_user(&self, user_id: &str) -> StoreResult<()>;

    // Employees
    async fn insert_employee(&self, new: &NewEmployee) -> StoreResult<u64>;
    async fn employee_by_email(&self, email: &str) -> StoreResult<Option<Employee>>;
    async fn employee_by_user_id(&self, user_id: &str) -> StoreResult<Option<Employee>>;
    async fn employee_by_id(&self, id: u64) -> StoreResult<Option<Employee>>;
    async fn list_employees(&self, limit: u32) -> StoreResult<Vec<Employee>>;
    /// Sets all three device-binding fields in one statement.
    async fn bind_device(
        &self,
        employee_id: u64,
        public_key: &str,
        fingerprint: Option<&str>,
        registered_at: DateTime<Utc>,
    ) -> StoreResult<()>;
    /// Clears all three device-binding fields in one statement.
    async fn clear_device(&self, employee_id: u64) -> StoreResult<()>;

    // Attendance
    async fn attendance_by_id(&self, id: u64) -> StoreResult<Option<Attendance>>;
    async fn attendance_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> StoreResult<Option<Attendance>>;
    async fn insert_attendance(&self, new: &NewAttendance) -> StoreResult<u64>;
    async fn update_attendance(&self, row: &Attendance) -> StoreResult<()>;
    async fn attendance_in_range(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Attendance>>;
    async fn set_attendance_locked_in_range(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
        locked: bool,
    ) -> StoreResult<u64>;
    async fn delete_auto_calculated_in_range(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<u64>;

    // Attendance modifications
    async fn insert_modification(&self, new: &NewAttendanceModification) -> StoreResult<u64>;
    async fn modifications_for_attendance(
        &self,
        attendance_id: u64,
    ) -> StoreResult<Vec<AttendanceModification>>;

    // Holidays
    async fn insert_holiday(&self, new: &NewHoliday) -> StoreResult<u64>;
    async fn delete_holiday(&self, id: u64) -> StoreResult<bool>;
    async fn holidays_in_range(&self, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<Holiday>>;

    // Leaves
    async fn approved_leaves_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Leave>>;

    // Office locations
    async fn active_offices(&self) -> StoreResult<Vec<OfficeLocation>>;
    async fn insert_office(&self, new: &NewOfficeLocation) -> StoreResult<u64>;

    // Payroll
    async fn payrolls_for_month(&self, month: &str) -> StoreResult<Vec<Payroll>>;
    async fn payroll_for_employee_month(
        &self,
        employee_id: u64,
        month: &str,
    ) -> StoreResult<Option<Payroll>>;
    async fn insert_payroll(&self, new: &NewPayroll) -> StoreResult<u64>;
    async fn update_payroll(&self, row: &Payroll) -> StoreResult<()>;
    async fn delete_payroll(&self, id: u64) -> StoreResult<()>;

    // Audit
    async fn append_audit(&self, event: &NewAuditEvent) -> StoreResult<u64>;

    // Admin team membership
    async fn admin_membership_count(&self, team_id: &str, user_id: &str) -> StoreResult<u64>;
}
