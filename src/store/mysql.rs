use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::MySqlPool;

use super::{Store, StoreError, StoreResult};
use crate::model::attendance::{
    Attendance, AttendanceModification, NewAttendance, NewAttendanceModification,
};
use crate::model::audit_event::NewAuditEvent;
use crate::model::employee::{Employee, NewEmployee};
use crate::model::holiday::{Holiday, NewHoliday};
use crate::model::leave::{Leave, LEAVE_STATUS_APPROVED};
use crate::model::office_location::{NewOfficeLocation, OfficeLocation};
use crate::model::payroll::{NewPayroll, Payroll};
use crate::model::user::User;

pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/// MySQL reports unique-index violations with SQLSTATE 23000.
fn map_write_err(err: sqlx::Error, index: &'static str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23000") {
            return StoreError::Duplicate(index);
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl Store for MySqlStore {
    async fn create_user(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, name, password_hash, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_err(e, "users.email"))?;
        Ok(())
    }

    async fn delete_user(&self, user_id: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn insert_employee(&self, new: &NewEmployee) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO employees
            (user_id, name, email, role, is_active, salary_monthly, join_date)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.user_id)
        .bind(&new.name)
        .bind(&new.email)
        .bind(new.role)
        .bind(new.is_active)
        .bind(new.salary_monthly)
        .bind(new.join_date)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_err(e, "employees.email"))?;
        Ok(result.last_insert_id())
    }

    async fn employee_by_email(&self, email: &str) -> StoreResult<Option<Employee>> {
        let row = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn employee_by_user_id(&self, user_id: &str) -> StoreResult<Option<Employee>> {
        let row = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn employee_by_id(&self, id: u64) -> StoreResult<Option<Employee>> {
        let row = sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_employees(&self, limit: u32) -> StoreResult<Vec<Employee>> {
        let rows = sqlx::query_as::<_, Employee>("SELECT * FROM employees ORDER BY id LIMIT ?")
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn bind_device(
        &self,
        employee_id: u64,
        public_key: &str,
        fingerprint: Option<&str>,
        registered_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE employees
            SET device_public_key = ?, device_fingerprint = ?, device_registered_at = ?
            WHERE id = ?
            "#,
        )
        .bind(public_key)
        .bind(fingerprint)
        .bind(registered_at)
        .bind(employee_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear_device(&self, employee_id: u64) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE employees
            SET device_public_key = NULL, device_fingerprint = NULL, device_registered_at = NULL
            WHERE id = ?
            "#,
        )
        .bind(employee_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn attendance_by_id(&self, id: u64) -> StoreResult<Option<Attendance>> {
        let row = sqlx::query_as::<_, Attendance>("SELECT * FROM attendance WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn attendance_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> StoreResult<Option<Attendance>> {
        let row = sqlx::query_as::<_, Attendance>(
            "SELECT * FROM attendance WHERE employee_id = ? AND date = ?",
        )
        .bind(employee_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_attendance(&self, new: &NewAttendance) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance
            (employee_id, date, status, check_in_time, check_out_time,
             check_in_lat, check_in_lng, check_in_accuracy,
             work_hours, is_location_flagged, is_auto_calculated, is_locked, notes)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.employee_id)
        .bind(new.date)
        .bind(new.status)
        .bind(new.check_in_time)
        .bind(new.check_out_time)
        .bind(new.check_in_lat)
        .bind(new.check_in_lng)
        .bind(new.check_in_accuracy)
        .bind(new.work_hours)
        .bind(new.is_location_flagged)
        .bind(new.is_auto_calculated)
        .bind(new.is_locked)
        .bind(&new.notes)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_err(e, "attendance.employee_id+date"))?;
        Ok(result.last_insert_id())
    }

    async fn update_attendance(&self, row: &Attendance) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE attendance
            SET status = ?, check_in_time = ?, check_out_time = ?,
                check_in_lat = ?, check_in_lng = ?, check_in_accuracy = ?,
                check_out_lat = ?, check_out_lng = ?, check_out_accuracy = ?,
                work_hours = ?, is_location_flagged = ?, is_auto_calculated = ?,
                is_locked = ?, notes = ?
            WHERE id = ?
            "#,
        )
        .bind(row.status)
        .bind(row.check_in_time)
        .bind(row.check_out_time)
        .bind(row.check_in_lat)
        .bind(row.check_in_lng)
        .bind(row.check_in_accuracy)
        .bind(row.check_out_lat)
        .bind(row.check_out_lng)
        .bind(row.check_out_accuracy)
        .bind(row.work_hours)
        .bind(row.is_location_flagged)
        .bind(row.is_auto_calculated)
        .bind(row.is_locked)
        .bind(&row.notes)
        .bind(row.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn attendance_in_range(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Attendance>> {
        let rows = sqlx::query_as::<_, Attendance>(
            r#"
            SELECT * FROM attendance
            WHERE employee_id = ? AND date BETWEEN ? AND ?
            ORDER BY date
            "#,
        )
        .bind(employee_id)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn set_attendance_locked_in_range(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
        locked: bool,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE attendance SET is_locked = ? WHERE employee_id = ? AND date BETWEEN ? AND ?",
        )
        .bind(locked)
        .bind(employee_id)
        .bind(from)
        .bind(to)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_auto_calculated_in_range(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM attendance
            WHERE employee_id = ? AND date BETWEEN ? AND ? AND is_auto_calculated = 1
            "#,
        )
        .bind(employee_id)
        .bind(from)
        .bind(to)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert_modification(&self, new: &NewAttendanceModification) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance_modifications
            (attendance_id, employee_id, modified_by, modified_at, reason,
             field_changed, original_value, new_value)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.attendance_id)
        .bind(new.employee_id)
        .bind(&new.modified_by)
        .bind(new.modified_at)
        .bind(&new.reason)
        .bind(&new.field_changed)
        .bind(&new.original_value)
        .bind(&new.new_value)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_id())
    }

    async fn modifications_for_attendance(
        &self,
        attendance_id: u64,
    ) -> StoreResult<Vec<AttendanceModification>> {
        let rows = sqlx::query_as::<_, AttendanceModification>(
            "SELECT * FROM attendance_modifications WHERE attendance_id = ? ORDER BY modified_at",
        )
        .bind(attendance_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_holiday(&self, new: &NewHoliday) -> StoreResult<u64> {
        let result = sqlx::query(
            "INSERT INTO holidays (date, name, description) VALUES (?, ?, ?)",
        )
        .bind(new.date)
        .bind(&new.name)
        .bind(&new.description)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_err(e, "holidays.date"))?;
        Ok(result.last_insert_id())
    }

    async fn delete_holiday(&self, id: u64) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM holidays WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn holidays_in_range(&self, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<Holiday>> {
        let rows = sqlx::query_as::<_, Holiday>(
            "SELECT * FROM holidays WHERE date BETWEEN ? AND ? ORDER BY date",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn approved_leaves_in_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<Leave>> {
        let rows = sqlx::query_as::<_, Leave>(
            "SELECT * FROM leaves WHERE status = ? AND date BETWEEN ? AND ?",
        )
        .bind(LEAVE_STATUS_APPROVED)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn active_offices(&self) -> StoreResult<Vec<OfficeLocation>> {
        let rows = sqlx::query_as::<_, OfficeLocation>(
            "SELECT * FROM office_locations WHERE is_active = 1",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_office(&self, new: &NewOfficeLocation) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO office_locations (name, latitude, longitude, radius_meters, is_active)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.name)
        .bind(new.latitude)
        .bind(new.longitude)
        .bind(new.radius_meters)
        .bind(new.is_active)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_id())
    }

    async fn payrolls_for_month(&self, month: &str) -> StoreResult<Vec<Payroll>> {
        let rows = sqlx::query_as::<_, Payroll>(
            "SELECT * FROM payroll WHERE month = ? ORDER BY employee_id",
        )
        .bind(month)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn payroll_for_employee_month(
        &self,
        employee_id: u64,
        month: &str,
    ) -> StoreResult<Option<Payroll>> {
        let row = sqlx::query_as::<_, Payroll>(
            "SELECT * FROM payroll WHERE employee_id = ? AND month = ?",
        )
        .bind(employee_id)
        .bind(month)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_payroll(&self, new: &NewPayroll) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO payroll
            (employee_id, month, base_salary, daily_rate, total_working_days,
             present_days, half_days, absent_days, sunday_days, holiday_days, leave_days,
             net_salary, is_locked, generated_by, generated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.employee_id)
        .bind(&new.month)
        .bind(new.base_salary)
        .bind(new.daily_rate)
        .bind(new.total_working_days)
        .bind(new.present_days)
        .bind(new.half_days)
        .bind(new.absent_days)
        .bind(new.sunday_days)
        .bind(new.holiday_days)
        .bind(new.leave_days)
        .bind(new.net_salary)
        .bind(new.is_locked)
        .bind(&new.generated_by)
        .bind(new.generated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_write_err(e, "payroll.employee_id+month"))?;
        Ok(result.last_insert_id())
    }

    async fn update_payroll(&self, row: &Payroll) -> StoreResult<()> {
        sqlx::query(
            r#"
            UPDATE payroll
            SET present_days = ?, half_days = ?, absent_days = ?, sunday_days = ?,
                holiday_days = ?, leave_days = ?, net_salary = ?, is_locked = ?,
                unlocked_by = ?, unlocked_at = ?, unlock_reason = ?
            WHERE id = ?
            "#,
        )
        .bind(row.present_days)
        .bind(row.half_days)
        .bind(row.absent_days)
        .bind(row.sunday_days)
        .bind(row.holiday_days)
        .bind(row.leave_days)
        .bind(row.net_salary)
        .bind(row.is_locked)
        .bind(&row.unlocked_by)
        .bind(row.unlocked_at)
        .bind(&row.unlock_reason)
        .bind(row.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_payroll(&self, id: u64) -> StoreResult<()> {
        sqlx::query("DELETE FROM payroll WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn append_audit(&self, event: &NewAuditEvent) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            INSERT INTO audit
            (actor_id, action, target_id, target_type, payload, signature,
             signature_verified, hash, device_info, ip_address, timestamp)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&event.actor_id)
        .bind(&event.action)
        .bind(&event.target_id)
        .bind(&event.target_type)
        .bind(&event.payload)
        .bind(&event.signature)
        .bind(event.signature_verified)
        .bind(&event.hash)
        .bind(&event.device_info)
        .bind(&event.ip_address)
        .bind(event.timestamp)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_id())
    }

    async fn admin_membership_count(&self, team_id: &str, user_id: &str) -> StoreResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM admin_team_members WHERE team_id = ? AND user_id = ?",
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }
}
