#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};

use attendance_authority::auth::signature::SignatureVerifier;
use attendance_authority::clock::{office_offset, Clock};
use attendance_authority::engine::{AttendanceEngine, PayrollEngine, RequestContext};
use attendance_authority::error::{ApiError, ErrorCode};
use attendance_authority::model::attendance::{AttendanceStatus, NewAttendance};
use attendance_authority::model::employee::{EmployeeRole, NewEmployee};
use attendance_authority::store::{MemoryStore, Store};

pub const SIG_OK: &str = "valid-sig";
pub const TEST_PEM: &str = "-----BEGIN PUBLIC KEY-----\ntest-key\n-----END PUBLIC KEY-----";

/// Wall clock pinned to an office-local instant, movable mid-test.
pub struct TestClock {
    now: Mutex<DateTime<FixedOffset>>,
}

impl TestClock {
    pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Self {
        Self {
            now: Mutex::new(office_local(y, mo, d, h, mi, s)),
        }
    }

    pub fn set(&self, y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) {
        *self.now.lock().unwrap() = office_local(y, mo, d, h, mi, s);
    }
}

impl Clock for TestClock {
    fn now(&self) -> DateTime<FixedOffset> {
        *self.now.lock().unwrap()
    }
}

pub fn office_local(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<FixedOffset> {
    office_offset().with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
}

/// Accepts exactly the `SIG_OK` token and any PEM-looking key, so tests
/// stay independent of real crypto.
pub struct StubVerifier;

impl SignatureVerifier for StubVerifier {
    fn verify(&self, _public_key_pem: &str, _data: &str, signature_b64: &str) -> bool {
        signature_b64 == SIG_OK
    }

    fn validate_public_key(&self, public_key_pem: &str) -> bool {
        public_key_pem.starts_with("-----BEGIN PUBLIC KEY-----")
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub clock: Arc<TestClock>,
    pub attendance: AttendanceEngine,
    pub payroll: PayrollEngine,
}

pub fn harness_at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(TestClock::at(y, mo, d, h, mi, s));
    let attendance = AttendanceEngine::new(store.clone(), clock.clone(), Arc::new(StubVerifier));
    let payroll = PayrollEngine::new(store.clone(), clock.clone());
    Harness {
        store,
        clock,
        attendance,
        payroll,
    }
}

pub fn ctx() -> RequestContext {
    RequestContext::default()
}

pub async fn seed_employee(store: &Arc<MemoryStore>, email: &str, salary: i64) -> u64 {
    seed_employee_joined(store, email, salary, None).await
}

pub async fn seed_employee_joined(
    store: &Arc<MemoryStore>,
    email: &str,
    salary: i64,
    join_date: Option<NaiveDate>,
) -> u64 {
    let id = store
        .insert_employee(&NewEmployee {
            user_id: format!("user-{email}"),
            name: format!("Employee {email}"),
            email: email.to_string(),
            role: EmployeeRole::Employee,
            is_active: true,
            salary_monthly: salary,
            join_date,
        })
        .await
        .unwrap();
    store
        .bind_device(id, TEST_PEM, Some("fp-1"), Utc::now())
        .await
        .unwrap();
    id
}

/// Inserts a pre-existing attendance row with a given status, the way a
/// full day would have left it.
pub async fn seed_attendance_day(
    store: &Arc<MemoryStore>,
    employee_id: u64,
    date: NaiveDate,
    status: AttendanceStatus,
) -> u64 {
    let check_in = date.and_hms_opt(9, 0, 0).unwrap().and_utc();
    let hours = match status {
        AttendanceStatus::Present => 9.0,
        AttendanceStatus::HalfDay => 5.0,
        _ => 0.0,
    };
    store
        .insert_attendance(&NewAttendance {
            employee_id,
            date,
            status,
            check_in_time: Some(check_in),
            check_out_time: None,
            check_in_lat: None,
            check_in_lng: None,
            check_in_accuracy: None,
            work_hours: hours,
            is_location_flagged: false,
            is_auto_calculated: true,
            is_locked: false,
            notes: None,
        })
        .await
        .unwrap()
}

pub fn code_of(err: ApiError) -> ErrorCode {
    err.code().expect("expected a business error")
}

pub fn date(y: i32, mo: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, mo, d).unwrap()
}
