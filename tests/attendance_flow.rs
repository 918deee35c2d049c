mod common;

use attendance_authority::engine::attendance::{AttendanceChanges, Location};
use attendance_authority::error::ErrorCode;
use attendance_authority::model::attendance::AttendanceStatus;
use attendance_authority::model::office_location::NewOfficeLocation;
use attendance_authority::store::Store;
use chrono::Utc;

use common::{code_of, ctx, date, harness_at, seed_employee, StubVerifier, SIG_OK, TEST_PEM};

const EMAIL: &str = "emp-1@example.com";

fn near_office() -> Option<Location> {
    Some(Location {
        latitude: 12.9716,
        longitude: 77.5946,
        accuracy: Some(10.0),
    })
}

#[tokio::test]
async fn happy_path_check_in_then_out() {
    let h = harness_at(2024, 1, 15, 9, 0, 0);
    let emp = seed_employee(&h.store, EMAIL, 50_000).await;

    let checked_in = h
        .attendance
        .check_in(EMAIL, SIG_OK, "d", near_office(), &ctx())
        .await
        .unwrap();
    assert_eq!(checked_in.date, date(2024, 1, 15));

    let row = h
        .store
        .attendance_for_day(emp, date(2024, 1, 15))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.status, AttendanceStatus::Absent);
    assert!(row.check_in_time.is_some());
    assert!(!row.is_locked);
    assert!(row.is_auto_calculated);

    h.clock.set(2024, 1, 15, 18, 0, 0);
    let checked_out = h
        .attendance
        .check_out(EMAIL, SIG_OK, "d", near_office(), &ctx())
        .await
        .unwrap();
    assert_eq!(checked_out.work_hours, 9.0);
    assert_eq!(checked_out.status, AttendanceStatus::Present);

    let row = h
        .store
        .attendance_for_day(emp, date(2024, 1, 15))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(row.work_hours, 9.0);
    assert_eq!(row.status, AttendanceStatus::Present);
    assert!(row.check_out_time.is_some());

    let actions: Vec<String> = h
        .store
        .audit_log()
        .into_iter()
        .map(|e| e.action)
        .collect();
    assert_eq!(actions, vec!["check-in", "check-out"]);
}

#[tokio::test]
async fn late_check_in_is_rejected_without_a_row() {
    let h = harness_at(2024, 1, 15, 9, 6, 0);
    let emp = seed_employee(&h.store, EMAIL, 50_000).await;

    let err = h
        .attendance
        .check_in(EMAIL, SIG_OK, "d", None, &ctx())
        .await
        .unwrap_err();
    assert_eq!(code_of(err), ErrorCode::LateCheckIn);

    assert!(h
        .store
        .attendance_for_day(emp, date(2024, 1, 15))
        .await
        .unwrap()
        .is_none());
    assert!(h.store.audit_log().is_empty());
}

#[tokio::test]
async fn check_out_window_is_blocked_between_1600_and_1725() {
    let h = harness_at(2024, 1, 15, 9, 0, 0);
    let emp = seed_employee(&h.store, EMAIL, 50_000).await;
    h.attendance
        .check_in(EMAIL, SIG_OK, "d", None, &ctx())
        .await
        .unwrap();

    h.clock.set(2024, 1, 15, 16, 30, 0);
    let err = h
        .attendance
        .check_out(EMAIL, SIG_OK, "d", None, &ctx())
        .await
        .unwrap_err();
    assert_eq!(code_of(err), ErrorCode::CheckoutWindowBlocked);

    // The row is untouched.
    let row = h
        .store
        .attendance_for_day(emp, date(2024, 1, 15))
        .await
        .unwrap()
        .unwrap();
    assert!(row.check_out_time.is_none());
    assert_eq!(row.work_hours, 0.0);
}

#[tokio::test]
async fn early_check_out_lands_in_the_half_day_band() {
    let h = harness_at(2024, 1, 15, 9, 0, 0);
    seed_employee(&h.store, EMAIL, 50_000).await;
    h.attendance
        .check_in(EMAIL, SIG_OK, "d", None, &ctx())
        .await
        .unwrap();

    // 14:00 is before the blocked window opens.
    h.clock.set(2024, 1, 15, 14, 0, 0);
    let out = h
        .attendance
        .check_out(EMAIL, SIG_OK, "d", None, &ctx())
        .await
        .unwrap();
    assert_eq!(out.work_hours, 5.0);
    assert_eq!(out.status, AttendanceStatus::HalfDay);
}

#[tokio::test]
async fn duplicate_check_in_is_rejected() {
    let h = harness_at(2024, 1, 15, 9, 0, 0);
    seed_employee(&h.store, EMAIL, 50_000).await;
    h.attendance
        .check_in(EMAIL, SIG_OK, "d", None, &ctx())
        .await
        .unwrap();

    let err = h
        .attendance
        .check_in(EMAIL, SIG_OK, "d", None, &ctx())
        .await
        .unwrap_err();
    assert_eq!(code_of(err), ErrorCode::DuplicateCheckIn);
}

#[tokio::test]
async fn check_out_requires_a_check_in() {
    let h = harness_at(2024, 1, 15, 18, 0, 0);
    seed_employee(&h.store, EMAIL, 50_000).await;

    let err = h
        .attendance
        .check_out(EMAIL, SIG_OK, "d", None, &ctx())
        .await
        .unwrap_err();
    assert_eq!(code_of(err), ErrorCode::MissingCheckIn);
}

#[tokio::test]
async fn second_check_out_is_rejected() {
    let h = harness_at(2024, 1, 15, 9, 0, 0);
    seed_employee(&h.store, EMAIL, 50_000).await;
    h.attendance
        .check_in(EMAIL, SIG_OK, "d", None, &ctx())
        .await
        .unwrap();

    h.clock.set(2024, 1, 15, 18, 0, 0);
    h.attendance
        .check_out(EMAIL, SIG_OK, "d", None, &ctx())
        .await
        .unwrap();
    let err = h
        .attendance
        .check_out(EMAIL, SIG_OK, "d", None, &ctx())
        .await
        .unwrap_err();
    assert_eq!(code_of(err), ErrorCode::DuplicateCheckOut);
}

#[tokio::test]
async fn unbound_device_and_bad_signature_are_rejected() {
    let h = harness_at(2024, 1, 15, 9, 0, 0);
    let emp = seed_employee(&h.store, EMAIL, 50_000).await;
    h.store.clear_device(emp).await.unwrap();

    let err = h
        .attendance
        .check_in(EMAIL, SIG_OK, "d", None, &ctx())
        .await
        .unwrap_err();
    assert_eq!(code_of(err), ErrorCode::DeviceNotRegistered);

    h.store
        .bind_device(emp, TEST_PEM, None, Utc::now())
        .await
        .unwrap();
    let err = h
        .attendance
        .check_in(EMAIL, "forged", "d", None, &ctx())
        .await
        .unwrap_err();
    assert_eq!(code_of(err), ErrorCode::InvalidSignature);

    // Failed attempts leave no audit trace.
    assert!(h.store.audit_log().is_empty());
}

#[tokio::test]
async fn unknown_employee_is_not_found() {
    let h = harness_at(2024, 1, 15, 9, 0, 0);
    let err = h
        .attendance
        .check_in("ghost@example.com", SIG_OK, "d", None, &ctx())
        .await
        .unwrap_err();
    assert_eq!(code_of(err), ErrorCode::NotFound);
}

#[tokio::test]
async fn rebinding_requires_an_explicit_reset() {
    let h = harness_at(2024, 1, 15, 9, 0, 0);
    let emp = seed_employee(&h.store, EMAIL, 50_000).await;

    let err = h
        .attendance
        .register_device(EMAIL, TEST_PEM, Some("fp-2"), &ctx())
        .await
        .unwrap_err();
    assert_eq!(code_of(err), ErrorCode::AlreadyExists);

    h.attendance
        .reset_device("admin-1", emp, "lost phone replacement", &ctx())
        .await
        .unwrap();

    // All three binding fields clear together.
    let employee = h.store.employee_by_id(emp).await.unwrap().unwrap();
    assert!(employee.device_public_key.is_none());
    assert!(employee.device_fingerprint.is_none());
    assert!(employee.device_registered_at.is_none());

    h.attendance
        .register_device(EMAIL, TEST_PEM, Some("fp-2"), &ctx())
        .await
        .unwrap();
    let employee = h.store.employee_by_id(emp).await.unwrap().unwrap();
    assert!(employee.device_public_key.is_some());
    assert_eq!(employee.device_fingerprint.as_deref(), Some("fp-2"));
    assert!(employee.device_registered_at.is_some());
}

#[tokio::test]
async fn register_device_rejects_a_malformed_key() {
    let h = harness_at(2024, 1, 15, 9, 0, 0);
    let emp = seed_employee(&h.store, EMAIL, 50_000).await;
    h.store.clear_device(emp).await.unwrap();

    let err = h
        .attendance
        .register_device(EMAIL, "garbage", None, &ctx())
        .await
        .unwrap_err();
    assert_eq!(code_of(err), ErrorCode::ValidationError);
}

#[tokio::test]
async fn check_in_outside_the_geofence_is_flagged_but_admitted() {
    let h = harness_at(2024, 1, 15, 9, 0, 0);
    let emp = seed_employee(&h.store, EMAIL, 50_000).await;
    h.store
        .insert_office(&NewOfficeLocation {
            name: "HQ".into(),
            latitude: 12.9716,
            longitude: 77.5946,
            radius_meters: 100.0,
            is_active: true,
        })
        .await
        .unwrap();

    let result = h
        .attendance
        .check_in(
            EMAIL,
            SIG_OK,
            "d",
            Some(Location {
                latitude: 13.05,
                longitude: 77.70,
                accuracy: Some(10.0),
            }),
            &ctx(),
        )
        .await
        .unwrap();
    assert!(result.location_flagged);

    let row = h
        .store
        .attendance_for_day(emp, date(2024, 1, 15))
        .await
        .unwrap()
        .unwrap();
    assert!(row.is_location_flagged);
    assert_eq!(row.notes.as_deref(), Some("Outside office premises"));
}

#[tokio::test]
async fn modification_needs_a_real_reason_and_fields() {
    let h = harness_at(2024, 1, 15, 9, 0, 0);
    let emp = seed_employee(&h.store, EMAIL, 50_000).await;
    h.attendance
        .check_in(EMAIL, SIG_OK, "d", None, &ctx())
        .await
        .unwrap();
    let row = h
        .store
        .attendance_for_day(emp, date(2024, 1, 15))
        .await
        .unwrap()
        .unwrap();

    let err = h
        .attendance
        .modify_attendance(
            "admin-1",
            row.id,
            "too short",
            AttendanceChanges {
                status: Some(AttendanceStatus::Present),
                ..Default::default()
            },
            &ctx(),
        )
        .await
        .unwrap_err();
    assert_eq!(code_of(err), ErrorCode::MissingReason);

    let err = h
        .attendance
        .modify_attendance(
            "admin-1",
            row.id,
            "forgot to check out, confirmed by manager",
            AttendanceChanges::default(),
            &ctx(),
        )
        .await
        .unwrap_err();
    assert_eq!(code_of(err), ErrorCode::ValidationError);
}

#[tokio::test]
async fn modification_rederives_status_from_new_times() {
    let h = harness_at(2024, 1, 15, 9, 0, 0);
    let emp = seed_employee(&h.store, EMAIL, 50_000).await;
    h.attendance
        .check_in(EMAIL, SIG_OK, "d", None, &ctx())
        .await
        .unwrap();
    let row = h
        .store
        .attendance_for_day(emp, date(2024, 1, 15))
        .await
        .unwrap()
        .unwrap();

    let check_in = date(2024, 1, 15).and_hms_opt(3, 30, 0).unwrap().and_utc();
    let check_out = date(2024, 1, 15).and_hms_opt(12, 30, 0).unwrap().and_utc();
    let updated = h
        .attendance
        .modify_attendance(
            "admin-1",
            row.id,
            "forgot to check out, confirmed by manager",
            AttendanceChanges {
                check_in_time: Some(check_in),
                check_out_time: Some(check_out),
                status: None,
            },
            &ctx(),
        )
        .await
        .unwrap();

    assert_eq!(updated.work_hours, 9.0);
    assert_eq!(updated.status, AttendanceStatus::Present);
    assert!(!updated.is_auto_calculated);

    let mods = h.store.modifications_for_attendance(row.id).await.unwrap();
    assert_eq!(mods.len(), 1);
    assert_eq!(mods[0].field_changed, "checkInTime,checkOutTime");
    assert!(mods[0].original_value.contains("absent"));
    assert!(mods[0].new_value.contains("present"));
}

#[tokio::test]
async fn explicit_status_wins_over_the_band_rule() {
    let h = harness_at(2024, 1, 15, 9, 0, 0);
    let emp = seed_employee(&h.store, EMAIL, 50_000).await;
    h.attendance
        .check_in(EMAIL, SIG_OK, "d", None, &ctx())
        .await
        .unwrap();
    let row = h
        .store
        .attendance_for_day(emp, date(2024, 1, 15))
        .await
        .unwrap()
        .unwrap();

    let updated = h
        .attendance
        .modify_attendance(
            "admin-1",
            row.id,
            "approved as on-duty travel day",
            AttendanceChanges {
                status: Some(AttendanceStatus::Leave),
                ..Default::default()
            },
            &ctx(),
        )
        .await
        .unwrap();
    assert_eq!(updated.status, AttendanceStatus::Leave);
}

#[tokio::test]
async fn locked_attendance_rejects_modification() {
    let h = harness_at(2024, 1, 15, 9, 0, 0);
    let emp = seed_employee(&h.store, EMAIL, 50_000).await;
    h.attendance
        .check_in(EMAIL, SIG_OK, "d", None, &ctx())
        .await
        .unwrap();
    let mut row = h
        .store
        .attendance_for_day(emp, date(2024, 1, 15))
        .await
        .unwrap()
        .unwrap();
    row.is_locked = true;
    h.store.update_attendance(&row).await.unwrap();

    let err = h
        .attendance
        .modify_attendance(
            "admin-1",
            row.id,
            "forgot to check out, confirmed by manager",
            AttendanceChanges {
                status: Some(AttendanceStatus::Present),
                ..Default::default()
            },
            &ctx(),
        )
        .await
        .unwrap_err();
    assert_eq!(code_of(err), ErrorCode::AttendanceLocked);
}

#[tokio::test]
async fn stub_verifier_shapes_hold() {
    // Sanity on the test double itself so the suite's auth assumptions
    // stay honest.
    use attendance_authority::auth::signature::SignatureVerifier;
    let v = StubVerifier;
    assert!(v.verify("any", "data", SIG_OK));
    assert!(!v.verify("any", "data", "other"));
    assert!(v.validate_public_key(TEST_PEM));
    assert!(!v.validate_public_key("nope"));
}
