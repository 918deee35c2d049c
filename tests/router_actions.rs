mod common;

use std::sync::Arc;

use actix_web::web::Data;
use actix_web::{test, App};
use serde_json::{json, Value};

use attendance_authority::api::{AppState, CALLER_ID_HEADER};
use attendance_authority::config::Config;
use attendance_authority::routes;
use attendance_authority::store::MemoryStore;

use common::{seed_employee, StubVerifier, TestClock, SIG_OK};

const ADMIN: &str = "admin-1";
const TEAM: &str = "team-ops";

fn test_config() -> Config {
    Config {
        server_addr: "127.0.0.1:0".into(),
        database_url: String::new(),
        admin_team_id: Some(TEAM.into()),
        rate_actions_per_min: 10_000,
        api_prefix: "/api".into(),
    }
}

fn state_with(store: Arc<MemoryStore>, clock: Arc<TestClock>) -> AppState {
    store.seed_admin_member(TEAM, ADMIN);
    AppState::new(store, clock, Arc::new(StubVerifier), Some(TEAM.into()))
}

async fn call(state: AppState, caller: Option<&str>, body: Value) -> Value {
    let config = test_config();
    let app = test::init_service(
        App::new()
            .app_data(Data::new(state))
            .configure(|cfg| routes::configure(cfg, &config)),
    )
    .await;

    let mut req = test::TestRequest::post()
        .uri("/api/v1/actions")
        .peer_addr("127.0.0.1:50000".parse().unwrap())
        .set_json(body);
    if let Some(caller) = caller {
        req = req.insert_header((CALLER_ID_HEADER, caller));
    }
    test::call_and_read_body_json(&app, req.to_request()).await
}

#[actix_web::test]
async fn unknown_actions_are_named_in_the_failure() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(TestClock::at(2024, 1, 15, 9, 0, 0));
    let resp = call(
        state_with(store, clock),
        None,
        json!({ "action": "fly-to-moon" }),
    )
    .await;

    assert_eq!(resp["success"], false);
    assert_eq!(resp["message"], "Unknown action: fly-to-moon");
    assert_eq!(resp["code"], "INVALID_ACTION");
}

#[actix_web::test]
async fn admin_actions_reject_callers_outside_the_team() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(TestClock::at(2024, 1, 15, 9, 0, 0));
    let state = state_with(store, clock);

    let body = json!({ "action": "generate-payroll", "month": "2024-01" });
    let resp = call(state.clone(), Some("not-an-admin"), body.clone()).await;
    assert_eq!(resp["success"], false);
    assert_eq!(resp["code"], "ADMIN_REQUIRED");

    let resp = call(state, None, body).await;
    assert_eq!(resp["code"], "ADMIN_REQUIRED");
}

#[actix_web::test]
async fn check_in_round_trips_through_the_endpoint() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(TestClock::at(2024, 1, 15, 9, 0, 0));
    seed_employee(&store, "emp-1@example.com", 50_000).await;
    let state = state_with(store, clock);

    let resp = call(
        state,
        None,
        json!({
            "action": "check-in",
            "email": "emp-1@example.com",
            "signature": SIG_OK,
            "dataToVerify": "d",
            "location": { "latitude": 12.97, "longitude": 77.59 },
        }),
    )
    .await;

    assert_eq!(resp["success"], true, "got {resp}");
    assert_eq!(resp["message"], "Checked in successfully");
    assert_eq!(resp["data"]["date"], "2024-01-15");
}

#[actix_web::test]
async fn business_failures_still_return_http_200_envelopes() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(TestClock::at(2024, 1, 15, 9, 30, 0));
    seed_employee(&store, "emp-1@example.com", 50_000).await;
    let state = state_with(store, clock);

    let resp = call(
        state,
        None,
        json!({
            "action": "check-in",
            "email": "emp-1@example.com",
            "signature": SIG_OK,
            "dataToVerify": "d",
        }),
    )
    .await;

    assert_eq!(resp["success"], false);
    assert_eq!(resp["code"], "LATE_CHECK_IN");
}

#[actix_web::test]
async fn malformed_json_is_caught_at_the_boundary() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(TestClock::at(2024, 1, 15, 9, 0, 0));
    let config = test_config();
    let app = test::init_service(
        App::new()
            .app_data(Data::new(state_with(store, clock)))
            .configure(|cfg| routes::configure(cfg, &config)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/actions")
        .peer_addr("127.0.0.1:50000".parse().unwrap())
        .insert_header(("content-type", "application/json"))
        .set_payload("{not json")
        .to_request();
    let resp: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(resp["success"], false);
    assert!(resp["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid JSON body"));
}

#[actix_web::test]
async fn system_info_reports_the_windows() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(TestClock::at(2024, 1, 15, 8, 0, 0));
    let resp = call(
        state_with(store, clock),
        None,
        json!({ "action": "get-system-info" }),
    )
    .await;

    assert_eq!(resp["success"], true);
    assert_eq!(resp["data"]["checkInAllowed"], true);
    assert_eq!(resp["data"]["checkOutAllowed"], true);
    assert_eq!(resp["data"]["checkInDeadline"], "09:05:00");
    assert_eq!(resp["data"]["date"], "2024-01-15");
}

#[actix_web::test]
async fn my_attendance_requires_a_caller_identity() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(TestClock::at(2024, 1, 15, 9, 0, 0));
    let state = state_with(store.clone(), clock);

    let resp = call(state.clone(), None, json!({ "action": "get-my-attendance" })).await;
    assert_eq!(resp["code"], "AUTH_REQUIRED");

    seed_employee(&store, "emp-1@example.com", 50_000).await;
    let resp = call(
        state,
        Some("user-emp-1@example.com"),
        json!({ "action": "get-my-attendance" }),
    )
    .await;
    assert_eq!(resp["success"], true);
    assert!(resp["data"]["attendance"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn create_employee_rolls_back_and_reports_duplicates() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(TestClock::at(2024, 1, 15, 9, 0, 0));
    let state = state_with(store.clone(), clock);

    let body = json!({
        "action": "create-employee",
        "data": {
            "email": "new-hire@example.com",
            "password": "a-strong-password",
            "name": "New Hire",
            "salary": 45_000,
            "joinDate": "2024-01-10",
        },
    });
    let resp = call(state.clone(), Some(ADMIN), body.clone()).await;
    assert_eq!(resp["success"], true, "got {resp}");
    assert!(resp["data"]["userId"].as_str().is_some());

    // Same email again: duplicate, and no orphan directory user left.
    let resp = call(state, Some(ADMIN), body).await;
    assert_eq!(resp["success"], false);
    assert_eq!(resp["code"], "ALREADY_EXISTS");
    assert_eq!(store.users_snapshot().len(), 1);
}

#[actix_web::test]
async fn holiday_lifecycle_via_actions() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(TestClock::at(2024, 1, 15, 9, 0, 0));
    let state = state_with(store, clock);

    let create = json!({
        "action": "create-holiday",
        "date": "2024-01-26",
        "name": "Republic Day",
    });
    let resp = call(state.clone(), Some(ADMIN), create.clone()).await;
    assert_eq!(resp["success"], true);
    let holiday_id = resp["data"]["holidayId"].as_u64().unwrap();

    let resp = call(state.clone(), Some(ADMIN), create).await;
    assert_eq!(resp["code"], "DUPLICATE_HOLIDAY");

    let resp = call(
        state.clone(),
        Some(ADMIN),
        json!({ "action": "delete-holiday", "holidayId": holiday_id }),
    )
    .await;
    assert_eq!(resp["success"], true);

    let resp = call(
        state,
        Some(ADMIN),
        json!({ "action": "delete-holiday", "holidayId": holiday_id }),
    )
    .await;
    assert_eq!(resp["code"], "NOT_FOUND");
}

#[actix_web::test]
async fn office_location_validation() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(TestClock::at(2024, 1, 15, 9, 0, 0));
    let state = state_with(store, clock);

    let resp = call(
        state.clone(),
        Some(ADMIN),
        json!({
            "action": "add-office-location",
            "name": "HQ",
            "latitude": 120.0,
            "longitude": 77.59,
        }),
    )
    .await;
    assert_eq!(resp["code"], "LOCATION_INVALID");

    let resp = call(
        state,
        Some(ADMIN),
        json!({
            "action": "add-office-location",
            "name": "HQ",
            "latitude": 12.97,
            "longitude": 77.59,
        }),
    )
    .await;
    assert_eq!(resp["success"], true);
}
