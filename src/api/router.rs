use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::admin;
use super::requests::{
    AddOfficeLocationRequest, CheckInRequest, CreateEmployeeRequest, CreateHolidayRequest,
    DeleteHolidayRequest, GeneratePayrollRequest, ModifyAttendanceRequest, MonthQueryRequest,
    PayrollReasonRequest, RegisterDeviceRequest, ResetDeviceRequest,
};
use super::{response::ActionResponse, AppState};
use crate::clock::{check_in_deadline, checkout_block};
use crate::engine::RequestContext;
use crate::error::{ApiError, ErrorCode};

/// Maps an action name to its handler. Admin-only actions pass the gate
/// before the handler body runs; every error becomes a failure envelope.
pub async fn dispatch(
    state: &AppState,
    caller: Option<&str>,
    body: Value,
    ctx: &RequestContext,
) -> ActionResponse {
    match dispatch_inner(state, caller, body, ctx).await {
        Ok(response) => response,
        Err(err) => err.into(),
    }
}

fn parse<T: DeserializeOwned>(body: &Value) -> Result<T, ApiError> {
    serde_json::from_value(body.clone())
        .map_err(|e| ApiError::business(ErrorCode::ValidationError, e.to_string()))
}

async fn dispatch_inner(
    state: &AppState,
    caller: Option<&str>,
    body: Value,
    ctx: &RequestContext,
) -> Result<ActionResponse, ApiError> {
    let Some(action) = body.get("action").and_then(Value::as_str) else {
        return Err(ApiError::business(
            ErrorCode::ValidationError,
            "Missing action",
        ));
    };

    match action {
        "check-in" => {
            let req: CheckInRequest = parse(&body)?;
            let result = state
                .attendance
                .check_in(
                    &req.email,
                    &req.signature,
                    &req.data_to_verify,
                    req.location,
                    ctx,
                )
                .await?;
            Ok(ActionResponse::ok_with_message(
                "Checked in successfully",
                Some(serde_json::to_value(result).unwrap_or_default()),
            ))
        }
        "check-out" => {
            let req: CheckInRequest = parse(&body)?;
            let result = state
                .attendance
                .check_out(
                    &req.email,
                    &req.signature,
                    &req.data_to_verify,
                    req.location,
                    ctx,
                )
                .await?;
            Ok(ActionResponse::ok_with_message(
                "Checked out successfully",
                Some(serde_json::to_value(result).unwrap_or_default()),
            ))
        }
        "register-device" => {
            let req: RegisterDeviceRequest = parse(&body)?;
            state
                .attendance
                .register_device(
                    &req.email,
                    &req.public_key,
                    req.device_fingerprint.as_deref(),
                    ctx,
                )
                .await?;
            Ok(ActionResponse::ok_with_message(
                "Device registered successfully",
                None,
            ))
        }
        "get-my-attendance" => {
            let user_id = caller.filter(|c| !c.is_empty()).ok_or_else(|| {
                ApiError::business(ErrorCode::AuthRequired, "Caller identity required")
            })?;
            let req: MonthQueryRequest = parse(&body)?;
            let rows = state
                .attendance
                .my_attendance(user_id, req.month.as_deref())
                .await?;
            Ok(ActionResponse::ok(json!({ "attendance": rows })))
        }
        "get-system-info" => {
            let now = state.clock.now();
            let (block_start, block_end) = checkout_block();
            Ok(ActionResponse::ok(json!({
                "serverTime": now.to_rfc3339(),
                "date": state.clock.today(),
                "checkInAllowed": state.clock.check_in_allowed(),
                "checkOutAllowed": state.clock.check_out_allowed(),
                "checkInDeadline": check_in_deadline().to_string(),
                "checkOutBlockedFrom": block_start.to_string(),
                "checkOutBlockedTo": block_end.to_string(),
            })))
        }
        "create-employee" => {
            let caller = state.gate.require_admin(caller).await?;
            let req: CreateEmployeeRequest = parse(&body)?;
            let data = admin::create_employee(state, &caller, req.data, ctx).await?;
            Ok(ActionResponse::ok_with_message(
                "Employee created successfully",
                Some(data),
            ))
        }
        "modify-attendance" => {
            let caller = state.gate.require_admin(caller).await?;
            let req: ModifyAttendanceRequest = parse(&body)?;
            let row = state
                .attendance
                .modify_attendance(&caller, req.attendance_id, &req.reason, req.modifications, ctx)
                .await?;
            Ok(ActionResponse::ok_with_message(
                "Attendance updated",
                Some(json!({ "attendance": row })),
            ))
        }
        "reset-device" => {
            let caller = state.gate.require_admin(caller).await?;
            let req: ResetDeviceRequest = parse(&body)?;
            state
                .attendance
                .reset_device(&caller, req.employee_id, &req.reason, ctx)
                .await?;
            Ok(ActionResponse::ok_with_message(
                "Device binding cleared",
                None,
            ))
        }
        "create-holiday" => {
            let caller = state.gate.require_admin(caller).await?;
            let req: CreateHolidayRequest = parse(&body)?;
            let data = admin::create_holiday(state, &caller, req, ctx).await?;
            Ok(ActionResponse::ok_with_message("Holiday created", Some(data)))
        }
        "delete-holiday" => {
            let caller = state.gate.require_admin(caller).await?;
            let req: DeleteHolidayRequest = parse(&body)?;
            let data = admin::delete_holiday(state, &caller, req.holiday_id, ctx).await?;
            Ok(ActionResponse::ok_with_message("Holiday deleted", Some(data)))
        }
        "add-office-location" => {
            let caller = state.gate.require_admin(caller).await?;
            let req: AddOfficeLocationRequest = parse(&body)?;
            let data = admin::add_office_location(state, &caller, req, ctx).await?;
            Ok(ActionResponse::ok_with_message(
                "Office location added",
                Some(data),
            ))
        }
        "generate-payroll" => {
            let caller = state.gate.require_admin(caller).await?;
            let req: GeneratePayrollRequest = parse(&body)?;
            let summary = state.payroll.generate(&caller, &req.month, ctx).await?;
            Ok(ActionResponse::ok_with_message(
                "Payroll generated",
                Some(serde_json::to_value(summary).unwrap_or_default()),
            ))
        }
        "unlock-payroll" => {
            let caller = state.gate.require_admin(caller).await?;
            let req: PayrollReasonRequest = parse(&body)?;
            let unlocked = state
                .payroll
                .unlock(&caller, &req.month, &req.reason, ctx)
                .await?;
            Ok(ActionResponse::ok_with_message(
                "Payroll unlocked",
                Some(json!({ "month": req.month, "employees": unlocked })),
            ))
        }
        "delete-payroll" => {
            let caller = state.gate.require_admin(caller).await?;
            let req: PayrollReasonRequest = parse(&body)?;
            let summary = state
                .payroll
                .delete(&caller, &req.month, &req.reason, ctx)
                .await?;
            Ok(ActionResponse::ok_with_message(
                "Payroll deleted",
                Some(serde_json::to_value(summary).unwrap_or_default()),
            ))
        }
        "get-payroll-report" => {
            state.gate.require_admin(caller).await?;
            let req: MonthQueryRequest = parse(&body)?;
            let report = state.payroll.report(req.month.as_deref()).await?;
            Ok(ActionResponse::ok(report))
        }
        unknown => Err(ApiError::business(
            ErrorCode::InvalidAction,
            format!("Unknown action: {unknown}"),
        )),
    }
}
