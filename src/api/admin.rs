use chrono::Utc;
use serde_json::{json, Value};
use tracing::error;

use super::requests::{AddOfficeLocationRequest, CreateEmployeeData, CreateHolidayRequest};
use super::AppState;
use crate::audit::AuditEntry;
use crate::auth::directory;
use crate::engine::RequestContext;
use crate::error::{ApiError, ErrorCode};
use crate::model::employee::{EmployeeRole, NewEmployee};
use crate::model::holiday::NewHoliday;
use crate::model::office_location::{NewOfficeLocation, DEFAULT_OFFICE_RADIUS_M};
use crate::model::user::User;
use crate::store::StoreError;

/// Creates the directory user and the employee row. The only
/// multi-resource mutation: a failed employee write rolls the user back.
pub async fn create_employee(
    state: &AppState,
    caller: &str,
    data: CreateEmployeeData,
    ctx: &RequestContext,
) -> Result<Value, ApiError> {
    if !data.email.contains('@') {
        return Err(ApiError::business(
            ErrorCode::ValidationError,
            "A valid email is required",
        ));
    }
    if data.name.trim().is_empty() {
        return Err(ApiError::business(
            ErrorCode::ValidationError,
            "Name is required",
        ));
    }
    if data.salary <= 0 {
        return Err(ApiError::business(
            ErrorCode::ValidationError,
            "Salary must be a positive amount",
        ));
    }
    if data.password.chars().count() < 8 {
        return Err(ApiError::business(
            ErrorCode::ValidationError,
            "Password must be at least 8 characters",
        ));
    }

    let password_hash = directory::hash_password(&data.password).map_err(|e| {
        error!(error = %e, "password hashing failed");
        ApiError::business(ErrorCode::ValidationError, "Could not hash password")
    })?;

    let user = User {
        id: directory::new_user_id(),
        email: data.email.clone(),
        name: data.name.clone(),
        password_hash,
        created_at: state.clock.now().with_timezone(&Utc),
    };
    match state.store.create_user(&user).await {
        Ok(()) => {}
        Err(StoreError::Duplicate(_)) => {
            return Err(ApiError::business(
                ErrorCode::AlreadyExists,
                "A user with this email already exists",
            ));
        }
        Err(e) => return Err(e.into()),
    }

    let employee_id = match state
        .store
        .insert_employee(&NewEmployee {
            user_id: user.id.clone(),
            name: data.name.clone(),
            email: data.email.clone(),
            role: EmployeeRole::Employee,
            is_active: true,
            salary_monthly: data.salary,
            join_date: data.join_date,
        })
        .await
    {
        Ok(id) => id,
        Err(e) => {
            // Roll the directory user back; on a second failure the
            // partial state is logged for manual reconciliation.
            if let Err(rollback) = state.store.delete_user(&user.id).await {
                error!(
                    error = %rollback,
                    user_id = %user.id,
                    "employee insert failed and user rollback also failed"
                );
            }
            return Err(match e {
                StoreError::Duplicate(_) => ApiError::business(
                    ErrorCode::AlreadyExists,
                    "An employee with this email already exists",
                ),
                other => other.into(),
            });
        }
    };

    state
        .audit
        .record(AuditEntry {
            actor_id: caller,
            action: "employee-created",
            target_id: user.id.clone(),
            target_type: "employee",
            payload: json!({ "employeeId": employee_id, "email": data.email }),
            signature: None,
            signature_verified: false,
            device_info: ctx.device_info.as_deref(),
            ip_address: ctx.ip_address.as_deref(),
        })
        .await;

    Ok(json!({ "employeeId": employee_id, "userId": user.id }))
}

pub async fn create_holiday(
    state: &AppState,
    caller: &str,
    req: CreateHolidayRequest,
    ctx: &RequestContext,
) -> Result<Value, ApiError> {
    if req.name.trim().is_empty() {
        return Err(ApiError::business(
            ErrorCode::ValidationError,
            "Holiday name is required",
        ));
    }

    let holiday_id = match state
        .store
        .insert_holiday(&NewHoliday {
            date: req.date,
            name: req.name.clone(),
            description: req.description.clone(),
        })
        .await
    {
        Ok(id) => id,
        Err(StoreError::Duplicate(_)) => {
            return Err(ApiError::business(
                ErrorCode::DuplicateHoliday,
                format!("A holiday already exists on {}", req.date),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    state
        .audit
        .record(AuditEntry {
            actor_id: caller,
            action: "holiday-created",
            target_id: holiday_id.to_string(),
            target_type: "holiday",
            payload: json!({ "date": req.date, "name": req.name }),
            signature: None,
            signature_verified: false,
            device_info: ctx.device_info.as_deref(),
            ip_address: ctx.ip_address.as_deref(),
        })
        .await;

    Ok(json!({ "holidayId": holiday_id }))
}

pub async fn delete_holiday(
    state: &AppState,
    caller: &str,
    holiday_id: u64,
    ctx: &RequestContext,
) -> Result<Value, ApiError> {
    if !state.store.delete_holiday(holiday_id).await? {
        return Err(ApiError::not_found("Holiday"));
    }

    state
        .audit
        .record(AuditEntry {
            actor_id: caller,
            action: "holiday-deleted",
            target_id: holiday_id.to_string(),
            target_type: "holiday",
            payload: json!({}),
            signature: None,
            signature_verified: false,
            device_info: ctx.device_info.as_deref(),
            ip_address: ctx.ip_address.as_deref(),
        })
        .await;

    Ok(json!({ "holidayId": holiday_id }))
}

pub async fn add_office_location(
    state: &AppState,
    caller: &str,
    req: AddOfficeLocationRequest,
    ctx: &RequestContext,
) -> Result<Value, ApiError> {
    if !(-90.0..=90.0).contains(&req.latitude) || !(-180.0..=180.0).contains(&req.longitude) {
        return Err(ApiError::business(
            ErrorCode::LocationInvalid,
            "Latitude must be within [-90, 90] and longitude within [-180, 180]",
        ));
    }
    let radius = req.radius_meters.unwrap_or(DEFAULT_OFFICE_RADIUS_M);
    if radius <= 0.0 {
        return Err(ApiError::business(
            ErrorCode::LocationInvalid,
            "Radius must be a positive number of meters",
        ));
    }

    let office_id = state
        .store
        .insert_office(&NewOfficeLocation {
            name: req.name.clone(),
            latitude: req.latitude,
            longitude: req.longitude,
            radius_meters: radius,
            is_active: true,
        })
        .await?;

    state
        .audit
        .record(AuditEntry {
            actor_id: caller,
            action: "office-location-added",
            target_id: office_id.to_string(),
            target_type: "office_location",
            payload: json!({ "name": req.name, "radiusMeters": radius }),
            signature: None,
            signature_verified: false,
            device_info: ctx.device_info.as_deref(),
            ip_address: ctx.ip_address.as_deref(),
        })
        .await;

    Ok(json!({ "officeLocationId": office_id }))
}
