use utoipa::OpenApi;

use crate::api::requests::{
    AddOfficeLocationRequest, CheckInRequest, CreateEmployeeData, CreateEmployeeRequest,
    CreateHolidayRequest, DeleteHolidayRequest, GeneratePayrollRequest, ModifyAttendanceRequest,
    MonthQueryRequest, PayrollReasonRequest, RegisterDeviceRequest, ResetDeviceRequest,
};
use crate::api::response::ActionResponse;
use crate::engine::attendance::{AttendanceChanges, CheckInResult, CheckOutResult, Location};
use crate::engine::payroll::{PayrollDeleteSummary, PayrollRunSummary};
use crate::error::ErrorCode;
use crate::geofence::GeofenceCheck;
use crate::model::attendance::{Attendance, AttendanceModification, AttendanceStatus};
use crate::model::employee::{Employee, EmployeeRole};
use crate::model::holiday::Holiday;
use crate::model::leave::Leave;
use crate::model::office_location::OfficeLocation;
use crate::model::payroll::Payroll;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance & Payroll Authority API",
        version = "1.0.0",
        description = r#"
## Attendance & Payroll Authority

Server-side authority for a single-office workforce.

### Key features
- **Device-bound check-in/check-out** signed with a per-device RSA key
- **Business windows** (check-in until 09:05, check-out blocked 16:00-17:25)
- **Geofencing** against configured office locations (flag-only)
- **Month-end payroll** with backfill, pro-rated net pay and record locking
- **Admin overrides** with mandatory reasons and a content-hashed audit trail

### Transport
A single `POST /api/v1/actions` endpoint. The body carries an `action`
name plus action-specific fields; caller identity travels in the
`x-user-id` header. Business failures come back as HTTP 200 with
`success=false` and an error code.
"#,
    ),
    paths(crate::api::actions),
    components(schemas(
        ActionResponse,
        ErrorCode,
        AttendanceStatus,
        Attendance,
        AttendanceModification,
        AttendanceChanges,
        Employee,
        EmployeeRole,
        Holiday,
        Leave,
        OfficeLocation,
        Payroll,
        GeofenceCheck,
        Location,
        CheckInResult,
        CheckOutResult,
        PayrollRunSummary,
        PayrollDeleteSummary,
        CheckInRequest,
        RegisterDeviceRequest,
        MonthQueryRequest,
        CreateEmployeeRequest,
        CreateEmployeeData,
        ModifyAttendanceRequest,
        ResetDeviceRequest,
        CreateHolidayRequest,
        DeleteHolidayRequest,
        AddOfficeLocationRequest,
        GeneratePayrollRequest,
        PayrollReasonRequest,
    ))
)]
pub struct ApiDoc;
