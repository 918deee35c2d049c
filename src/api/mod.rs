use std::sync::Arc;

use actix_web::http::header;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::Value;

use crate::audit::AuditWriter;
use crate::auth::gate::AdminGate;
use crate::auth::signature::SignatureVerifier;
use crate::clock::Clock;
use crate::engine::{AttendanceEngine, PayrollEngine, RequestContext};
use crate::store::Store;

pub mod admin;
pub mod requests;
pub mod response;
pub mod router;

use response::ActionResponse;

/// Header carrying the caller's opaque user id.
pub const CALLER_ID_HEADER: &str = "x-user-id";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub clock: Arc<dyn Clock>,
    pub attendance: AttendanceEngine,
    pub payroll: PayrollEngine,
    pub gate: AdminGate,
    pub audit: AuditWriter,
}

impl AppState {
    pub fn new(
        store: Arc<dyn Store>,
        clock: Arc<dyn Clock>,
        verifier: Arc<dyn SignatureVerifier>,
        admin_team_id: Option<String>,
    ) -> Self {
        Self {
            attendance: AttendanceEngine::new(store.clone(), clock.clone(), verifier),
            payroll: PayrollEngine::new(store.clone(), clock.clone()),
            gate: AdminGate::new(store.clone(), admin_team_id),
            audit: AuditWriter::new(store.clone(), clock.clone()),
            store,
            clock,
        }
    }
}

/// Single action endpoint: `{ "action": "...", ... }` in, envelope out.
#[utoipa::path(
    post,
    path = "/api/v1/actions",
    request_body = Object,
    responses(
        (status = 200, description = "Envelope with success flag; business failures are HTTP 200 with success=false", body = ActionResponse),
        (status = 429, description = "Rate limited")
    ),
    tag = "Actions"
)]
pub async fn actions(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> impl Responder {
    let payload: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            return HttpResponse::Ok()
                .json(ActionResponse::failure(format!("Invalid JSON body: {e}"), None));
        }
    };

    let caller = req
        .headers()
        .get(CALLER_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string);

    let ctx = RequestContext {
        device_info: req
            .headers()
            .get(header::USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string),
        ip_address: req.peer_addr().map(|addr| addr.ip().to_string()),
    };

    let response = router::dispatch(&state, caller.as_deref(), payload, &ctx).await;
    HttpResponse::Ok().json(response)
}
