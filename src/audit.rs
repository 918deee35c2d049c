use std::sync::Arc;

use serde_json::{json, Value};
use tracing::warn;

use crate::auth::signature::sha256_hex_json;
use crate::clock::Clock;
use crate::model::audit_event::NewAuditEvent;
use crate::store::Store;

/// One event per applied state mutation. Failed requests emit nothing;
/// the audit log is a ledger of facts, not attempts.
#[derive(Clone)]
pub struct AuditWriter {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
}

pub struct AuditEntry<'a> {
    pub actor_id: &'a str,
    pub action: &'a str,
    pub target_id: String,
    pub target_type: &'a str,
    pub payload: Value,
    pub signature: Option<&'a str>,
    pub signature_verified: bool,
    pub device_info: Option<&'a str>,
    pub ip_address: Option<&'a str>,
}

impl AuditWriter {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Appends the event after the primary mutation has committed.
    /// Best-effort: a failed append is logged and never fails the
    /// request that already applied.
    pub async fn record(&self, entry: AuditEntry<'_>) {
        let timestamp = self.clock.now().with_timezone(&chrono::Utc);
        let hash = sha256_hex_json(&json!({
            "actorId": entry.actor_id,
            "action": entry.action,
            "targetId": entry.target_id,
            "payload": entry.payload,
            "timestamp": timestamp.to_rfc3339(),
        }));

        let event = NewAuditEvent {
            actor_id: entry.actor_id.to_string(),
            action: entry.action.to_string(),
            target_id: entry.target_id,
            target_type: entry.target_type.to_string(),
            payload: entry.payload.to_string(),
            signature: entry.signature.map(str::to_string),
            signature_verified: entry.signature_verified,
            hash,
            device_info: entry.device_info.map(str::to_string),
            ip_address: entry.ip_address.map(str::to_string),
            timestamp,
        };

        if let Err(e) = self.store.append_audit(&event).await {
            warn!(error = %e, action = %event.action, "failed to append audit event");
        }
    }
}
