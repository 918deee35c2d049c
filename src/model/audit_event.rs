use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Append-only record of an applied state mutation.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct AuditEvent {
    pub id: u64,
    pub actor_id: String,
    pub action: String,
    pub target_id: String,
    pub target_type: String,
    /// Serialized event-specific body.
    pub payload: String,
    pub signature: Option<String>,
    pub signature_verified: bool,
    /// SHA-256 hex over actor, action, target, payload and timestamp.
    pub hash: String,
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuditEvent {
    pub actor_id: String,
    pub action: String,
    pub target_id: String,
    pub target_type: String,
    pub payload: String,
    pub signature: Option<String>,
    pub signature_verified: bool,
    pub hash: String,
    pub device_info: Option<String>,
    pub ip_address: Option<String>,
    pub timestamp: DateTime<Utc>,
}
