use std::sync::Arc;

use crate::error::{ApiError, ErrorCode};
use crate::store::Store;

/// Authorization predicate for admin-only actions. Runs before the
/// handler body; membership lives in the admin team table.
#[derive(Clone)]
pub struct AdminGate {
    store: Arc<dyn Store>,
    team_id: Option<String>,
}

impl AdminGate {
    pub fn new(store: Arc<dyn Store>, team_id: Option<String>) -> Self {
        Self { store, team_id }
    }

    /// Returns the caller id when the caller belongs to the admin team.
    pub async fn require_admin(&self, caller_id: Option<&str>) -> Result<String, ApiError> {
        let caller = caller_id
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ApiError::business(ErrorCode::AdminRequired, "Admin access required"))?;

        let team = self.team_id.as_deref().ok_or_else(|| {
            ApiError::business(ErrorCode::AdminRequired, "Admin team is not configured")
        })?;

        let memberships = self.store.admin_membership_count(team, caller).await?;
        if memberships == 0 {
            return Err(ApiError::business(
                ErrorCode::AdminRequired,
                "Admin access required",
            ));
        }

        Ok(caller.to_string())
    }
}
