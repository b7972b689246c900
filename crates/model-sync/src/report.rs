//! Record of one reconciliation

use chrono::{DateTime, Utc};
use model_controller::{ModelOperation, OperationOutcome, ServerAction};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::plan::SyncPlan;

/// What a reconciliation did, or would do for a dry run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncReport {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// SHA-256 of the incoming description
    pub incoming_digest: String,
    /// True when nothing was applied
    #[serde(default)]
    pub dry_run: bool,
    pub operations: Vec<ModelOperation>,
    #[serde(default)]
    pub server_actions: Vec<ServerAction>,
}

impl SyncReport {
    /// Report for a committed pass.
    pub fn applied(incoming_digest: String, outcome: OperationOutcome) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            incoming_digest,
            dry_run: false,
            operations: outcome.applied,
            server_actions: outcome.server_actions,
        }
    }

    /// Report for a plan that was not applied.
    pub fn planned(incoming_digest: String, plan: SyncPlan) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            incoming_digest,
            dry_run: true,
            operations: plan.into_operations(),
            server_actions: Vec::new(),
        }
    }

    /// Whether the model was already up to date.
    pub fn is_noop(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use model_controller::{RequiredAction, ServerIdentity};

    #[test]
    fn applied_report_carries_outcome() {
        let outcome = OperationOutcome {
            applied: vec![ModelOperation::remove("/profile=old".parse().unwrap())],
            server_actions: vec![ServerAction {
                server: ServerIdentity::new("primary", "main", "one"),
                action: RequiredAction::Reload,
            }],
        };
        let report = SyncReport::applied("abc".to_string(), outcome);
        assert!(!report.dry_run);
        assert!(!report.is_noop());
        assert_eq!(report.server_actions.len(), 1);

        let json = report.to_json_string().unwrap();
        let back: SyncReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn reports_get_distinct_ids() {
        let a = SyncReport::planned("d".to_string(), SyncPlan::default());
        let b = SyncReport::planned("d".to_string(), SyncPlan::default());
        assert_ne!(a.id, b.id);
        assert!(a.dry_run && a.is_noop());
    }
}
