//! Hash-chained audit entries

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use sentinel_core::{ActionType, Decision, GovernanceVerdict, ProposedAction, SriScores};

/// One governance verdict as written to the Audit Log.
///
/// Carries the full `GovernanceVerdict` so `get_by_id` can return it
/// byte-equivalent to what the pipeline produced, plus a hash-chained
/// summary (chained to the entry written immediately before it, by the same
/// writer thread) so a gap or edit anywhere in the chain is detectable by
/// recomputing hashes forward from the first entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub action_id: Uuid,
    pub agent_id: Option<String>,
    pub action_type: ActionType,
    pub resource_id: String,
    pub decision: Decision,
    pub sri: SriScores,
    pub reason: String,
    pub recorded_at: DateTime<Utc>,
    pub previous_hash: Option<String>,
    pub hash: String,
    pub verdict: GovernanceVerdict,
}

impl AuditEntry {
    pub fn from_verdict(action: &ProposedAction, verdict: &GovernanceVerdict, previous_hash: Option<String>) -> Self {
        let mut entry = Self {
            action_id: verdict.action_id,
            agent_id: action.agent_id.clone(),
            action_type: action.action_type,
            resource_id: action.target.resource_id.clone(),
            decision: verdict.decision,
            sri: verdict.sri,
            reason: verdict.reason.clone(),
            recorded_at: verdict.timestamp,
            previous_hash,
            hash: String::new(),
            verdict: verdict.clone(),
        };
        entry.hash = entry.compute_hash();
        entry
    }

    fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.action_id.as_bytes());
        hasher.update(decision_label(self.decision).as_bytes());
        hasher.update(self.sri.composite.to_le_bytes());
        hasher.update(self.reason.as_bytes());
        hasher.update(self.recorded_at.to_rfc3339().as_bytes());
        if let Ok(verdict_bytes) = serde_json::to_vec(&self.verdict) {
            hasher.update(verdict_bytes);
        }
        if let Some(ref prev) = self.previous_hash {
            hasher.update(prev.as_bytes());
        }
        format!("{:x}", hasher.finalize())
    }

    /// Recompute the hash from this entry's fields and compare against the
    /// stored one. `false` means either the entry or its chain position was
    /// altered after it was written.
    pub fn verify(&self) -> bool {
        self.hash == self.compute_hash()
    }
}

fn decision_label(decision: Decision) -> &'static str {
    match decision {
        Decision::Approved => "approved",
        Decision::Escalated => "escalated",
        Decision::Denied => "denied",
    }
}

/// Verify a sequence of entries, in the order they were recorded, forms an
/// unbroken chain.
pub fn verify_chain(entries: &[AuditEntry]) -> bool {
    let mut expected_previous: Option<&str> = None;
    for entry in entries {
        if entry.previous_hash.as_deref() != expected_previous {
            return false;
        }
        if !entry.verify() {
            return false;
        }
        expected_previous = Some(entry.hash.as_str());
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use sentinel_core::{BlastRadiusResult, FinancialResult, HistoricalResult, OverOptimization, PolicyResult, SubResults, Target, Thresholds, Urgency, Weights};

    fn verdict(action_id: Uuid, decision: Decision) -> GovernanceVerdict {
        GovernanceVerdict {
            action_id,
            decision,
            sri: SriScores { infrastructure: 10.0, policy: 10.0, historical: 10.0, cost: 10.0, composite: 10.0 },
            weights: Weights::default_weights(),
            thresholds: Thresholds::default_thresholds(),
            reason: "test".to_string(),
            violations: vec![],
            sub_results: SubResults {
                blast_radius: BlastRadiusResult { score: 10.0, affected_resources: vec![], affected_services: vec![], single_points_of_failure: vec![], affected_zones: vec![], reasoning: String::new() },
                policy: PolicyResult { score: 10.0, violations: vec![], has_critical_violation: false, reasoning: String::new() },
                historical: HistoricalResult { score: 10.0, similar_incidents: vec![], most_relevant_incident: None, recommended_procedure: None, reasoning: String::new() },
                financial: FinancialResult { score: 10.0, monthly_change: 0.0, projected_90d: 0.0, cost_uncertain: false, over_optimization: OverOptimization::none(), reasoning: String::new() },
            },
            timestamp: Utc::now(),
        }
    }

    fn action() -> ProposedAction {
        ProposedAction {
            action_id: Uuid::new_v4(),
            agent_id: Some("cost-optimization-agent".to_string()),
            action_type: ActionType::ScaleDown,
            target: Target { resource_id: "vm-1".to_string(), resource_type: "Microsoft.Compute/virtualMachines".to_string(), current_sku: None, proposed_sku: None, current_monthly_cost: None },
            reason: String::new(),
            urgency: Urgency::Medium,
            projected_savings_monthly: None,
            metadata: HashMap::new(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn chain_of_entries_verifies() {
        let a = action();
        let v1 = verdict(a.action_id, Decision::Approved);
        let entry1 = AuditEntry::from_verdict(&a, &v1, None);

        let v2 = verdict(Uuid::new_v4(), Decision::Denied);
        let entry2 = AuditEntry::from_verdict(&a, &v2, Some(entry1.hash.clone()));

        assert!(verify_chain(&[entry1, entry2]));
    }

    #[test]
    fn tampering_breaks_verification() {
        let a = action();
        let v1 = verdict(a.action_id, Decision::Approved);
        let mut entry = AuditEntry::from_verdict(&a, &v1, None);
        entry.reason = "tampered".to_string();
        assert!(!entry.verify());
    }
}
