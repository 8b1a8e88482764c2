//! Policy Evaluator: SRI:Policy

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{instrument, warn};

use sentinel_core::{Evaluator, PolicyResult, PolicyViolation, ProposedAction, Resource, Result, TopologyStore};

use crate::store::PolicyStore;

/// Computes SRI:Policy by matching every configured policy's predicate
/// against the proposed action, per the scoring contract:
/// `raw = Σ severity_weight(fired policies)`, `score = clamp(raw, 0, 100)`,
/// `has_critical_violation = any fired policy has severity critical`.
pub struct PolicyEvaluator {
    policies: Arc<dyn PolicyStore>,
    topology: Arc<dyn TopologyStore>,
}

impl PolicyEvaluator {
    pub fn new(policies: Arc<dyn PolicyStore>, topology: Arc<dyn TopologyStore>) -> Self {
        Self { policies, topology }
    }

    async fn resolve_target(&self, action: &ProposedAction) -> Option<Resource> {
        match self.topology.get_resource(&action.target.resource_id).await {
            Ok(resource) => resource,
            Err(err) => {
                warn!(resource_id = %action.target.resource_id, error = %err, "topology lookup failed, treating target as unknown");
                None
            }
        }
    }
}

#[async_trait]
impl Evaluator for PolicyEvaluator {
    type Output = PolicyResult;

    #[instrument(skip(self, action), fields(action_id = %action.action_id))]
    async fn evaluate(&self, action: &ProposedAction) -> Result<PolicyResult> {
        let resource = self.resolve_target(action).await;
        let policies = self.policies.list().await?;

        let mut violations: Vec<PolicyViolation> = policies
            .iter()
            .filter(|policy| {
                policy.predicate.fires(
                    action.action_type,
                    &action.target.resource_type,
                    action.timestamp,
                    resource.as_ref(),
                )
            })
            .map(|policy| PolicyViolation {
                policy_id: policy.policy_id.clone(),
                severity: policy.severity,
                description: policy.description.clone(),
            })
            .collect();

        violations.sort_by(|a, b| b.severity.cmp(&a.severity).then_with(|| a.policy_id.cmp(&b.policy_id)));

        let raw: f64 = violations.iter().map(|v| v.severity.policy_weight()).sum();
        let score = raw.clamp(0.0, 100.0);
        let has_critical_violation = violations.iter().any(|v| v.severity == sentinel_core::Severity::Critical);

        let reasoning = if violations.is_empty() {
            "no governance policy matched this action".to_string()
        } else {
            let ids: Vec<&str> = violations.iter().map(|v| v.policy_id.as_str()).collect();
            format!("{} polic{} fired: {}", violations.len(), if violations.len() == 1 { "y" } else { "ies" }, ids.join(", "))
        };

        Ok(PolicyResult {
            score,
            violations,
            has_critical_violation,
            reasoning,
        })
    }

    fn name(&self) -> &str {
        "policy"
    }
}
