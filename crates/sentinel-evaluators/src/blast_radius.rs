//! Blast-Radius Evaluator: SRI:Infrastructure

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{instrument, warn};

use sentinel_core::{ActionType, BlastRadiusResult, Evaluator, ProposedAction, Result, TopologyStore};

fn action_base(action_type: ActionType) -> f64 {
    match action_type {
        ActionType::ScaleUp => 10.0,
        ActionType::ScaleDown => 15.0,
        ActionType::RestartService => 20.0,
        ActionType::ModifyNsg => 30.0,
        ActionType::UpdateConfig => 20.0,
        ActionType::CreateResource => 15.0,
        ActionType::DeleteResource => 40.0,
    }
}

fn criticality_points(criticality: Option<&str>) -> f64 {
    match criticality {
        Some("critical") => 30.0,
        Some("high") => 20.0,
        Some("medium") => 10.0,
        _ => 0.0,
    }
}

/// Computes SRI:Infrastructure by a single one-hop traversal of the topology
/// graph from the target resource (deliberately not recursive — see the
/// design note on cyclic data: if multi-hop traversal is ever introduced it
/// must be iterative BFS with a visited set, never recursive descent).
pub struct BlastRadiusEvaluator {
    topology: Arc<dyn TopologyStore>,
}

impl BlastRadiusEvaluator {
    pub fn new(topology: Arc<dyn TopologyStore>) -> Self {
        Self { topology }
    }
}

#[async_trait]
impl Evaluator for BlastRadiusEvaluator {
    type Output = BlastRadiusResult;

    #[instrument(skip(self, action), fields(action_id = %action.action_id))]
    async fn evaluate(&self, action: &ProposedAction) -> Result<BlastRadiusResult> {
        let resource = match self.topology.get_resource(&action.target.resource_id).await {
            Ok(resource) => resource,
            Err(err) => {
                warn!(resource_id = %action.target.resource_id, error = %err, "topology lookup failed");
                None
            }
        };

        let Some(resource) = resource else {
            return Ok(BlastRadiusResult {
                score: 0.0,
                affected_resources: vec![],
                affected_services: vec![],
                single_points_of_failure: vec![],
                affected_zones: vec![],
                reasoning: "unknown resource".to_string(),
            });
        };

        let edges = self.topology.dependency_edges().await.unwrap_or_default();

        // One-hop neighbors reachable via `governs` or an explicit dependency edge.
        let mut neighbors = Vec::new();
        let mut seen_neighbors = HashSet::new();
        for name in resource.governs.iter().chain(
            edges
                .iter()
                .filter(|e| e.from == resource.name)
                .map(|e| &e.to),
        ) {
            if seen_neighbors.insert(name.clone()) {
                neighbors.push(name.clone());
            }
        }

        let mut single_points_of_failure = Vec::new();
        for name in &neighbors {
            if let Ok(Some(neighbor)) = self.topology.get_resource(name).await {
                if neighbor.criticality() == Some("critical") {
                    single_points_of_failure.push(name.clone());
                }
            }
        }

        let mut score = action_base(action.action_type)
            + criticality_points(resource.criticality())
            + 5.0 * resource.dependents.len() as f64
            + 5.0 * resource.services_hosted.len() as f64
            + 10.0 * single_points_of_failure.len() as f64;
        score = score.clamp(0.0, 100.0);

        let mut affected_resources = Vec::new();
        let mut seen_affected = HashSet::new();
        for name in resource.dependents.iter().chain(neighbors.iter()) {
            if seen_affected.insert(name.clone()) {
                affected_resources.push(name.clone());
            }
        }

        let affected_zones = resource
            .tags
            .get("zone")
            .into_iter()
            .cloned()
            .collect::<Vec<_>>();

        let reasoning = format!(
            "{:?} on {} ({} dependents, {} hosted services, {} single point(s) of failure)",
            action.action_type,
            resource.name,
            resource.dependents.len(),
            resource.services_hosted.len(),
            single_points_of_failure.len(),
        );

        Ok(BlastRadiusResult {
            score,
            affected_resources,
            affected_services: resource.services_hosted.clone(),
            single_points_of_failure,
            affected_zones,
            reasoning,
        })
    }

    fn name(&self) -> &str {
        "blast_radius"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use sentinel_core::{DependencyEdge, InMemoryTopologyStore, Resource, Target, Urgency};

    fn resource(name: &str, criticality: &str, dependents: Vec<&str>, services: Vec<&str>, governs: Vec<&str>) -> Resource {
        let mut tags = HashMap::new();
        tags.insert("criticality".to_string(), criticality.to_string());
        Resource {
            name: name.to_string(),
            id: None,
            resource_type: "Microsoft.Compute/virtualMachines".to_string(),
            tags,
            dependencies: vec![],
            dependents: dependents.into_iter().map(str::to_string).collect(),
            governs: governs.into_iter().map(str::to_string).collect(),
            services_hosted: services.into_iter().map(str::to_string).collect(),
            monthly_cost: None,
        }
    }

    fn action(action_type: ActionType, resource_id: &str) -> ProposedAction {
        ProposedAction {
            action_id: uuid::Uuid::new_v4(),
            agent_id: None,
            action_type,
            target: Target {
                resource_id: resource_id.to_string(),
                resource_type: "Microsoft.Compute/virtualMachines".to_string(),
                current_sku: None,
                proposed_sku: None,
                current_monthly_cost: None,
            },
            reason: String::new(),
            urgency: Urgency::Medium,
            projected_savings_monthly: None,
            metadata: HashMap::new(),
            timestamp: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn unknown_resource_scores_zero() {
        let topology = InMemoryTopologyStore::new(vec![], vec![]);
        let evaluator = BlastRadiusEvaluator::new(Arc::new(topology));
        let result = evaluator.evaluate(&action(ActionType::ScaleUp, "vm-missing")).await.unwrap();
        assert_eq!(result.score, 0.0);
        assert_eq!(result.reasoning, "unknown resource");
    }

    #[tokio::test]
    async fn delete_with_dependents_and_spof_scores_high() {
        let governed = resource("nsg-governed", "critical", vec![], vec![], vec![]);
        let target = resource(
            "vm-dr-01",
            "critical",
            vec!["dr-failover-service", "backup-coordinator"],
            vec![],
            vec!["nsg-governed"],
        );
        let topology = InMemoryTopologyStore::new(vec![target, governed], vec![]);
        let evaluator = BlastRadiusEvaluator::new(Arc::new(topology));

        let result = evaluator.evaluate(&action(ActionType::DeleteResource, "vm-dr-01")).await.unwrap();
        // base 40 + criticality 30 + 2*5 dependents + 1*10 spof = 90
        assert_eq!(result.score, 90.0);
        assert_eq!(result.single_points_of_failure, vec!["nsg-governed".to_string()]);
        assert!(result.affected_resources.contains(&"dr-failover-service".to_string()));
    }

    #[tokio::test]
    async fn score_is_capped_at_100() {
        let target = resource(
            "vm-huge",
            "critical",
            (0..30).map(|_| "dep").collect(),
            vec![],
            vec![],
        );
        let topology = InMemoryTopologyStore::new(vec![target], vec![]);
        let evaluator = BlastRadiusEvaluator::new(Arc::new(topology));
        let result = evaluator.evaluate(&action(ActionType::DeleteResource, "vm-huge")).await.unwrap();
        assert_eq!(result.score, 100.0);
    }
}
