//! Core domain types for the governance engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// The kind of infrastructure mutation an agent is proposing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    ScaleUp,
    ScaleDown,
    DeleteResource,
    RestartService,
    ModifyNsg,
    CreateResource,
    UpdateConfig,
}

impl ActionType {
    /// Whether this action type destroys or materially shrinks a resource
    pub fn is_destructive(self) -> bool {
        matches!(self, Self::DeleteResource | Self::ScaleDown)
    }
}

/// Caller-supplied urgency for a proposed action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Final disposition of a governance verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approved,
    Escalated,
    Denied,
}

/// Severity scale shared by policies and incidents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Weight contributed by a fired policy of this severity, per the Policy Evaluator contract
    pub fn policy_weight(self) -> f64 {
        match self {
            Self::Critical => 100.0,
            Self::High => 40.0,
            Self::Medium => 20.0,
            Self::Low => 10.0,
        }
    }

    /// Weight contributed by an incident of this severity, per the Historical Evaluator contract
    pub fn incident_weight(self) -> f64 {
        match self {
            Self::Critical => 100.0,
            Self::High => 75.0,
            Self::Medium => 40.0,
            Self::Low => 10.0,
        }
    }
}

/// The resource a proposed action targets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    pub resource_id: String,

    #[serde(default)]
    pub resource_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_sku: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proposed_sku: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_monthly_cost: Option<f64>,
}

/// An action an operational agent proposes to take against infrastructure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposedAction {
    #[serde(default = "Uuid::new_v4")]
    pub action_id: Uuid,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,

    pub action_type: ActionType,

    pub target: Target,

    #[serde(default)]
    pub reason: String,

    #[serde(default)]
    pub urgency: Urgency,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projected_savings_monthly: Option<f64>,

    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,

    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

/// The five-component Sentinel Risk Index, each clamped to [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SriScores {
    pub infrastructure: f64,
    pub policy: f64,
    pub historical: f64,
    pub cost: f64,
    pub composite: f64,
}

/// Weight vector applied by the Decision Engine; must sum to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    pub infra: f64,
    pub policy: f64,
    pub historical: f64,
    pub cost: f64,
}

impl Weights {
    /// `0.30, 0.25, 0.25, 0.20` per the Decision Engine's default contract
    pub fn default_weights() -> Self {
        Self {
            infra: 0.30,
            policy: 0.25,
            historical: 0.25,
            cost: 0.20,
        }
    }

    /// Sum of all four weights
    pub fn sum(&self) -> f64 {
        self.infra + self.policy + self.historical + self.cost
    }

    /// Whether the weights sum to 1.0 within the tolerance the Decision Engine requires
    pub fn is_valid(&self) -> bool {
        (self.sum() - 1.0).abs() <= 1e-9
    }
}

/// Decision thresholds; `auto_approve <= human_review` is a configuration invariant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub auto_approve: f64,
    pub human_review: f64,
}

impl Thresholds {
    pub fn default_thresholds() -> Self {
        Self {
            auto_approve: 25.0,
            human_review: 60.0,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.auto_approve <= self.human_review
    }
}

/// Result of the Blast-Radius Evaluator (SRI:Infrastructure)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlastRadiusResult {
    pub score: f64,
    pub affected_resources: Vec<String>,
    pub affected_services: Vec<String>,
    pub single_points_of_failure: Vec<String>,
    pub affected_zones: Vec<String>,
    pub reasoning: String,
}

/// A single fired policy, as recorded in a `PolicyResult`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyViolation {
    pub policy_id: String,
    pub severity: Severity,
    pub description: String,
}

/// Result of the Policy Evaluator (SRI:Policy)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyResult {
    pub score: f64,
    pub violations: Vec<PolicyViolation>,
    pub has_critical_violation: bool,
    pub reasoning: String,
}

/// A past incident judged similar enough to the proposed action to surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarIncident {
    pub incident_id: String,
    pub similarity: f64,
    pub severity: Severity,
    pub summary: String,
}

/// Result of the Historical Evaluator (SRI:Historical)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalResult {
    pub score: f64,
    pub similar_incidents: Vec<SimilarIncident>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub most_relevant_incident: Option<SimilarIncident>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_procedure: Option<String>,
    pub reasoning: String,
}

/// Over-optimization risk flagged by the Financial Evaluator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverOptimization {
    pub triggered: bool,
    pub risk_usd: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl OverOptimization {
    pub fn none() -> Self {
        Self {
            triggered: false,
            risk_usd: 0.0,
            rationale: None,
        }
    }
}

/// Result of the Financial Evaluator (SRI:Cost)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinancialResult {
    pub score: f64,
    pub monthly_change: f64,
    pub projected_90d: f64,
    pub cost_uncertain: bool,
    pub over_optimization: OverOptimization,
    pub reasoning: String,
}

/// The four typed evaluator results a verdict carries alongside the composite score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubResults {
    pub blast_radius: BlastRadiusResult,
    pub policy: PolicyResult,
    pub historical: HistoricalResult,
    pub financial: FinancialResult,
}

/// The output of the Pipeline: a composite risk score and a decision
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceVerdict {
    pub action_id: Uuid,
    pub decision: Decision,
    pub sri: SriScores,
    pub weights: Weights,
    pub thresholds: Thresholds,
    pub reason: String,
    pub violations: Vec<String>,
    pub sub_results: SubResults,
    pub timestamp: DateTime<Utc>,
}

/// A directed edge in the topology graph not reflected in either endpoint's own fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub from: String,
    pub to: String,
}

/// A Topology Store entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub resource_type: String,

    #[serde(default)]
    pub tags: HashMap<String, String>,

    #[serde(default)]
    pub dependencies: Vec<String>,

    #[serde(default)]
    pub dependents: Vec<String>,

    #[serde(default)]
    pub governs: Vec<String>,

    #[serde(default)]
    pub services_hosted: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly_cost: Option<f64>,
}

impl Resource {
    /// Value of the `criticality` tag, if present
    pub fn criticality(&self) -> Option<&str> {
        self.tags.get("criticality").map(String::as_str)
    }

    /// Value of the `environment` tag, if present
    pub fn environment(&self) -> Option<&str> {
        self.tags.get("environment").map(String::as_str)
    }
}

/// A past-incident record served by the Incident Store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Incident {
    pub incident_id: String,
    pub title: String,
    pub summary: String,
    pub action_type: ActionType,
    pub resource_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    pub severity: Severity,
    pub outcome_text: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_procedure: Option<String>,
}

/// Per-agent counters tracked by the Agent Registry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentRecord {
    pub name: String,
    pub registered_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub total_proposed: u64,
    pub approved: u64,
    pub escalated: u64,
    pub denied: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_url: Option<String>,
}

impl AgentRecord {
    pub fn new(name: impl Into<String>, card_url: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            registered_at: now,
            last_seen: now,
            total_proposed: 0,
            approved: 0,
            escalated: 0,
            denied: 0,
            card_url,
        }
    }

    /// Record one more verdict against this agent
    pub fn record_decision(&mut self, decision: Decision, at: DateTime<Utc>) {
        self.total_proposed += 1;
        match decision {
            Decision::Approved => self.approved += 1,
            Decision::Escalated => self.escalated += 1,
            Decision::Denied => self.denied += 1,
        }
        if at > self.last_seen {
            self.last_seen = at;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weights_sum_to_one() {
        assert!(Weights::default_weights().is_valid());
    }

    #[test]
    fn default_thresholds_are_ordered() {
        assert!(Thresholds::default_thresholds().is_valid());
    }

    #[test]
    fn agent_record_counters_stay_consistent() {
        let mut rec = AgentRecord::new("cost-optimization-agent", None);
        let t0 = rec.last_seen;
        rec.record_decision(Decision::Approved, t0);
        rec.record_decision(Decision::Escalated, t0 + chrono::Duration::seconds(1));
        rec.record_decision(Decision::Denied, t0 + chrono::Duration::seconds(2));
        assert_eq!(rec.total_proposed, rec.approved + rec.escalated + rec.denied);
        assert_eq!(rec.total_proposed, 3);
    }

    #[test]
    fn action_type_round_trips_snake_case() {
        let json = serde_json::to_string(&ActionType::DeleteResource).unwrap();
        assert_eq!(json, "\"delete_resource\"");
        let back: ActionType = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ActionType::DeleteResource);
    }
}
