//! End-to-end scenarios exercising the full Pipeline: topology + policy +
//! incident fixtures in, a composed verdict and its audit/registry side
//! effects out.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tempfile::TempDir;
use uuid::Uuid;

use sentinel_core::{
    ActionType, Decision, DependencyEdge, Error, Incident, IncidentQuery, IncidentStore,
    InMemoryIncidentStore, InMemoryTopologyStore, ProposedAction, Resource, Result, Severity,
    Target, Thresholds, Urgency, Weights,
};
use sentinel_evaluators::{BlastRadiusEvaluator, FinancialEvaluator, HistoricalEvaluator, Pipeline};
use sentinel_policy::{InMemoryPolicyStore, Policy, PolicyEvaluator, PolicyPredicate};
use sentinel_telemetry::{AgentRegistry, AuditLog};

fn vm_dr_01() -> Resource {
    let mut tags = HashMap::new();
    tags.insert("disaster-recovery".to_string(), "true".to_string());
    tags.insert("environment".to_string(), "production".to_string());
    Resource {
        name: "vm-dr-01".to_string(),
        id: None,
        resource_type: "Microsoft.Compute/virtualMachines".to_string(),
        tags,
        dependencies: vec![],
        dependents: vec!["dr-failover-service".to_string(), "backup-coordinator".to_string()],
        governs: vec![],
        services_hosted: vec![],
        monthly_cost: Some(15.00),
    }
}

fn vm_web_01() -> Resource {
    let mut tags = HashMap::new();
    tags.insert("tier".to_string(), "web".to_string());
    Resource {
        name: "vm-web-01".to_string(),
        id: None,
        resource_type: "Microsoft.Compute/virtualMachines".to_string(),
        tags,
        dependencies: vec![],
        dependents: vec!["web-lb-1".to_string(), "web-lb-2".to_string(), "web-cache-1".to_string()],
        governs: vec![],
        services_hosted: vec![],
        monthly_cost: None,
    }
}

fn nsg_east_prod() -> Resource {
    let mut tags = HashMap::new();
    tags.insert("criticality".to_string(), "high".to_string());
    Resource {
        name: "nsg-east-prod".to_string(),
        id: None,
        resource_type: "Microsoft.Network/networkSecurityGroups".to_string(),
        tags,
        dependencies: vec![],
        dependents: vec!["svc-auth".to_string(), "svc-billing".to_string()],
        governs: vec!["vm-app-01".to_string(), "vm-app-02".to_string()],
        services_hosted: vec![],
        monthly_cost: None,
    }
}

fn vm_app_01() -> Resource {
    let mut tags = HashMap::new();
    tags.insert("criticality".to_string(), "critical".to_string());
    Resource {
        name: "vm-app-01".to_string(),
        id: None,
        resource_type: "Microsoft.Compute/virtualMachines".to_string(),
        tags,
        dependencies: vec![],
        dependents: vec![],
        governs: vec![],
        services_hosted: vec![],
        monthly_cost: None,
    }
}

fn vm_app_02() -> Resource {
    Resource {
        name: "vm-app-02".to_string(),
        id: None,
        resource_type: "Microsoft.Compute/virtualMachines".to_string(),
        tags: HashMap::new(),
        dependencies: vec![],
        dependents: vec![],
        governs: vec![],
        services_hosted: vec![],
        monthly_cost: None,
    }
}

fn topology() -> Arc<InMemoryTopologyStore> {
    Arc::new(InMemoryTopologyStore::new(
        vec![vm_dr_01(), vm_web_01(), nsg_east_prod(), vm_app_01(), vm_app_02()],
        vec![DependencyEdge { from: "nsg-east-prod".into(), to: "vm-app-01".into() }],
    ))
}

fn policies() -> Arc<InMemoryPolicyStore> {
    Arc::new(InMemoryPolicyStore::new(vec![
        Policy {
            policy_id: "POL-DR-001".to_string(),
            severity: Severity::Critical,
            description: "never delete disaster-recovery resources".to_string(),
            predicate: PolicyPredicate::TagMatch {
                tag: "disaster-recovery".to_string(),
                value: "true".to_string(),
                action_types: vec![ActionType::DeleteResource],
            },
        },
        Policy {
            policy_id: "POL-NSG-001".to_string(),
            severity: Severity::High,
            description: "NSG rule changes require review".to_string(),
            predicate: PolicyPredicate::ActionIn { action_types: vec![ActionType::ModifyNsg] },
        },
    ]))
}

fn build_pipeline(dir: &TempDir, incidents: Vec<Incident>) -> Pipeline {
    let topology = topology();
    let audit_log = Arc::new(AuditLog::new(dir.path().join(format!("audit-{}", Uuid::new_v4()))).unwrap());
    let agent_registry = Arc::new(AgentRegistry::new(dir.path().join(format!("agents-{}", Uuid::new_v4()))).unwrap());
    Pipeline::new(
        BlastRadiusEvaluator::new(topology.clone()),
        PolicyEvaluator::new(policies(), topology.clone()),
        HistoricalEvaluator::new(Arc::new(InMemoryIncidentStore::new(incidents))),
        FinancialEvaluator::new(topology),
        audit_log,
        agent_registry,
        Weights::default_weights(),
        Thresholds::default_thresholds(),
        Duration::from_secs(5),
    )
}

fn action(agent_id: &str, action_type: ActionType, resource_id: &str, resource_type: &str, reason: &str, urgency: Urgency, current_monthly_cost: Option<f64>) -> ProposedAction {
    ProposedAction {
        action_id: Uuid::new_v4(),
        agent_id: Some(agent_id.to_string()),
        action_type,
        target: Target {
            resource_id: resource_id.to_string(),
            resource_type: resource_type.to_string(),
            current_sku: None,
            proposed_sku: None,
            current_monthly_cost,
        },
        reason: reason.to_string(),
        urgency,
        projected_savings_monthly: None,
        metadata: HashMap::new(),
        timestamp: Utc.with_ymd_and_hms(2026, 1, 5, 12, 0, 0).unwrap(),
    }
}

fn scenario1_action() -> ProposedAction {
    action(
        "cost-optimization-agent",
        ActionType::DeleteResource,
        "vm-dr-01",
        "Microsoft.Compute/virtualMachines",
        "idle 30d",
        Urgency::High,
        None,
    )
}

fn scenario2_action() -> ProposedAction {
    action(
        "monitoring-agent",
        ActionType::ScaleUp,
        "vm-web-01",
        "Microsoft.Compute/virtualMachines",
        "CPU 87% for 15min",
        Urgency::Medium,
        Some(30.00),
    )
}

fn scenario3_action() -> ProposedAction {
    action(
        "deploy-agent",
        ActionType::ModifyNsg,
        "nsg-east-prod",
        "Microsoft.Network/networkSecurityGroups",
        "open 8080",
        Urgency::Medium,
        None,
    )
}

fn web01_incident() -> Incident {
    Incident {
        incident_id: "INC-4001".to_string(),
        title: "scale-up of web-01 caused a brief capacity incident".to_string(),
        summary: "scaling web-01 tripped an autoscaler flap".to_string(),
        action_type: ActionType::ScaleUp,
        resource_type: "Microsoft.Compute/virtualMachines".to_string(),
        resource_name: Some("web-01".to_string()),
        tags: vec![],
        severity: Severity::High,
        outcome_text: "reverted within 20 minutes".to_string(),
        recommended_procedure: Some("scale in one step, monitor 10 minutes before the next".to_string()),
    }
}

#[tokio::test]
async fn scenario_1_denied_by_critical_policy() {
    let dir = TempDir::new().unwrap();
    let pipeline = build_pipeline(&dir, vec![]);

    let verdict = pipeline.evaluate(&scenario1_action()).await.unwrap();

    assert_eq!(verdict.decision, Decision::Denied);
    assert!(verdict.violations.contains(&"POL-DR-001".to_string()));
    assert!(verdict.sri.policy >= 90.0);
    assert!(verdict.sub_results.policy.has_critical_violation);
    assert!(verdict.sri.composite >= 61.0);
}

#[tokio::test]
async fn scenario_2_approved_safe_scale_up() {
    let dir = TempDir::new().unwrap();
    let pipeline = build_pipeline(&dir, vec![]);

    let verdict = pipeline.evaluate(&scenario2_action()).await.unwrap();

    assert_eq!(verdict.decision, Decision::Approved);
    assert!(verdict.sri.composite <= 25.0);
    assert!(verdict.sri.infrastructure <= 40.0);
    assert!(verdict.sri.policy <= 40.0);
    assert!(verdict.sri.historical <= 40.0);
    assert!(verdict.sri.cost <= 40.0);
    assert!(verdict.violations.is_empty());
}

#[tokio::test]
async fn scenario_3_escalated_nsg_change() {
    let dir = TempDir::new().unwrap();
    let pipeline = build_pipeline(&dir, vec![]);

    let verdict = pipeline.evaluate(&scenario3_action()).await.unwrap();

    assert_eq!(verdict.decision, Decision::Escalated);
    assert!(verdict.sri.composite >= 26.0 && verdict.sri.composite <= 60.0);
    assert!(verdict.violations.contains(&"POL-NSG-001".to_string()));
    assert!(!verdict.sub_results.policy.has_critical_violation);
}

#[tokio::test]
async fn scenario_4_historical_override_pushes_composite_into_escalated_band() {
    let dir = TempDir::new().unwrap();
    let pipeline = build_pipeline(&dir, vec![web01_incident()]);

    let verdict = pipeline.evaluate(&scenario2_action()).await.unwrap();

    assert!(verdict.sri.historical >= 60.0);
    assert_eq!(verdict.decision, Decision::Escalated);
    assert!(verdict.sri.composite >= 26.0 && verdict.sri.composite <= 60.0);
}

struct FailingIncidentStore;

#[async_trait]
impl IncidentStore for FailingIncidentStore {
    async fn find_candidates(&self, _query: IncidentQuery<'_>) -> Result<Vec<Incident>> {
        Err(Error::lookup_failure("incident index unreachable"))
    }
}

#[tokio::test]
async fn scenario_5_evaluator_crash_is_absorbed_as_a_neutral_score() {
    let dir = TempDir::new().unwrap();
    let topology = topology();
    let audit_log = Arc::new(AuditLog::new(dir.path().join("audit")).unwrap());
    let agent_registry = Arc::new(AgentRegistry::new(dir.path().join("agents")).unwrap());

    let pipeline = Pipeline::new(
        BlastRadiusEvaluator::new(topology.clone()),
        PolicyEvaluator::new(policies(), topology.clone()),
        HistoricalEvaluator::new(Arc::new(FailingIncidentStore)),
        FinancialEvaluator::new(topology),
        audit_log.clone(),
        agent_registry,
        Weights::default_weights(),
        Thresholds::default_thresholds(),
        Duration::from_secs(5),
    );

    let action = scenario2_action();
    let verdict = pipeline.evaluate(&action).await.unwrap();
    audit_log.flush().await;

    assert_eq!(verdict.sri.historical, 50.0);
    assert!(verdict.sub_results.historical.reasoning.contains("unavailable"));
    assert!(audit_log.get(&verdict.action_id).is_some());
}

#[tokio::test]
async fn scenario_6_agent_registry_counts_one_of_each_verdict() {
    let dir = TempDir::new().unwrap();
    let topology = topology();
    let audit_log = Arc::new(AuditLog::new(dir.path().join("audit")).unwrap());
    let agent_registry = Arc::new(AgentRegistry::new(dir.path().join("agents")).unwrap());

    let pipeline = Pipeline::new(
        BlastRadiusEvaluator::new(topology.clone()),
        PolicyEvaluator::new(policies(), topology.clone()),
        HistoricalEvaluator::new(Arc::new(InMemoryIncidentStore::new(vec![]))),
        FinancialEvaluator::new(topology),
        audit_log,
        agent_registry.clone(),
        Weights::default_weights(),
        Thresholds::default_thresholds(),
        Duration::from_secs(5),
    );

    let agent = "cost-optimization-agent";
    let mut denied = scenario1_action();
    denied.agent_id = Some(agent.to_string());
    denied.timestamp = Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap();

    let mut approved = scenario2_action();
    approved.agent_id = Some(agent.to_string());
    approved.timestamp = Utc.with_ymd_and_hms(2026, 1, 5, 10, 0, 0).unwrap();

    let mut escalated = scenario3_action();
    escalated.agent_id = Some(agent.to_string());
    escalated.timestamp = Utc.with_ymd_and_hms(2026, 1, 5, 11, 0, 0).unwrap();

    pipeline.evaluate(&denied).await.unwrap();
    pipeline.evaluate(&approved).await.unwrap();
    let last = pipeline.evaluate(&escalated).await.unwrap();

    agent_registry.flush().await;

    let record = agent_registry.get(agent).unwrap();
    assert_eq!(record.total_proposed, 3);
    assert_eq!(record.approved, 1);
    assert_eq!(record.escalated, 1);
    assert_eq!(record.denied, 1);
    assert_eq!(record.last_seen, last.timestamp);
}
