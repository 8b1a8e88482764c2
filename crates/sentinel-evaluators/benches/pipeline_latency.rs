//! Latency benchmarks for the Governance Pipeline
//!
//! Run with: cargo bench -p sentinel-evaluators

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tokio::runtime::Runtime;

use sentinel_core::{
    ActionType, DependencyEdge, InMemoryIncidentStore, InMemoryTopologyStore, ProposedAction,
    Resource, Target, Thresholds, Urgency, Weights,
};
use sentinel_evaluators::{BlastRadiusEvaluator, FinancialEvaluator, HistoricalEvaluator, Pipeline};
use sentinel_policy::{InMemoryPolicyStore, PolicyEvaluator};
use sentinel_telemetry::{AgentRegistry, AuditLog};

fn resource(name: &str, dependents: usize) -> Resource {
    Resource {
        name: name.to_string(),
        id: None,
        resource_type: "Microsoft.Compute/virtualMachines".to_string(),
        tags: HashMap::new(),
        dependencies: vec![],
        dependents: (0..dependents).map(|i| format!("dep-{i}")).collect(),
        governs: vec![],
        services_hosted: vec![],
        monthly_cost: Some(120.0),
    }
}

fn action(resource_id: &str) -> ProposedAction {
    ProposedAction {
        action_id: uuid::Uuid::new_v4(),
        agent_id: Some("bench-agent".to_string()),
        action_type: ActionType::ScaleUp,
        target: Target {
            resource_id: resource_id.to_string(),
            resource_type: "Microsoft.Compute/virtualMachines".to_string(),
            current_sku: None,
            proposed_sku: None,
            current_monthly_cost: None,
        },
        reason: "bench".to_string(),
        urgency: Urgency::Medium,
        projected_savings_monthly: None,
        metadata: HashMap::new(),
        timestamp: chrono::Utc::now(),
    }
}

fn build_pipeline(dependents: usize) -> (tempfile::TempDir, Pipeline) {
    let dir = tempfile::tempdir().unwrap();
    let topology = Arc::new(InMemoryTopologyStore::new(
        vec![resource("vm-bench", dependents)],
        vec![DependencyEdge { from: "vm-bench".into(), to: "vm-bench".into() }],
    ));
    let audit_log = Arc::new(AuditLog::new(dir.path().join("audit")).unwrap());
    let agent_registry = Arc::new(AgentRegistry::new(dir.path().join("agents")).unwrap());

    let pipeline = Pipeline::new(
        BlastRadiusEvaluator::new(topology.clone()),
        PolicyEvaluator::new(Arc::new(InMemoryPolicyStore::new(vec![])), topology.clone()),
        HistoricalEvaluator::new(Arc::new(InMemoryIncidentStore::new(vec![]))),
        FinancialEvaluator::new(topology),
        audit_log,
        agent_registry,
        Weights::default_weights(),
        Thresholds::default_thresholds(),
        Duration::from_secs(5),
    );

    (dir, pipeline)
}

/// Verifies a single evaluation completes well inside the per-evaluator timeout budget
fn benchmark_single_evaluation(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let (_dir, pipeline) = build_pipeline(3);
    let action = action("vm-bench");

    let mut group = c.benchmark_group("Pipeline_Single_Evaluation");
    group.significance_level(0.05);
    group.sample_size(100);

    group.bench_function("evaluate", |b| {
        b.iter(|| {
            rt.block_on(async { pipeline.evaluate(black_box(&action)).await.unwrap() })
        });
    });

    group.finish();
}

/// Scales the target resource's dependent count to see how it affects
/// Blast-Radius Evaluator (and thus whole-Pipeline) latency
fn benchmark_topology_fan_out(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("Pipeline_Topology_Fan_Out");
    group.sample_size(50);

    for dependents in [0usize, 10, 100] {
        let (_dir, pipeline) = build_pipeline(dependents);
        let action = action("vm-bench");

        group.bench_with_input(BenchmarkId::new("evaluate", dependents), &action, |b, action| {
            b.iter(|| {
                rt.block_on(async { pipeline.evaluate(black_box(action)).await.unwrap() })
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_single_evaluation, benchmark_topology_fan_out);
criterion_main!(benches);
