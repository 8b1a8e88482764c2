//! Governance Pipeline: fans out to the four evaluators, then composes a verdict
//!
//! Each evaluator produces a differently-typed result, so unlike a homogeneous
//! classifier pipeline this cannot hold `Vec<Box<dyn Evaluator>>` and
//! `join_all` over it. Instead the four concrete evaluators are joined with
//! `tokio::join!`, which places no constraint on its futures' output types.

use std::sync::Arc;
use std::time::Duration;

use tracing::{instrument, warn};

use sentinel_core::{
    BlastRadiusResult, Error, Evaluator, FinancialResult, GovernanceVerdict, HistoricalResult,
    PolicyResult, ProposedAction, Result, SubResults, Thresholds, Weights,
};
use sentinel_policy::PolicyEvaluator;
use sentinel_telemetry::{AgentRegistry, AuditLog};

use crate::blast_radius::BlastRadiusEvaluator;
use crate::decision::decide;
use crate::financial::FinancialEvaluator;
use crate::historical::HistoricalEvaluator;

const NEUTRAL_SCORE: f64 = 50.0;

/// Runs one evaluator under a per-evaluator timeout, falling back to a
/// neutral score on failure or timeout rather than failing the whole Pipeline.
async fn run_evaluator<E: Evaluator>(evaluator: &E, action: &ProposedAction, timeout: Duration) -> (Option<E::Output>, Option<String>) {
    match tokio::time::timeout(timeout, evaluator.evaluate(action)).await {
        Ok(Ok(result)) => (Some(result), None),
        Ok(Err(err)) => {
            warn!(evaluator = evaluator.name(), %err, "evaluator failed, substituting a neutral score");
            (None, Some(err.to_string()))
        }
        Err(_) => {
            warn!(evaluator = evaluator.name(), "evaluator timed out, substituting a neutral score");
            (None, Some("timed out".to_string()))
        }
    }
}

fn neutral_blast_radius(failure: &str) -> BlastRadiusResult {
    BlastRadiusResult {
        score: NEUTRAL_SCORE,
        affected_resources: vec![],
        affected_services: vec![],
        single_points_of_failure: vec![],
        affected_zones: vec![],
        reasoning: format!("blast-radius evaluation unavailable ({failure}); defaulted to neutral"),
    }
}

fn neutral_policy(failure: &str) -> PolicyResult {
    PolicyResult {
        score: NEUTRAL_SCORE,
        violations: vec![],
        has_critical_violation: false,
        reasoning: format!("policy evaluation unavailable ({failure}); defaulted to neutral"),
    }
}

fn neutral_historical(failure: &str) -> HistoricalResult {
    HistoricalResult {
        score: NEUTRAL_SCORE,
        similar_incidents: vec![],
        most_relevant_incident: None,
        recommended_procedure: None,
        reasoning: format!("historical evaluation unavailable ({failure}); defaulted to neutral"),
    }
}

fn neutral_financial(failure: &str) -> FinancialResult {
    FinancialResult {
        score: NEUTRAL_SCORE,
        monthly_change: 0.0,
        projected_90d: 0.0,
        cost_uncertain: true,
        over_optimization: sentinel_core::OverOptimization::none(),
        reasoning: format!("financial evaluation unavailable ({failure}); defaulted to neutral"),
    }
}

/// Fans out a proposed action to the four evaluators, composes a
/// [`GovernanceVerdict`], and records it to the Audit Log and Agent Registry.
pub struct Pipeline {
    blast_radius: BlastRadiusEvaluator,
    policy: PolicyEvaluator,
    historical: HistoricalEvaluator,
    financial: FinancialEvaluator,
    audit_log: Arc<AuditLog>,
    agent_registry: Arc<AgentRegistry>,
    weights: Weights,
    thresholds: Thresholds,
    evaluator_timeout: Duration,
}

impl Pipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        blast_radius: BlastRadiusEvaluator,
        policy: PolicyEvaluator,
        historical: HistoricalEvaluator,
        financial: FinancialEvaluator,
        audit_log: Arc<AuditLog>,
        agent_registry: Arc<AgentRegistry>,
        weights: Weights,
        thresholds: Thresholds,
        evaluator_timeout: Duration,
    ) -> Self {
        Self {
            blast_radius,
            policy,
            historical,
            financial,
            audit_log,
            agent_registry,
            weights,
            thresholds,
            evaluator_timeout,
        }
    }

    /// Evaluate a proposed action end to end. A deadline roughly double the
    /// per-evaluator timeout bounds the whole call; if it expires before
    /// composition finishes, no partial verdict is persisted and
    /// `DeadlineExceeded` is returned.
    #[instrument(skip(self, action), fields(action_id = %action.action_id))]
    pub async fn evaluate(&self, action: &ProposedAction) -> Result<GovernanceVerdict> {
        let overall_deadline = self.evaluator_timeout * 2;
        match tokio::time::timeout(overall_deadline, self.run(action)).await {
            Ok(verdict) => verdict,
            Err(_) => Err(Error::DeadlineExceeded),
        }
    }

    pub fn audit_log(&self) -> &Arc<AuditLog> {
        &self.audit_log
    }

    pub fn agent_registry(&self) -> &Arc<AgentRegistry> {
        &self.agent_registry
    }

    async fn run(&self, action: &ProposedAction) -> Result<GovernanceVerdict> {
        let timeout = self.evaluator_timeout;
        let (blast_result, policy_result, historical_result, financial_result) = tokio::join!(
            run_evaluator(&self.blast_radius, action, timeout),
            run_evaluator(&self.policy, action, timeout),
            run_evaluator(&self.historical, action, timeout),
            run_evaluator(&self.financial, action, timeout),
        );

        let sub_results = SubResults {
            blast_radius: blast_result.0.unwrap_or_else(|| neutral_blast_radius(blast_result.1.as_deref().unwrap_or("unknown"))),
            policy: policy_result.0.unwrap_or_else(|| neutral_policy(policy_result.1.as_deref().unwrap_or("unknown"))),
            historical: historical_result.0.unwrap_or_else(|| neutral_historical(historical_result.1.as_deref().unwrap_or("unknown"))),
            financial: financial_result.0.unwrap_or_else(|| neutral_financial(financial_result.1.as_deref().unwrap_or("unknown"))),
        };

        let verdict = decide(action.action_id, sub_results, self.weights, self.thresholds, action.timestamp);

        self.audit_log.record(action, &verdict);
        if let Some(agent_id) = action.agent_id.as_deref() {
            self.agent_registry.record_decision(agent_id, None, verdict.decision, verdict.timestamp);
        }

        Ok(verdict)
    }
}
