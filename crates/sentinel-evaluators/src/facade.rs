//! Governance Facade: the single entry point Surface A, Surface B, and the
//! dashboard all call through

use std::sync::Arc;

use uuid::Uuid;

use sentinel_core::{AgentRecord, GovernanceVerdict, ProposedAction, Result};
use sentinel_telemetry::{AuditAggregate, AuditEntry};

use crate::pipeline::Pipeline;

/// Thin facade over the Pipeline plus read access to the Audit Log and Agent
/// Registry, so HTTP, SSE, and stdio surfaces share one code path.
pub struct GovernanceFacade {
    pipeline: Arc<Pipeline>,
}

impl GovernanceFacade {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }

    pub async fn evaluate_action(&self, action: &ProposedAction) -> Result<GovernanceVerdict> {
        self.pipeline.evaluate(action).await
    }

    pub fn get_recent_decisions(&self, limit: usize) -> Vec<AuditEntry> {
        self.pipeline.audit_log().recent(limit)
    }

    /// The full verdict as originally produced, byte-equivalent to what
    /// `evaluate_action` returned for this `action_id`.
    pub fn get_decision(&self, action_id: &Uuid) -> Option<GovernanceVerdict> {
        self.pipeline.audit_log().get_by_id(action_id)
    }

    pub fn get_resource_history(&self, resource_id: &str, limit: usize) -> Vec<AuditEntry> {
        self.pipeline.audit_log().by_resource(resource_id, limit)
    }

    pub fn get_agent_history(&self, agent_name: &str, limit: usize) -> Vec<AuditEntry> {
        self.pipeline.audit_log().by_agent(agent_name, limit)
    }

    /// Decision counts, composite min/avg/max, per-dimension averages, top
    /// violations, and most-evaluated resources across every recorded verdict.
    pub fn aggregate(&self) -> AuditAggregate {
        self.pipeline.audit_log().aggregate()
    }

    pub fn get_risk_profile(&self, agent_name: &str) -> Option<AgentRecord> {
        self.pipeline.agent_registry().get(agent_name)
    }

    pub fn list_agents(&self) -> Vec<AgentRecord> {
        self.pipeline.agent_registry().list()
    }
}
