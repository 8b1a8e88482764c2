//! Audit Log and Agent Registry for the Sentinel governance engine
//!
//! Provides:
//! - A tamper-evident, hash-chained Audit Log, one JSON file per `action_id`
//! - An Agent Registry tracking per-agent decision counters, one JSON file per agent name
//! - Both write through a dedicated background thread so recording never blocks the Pipeline

pub mod agent_registry;
pub mod audit;
pub mod audit_log;
pub mod persistence;

pub use agent_registry::AgentRegistry;
pub use audit::AuditEntry;
pub use audit_log::{AuditAggregate, AuditLog, DimensionAverages, ResourceCount, ViolationCount};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::agent_registry::AgentRegistry;
    pub use crate::audit::AuditEntry;
    pub use crate::audit_log::{AuditAggregate, AuditLog};
}
