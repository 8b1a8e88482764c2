//! Governance Core
//!
//! Core types, traits, and utilities shared across the governance engine's crates.
//!
//! This crate provides:
//! - The `ProposedAction` / `GovernanceVerdict` data model and its typed sub-results
//! - Error types and result handling
//! - The `Evaluator` trait each scoring evaluator implements
//! - The `TopologyStore` and `IncidentStore` read-side contracts and their
//!   file-backed mock-mode implementations
//! - Environment-driven startup configuration

pub mod config;
pub mod error;
pub mod evaluator;
pub mod incident_store;
pub mod topology;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use evaluator::Evaluator;
pub use incident_store::{FileIncidentStore, IncidentQuery, IncidentStore, InMemoryIncidentStore};
pub use topology::{FileTopologyStore, InMemoryTopologyStore, TopologyStore};
pub use types::{
    ActionType, AgentRecord, BlastRadiusResult, Decision, DependencyEdge, FinancialResult,
    GovernanceVerdict, HistoricalResult, Incident, OverOptimization, PolicyResult,
    PolicyViolation, ProposedAction, Resource, Severity, SimilarIncident, SriScores, SubResults,
    Target, Thresholds, Urgency, Weights,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::evaluator::Evaluator;
    pub use crate::incident_store::{IncidentQuery, IncidentStore};
    pub use crate::topology::TopologyStore;
    pub use crate::types::*;
}
