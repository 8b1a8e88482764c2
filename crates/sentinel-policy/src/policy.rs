//! Policy definitions

use serde::{Deserialize, Serialize};

use sentinel_core::Severity;

use crate::predicate::PolicyPredicate;

/// A single governance policy: a severity, a human-readable description, and
/// the predicate that decides whether it fires against a proposed action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Policy {
    pub policy_id: String,
    pub severity: Severity,
    pub description: String,
    pub predicate: PolicyPredicate,
}
