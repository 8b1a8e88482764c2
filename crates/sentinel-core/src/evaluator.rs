//! The common contract all four scoring evaluators implement

use async_trait::async_trait;

use crate::error::Result;
use crate::types::ProposedAction;

/// One of the four independent risk dimensions the Pipeline fans out to.
///
/// Mirrors how a classifier in a content pipeline scores one axis of a piece
/// of text — here each evaluator scores one axis of a proposed infrastructure
/// mutation. Evaluators are invoked at most once per `evaluate` call, run
/// concurrently with their siblings, and MUST NOT hold any lock across a
/// suspension point (a store lookup or an optional LLM narration call).
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// The typed sub-result this evaluator produces
    type Output: Send;

    /// Score the proposed action along this evaluator's dimension
    async fn evaluate(&self, action: &ProposedAction) -> Result<Self::Output>;

    /// Stable name used in logging, metrics, and failure attribution
    fn name(&self) -> &str;
}
