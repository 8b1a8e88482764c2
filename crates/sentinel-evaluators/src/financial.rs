//! Financial Evaluator: SRI:Cost

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{instrument, warn};

use sentinel_core::{
    ActionType, Evaluator, FinancialResult, OverOptimization, ProposedAction, Resource, Result,
    TopologyStore,
};

fn estimate_monthly_change(action: &ProposedAction, looked_up_cost: Option<f64>) -> (f64, bool) {
    if let Some(savings) = action.projected_savings_monthly {
        return (-savings, false);
    }

    // `current_monthly_cost` of 0.0 is a known value, not a missing one.
    let current_cost = action.target.current_monthly_cost.or(looked_up_cost);

    if let Some(cost) = current_cost {
        return match action.action_type {
            ActionType::DeleteResource => (-cost, false),
            ActionType::ScaleDown => (-0.30 * cost, true),
            ActionType::ScaleUp => (0.50 * cost, true),
            ActionType::RestartService | ActionType::ModifyNsg => (0.0, false),
            ActionType::CreateResource | ActionType::UpdateConfig => (0.0, false),
        };
    }

    (0.0, true)
}

fn magnitude_score(abs_change: f64) -> f64 {
    if abs_change >= 1000.0 {
        70.0
    } else if abs_change >= 600.0 {
        50.0
    } else if abs_change >= 300.0 {
        30.0
    } else if abs_change >= 100.0 {
        15.0
    } else if abs_change > 0.0 {
        5.0
    } else {
        0.0
    }
}

fn action_multiplier(action_type: ActionType) -> f64 {
    match action_type {
        ActionType::DeleteResource => 1.5,
        ActionType::ScaleDown => 1.2,
        ActionType::UpdateConfig => 0.8,
        ActionType::ScaleUp => 0.6,
        ActionType::CreateResource => 0.5,
        ActionType::RestartService | ActionType::ModifyNsg => 0.3,
    }
}

fn detect_over_optimization(monthly_change: f64, resource: Option<&Resource>) -> OverOptimization {
    if monthly_change >= 0.0 {
        return OverOptimization::none();
    }

    let Some(resource) = resource else {
        return OverOptimization::none();
    };

    let is_critical = resource.criticality() == Some("critical")
        || resource.dependents.len() >= 2
        || !resource.services_hosted.is_empty();

    if !is_critical {
        return OverOptimization::none();
    }

    let weight = (resource.dependents.len() + resource.services_hosted.len()).max(1) as f64;
    OverOptimization {
        triggered: true,
        risk_usd: 10_000.0 * weight,
        rationale: Some(format!(
            "cutting spend on {} risks a costly recovery: {} dependent(s), {} hosted service(s)",
            resource.name,
            resource.dependents.len(),
            resource.services_hosted.len()
        )),
    }
}

/// Computes SRI:Cost from the proposed action's projected monthly spend
/// change, an action-type multiplier, and an over-optimization penalty for
/// cost cuts aimed at resources that are themselves critical.
pub struct FinancialEvaluator {
    topology: Arc<dyn TopologyStore>,
}

impl FinancialEvaluator {
    pub fn new(topology: Arc<dyn TopologyStore>) -> Self {
        Self { topology }
    }
}

#[async_trait]
impl Evaluator for FinancialEvaluator {
    type Output = FinancialResult;

    #[instrument(skip(self, action), fields(action_id = %action.action_id))]
    async fn evaluate(&self, action: &ProposedAction) -> Result<FinancialResult> {
        let resource = match self.topology.get_resource(&action.target.resource_id).await {
            Ok(resource) => resource,
            Err(err) => {
                warn!(resource_id = %action.target.resource_id, error = %err, "topology lookup failed");
                None
            }
        };

        let looked_up_cost = resource.as_ref().and_then(|r| r.monthly_cost);
        let (monthly_change, cost_uncertain) = estimate_monthly_change(action, looked_up_cost);
        let over_optimization = detect_over_optimization(monthly_change, resource.as_ref());
        let projected_90d = monthly_change * 3.0;

        // A flat zero change carries no cost signal at all; score it zero
        // outright rather than let the uncertain-cost penalty alone produce a
        // nonzero score for an action with literally no known spend impact.
        let score = if monthly_change == 0.0 {
            0.0
        } else {
            let mut raw = magnitude_score(monthly_change.abs()) * action_multiplier(action.action_type);
            if over_optimization.triggered {
                raw += 20.0;
            }
            if cost_uncertain {
                raw += 10.0;
            }
            raw.clamp(0.0, 100.0)
        };

        let reasoning = if monthly_change == 0.0 {
            format!("{:?} carries no projected monthly spend change", action.action_type)
        } else {
            format!(
                "projected monthly change of ${:.2} ({}){}",
                monthly_change,
                if cost_uncertain { "estimated" } else { "known" },
                if over_optimization.triggered {
                    format!("; over-optimization risk ${:.2}", over_optimization.risk_usd)
                } else {
                    String::new()
                }
            )
        };

        Ok(FinancialResult {
            score,
            monthly_change,
            projected_90d,
            cost_uncertain,
            over_optimization,
            reasoning,
        })
    }

    fn name(&self) -> &str {
        "financial"
    }
}
