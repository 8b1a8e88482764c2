//! Decision Engine: composes the four sub-results into one verdict

use chrono::{DateTime, Utc};
use uuid::Uuid;

use sentinel_core::{Decision, GovernanceVerdict, Severity, SriScores, SubResults, Thresholds, Weights};

/// Weighted sum of the four dimension scores, clamped to `[0, 100]`, with a
/// critical policy violation overriding the threshold rule outright: the
/// action is denied regardless of where the weighted sum would otherwise land.
pub fn decide(action_id: Uuid, sub_results: SubResults, weights: Weights, thresholds: Thresholds, timestamp: DateTime<Utc>) -> GovernanceVerdict {
    let weighted = weights.infra * sub_results.blast_radius.score
        + weights.policy * sub_results.policy.score
        + weights.historical * sub_results.historical.score
        + weights.cost * sub_results.financial.score;
    let mut composite = weighted.clamp(0.0, 100.0);

    let critical_violation = sub_results
        .policy
        .violations
        .iter()
        .find(|v| v.severity == Severity::Critical);

    if critical_violation.is_some() {
        composite = composite.max(thresholds.human_review + 1.0);
    }

    let decision = if critical_violation.is_some() {
        Decision::Denied
    } else if composite <= thresholds.auto_approve {
        Decision::Approved
    } else if composite <= thresholds.human_review {
        Decision::Escalated
    } else {
        Decision::Denied
    };

    let violations: Vec<String> = sub_results.policy.violations.iter().map(|v| v.policy_id.clone()).collect();

    let reason = match critical_violation {
        Some(cv) => format!(
            "{:?}: composite {:.1} forced by critical policy violation {}",
            decision, composite, cv.policy_id
        ),
        None => {
            let (dim, score) = highest_dimension(&sub_results);
            let mut reason = format!("{:?}: composite {:.1}, highest-risk dimension {} ({:.1})", decision, composite, dim, score);
            if let Some(first) = violations.first() {
                reason.push_str(&format!(", first violation {first}"));
            }
            reason
        }
    };

    let sri = SriScores {
        infrastructure: sub_results.blast_radius.score,
        policy: sub_results.policy.score,
        historical: sub_results.historical.score,
        cost: sub_results.financial.score,
        composite,
    };

    GovernanceVerdict {
        action_id,
        decision,
        sri,
        weights,
        thresholds,
        reason,
        violations,
        sub_results,
        timestamp,
    }
}

fn highest_dimension(sub_results: &SubResults) -> (&'static str, f64) {
    let dims = [
        ("infrastructure", sub_results.blast_radius.score),
        ("policy", sub_results.policy.score),
        ("historical", sub_results.historical.score),
        ("cost", sub_results.financial.score),
    ];
    dims.into_iter()
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
        .expect("dims is non-empty")
}
