//! Historical Evaluator: SRI:Historical

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use sentinel_core::{
    ActionType, Evaluator, HistoricalResult, Incident, IncidentQuery, IncidentStore,
    ProposedAction, Result, Severity, SimilarIncident,
};

const SIMILARITY_THRESHOLD: f64 = 0.30;

/// Loose keyword vocabulary derived from an action type, used only for the
/// 0.10-weighted tag-overlap dimension of incident similarity.
fn action_keywords(action_type: ActionType) -> &'static [&'static str] {
    match action_type {
        ActionType::ScaleUp | ActionType::ScaleDown => &["scaling", "capacity"],
        ActionType::DeleteResource => &["deletion", "decommission"],
        ActionType::RestartService => &["restart", "reboot"],
        ActionType::ModifyNsg => &["network", "security", "firewall"],
        ActionType::CreateResource => &["provisioning"],
        ActionType::UpdateConfig => &["configuration"],
    }
}

fn similarity(action: &ProposedAction, incident: &Incident) -> f64 {
    let mut sim = 0.0;

    if incident.action_type == action.action_type {
        sim += 0.40;
    }
    if incident.resource_type.eq_ignore_ascii_case(&action.target.resource_type) {
        sim += 0.30;
    }

    let resource_id_lower = action.target.resource_id.to_lowercase();
    let name_hits = incident
        .resource_name
        .as_deref()
        // Resource ids are often longer than the human label an incident was
        // filed under ("vm-web-01" vs. "web-01"), so check containment both ways.
        .is_some_and(|n| resource_id_lower.contains(&n.to_lowercase()) || n.to_lowercase().contains(&resource_id_lower))
        || incident.title.to_lowercase().contains(&resource_id_lower)
        || incident
            .tags
            .iter()
            .any(|t| t.to_lowercase().contains(&resource_id_lower))
        || incident.summary.to_lowercase().contains(&resource_id_lower);
    if name_hits {
        sim += 0.20;
    }

    let keywords = action_keywords(action.action_type);
    if incident
        .tags
        .iter()
        .any(|tag| keywords.iter().any(|kw| tag.eq_ignore_ascii_case(kw)))
    {
        sim += 0.10;
    }

    sim
}

/// Computes SRI:Historical from weighted similarity to past incidents, with
/// diminishing returns applied to every incident after the single best match.
pub struct HistoricalEvaluator {
    incidents: Arc<dyn IncidentStore>,
}

impl HistoricalEvaluator {
    pub fn new(incidents: Arc<dyn IncidentStore>) -> Self {
        Self { incidents }
    }
}

#[async_trait]
impl Evaluator for HistoricalEvaluator {
    type Output = HistoricalResult;

    #[instrument(skip(self, action), fields(action_id = %action.action_id))]
    async fn evaluate(&self, action: &ProposedAction) -> Result<HistoricalResult> {
        let keywords: Vec<String> = action_keywords(action.action_type)
            .iter()
            .map(|s| s.to_string())
            .collect();

        let candidates = self
            .incidents
            .find_candidates(IncidentQuery {
                action_type: action.action_type,
                resource_type: &action.target.resource_type,
                resource_name: Some(action.target.resource_id.as_str()),
                keywords: &keywords,
            })
            .await?;

        let mut scored: Vec<(f64, &Incident)> = candidates
            .iter()
            .map(|incident| (similarity(action, incident), incident))
            .filter(|(sim, _)| *sim >= SIMILARITY_THRESHOLD)
            .collect();

        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap()
                .then_with(|| a.1.incident_id.cmp(&b.1.incident_id))
        });

        if scored.is_empty() {
            return Ok(HistoricalResult {
                score: 0.0,
                similar_incidents: vec![],
                most_relevant_incident: None,
                recommended_procedure: None,
                reasoning: "no precedent found in incident history".to_string(),
            });
        }

        let similar_incidents: Vec<SimilarIncident> = scored
            .iter()
            .map(|(sim, incident)| SimilarIncident {
                incident_id: incident.incident_id.clone(),
                similarity: *sim,
                severity: incident.severity,
                summary: incident.summary.clone(),
            })
            .collect();

        let (best_sim, best_incident) = scored[0];
        let mut score = best_sim * best_incident.severity.incident_weight();
        for (sim, incident) in &scored[1..] {
            score += sim * incident.severity.incident_weight() * 0.20;
        }
        let score = score.clamp(0.0, 100.0);

        let most_relevant_incident = similar_incidents.first().cloned();
        let recommended_procedure = best_incident.recommended_procedure.clone();

        let reasoning = format!(
            "{} similar incident(s) found; most relevant is {} (similarity {:.2}, severity {:?})",
            similar_incidents.len(),
            best_incident.incident_id,
            best_sim,
            best_incident.severity,
        );

        Ok(HistoricalResult {
            score,
            similar_incidents,
            most_relevant_incident,
            recommended_procedure,
            reasoning,
        })
    }

    fn name(&self) -> &str {
        "historical"
    }
}
