//! Incident Store: past-incident lookup for the Historical Evaluator
//!
//! No BM25 crate appears anywhere in this codebase's lineage, so the file-backed
//! implementation here narrows the corpus with a plain keyword/tag pre-filter
//! instead. The Historical Evaluator recomputes the exact weighted-similarity
//! score itself from whatever candidates a store returns, so swapping this file
//! store for a real full-text index later changes retrieval recall, not scoring
//! semantics — the evaluator's contract (same score for the same
//! `(action, returned incidents)` tuple) holds regardless of back-end.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::types::{ActionType, Incident};

/// Parameters the Historical Evaluator passes down when asking for candidate incidents
#[derive(Debug, Clone)]
pub struct IncidentQuery<'a> {
    pub action_type: ActionType,
    pub resource_type: &'a str,
    pub resource_name: Option<&'a str>,
    pub keywords: &'a [String],
}

/// Read-only view over past-incident records
#[async_trait]
pub trait IncidentStore: Send + Sync {
    /// Return incidents plausibly similar to the query. The evaluator treats
    /// this as a recall-oriented pre-filter: it is safe (and required) to
    /// return more than end up above the similarity threshold, but an
    /// incident that could score `>= 0.30` MUST be present in the result.
    async fn find_candidates(&self, query: IncidentQuery<'_>) -> Result<Vec<Incident>>;
}

/// File-backed Incident Store for mock mode, loading the full corpus from a
/// single JSON array document.
pub struct FileIncidentStore {
    incidents: RwLock<Arc<Vec<Incident>>>,
    path: PathBuf,
}

impl FileIncidentStore {
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let incidents = Self::parse(&path)?;
        Ok(Self {
            incidents: RwLock::new(Arc::new(incidents)),
            path,
        })
    }

    pub async fn reload(&self) -> Result<()> {
        let incidents = Self::parse(&self.path)?;
        *self.incidents.write().await = Arc::new(incidents);
        Ok(())
    }

    fn parse(path: &std::path::Path) -> Result<Vec<Incident>> {
        let raw = std::fs::read_to_string(path)?;
        let incidents: Vec<Incident> = serde_json::from_str(&raw)?;
        Ok(incidents)
    }
}

fn matches(incident: &Incident, query: &IncidentQuery<'_>) -> bool {
    if incident.action_type == query.action_type {
        return true;
    }
    if incident.resource_type.eq_ignore_ascii_case(query.resource_type) {
        return true;
    }
    if let (Some(name), Some(incident_name)) = (query.resource_name, incident.resource_name.as_deref())
    {
        let name = name.to_lowercase();
        if incident_name.to_lowercase().contains(&name)
            || incident.title.to_lowercase().contains(&name)
            || incident.summary.to_lowercase().contains(&name)
        {
            return true;
        }
    }
    if query
        .keywords
        .iter()
        .any(|kw| incident.tags.iter().any(|tag| tag.eq_ignore_ascii_case(kw)))
    {
        return true;
    }
    false
}

#[async_trait]
impl IncidentStore for FileIncidentStore {
    async fn find_candidates(&self, query: IncidentQuery<'_>) -> Result<Vec<Incident>> {
        let incidents = self.incidents.read().await.clone();
        Ok(incidents.iter().filter(|i| matches(i, &query)).cloned().collect())
    }
}

/// In-memory Incident Store for tests and literal scenario fixtures
pub struct InMemoryIncidentStore {
    incidents: Vec<Incident>,
}

impl InMemoryIncidentStore {
    pub fn new(incidents: Vec<Incident>) -> Self {
        Self { incidents }
    }
}

#[async_trait]
impl IncidentStore for InMemoryIncidentStore {
    async fn find_candidates(&self, query: IncidentQuery<'_>) -> Result<Vec<Incident>> {
        Ok(self
            .incidents
            .iter()
            .filter(|i| matches(i, &query))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Severity;

    fn incident(id: &str, action_type: ActionType, resource_type: &str, resource_name: Option<&str>) -> Incident {
        Incident {
            incident_id: id.to_string(),
            title: format!("incident {id}"),
            summary: "summary".to_string(),
            action_type,
            resource_type: resource_type.to_string(),
            resource_name: resource_name.map(str::to_string),
            tags: vec![],
            severity: Severity::Medium,
            outcome_text: "recovered".to_string(),
            recommended_procedure: None,
        }
    }

    #[tokio::test]
    async fn unrelated_incident_is_excluded() {
        let store = InMemoryIncidentStore::new(vec![incident(
            "INC-1",
            ActionType::ScaleUp,
            "Microsoft.Compute/virtualMachines",
            None,
        )]);

        let results = store
            .find_candidates(IncidentQuery {
                action_type: ActionType::DeleteResource,
                resource_type: "Microsoft.Network/networkSecurityGroups",
                resource_name: None,
                keywords: &[],
            })
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn resource_name_substring_is_case_insensitive() {
        let store = InMemoryIncidentStore::new(vec![incident(
            "INC-1",
            ActionType::RestartService,
            "Microsoft.Compute/virtualMachines",
            Some("VM-WEB-01"),
        )]);

        let results = store
            .find_candidates(IncidentQuery {
                action_type: ActionType::ScaleUp,
                resource_type: "other",
                resource_name: Some("vm-web-01"),
                keywords: &[],
            })
            .await
            .unwrap();
        assert_eq!(results.len(), 1);
    }
}
