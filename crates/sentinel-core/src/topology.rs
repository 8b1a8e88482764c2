//! Topology Store: resource dependency graph and per-resource attributes

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::types::{DependencyEdge, Resource};

/// Read-only view over the resource dependency graph, swappable for a remote
/// back-end without the evaluators that consume it noticing.
#[async_trait]
pub trait TopologyStore: Send + Sync {
    /// Look up a resource by id, matched against `Resource::name`
    async fn get_resource(&self, resource_id: &str) -> Result<Option<Resource>>;

    /// Every explicit directed edge not reflected in a resource's own
    /// `governs`/`dependencies` fields (this is what lets `delete -> restart -> …`
    /// cycles be caught without recursive descent).
    async fn dependency_edges(&self) -> Result<Vec<DependencyEdge>>;
}

#[derive(Debug, Deserialize)]
struct TopologyFile {
    resources: Vec<Resource>,
    #[serde(default)]
    dependency_edges: Vec<DependencyEdge>,
}

struct Snapshot {
    by_name: HashMap<String, Resource>,
    edges: Vec<DependencyEdge>,
}

impl Snapshot {
    fn from_file(file: TopologyFile) -> Self {
        let by_name = file
            .resources
            .into_iter()
            .map(|r| (r.name.clone(), r))
            .collect();
        Self {
            by_name,
            edges: file.dependency_edges,
        }
    }
}

/// File-backed Topology Store for mock mode. The on-disk format is a single
/// JSON document `{resources:[…], dependency_edges:[…]}`.
///
/// The in-memory snapshot is held behind an `RwLock<Arc<_>>` so a concurrent
/// `reload` can swap in a freshly parsed snapshot without readers ever
/// observing a torn read — every in-flight `get_resource`/`dependency_edges`
/// call sees either the old or the new snapshot in full.
pub struct FileTopologyStore {
    path: PathBuf,
    inner: RwLock<Arc<Snapshot>>,
}

impl FileTopologyStore {
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let snapshot = Self::parse(&path)?;
        Ok(Self {
            path,
            inner: RwLock::new(Arc::new(snapshot)),
        })
    }

    /// Re-read the backing file and swap it in atomically
    pub async fn reload(&self) -> Result<()> {
        let snapshot = Self::parse(&self.path)?;
        *self.inner.write().await = Arc::new(snapshot);
        Ok(())
    }

    fn parse(path: &std::path::Path) -> Result<Snapshot> {
        let raw = std::fs::read_to_string(path)?;
        let file: TopologyFile = serde_json::from_str(&raw)?;
        Ok(Snapshot::from_file(file))
    }
}

#[async_trait]
impl TopologyStore for FileTopologyStore {
    async fn get_resource(&self, resource_id: &str) -> Result<Option<Resource>> {
        let snapshot = self.inner.read().await.clone();
        Ok(snapshot.by_name.get(resource_id).cloned())
    }

    async fn dependency_edges(&self) -> Result<Vec<DependencyEdge>> {
        let snapshot = self.inner.read().await.clone();
        Ok(snapshot.edges.clone())
    }
}

/// In-memory Topology Store for tests and for composing literal scenario fixtures
pub struct InMemoryTopologyStore {
    by_name: HashMap<String, Resource>,
    edges: Vec<DependencyEdge>,
}

impl InMemoryTopologyStore {
    pub fn new(resources: Vec<Resource>, edges: Vec<DependencyEdge>) -> Self {
        Self {
            by_name: resources.into_iter().map(|r| (r.name.clone(), r)).collect(),
            edges,
        }
    }
}

#[async_trait]
impl TopologyStore for InMemoryTopologyStore {
    async fn get_resource(&self, resource_id: &str) -> Result<Option<Resource>> {
        Ok(self.by_name.get(resource_id).cloned())
    }

    async fn dependency_edges(&self) -> Result<Vec<DependencyEdge>> {
        Ok(self.edges.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(name: &str) -> Resource {
        Resource {
            name: name.to_string(),
            id: None,
            resource_type: "Microsoft.Compute/virtualMachines".to_string(),
            tags: HashMap::new(),
            dependencies: vec![],
            dependents: vec![],
            governs: vec![],
            services_hosted: vec![],
            monthly_cost: None,
        }
    }

    #[tokio::test]
    async fn unknown_resource_is_none() {
        let store = InMemoryTopologyStore::new(vec![resource("vm-a")], vec![]);
        assert!(store.get_resource("vm-missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reload_swaps_snapshot_without_blocking_readers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topology.json");
        std::fs::write(
            &path,
            r#"{"resources":[{"name":"vm-a","type":"vm","tags":{}}],"dependency_edges":[]}"#,
        )
        .unwrap();

        let store = FileTopologyStore::load(&path).await.unwrap();
        assert!(store.get_resource("vm-a").await.unwrap().is_some());
        assert!(store.get_resource("vm-b").await.unwrap().is_none());

        std::fs::write(
            &path,
            r#"{"resources":[{"name":"vm-b","type":"vm","tags":{}}],"dependency_edges":[]}"#,
        )
        .unwrap();
        store.reload().await.unwrap();

        assert!(store.get_resource("vm-a").await.unwrap().is_none());
        assert!(store.get_resource("vm-b").await.unwrap().is_some());
    }
}
