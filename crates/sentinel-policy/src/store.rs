//! Policy Store: serves governance policies to the Policy Evaluator

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use sentinel_core::{Error, Result};

use crate::policy::Policy;

/// Read-only view over the configured governance policies
#[async_trait]
pub trait PolicyStore: Send + Sync {
    async fn list(&self) -> Result<Vec<Policy>>;
}

/// File-backed Policy Store for mock mode. The on-disk format is a single
/// JSON array: `[{policy_id, severity, description, predicate:{kind, …}}, …]`.
///
/// Parsing happens once at construction (and again on `reload`); a file that
/// fails to parse is a startup `ConfigError`, not a runtime surprise — per the
/// "policies that cannot be parsed at startup raise ConfigError" design note.
pub struct FilePolicyStore {
    path: PathBuf,
    policies: RwLock<Arc<Vec<Policy>>>,
}

impl FilePolicyStore {
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let policies = Self::parse(&path)?;
        Ok(Self {
            path,
            policies: RwLock::new(Arc::new(policies)),
        })
    }

    pub async fn reload(&self) -> Result<()> {
        let policies = Self::parse(&self.path)?;
        *self.policies.write().await = Arc::new(policies);
        Ok(())
    }

    fn parse(path: &std::path::Path) -> Result<Vec<Policy>> {
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::config(format!("failed to parse policy file {}: {e}", path.display())))
    }
}

#[async_trait]
impl PolicyStore for FilePolicyStore {
    async fn list(&self) -> Result<Vec<Policy>> {
        Ok((**self.policies.read().await).clone())
    }
}

/// In-memory Policy Store for tests and literal scenario fixtures
pub struct InMemoryPolicyStore {
    policies: Vec<Policy>,
}

impl InMemoryPolicyStore {
    pub fn new(policies: Vec<Policy>) -> Self {
        Self { policies }
    }
}

#[async_trait]
impl PolicyStore for InMemoryPolicyStore {
    async fn list(&self) -> Result<Vec<Policy>> {
        Ok(self.policies.clone())
    }
}
