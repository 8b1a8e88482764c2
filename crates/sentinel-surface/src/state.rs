//! Application state shared across all requests

use std::sync::Arc;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusHandle;
use sentinel_core::{IncidentStore, InMemoryIncidentStore, InMemoryTopologyStore, TopologyStore};
use sentinel_evaluators::{
    BlastRadiusEvaluator, FinancialEvaluator, GovernanceFacade, HistoricalEvaluator, Pipeline,
};
use sentinel_policy::{InMemoryPolicyStore, PolicyEvaluator, PolicyStore};
use sentinel_telemetry::{AgentRegistry, AuditLog};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::config::AppConfig;

/// Application state shared across all requests
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub facade: Arc<GovernanceFacade>,
    pub metrics_handle: PrometheusHandle,

    /// Bounds the number of in-flight evaluations Surface A admits.
    pub admission: Arc<Semaphore>,
}

impl AppState {
    /// Initialize application state: load the topology/policy/incident stores
    /// (file-backed in mock mode, empty in-memory otherwise pending a remote
    /// store back-end) and build the Pipeline.
    pub async fn new(config: AppConfig, metrics_handle: PrometheusHandle) -> anyhow::Result<Self> {
        info!("Initializing application state");

        let topology = Self::load_topology(&config).await?;
        let policies = Self::load_policies(&config).await?;
        let incidents = Self::load_incidents(&config).await?;

        let audit_log = Arc::new(AuditLog::new(&config.audit_dir)?);
        let agent_registry = Arc::new(AgentRegistry::new(&config.agents_dir)?);

        let pipeline = Pipeline::new(
            BlastRadiusEvaluator::new(topology.clone()),
            PolicyEvaluator::new(policies, topology.clone()),
            HistoricalEvaluator::new(incidents),
            FinancialEvaluator::new(topology),
            audit_log,
            agent_registry,
            config.core.weights,
            config.core.thresholds,
            Duration::from_secs(config.core.evaluator_timeout_seconds),
        );

        let admission = Arc::new(Semaphore::new(config.core.max_concurrent_evaluations));

        Ok(Self {
            config: Arc::new(config),
            facade: Arc::new(GovernanceFacade::new(Arc::new(pipeline))),
            metrics_handle,
            admission,
        })
    }

    async fn load_topology(config: &AppConfig) -> anyhow::Result<Arc<dyn TopologyStore>> {
        if config.core.use_local_mocks && config.topology_path.exists() {
            let loaded = sentinel_core::FileTopologyStore::load(&config.topology_path).await?;
            info!(path = %config.topology_path.display(), "loaded topology snapshot");
            return Ok(Arc::new(loaded));
        }
        warn!(path = %config.topology_path.display(), "topology file not found, starting with an empty topology");
        Ok(Arc::new(InMemoryTopologyStore::new(vec![], vec![])))
    }

    async fn load_policies(config: &AppConfig) -> anyhow::Result<Arc<dyn PolicyStore>> {
        if config.core.use_local_mocks && config.policy_path.exists() {
            let loaded = sentinel_policy::FilePolicyStore::load(&config.policy_path).await?;
            info!(path = %config.policy_path.display(), "loaded policy pack");
            return Ok(Arc::new(loaded));
        }
        warn!(path = %config.policy_path.display(), "policy file not found, starting with an empty policy pack");
        Ok(Arc::new(InMemoryPolicyStore::new(vec![])))
    }

    async fn load_incidents(config: &AppConfig) -> anyhow::Result<Arc<dyn IncidentStore>> {
        if config.core.use_local_mocks && config.incidents_path.exists() {
            let loaded = sentinel_core::FileIncidentStore::load(&config.incidents_path).await?;
            info!(path = %config.incidents_path.display(), "loaded incident history");
            return Ok(Arc::new(loaded));
        }
        warn!(path = %config.incidents_path.display(), "incident file not found, starting with no incident history");
        Ok(Arc::new(InMemoryIncidentStore::new(vec![])))
    }
}
