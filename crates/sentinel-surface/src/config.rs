//! Surface configuration: environment-driven core settings plus the
//! process-level concerns (listen address, mock-mode store paths) the core
//! crate has no opinion on.

use std::path::PathBuf;

use sentinel_core::Config as CoreConfig;

/// Full process configuration: the engine's [`CoreConfig`] plus the bits
/// that only matter to the surfaces that host it.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub core: CoreConfig,

    pub listen_host: String,
    pub listen_port: u16,

    /// Mock-mode persisted store paths, read when `core.use_local_mocks` is set.
    pub topology_path: PathBuf,
    pub policy_path: PathBuf,
    pub incidents_path: PathBuf,

    pub audit_dir: PathBuf,
    pub agents_dir: PathBuf,
}

impl AppConfig {
    /// Assemble configuration from the environment, then apply CLI overrides.
    pub fn load(cli: &crate::Cli) -> anyhow::Result<Self> {
        let core = CoreConfig::from_env()?;

        let mut config = Self {
            core,
            listen_host: "0.0.0.0".to_string(),
            listen_port: 8080,
            topology_path: PathBuf::from("./data/topology.json"),
            policy_path: PathBuf::from("./data/policies.json"),
            incidents_path: PathBuf::from("./data/incidents.json"),
            audit_dir: PathBuf::from("./data/audit"),
            agents_dir: PathBuf::from("./data/agents"),
        };

        if let Some(listen) = &cli.listen {
            config.listen_host = listen.clone();
        }
        if let Some(port) = cli.port {
            config.listen_port = port;
        }
        if let Some(topology) = &cli.topology {
            config.topology_path = PathBuf::from(topology);
        }
        if let Some(policy) = &cli.policy {
            config.policy_path = PathBuf::from(policy);
        }
        if let Some(incidents) = &cli.incidents {
            config.incidents_path = PathBuf::from(incidents);
        }

        Ok(config)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            core: CoreConfig::default(),
            listen_host: "0.0.0.0".to_string(),
            listen_port: 8080,
            topology_path: PathBuf::from("./data/topology.json"),
            policy_path: PathBuf::from("./data/policies.json"),
            incidents_path: PathBuf::from("./data/incidents.json"),
            audit_dir: PathBuf::from("./data/audit"),
            agents_dir: PathBuf::from("./data/agents"),
        }
    }
}
