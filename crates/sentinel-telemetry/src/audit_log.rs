//! Audit Log: a tamper-evident, hash-chained record of every governance verdict
//!
//! Writes happen on a dedicated background thread with its own
//! single-threaded Tokio runtime, so `record` never blocks the Pipeline on
//! disk I/O. The writer thread is the only writer, so it alone owns the
//! running hash-chain state.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{error, warn};
use uuid::Uuid;

use sentinel_core::{Decision, Error, GovernanceVerdict, ProposedAction, Result};

use crate::audit::AuditEntry;
use crate::persistence::{list_json_files, read_json, write_json_atomic};

enum Command {
    Record(Box<ProposedAction>, Box<GovernanceVerdict>),
    Flush(oneshot::Sender<()>),
    Shutdown,
}

pub struct AuditLog {
    sender: mpsc::UnboundedSender<Command>,
    dir: PathBuf,
}

impl AuditLog {
    /// Create an Audit Log backed by one JSON file per `action_id` under `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|err| Error::persistence_failure(err.to_string()))?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let writer_dir = dir.clone();
        std::thread::spawn(move || run_writer(writer_dir, receiver));

        Ok(Self { sender, dir })
    }

    /// Enqueue a verdict for persistence. Never blocks; failures to persist
    /// are logged by the writer thread, not surfaced here.
    pub fn record(&self, action: &ProposedAction, verdict: &GovernanceVerdict) {
        let cmd = Command::Record(Box::new(action.clone()), Box::new(verdict.clone()));
        if self.sender.send(cmd).is_err() {
            warn!(action_id = %verdict.action_id, "audit log writer is gone, verdict was not persisted");
        }
    }

    /// Wait until every previously enqueued record has been written to disk.
    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.sender.send(Command::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    pub fn get(&self, action_id: &Uuid) -> Option<AuditEntry> {
        read_json(&self.dir.join(format!("{action_id}.json"))).ok()
    }

    /// The full verdict as originally produced, byte-equivalent to what
    /// `Pipeline::evaluate` returned for this `action_id`.
    pub fn get_by_id(&self, action_id: &Uuid) -> Option<GovernanceVerdict> {
        self.get(action_id).map(|entry| entry.verdict)
    }

    fn all_sorted(&self) -> Vec<AuditEntry> {
        let mut entries: Vec<AuditEntry> = list_json_files(&self.dir)
            .into_iter()
            .filter_map(|path| read_json(&path).ok())
            .collect();
        entries.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at).then_with(|| a.action_id.cmp(&b.action_id)));
        entries
    }

    /// Most recent entries first, capped at `limit`.
    pub fn recent(&self, limit: usize) -> Vec<AuditEntry> {
        let mut entries = self.all_sorted();
        entries.truncate(limit);
        entries
    }

    /// Most recent entries touching `resource_id`, capped at `limit`.
    pub fn by_resource(&self, resource_id: &str, limit: usize) -> Vec<AuditEntry> {
        self.all_sorted()
            .into_iter()
            .filter(|e| e.resource_id == resource_id)
            .take(limit)
            .collect()
    }

    /// Most recent entries submitted by `agent_id`, capped at `limit`.
    pub fn by_agent(&self, agent_id: &str, limit: usize) -> Vec<AuditEntry> {
        self.all_sorted()
            .into_iter()
            .filter(|e| e.agent_id.as_deref() == Some(agent_id))
            .take(limit)
            .collect()
    }

    /// Decision counts, composite min/avg/max, per-dimension averages, the
    /// most frequently violated policies, and the most-evaluated resources,
    /// across every entry ever recorded.
    pub fn aggregate(&self) -> AuditAggregate {
        let entries = self.all_sorted();
        if entries.is_empty() {
            return AuditAggregate::default();
        }

        let mut approved = 0u64;
        let mut escalated = 0u64;
        let mut denied = 0u64;
        let mut composite_sum = 0.0;
        let mut composite_min = f64::INFINITY;
        let mut composite_max = f64::NEG_INFINITY;
        let mut infra_sum = 0.0;
        let mut policy_sum = 0.0;
        let mut historical_sum = 0.0;
        let mut cost_sum = 0.0;
        let mut violation_counts: HashMap<String, u64> = HashMap::new();
        let mut resource_counts: HashMap<String, u64> = HashMap::new();

        for entry in &entries {
            match entry.decision {
                Decision::Approved => approved += 1,
                Decision::Escalated => escalated += 1,
                Decision::Denied => denied += 1,
            }
            composite_sum += entry.sri.composite;
            composite_min = composite_min.min(entry.sri.composite);
            composite_max = composite_max.max(entry.sri.composite);
            infra_sum += entry.sri.infrastructure;
            policy_sum += entry.sri.policy;
            historical_sum += entry.sri.historical;
            cost_sum += entry.sri.cost;
            for policy_id in &entry.verdict.violations {
                *violation_counts.entry(policy_id.clone()).or_insert(0) += 1;
            }
            *resource_counts.entry(entry.resource_id.clone()).or_insert(0) += 1;
        }

        let total = entries.len() as f64;
        let mut top_violations: Vec<ViolationCount> = violation_counts
            .into_iter()
            .map(|(policy_id, count)| ViolationCount { policy_id, count })
            .collect();
        top_violations.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.policy_id.cmp(&b.policy_id)));
        top_violations.truncate(10);

        let mut most_evaluated_resources: Vec<ResourceCount> = resource_counts
            .into_iter()
            .map(|(resource_id, count)| ResourceCount { resource_id, count })
            .collect();
        most_evaluated_resources.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.resource_id.cmp(&b.resource_id)));
        most_evaluated_resources.truncate(10);

        AuditAggregate {
            total: entries.len(),
            approved,
            escalated,
            denied,
            composite_min,
            composite_avg: composite_sum / total,
            composite_max,
            dimension_averages: DimensionAverages {
                infrastructure: infra_sum / total,
                policy: policy_sum / total,
                historical: historical_sum / total,
                cost: cost_sum / total,
            },
            top_violations,
            most_evaluated_resources,
        }
    }
}

/// Result of [`AuditLog::aggregate`].
#[derive(Debug, Clone, Serialize)]
pub struct AuditAggregate {
    pub total: usize,
    pub approved: u64,
    pub escalated: u64,
    pub denied: u64,
    pub composite_min: f64,
    pub composite_avg: f64,
    pub composite_max: f64,
    pub dimension_averages: DimensionAverages,
    pub top_violations: Vec<ViolationCount>,
    pub most_evaluated_resources: Vec<ResourceCount>,
}

impl Default for AuditAggregate {
    fn default() -> Self {
        Self {
            total: 0,
            approved: 0,
            escalated: 0,
            denied: 0,
            composite_min: 0.0,
            composite_avg: 0.0,
            composite_max: 0.0,
            dimension_averages: DimensionAverages { infrastructure: 0.0, policy: 0.0, historical: 0.0, cost: 0.0 },
            top_violations: vec![],
            most_evaluated_resources: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DimensionAverages {
    pub infrastructure: f64,
    pub policy: f64,
    pub historical: f64,
    pub cost: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViolationCount {
    pub policy_id: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceCount {
    pub resource_id: String,
    pub count: u64,
}

impl Drop for AuditLog {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
    }
}

fn run_writer(dir: PathBuf, mut receiver: mpsc::UnboundedReceiver<Command>) {
    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(err) => {
            error!(%err, "audit log writer failed to start its runtime");
            return;
        }
    };

    rt.block_on(async move {
        let mut last_hash = latest_hash(&dir);
        while let Some(cmd) = receiver.recv().await {
            match cmd {
                Command::Record(action, verdict) => {
                    let entry = AuditEntry::from_verdict(&action, &verdict, last_hash.clone());
                    let path = dir.join(format!("{}.json", entry.action_id));
                    match write_json_atomic(&path, &entry) {
                        Ok(()) => last_hash = Some(entry.hash),
                        Err(err) => error!(action_id = %entry.action_id, %err, "failed to persist audit entry"),
                    }
                }
                Command::Flush(ack) => {
                    let _ = ack.send(());
                }
                Command::Shutdown => break,
            }
        }
    });
}

fn latest_hash(dir: &std::path::Path) -> Option<String> {
    let mut entries: Vec<AuditEntry> = list_json_files(dir)
        .into_iter()
        .filter_map(|path| read_json(&path).ok())
        .collect();
    entries.sort_by(|a, b| a.recorded_at.cmp(&b.recorded_at));
    entries.last().map(|entry| entry.hash.clone())
}
