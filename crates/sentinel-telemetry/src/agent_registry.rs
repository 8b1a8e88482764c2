//! Agent Registry: per-agent decision counters, one JSON file per agent name
//!
//! Same background-writer shape as the Audit Log: updates enqueue onto a
//! dedicated thread so a burst of verdicts for the same agent never race
//! each other's read-modify-write of that agent's file.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, warn};

use sentinel_core::{AgentRecord, Decision, Error, Result};

use crate::persistence::{list_json_files, read_json, write_json_atomic};

enum Command {
    RecordDecision {
        name: String,
        card_url: Option<String>,
        decision: Decision,
        at: DateTime<Utc>,
    },
    Flush(oneshot::Sender<()>),
    Shutdown,
}

pub struct AgentRegistry {
    sender: mpsc::UnboundedSender<Command>,
    dir: PathBuf,
}

impl AgentRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|err| Error::persistence_failure(err.to_string()))?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let writer_dir = dir.clone();
        std::thread::spawn(move || run_writer(writer_dir, receiver));

        Ok(Self { sender, dir })
    }

    /// Record one more verdict against `name`, creating the agent's record on
    /// first contact. Never blocks.
    pub fn record_decision(&self, name: &str, card_url: Option<String>, decision: Decision, at: DateTime<Utc>) {
        let cmd = Command::RecordDecision { name: name.to_string(), card_url, decision, at };
        if self.sender.send(cmd).is_err() {
            warn!(agent = %name, "agent registry writer is gone, decision was not recorded");
        }
    }

    pub async fn flush(&self) {
        let (tx, rx) = oneshot::channel();
        if self.sender.send(Command::Flush(tx)).is_ok() {
            let _ = rx.await;
        }
    }

    pub fn get(&self, name: &str) -> Option<AgentRecord> {
        read_json(&self.dir.join(format!("{name}.json"))).ok()
    }

    /// All registered agents, newest `last_seen` first.
    pub fn list(&self) -> Vec<AgentRecord> {
        let mut records: Vec<AgentRecord> = list_json_files(&self.dir)
            .into_iter()
            .filter_map(|path| read_json(&path).ok())
            .collect();
        records.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        records
    }
}

impl Drop for AgentRegistry {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
    }
}

fn run_writer(dir: PathBuf, mut receiver: mpsc::UnboundedReceiver<Command>) {
    let rt = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(err) => {
            error!(%err, "agent registry writer failed to start its runtime");
            return;
        }
    };

    rt.block_on(async move {
        while let Some(cmd) = receiver.recv().await {
            match cmd {
                Command::RecordDecision { name, card_url, decision, at } => {
                    let path = dir.join(format!("{name}.json"));
                    let mut record: AgentRecord = read_json(&path).unwrap_or_else(|_| AgentRecord::new(name.clone(), card_url.clone()));
                    if record.card_url.is_none() {
                        record.card_url = card_url;
                    }
                    record.record_decision(decision, at);
                    if let Err(err) = write_json_atomic(&path, &record) {
                        error!(agent = %name, %err, "failed to persist agent record");
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

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn first_decision_creates_the_record() {
        let dir = TempDir::new().unwrap();
        let registry = AgentRegistry::new(dir.path()).unwrap();

        registry.record_decision("cost-optimization-agent", Some("https://agents.example/cost.json".to_string()), Decision::Approved, Utc::now());
        registry.flush().await;

        let record = registry.get("cost-optimization-agent").expect("record created");
        assert_eq!(record.total_proposed, 1);
        assert_eq!(record.approved, 1);
    }

    #[tokio::test]
    async fn counters_accumulate_across_calls() {
        let dir = TempDir::new().unwrap();
        let registry = AgentRegistry::new(dir.path()).unwrap();

        registry.record_decision("net-sec-agent", None, Decision::Denied, Utc::now());
        registry.record_decision("net-sec-agent", None, Decision::Escalated, Utc::now());
        registry.flush().await;

        let record = registry.get("net-sec-agent").unwrap();
        assert_eq!(record.total_proposed, 2);
        assert_eq!(record.denied, 1);
        assert_eq!(record.escalated, 1);
        assert_eq!(registry.list().len(), 1);
    }

    #[tokio::test]
    async fn list_orders_newest_last_seen_first() {
        let dir = TempDir::new().unwrap();
        let registry = AgentRegistry::new(dir.path()).unwrap();

        let earlier = Utc::now() - chrono::Duration::minutes(10);
        let later = Utc::now();
        registry.record_decision("aardvark-agent", None, Decision::Approved, earlier);
        registry.record_decision("zebra-agent", None, Decision::Approved, later);
        registry.flush().await;

        let names: Vec<String> = registry.list().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["zebra-agent".to_string(), "aardvark-agent".to_string()]);
    }
}
