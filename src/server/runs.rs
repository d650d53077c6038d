//! Registry of background analysis runs.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use uuid::Uuid;

use crate::pipeline::{ArtifactPaths, RunCounts, RunOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Processing,
    Completed,
    Failed,
}

/// State of one run as reported by `GET /api/runs/{id}`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRecord {
    pub id: Uuid,
    pub board_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,
    pub status: RunStatus,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<ArtifactPaths>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<RunCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Registration order
    #[serde(skip)]
    seq: u64,
}

/// Records kept before the oldest are evicted.
pub const MAX_RUNS: usize = 1000;

/// In-memory run records, keyed by run ID. Lost on restart.
///
/// Holds at most `max_runs` records. Finished runs are evicted oldest first;
/// processing runs go only when nothing has finished.
#[derive(Debug)]
pub struct RunRegistry {
    runs: RwLock<HashMap<Uuid, RunRecord>>,
    next_seq: AtomicU64,
    max_runs: usize,
}

impl Default for RunRegistry {
    fn default() -> Self {
        Self { runs: RwLock::new(HashMap::new()), next_seq: AtomicU64::new(0), max_runs: MAX_RUNS }
    }
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_runs(mut self, max_runs: usize) -> Self {
        self.max_runs = max_runs.max(1);
        self
    }

    pub fn len(&self) -> usize {
        self.runs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.read().is_empty()
    }

    /// Register a new run in the `processing` state.
    pub fn start(&self, board_id: &str, project_id: Option<u64>) -> Uuid {
        let id = Uuid::new_v4();
        let record = RunRecord {
            id,
            board_id: board_id.to_string(),
            project_id,
            status: RunStatus::Processing,
            started_at: Utc::now(),
            finished_at: None,
            artifacts: None,
            counts: None,
            error: None,
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
        };
        let mut runs = self.runs.write();
        while runs.len() >= self.max_runs {
            let Some(oldest) = eviction_candidate(&runs) else { break };
            runs.remove(&oldest);
        }
        runs.insert(id, record);
        id
    }

    /// Mark a run completed.
    pub fn complete(&self, id: Uuid, outcome: &RunOutcome) {
        if let Some(record) = self.runs.write().get_mut(&id) {
            record.status = RunStatus::Completed;
            record.finished_at = Some(Utc::now());
            record.artifacts = Some(outcome.artifacts.clone());
            record.counts = Some(outcome.counts());
        }
    }

    /// Mark a run failed.
    pub fn fail(&self, id: Uuid, error: impl Into<String>) {
        if let Some(record) = self.runs.write().get_mut(&id) {
            record.status = RunStatus::Failed;
            record.finished_at = Some(Utc::now());
            record.error = Some(error.into());
        }
    }

    pub fn get(&self, id: Uuid) -> Option<RunRecord> {
        self.runs.read().get(&id).cloned()
    }
}

fn eviction_candidate(runs: &HashMap<Uuid, RunRecord>) -> Option<Uuid> {
    let oldest = |finished: bool| {
        runs.values()
            .filter(|r| (r.status != RunStatus::Processing) == finished)
            .min_by_key(|r| r.seq)
            .map(|r| r.id)
    };
    oldest(true).or_else(|| oldest(false))
}
