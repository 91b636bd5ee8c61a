//! Append-only record stores for simulation runs and completion history.
//!
//! Both logs are JSONL files under `.plancast/`, one serialized record per
//! line. Writers hold an exclusive advisory lock on a sidecar `.lock` file;
//! readers hold a shared one. Records are never rewritten in place.

use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::lock::LogLock;
use crate::model::{CompletionRecord, SimulationRun};

pub const PLANCAST_DIR: &str = ".plancast";
pub const RUN_LOG_FILE: &str = "runs.jsonl";
pub const HISTORY_LOG_FILE: &str = "history.jsonl";

const LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Destination for finished simulation runs.
///
/// Implementations must treat runs as immutable, uniquely identified records.
pub trait RunStore {
    /// Append one run.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying write fails.
    fn append(&self, run: &SimulationRun) -> Result<()>;

    /// Return up to `limit` runs for `project_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error when stored runs cannot be read back.
    fn recent(&self, project_id: &str, limit: usize) -> Result<Vec<SimulationRun>>;
}

/// In-memory run store for tests and embedding callers.
#[derive(Debug, Default)]
pub struct MemoryRunStore {
    runs: Mutex<Vec<SimulationRun>>,
}

impl MemoryRunStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of runs appended so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.runs.lock().map_or(0, |runs| runs.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RunStore for MemoryRunStore {
    fn append(&self, run: &SimulationRun) -> Result<()> {
        self.runs
            .lock()
            .map_err(|_| anyhow!("run store mutex poisoned"))?
            .push(run.clone());
        Ok(())
    }

    fn recent(&self, project_id: &str, limit: usize) -> Result<Vec<SimulationRun>> {
        let runs = self
            .runs
            .lock()
            .map_err(|_| anyhow!("run store mutex poisoned"))?;
        Ok(newest_first(runs.iter().cloned(), project_id, limit))
    }
}

/// Typed JSONL log with advisory locking.
#[derive(Debug, Clone)]
pub struct JsonlLog<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> JsonlLog<T> {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    /// Path of the JSONL file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("lock")
    }

    /// Append one record as a single line.
    ///
    /// # Errors
    ///
    /// Returns an error when the lock, serialization, or write fails.
    pub fn append(&self, record: &T) -> Result<()> {
        self.ensure_parent()?;
        let _lock = LogLock::exclusive(&self.lock_path(), LOCK_TIMEOUT)
            .with_context(|| format!("failed to lock {}", self.path.display()))?;
        self.write_line(record)
    }

    /// Append `record` unless an existing record satisfies `exists`.
    ///
    /// The check and the write happen under one exclusive lock. Returns
    /// `false` when a matching record was found and nothing was written.
    ///
    /// # Errors
    ///
    /// Returns an error when the lock, read, serialization, or write fails.
    pub fn append_unless(&self, record: &T, exists: impl Fn(&T) -> bool) -> Result<bool> {
        self.ensure_parent()?;
        let _lock = LogLock::exclusive(&self.lock_path(), LOCK_TIMEOUT)
            .with_context(|| format!("failed to lock {}", self.path.display()))?;

        if self.read_records()?.iter().any(exists) {
            debug!(path = %self.path.display(), "matching record present, skipped append");
            return Ok(false);
        }
        self.write_line(record)?;
        Ok(true)
    }

    fn ensure_parent(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        Ok(())
    }

    fn write_line(&self, record: &T) -> Result<()> {
        let mut line = serde_json::to_vec(record)
            .with_context(|| format!("failed to serialize record for {}", self.path.display()))?;
        line.push(b'\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;
        file.write_all(&line)
            .with_context(|| format!("failed to append to {}", self.path.display()))?;
        file.flush()
            .with_context(|| format!("failed to flush {}", self.path.display()))?;

        debug!(path = %self.path.display(), "appended record");
        Ok(())
    }

    /// Load every record in file order. A missing file is an empty log.
    ///
    /// # Errors
    ///
    /// Returns an error naming the line of the first malformed record.
    pub fn load(&self) -> Result<Vec<T>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let _lock = LogLock::shared(&self.lock_path(), LOCK_TIMEOUT)
            .with_context(|| format!("failed to lock {}", self.path.display()))?;
        self.read_records()
    }

    /// Read every record without taking the lock. Callers hold it.
    fn read_records(&self) -> Result<Vec<T>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?;

        let mut records = Vec::new();
        for (line_no, line_result) in BufReader::new(file).lines().enumerate() {
            let line = line_result.with_context(|| {
                format!("failed reading line {} in {}", line_no + 1, self.path.display())
            })?;
            if line.trim().is_empty() {
                continue;
            }

            let record: T = serde_json::from_str(&line).with_context(|| {
                format!("failed parsing record at {}:{}", self.path.display(), line_no + 1)
            })?;
            records.push(record);
        }

        Ok(records)
    }
}

/// File-backed run store at `<root>/.plancast/runs.jsonl`.
pub type JsonlRunStore = JsonlLog<SimulationRun>;

/// File-backed completion history at `<root>/.plancast/history.jsonl`.
pub type HistoryLog = JsonlLog<CompletionRecord>;

/// Open the run log under `project_root`.
#[must_use]
pub fn run_log(project_root: &Path) -> JsonlRunStore {
    JsonlLog::new(project_root.join(PLANCAST_DIR).join(RUN_LOG_FILE))
}

/// Open the completion history log under `project_root`.
#[must_use]
pub fn history_log(project_root: &Path) -> HistoryLog {
    JsonlLog::new(project_root.join(PLANCAST_DIR).join(HISTORY_LOG_FILE))
}

impl RunStore for JsonlRunStore {
    fn append(&self, run: &SimulationRun) -> Result<()> {
        Self::append(self, run)
    }

    fn recent(&self, project_id: &str, limit: usize) -> Result<Vec<SimulationRun>> {
        Ok(newest_first(self.load()?, project_id, limit))
    }
}

fn newest_first(
    runs: impl IntoIterator<Item = SimulationRun>,
    project_id: &str,
    limit: usize,
) -> Vec<SimulationRun> {
    let mut matching: Vec<SimulationRun> = runs
        .into_iter()
        .filter(|run| run.project_id == project_id)
        .collect();
    // Stable sort keeps append order among equal timestamps; reverse makes it newest-first.
    matching.sort_by_key(|run| run.created_at);
    matching.reverse();
    matching.truncate(limit);
    matching
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CompletionDistribution, DurationUnit, SimulationParameters};
    use chrono::{DateTime, TimeDelta, Utc};

    fn run(id: &str, project: &str, minutes: i64) -> SimulationRun {
        let at = DateTime::<Utc>::UNIX_EPOCH + TimeDelta::minutes(minutes);
        SimulationRun {
            id: id.to_string(),
            project_id: project.to_string(),
            iterations: 1,
            created_at: at,
            parameters: SimulationParameters::default(),
            duration_unit: DurationUnit::Days,
            seed: 0,
            plan_hash: "blake3:test".to_string(),
            distribution: CompletionDistribution {
                mean_completion: at,
                std_completion_days: 0.0,
                p50_completion: at,
                p90_completion: at,
                p95_completion: at,
                iterations: 1,
                sample_completion_dates: vec![at],
            },
        }
    }

    #[test]
    fn memory_store_filters_and_orders() {
        let store = MemoryRunStore::new();
        store.append(&run("r1", "p", 1)).unwrap();
        store.append(&run("r2", "q", 2)).unwrap();
        store.append(&run("r3", "p", 3)).unwrap();

        let recent = store.recent("p", 10).unwrap();
        let ids: Vec<&str> = recent.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["r3", "r1"]);
        assert_eq!(store.recent("p", 1).unwrap().len(), 1);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn jsonl_store_round_trips_runs_newest_first() {
        let dir = tempfile::tempdir().unwrap();
        let store = run_log(dir.path());
        assert!(store.recent("p", 10).unwrap().is_empty());

        RunStore::append(&store, &run("r1", "p", 1)).unwrap();
        RunStore::append(&store, &run("r2", "p", 5)).unwrap();

        let recent = store.recent("p", 10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, "r2");
        assert_eq!(recent[1], run("r1", "p", 1));
    }

    #[test]
    fn malformed_line_reports_location() {
        let dir = tempfile::tempdir().unwrap();
        let log = history_log(dir.path());
        fs::create_dir_all(log.path().parent().unwrap()).unwrap();
        fs::write(log.path(), "{not json}\n").unwrap();

        let err = log.load().unwrap_err();
        assert!(format!("{err:#}").contains("history.jsonl:1"));
    }

    #[test]
    fn append_unless_skips_matching_record() {
        let dir = tempfile::tempdir().unwrap();
        let store = run_log(dir.path());

        assert!(store.append_unless(&run("r1", "p", 1), |r| r.id == "r1").unwrap());
        assert!(!store.append_unless(&run("r1", "p", 2), |r| r.id == "r1").unwrap());
        assert!(store.append_unless(&run("r2", "p", 3), |r| r.id == "r2").unwrap());

        let lines = fs::read_to_string(store.path()).unwrap();
        assert_eq!(lines.lines().count(), 2);
    }
}
