//! Project root discovery, plan files, and error classification.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use plancast_core::ErrorCode;
use plancast_core::InvalidInput;
use plancast_core::config::{ProjectConfig, load_project_config};
use plancast_core::lock::LockError;
use plancast_core::model::item::InvalidTransition;
use plancast_core::model::{
    AlreadyRecorded, CompletionRecord, NotCompleted, Project, SimulationParameters, WorkItem,
};
use plancast_core::store::{JsonlRunStore, PLANCAST_DIR, history_log, run_log};
use plancast_sim::{PlanningService, SimulationError};
use serde::{Deserialize, Serialize};

/// A plan file: the project, its work items, and optional sampler parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlanFile {
    pub project: Project,
    pub work_items: Vec<WorkItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<SimulationParameters>,
}

impl PlanFile {
    pub fn item(&self, id: &str) -> Result<&WorkItem, CliFailure> {
        self.work_items
            .iter()
            .find(|item| item.id == id)
            .ok_or_else(|| CliFailure::ItemNotFound(id.to_string()))
    }

    pub fn item_mut(&mut self, id: &str) -> Result<&mut WorkItem, CliFailure> {
        self.work_items
            .iter_mut()
            .find(|item| item.id == id)
            .ok_or_else(|| CliFailure::ItemNotFound(id.to_string()))
    }
}

/// Failures raised by the CLI layer itself.
#[derive(Debug, thiserror::Error)]
pub enum CliFailure {
    #[error(".plancast not found under {}", .0.display())]
    NotInitialized(PathBuf),
    #[error("failed to parse plan file {}: {source}", .path.display())]
    PlanParse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("work item '{0}' not found in plan")]
    ItemNotFound(String),
    #[error("no process template for role '{role_type}' and work unit '{work_unit_type}'")]
    UnknownTemplate {
        role_type: String,
        work_unit_type: String,
    },
}

impl CliFailure {
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized(_) => ErrorCode::NotInitialized,
            Self::PlanParse { .. } => ErrorCode::PlanParseError,
            Self::ItemNotFound(_) | Self::UnknownTemplate { .. } => ErrorCode::ItemNotFound,
        }
    }
}

/// Read and parse a JSON plan file.
pub fn load_plan(path: &Path) -> Result<PlanFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read plan file {}", path.display()))?;
    let plan = serde_json::from_str(&content).map_err(|source| CliFailure::PlanParse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(plan)
}

/// Write a plan file back as pretty-printed JSON.
pub fn save_plan(path: &Path, plan: &PlanFile) -> Result<()> {
    let mut content = serde_json::to_string_pretty(plan).context("Failed to serialize plan")?;
    content.push('\n');
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write plan file {}", path.display()))
}

/// The directory a command runs in, with its config loaded.
pub struct Workspace {
    root: PathBuf,
    config: ProjectConfig,
}

impl Workspace {
    pub fn open(root: &Path) -> Result<Self> {
        let config = load_project_config(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            config,
        })
    }

    pub const fn config(&self) -> &ProjectConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.root.join(PLANCAST_DIR).is_dir()
    }

    /// Fail with a `NotInitialized` error unless `.plancast/` exists.
    pub fn require_initialized(&self) -> Result<(), CliFailure> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(CliFailure::NotInitialized(self.root.clone()))
        }
    }

    /// Completion history, or empty when none has been recorded yet.
    pub fn history(&self) -> Result<Vec<CompletionRecord>> {
        history_log(&self.root).load()
    }

    /// Append a completion record unless the same item is already recorded.
    pub fn record_completion(&self, record: &CompletionRecord) -> Result<()> {
        let appended = history_log(&self.root)
            .append_unless(record, |existing| existing.same_item(record))?;
        if appended {
            Ok(())
        } else {
            Err(record.already_recorded().into())
        }
    }

    /// Fail with [`AlreadyRecorded`] when the history already holds this item.
    pub fn ensure_unrecorded(&self, record: &CompletionRecord) -> Result<()> {
        if self.history()?.iter().any(|existing| existing.same_item(record)) {
            return Err(record.already_recorded().into());
        }
        Ok(())
    }

    pub fn service(&self) -> Result<PlanningService<JsonlRunStore>> {
        Ok(PlanningService::new(
            self.config.clone(),
            self.history()?,
            run_log(&self.root),
        ))
    }
}

/// Map an error chain to its stable error code.
pub fn classify(err: &anyhow::Error) -> ErrorCode {
    for cause in err.chain() {
        if let Some(e) = cause.downcast_ref::<CliFailure>() {
            return e.code();
        }
        if let Some(e) = cause.downcast_ref::<SimulationError>() {
            return e.code();
        }
        if let Some(e) = cause.downcast_ref::<InvalidInput>() {
            return e.code();
        }
        if let Some(e) = cause.downcast_ref::<LockError>() {
            return e.code();
        }
        if cause.downcast_ref::<InvalidTransition>().is_some() {
            return ErrorCode::InvalidStateTransition;
        }
        if cause.downcast_ref::<NotCompleted>().is_some() {
            return ErrorCode::ItemNotCompleted;
        }
        if cause.downcast_ref::<AlreadyRecorded>().is_some() {
            return ErrorCode::AlreadyRecorded;
        }
        if cause.downcast_ref::<toml::de::Error>().is_some() {
            return ErrorCode::ConfigParseError;
        }
    }
    ErrorCode::InternalUnexpected
}

#[cfg(test)]
mod tests {
    use super::*;

    const PLAN: &str = r#"{
        "project": {"id": "p1", "start_date": "2026-01-01T00:00:00Z"},
        "work_items": [
            {"id": "a", "estimated_hours": 8},
            {"id": "b", "estimated_hours": 4, "dependencies": ["a"], "priority": "high"}
        ]
    }"#;

    #[test]
    fn plan_file_parses_with_defaults() {
        let plan: PlanFile = serde_json::from_str(PLAN).unwrap();
        assert_eq!(plan.work_items.len(), 2);
        assert!(plan.params.is_none());
        assert_eq!(plan.item("b").unwrap().dependency_count(), 1);
        assert!(matches!(plan.item("zzz"), Err(CliFailure::ItemNotFound(_))));
    }

    #[test]
    fn saved_plan_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        let mut plan: PlanFile = serde_json::from_str(PLAN).unwrap();
        plan.item_mut("a").unwrap().name = "Spec".to_string();
        save_plan(&path, &plan).unwrap();

        let loaded = load_plan(&path).unwrap();
        assert_eq!(loaded.item("a").unwrap().name, "Spec");
        assert_eq!(loaded.work_items, plan.work_items);
    }

    #[test]
    fn unknown_plan_field_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plan.json");
        std::fs::write(&path, PLAN.replace("\"work_items\"", "\"extra\": 1, \"work_items\"")).unwrap();
        let err = load_plan(&path).unwrap_err();
        assert_eq!(classify(&err), ErrorCode::PlanParseError);
    }

    #[test]
    fn classify_walks_context_chain() {
        let err = anyhow::Error::new(InvalidInput::ZeroIterations).context("while simulating");
        assert_eq!(classify(&err), ErrorCode::InvalidIterations);

        let err = anyhow::anyhow!("boom");
        assert_eq!(classify(&err), ErrorCode::InternalUnexpected);
    }

    #[test]
    fn uninitialized_root_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::open(dir.path()).unwrap();
        assert!(!ws.is_initialized());
        assert!(matches!(ws.require_initialized(), Err(CliFailure::NotInitialized(_))));
        assert!(ws.history().unwrap().is_empty());
    }

    #[test]
    fn completion_is_recorded_once_per_item() {
        let dir = tempfile::tempdir().unwrap();
        let ws = Workspace::open(dir.path()).unwrap();
        let mut item = WorkItem::new("weld", 10.0);
        item.status = plancast_core::model::WorkStatus::Completed;
        item.actual_hours = Some(20.0);
        let record = CompletionRecord::from_completed("p1", &item, chrono::Utc::now()).unwrap();

        ws.ensure_unrecorded(&record).unwrap();
        ws.record_completion(&record).unwrap();

        let err = ws.record_completion(&record).unwrap_err();
        assert_eq!(classify(&err), ErrorCode::AlreadyRecorded);
        let err = ws.ensure_unrecorded(&record).unwrap_err();
        assert_eq!(classify(&err), ErrorCode::AlreadyRecorded);
        assert_eq!(ws.history().unwrap().len(), 1);
    }
}
