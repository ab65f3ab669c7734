use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle of an import orchestration as reported to pollers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuntimeStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

/// Batch progress of a running import, published after every finished batch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImportProgress {
    /// Whole-number percentage of batches completed.
    pub progress: u32,
    pub message: String,
    pub completed_count: usize,
    pub total_count: usize,
}

/// A status change emitted by a running orchestration.
#[derive(Clone, Debug, PartialEq)]
pub enum JobStatus {
    InProgress(ImportProgress),
    Completed(String),
    Failed(String),
}

/// The document returned when polling an orchestration instance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestrationStatus {
    pub name: String,
    pub instance_id: String,
    pub runtime_status: RuntimeStatus,
    pub custom_status: Option<ImportProgress>,
    pub output: Option<String>,
    pub created_time: DateTime<Utc>,
    pub last_updated_time: DateTime<Utc>,
}

impl OrchestrationStatus {
    pub fn new(name: impl Into<String>, instance_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            instance_id: instance_id.into(),
            runtime_status: RuntimeStatus::Pending,
            custom_status: None,
            output: None,
            created_time: now,
            last_updated_time: now,
        }
    }

    /// Folds a status change into the document.
    ///
    /// Progress updates keep the instance `Running`; terminal updates record the
    /// output but leave the last published progress in place.
    pub fn apply(&mut self, status: JobStatus) {
        match status {
            JobStatus::InProgress(progress) => {
                self.runtime_status = RuntimeStatus::Running;
                self.custom_status = Some(progress);
            }
            JobStatus::Completed(output) => {
                self.runtime_status = RuntimeStatus::Completed;
                self.output = Some(output);
            }
            JobStatus::Failed(reason) => {
                self.runtime_status = RuntimeStatus::Failed;
                self.output = Some(reason);
            }
        }
        self.last_updated_time = Utc::now();
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.runtime_status,
            RuntimeStatus::Completed | RuntimeStatus::Failed
        )
    }
}
