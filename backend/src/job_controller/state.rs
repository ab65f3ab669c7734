//! In-memory registry of import orchestrations.
//!
//! Running imports never write the shared map themselves. They push
//! `JobUpdate` messages through `JobsState::tx`, and `start_job_updater`
//! (spawned once in `main.rs`) folds them into the matching
//! `OrchestrationStatus`. HTTP handlers only read.

use common::jobs::{JobStatus, OrchestrationStatus};
use log::warn;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::{mpsc, RwLock};

/// Shared handle to every orchestration this process has started.
///
/// Cloned into the actix application as `web::Data`.
#[derive(Clone)]
pub struct JobsState {
    /// Instance id to its latest status document.
    pub jobs: Arc<RwLock<HashMap<String, OrchestrationStatus>>>,

    /// Producer side of the update channel; each import holds a clone.
    pub tx: mpsc::Sender<JobUpdate>,
}

/// A status change for one orchestration instance.
#[derive(Debug)]
pub struct JobUpdate {
    pub job_id: String,
    pub status: JobStatus,
}

impl JobsState {
    /// Creates an empty registry and the receiver `start_job_updater` drains.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<JobUpdate>) {
        let (tx, rx) = mpsc::channel(capacity);
        let state = Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            tx,
        };
        (state, rx)
    }

    /// Registers a new instance as `Pending`.
    pub async fn register(&self, name: &str, instance_id: &str) {
        self.jobs
            .write()
            .await
            .insert(instance_id.to_string(), OrchestrationStatus::new(name, instance_id));
    }

    pub async fn get(&self, instance_id: &str) -> Option<OrchestrationStatus> {
        self.jobs.read().await.get(instance_id).cloned()
    }
}

/// Applies updates to the registry until every sender is dropped.
pub async fn start_job_updater(state: JobsState, mut rx: mpsc::Receiver<JobUpdate>) {
    while let Some(update) = rx.recv().await {
        let mut jobs = state.jobs.write().await;
        match jobs.get_mut(&update.job_id) {
            Some(job) => job.apply(update.status),
            None => warn!("Dropping status update for unknown orchestration {}", update.job_id),
        }
    }
}
