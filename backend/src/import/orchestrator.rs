//! Drives one CSV import from payload to persisted vehicles.
//!
//! The payload is parsed once, archived, split into batches of
//! `ImportPipeline::batch_size` and every batch runs as its own task. Progress
//! is published through the job controller after each batch finishes, in
//! whatever order they finish.

use crate::error::{AppError, Result};
use crate::import::batch::{process_batch, BatchOutcome};
use crate::import::csv_parser::{decode_payload, parse_vehicle_csv};
use crate::import::ImportPipeline;
use crate::job_controller::state::JobUpdate;
use common::jobs::{ImportProgress, JobStatus};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

pub const ORCHESTRATION_NAME: &str = "VinProcessingOrchestration";

/// Input handed to an import run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrchestratorInput {
    pub base64_csv_content: String,
    pub original_file_name: Option<String>,
}

/// Whole-number percentage of completed batches, halves rounded to even.
pub fn progress_percent(completed: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (completed as f64 / total as f64 * 100.0).round_ties_even() as u32
}

async fn publish(tx: &mpsc::Sender<JobUpdate>, instance_id: &str, progress: ImportProgress) {
    let update = JobUpdate {
        job_id: instance_id.to_string(),
        status: JobStatus::InProgress(progress),
    };
    if tx.send(update).await.is_err() {
        warn!("Job updater is gone; progress for {} not recorded", instance_id);
    }
}

/// Runs an import to completion and returns its output message.
///
/// Only a missing or undecodable payload fails the run. Batch failures are
/// counted and mentioned in the output.
pub async fn run_import(
    pipeline: ImportPipeline,
    instance_id: String,
    input: OrchestratorInput,
    tx: mpsc::Sender<JobUpdate>,
) -> Result<String> {
    info!("Orchestration {} started", instance_id);

    let file_name = match input.original_file_name.as_deref() {
        Some(name) if !name.is_empty() && !input.base64_csv_content.is_empty() => name,
        _ => {
            error!("Orchestration {} received an empty CSV payload or file name", instance_id);
            publish(
                &tx,
                &instance_id,
                ImportProgress {
                    progress: 0,
                    message: "Orchestration failed: Empty Base64 CSV.".to_string(),
                    completed_count: 0,
                    total_count: 0,
                },
            )
            .await;
            return Err(AppError::MissingPayload);
        }
    };

    let bytes = decode_payload(&input.base64_csv_content)?;
    let records = parse_vehicle_csv(&bytes);
    if records.is_empty() {
        let output = "No records processed.".to_string();
        publish(
            &tx,
            &instance_id,
            ImportProgress {
                progress: 0,
                message: output.clone(),
                completed_count: 0,
                total_count: 0,
            },
        )
        .await;
        info!("Orchestration {}: {}", instance_id, output);
        return Ok(output);
    }

    if let Err(e) = pipeline.source.archive(file_name, &instance_id, &bytes).await {
        error!("Failed to archive {} for {}: {}", file_name, instance_id, e);
    }

    let record_count = records.len();
    let batch_size = pipeline.batch_size.max(1);
    let mut batches = JoinSet::new();
    for chunk in records.chunks(batch_size) {
        let pipeline = pipeline.clone();
        let chunk = chunk.to_vec();
        batches.spawn(async move { process_batch(&pipeline, chunk).await });
    }
    let total = batches.len();
    info!(
        "Orchestration {}: {} records split into {} batches",
        instance_id, record_count, total
    );

    publish(
        &tx,
        &instance_id,
        ImportProgress {
            progress: 0,
            message: format!("Processing batches: 0 of {} completed.", total),
            completed_count: 0,
            total_count: total,
        },
    )
    .await;

    let mut completed = 0;
    let mut failed = 0;
    while let Some(joined) = batches.join_next().await {
        let outcome = joined.unwrap_or_else(|e| BatchOutcome::Failed(format!("Batch task aborted: {}", e)));
        if outcome.is_failed() {
            failed += 1;
        }
        completed += 1;

        let message = format!("Processing batches: {} of {} completed.", completed, total);
        info!("Orchestration {}: {}", instance_id, message);
        publish(
            &tx,
            &instance_id,
            ImportProgress {
                progress: progress_percent(completed, total),
                message,
                completed_count: completed,
                total_count: total,
            },
        )
        .await;
    }

    publish(
        &tx,
        &instance_id,
        ImportProgress {
            progress: 100,
            message: "CSV processing completed successfully!".to_string(),
            completed_count: completed,
            total_count: total,
        },
    )
    .await;

    let mut output = format!(
        "CSV processing completed for {} records in {} batches.",
        record_count, total
    );
    if failed > 0 {
        output.push_str(&format!(" {} batch(es) failed.", failed));
    }
    info!("Orchestration {} finished: {}", instance_id, output);
    Ok(output)
}
