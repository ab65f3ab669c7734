//! `POST /api/StartVinCsvProcessing`.
//!
//! Reads the requested CSV from the import source, registers a new
//! orchestration instance as `Pending` and spawns `run_import` for it. The
//! response carries the instance id and the URI to poll; the import itself
//! reports through the job controller.

use crate::error::AppError;
use crate::import::orchestrator::{run_import, OrchestratorInput, ORCHESTRATION_NAME};
use crate::import::source::{DEFAULT_CONTAINER, DEFAULT_FILE};
use crate::import::ImportPipeline;
use crate::job_controller::state::{JobUpdate, JobsState};
use actix_web::http::header::LOCATION;
use actix_web::{web, HttpRequest, HttpResponse, ResponseError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use common::jobs::JobStatus;
use common::requests::{ImportInput, OrchestrationStatusResponse};
use log::{error, info};
use uuid::Uuid;

/// Reads `ContainerName` / `Filename` with case-insensitive keys. A body that
/// is missing, not a JSON object, or carries non-string names yields the
/// defaults.
fn parse_import_input(body: &[u8]) -> ImportInput {
    if body.iter().all(u8::is_ascii_whitespace) {
        return ImportInput::default();
    }

    let value: serde_json::Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => {
            error!("Failed to deserialize request body so using default: {}", e);
            return ImportInput::default();
        }
    };
    let Some(object) = value.as_object() else {
        return ImportInput::default();
    };

    // Rename keys to the wire casing so serde does the typed read.
    let normalized: serde_json::Map<String, serde_json::Value> = object
        .iter()
        .filter_map(|(key, value)| {
            let key = match key.to_ascii_lowercase().as_str() {
                "containername" => "ContainerName",
                "filename" => "Filename",
                _ => return None,
            };
            Some((key.to_string(), value.clone()))
        })
        .collect();

    serde_json::from_value(serde_json::Value::Object(normalized)).unwrap_or_else(|e| {
        error!("Failed to deserialize request body so using default: {}", e);
        ImportInput::default()
    })
}

fn or_default(value: Option<String>, default: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Actix web handler for `POST /api/StartVinCsvProcessing`.
///
/// # Arguments
/// * `req` - Used to build the absolute status URI.
/// * `body` - Optional JSON `{ContainerName, Filename}`; keys are matched case-insensitively.
/// * `pipeline` - The shared `ImportPipeline`.
/// * `state` - The shared `JobsState` the new instance is registered in.
///
/// # Returns
/// - `202 Accepted` with an `OrchestrationStatusResponse` and a `Location` header.
/// - `400 Bad Request` for container or file names that leave the import root.
/// - `404 Not Found` when the file does not exist.
/// - `500 Internal Server Error` when the file cannot be read.
pub(crate) async fn process(
    req: HttpRequest,
    body: web::Bytes,
    pipeline: web::Data<ImportPipeline>,
    state: web::Data<JobsState>,
) -> HttpResponse {
    info!("HTTP trigger received VIN CSV processing request.");
    let input = parse_import_input(&body);
    let container = or_default(input.container_name, DEFAULT_CONTAINER);
    let file_name = or_default(input.filename, DEFAULT_FILE);
    info!("Reading import file: Container='{}', File='{}'", container, file_name);

    let source = &pipeline.source;
    match source.exists(&container, &file_name).await {
        Ok(true) => {}
        Ok(false) => {
            error!("File '{}' not found in container '{}'.", file_name, container);
            return AppError::NotFound(format!("File '{}' not found.", file_name)).error_response();
        }
        Err(e @ AppError::BadRequest(_)) => return e.error_response(),
        Err(e) => {
            error!("Error checking import file '{}': {}", file_name, e);
            return HttpResponse::InternalServerError().body(format!("Failed to read file '{}'.", file_name));
        }
    }

    let bytes = match source.read(&container, &file_name).await {
        Ok(bytes) => bytes,
        Err(e) => {
            error!("Error reading import file '{}': {}", file_name, e);
            return HttpResponse::InternalServerError().body(format!("Failed to read file '{}'.", file_name));
        }
    };
    let size = bytes.len();

    let input = OrchestratorInput {
        base64_csv_content: STANDARD.encode(&bytes),
        original_file_name: Some(file_name),
    };
    let instance_id = schedule_import(pipeline.get_ref().clone(), state.get_ref().clone(), input).await;
    info!(
        "Started VIN processing orchestration with ID = '{}', passing {} bytes.",
        instance_id, size
    );

    let connection = req.connection_info();
    let status_uri = format!(
        "{}://{}/api/orchestrations/{}",
        connection.scheme(),
        connection.host(),
        instance_id
    );
    HttpResponse::Accepted()
        .insert_header((LOCATION, status_uri.clone()))
        .json(OrchestrationStatusResponse {
            id: instance_id,
            status_query_get_uri: status_uri,
            send_event_post_uri: None,
            terminate_post_uri: None,
            rewind_post_uri: None,
            restart_post_uri: None,
        })
}

/// Registers a new instance and runs the import on a spawned task.
///
/// Returns the instance id immediately; the task reports `Completed` or
/// `Failed` through the job controller when it ends.
pub(crate) async fn schedule_import(pipeline: ImportPipeline, state: JobsState, input: OrchestratorInput) -> String {
    let instance_id = Uuid::new_v4().to_string();
    state.register(ORCHESTRATION_NAME, &instance_id).await;

    let tx = state.tx.clone();
    let job_id = instance_id.clone();
    tokio::spawn(async move {
        let run = tokio::spawn(run_import(pipeline, job_id.clone(), input, tx.clone()));
        let status = match run.await {
            Ok(Ok(output)) => JobStatus::Completed(output),
            Ok(Err(e)) => {
                error!("Orchestration {} failed: {}", job_id, e);
                JobStatus::Failed(e.to_string())
            }
            Err(e) => {
                error!("Orchestration {} aborted: {}", job_id, e);
                JobStatus::Failed(format!("Task join error: {}", e))
            }
        };
        let _ = tx.send(JobUpdate { job_id, status }).await;
    });

    instance_id
}
