use crate::error::AppError;
use crate::job_controller::state::JobsState;
use actix_web::{web, HttpResponse};

/// Actix web handler for `GET /api/orchestrations/{instance_id}`.
///
/// # Arguments
/// * `instance_id` - Orchestration instance id returned by `StartVinCsvProcessing`.
/// * `state` - The shared `JobsState` holding every instance of this process.
///
/// # Returns
/// - `200 OK` with the `OrchestrationStatus` document.
/// - `404 Not Found` when the id is unknown.
pub(crate) async fn process(
    instance_id: web::Path<String>,
    state: web::Data<JobsState>,
) -> Result<HttpResponse, AppError> {
    let instance_id = instance_id.into_inner();
    match state.get(&instance_id).await {
        Some(status) => Ok(HttpResponse::Ok().json(status)),
        None => Err(AppError::NotFound(format!(
            "Orchestration '{}' not found.",
            instance_id
        ))),
    }
}
