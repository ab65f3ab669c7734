//! CSV import endpoints.
//!
//! - `POST /api/StartVinCsvProcessing`: reads a CSV from the import source and
//!   schedules an import orchestration. Answers `202 Accepted` with the
//!   status polling URI.
//! - `GET /api/orchestrations/{instance_id}`: current status document of an
//!   orchestration.

use actix_web::web::{get, post, scope};
use actix_web::Scope;

mod get_status;
mod start;

const API_PATH: &str = "/api";

/// Configures and returns the Actix `Scope` for the import routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("/StartVinCsvProcessing", post().to(start::process))
        .route("/orchestrations/{instance_id}", get().to(get_status::process))
}
