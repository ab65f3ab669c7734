//! Read-only vehicle queries.
//!
//! - `GET /api/vins`: filtered, sorted, paginated vehicle list
//!   (`{TotalCount, Items}`).
//! - `GET /api/vins/{vin}`: one vehicle with its decoded attributes.

use actix_web::web::{get, scope};
use actix_web::Scope;

mod get;
mod list;

const API_PATH: &str = "/api/vins";

/// Configures and returns the Actix `Scope` for the vehicle query routes.
pub fn configure_routes() -> Scope {
    scope(API_PATH)
        .route("", get().to(list::process))
        .route("/{vin}", get().to(get::process))
}
