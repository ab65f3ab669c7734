//! HTTP surface of the service.

pub mod import;
pub mod vins;

use actix_web::web;

/// Registers every API scope. `/api/vins` goes first so the broader `/api`
/// scope does not shadow it.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(vins::configure_routes())
        .service(import::configure_routes());
}
