use crate::db::{self, VehicleRepository};
use crate::error::AppError;
use actix_web::{web, HttpResponse, ResponseError};
use log::error;

/// Actix web handler for `GET /api/vins/{vin}`.
///
/// # Arguments
/// * `vin` - The VIN to look up, taken from the URL path.
/// * `repository` - The shared `VehicleRepository`.
///
/// # Returns
/// - `200 OK` with the vehicle and its attributes ordered by variable id.
/// - `400 Bad Request` when the VIN is blank.
/// - `404 Not Found` when no vehicle has this VIN.
/// - `500 Internal Server Error` with a generic message on database failure.
pub(crate) async fn process(vin: web::Path<String>, repository: web::Data<VehicleRepository>) -> HttpResponse {
    let vin = vin.into_inner();
    if vin.trim().is_empty() {
        return AppError::BadRequest("VIN is required.".to_string()).error_response();
    }

    let repository = repository.get_ref().clone();
    let lookup = vin.clone();
    match db::blocking(move || repository.get_vehicle_by_vin(&lookup)).await {
        Ok(Some(vehicle)) => HttpResponse::Ok().json(vehicle),
        Ok(None) => AppError::NotFound(format!("Vehicle with VIN '{}' not found.", vin)).error_response(),
        Err(e) => {
            error!("Error fetching vehicle data for VIN {}: {}", vin, e);
            HttpResponse::InternalServerError().body("An unexpected error occurred while fetching vehicle data.")
        }
    }
}
