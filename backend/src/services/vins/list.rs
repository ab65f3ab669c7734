use crate::db::{self, VehicleRepository};
use actix_web::{web, HttpResponse, Responder};
use common::requests::GetVinsQuery;
use log::error;
use serde::Deserialize;

/// Raw query string parameters. Page values stay strings so a non-integer
/// degrades to "no pagination" instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VinsQueryParams {
    page_number: Option<String>,
    page_size: Option<String>,
    sort: Option<String>,
    direction: Option<String>,
    dealer_id: Option<String>,
    modified_date: Option<String>,
}

fn parse_page_value(value: Option<String>) -> Option<i64> {
    value.and_then(|v| v.trim().parse().ok())
}

impl From<VinsQueryParams> for GetVinsQuery {
    fn from(params: VinsQueryParams) -> Self {
        GetVinsQuery {
            page_number: parse_page_value(params.page_number),
            page_size: parse_page_value(params.page_size),
            sort_by: params.sort,
            sort_direction: params.direction,
            dealer_id: params.dealer_id,
            modified_date: params.modified_date,
        }
    }
}

/// Actix web handler for `GET /api/vins`.
///
/// # Arguments
/// * `repository` - The shared `VehicleRepository`.
/// * `params` - `pageNumber`, `pageSize`, `sort`, `direction`, `dealerId` and
///   `modifiedDate`, all optional. Invalid values degrade instead of failing.
///
/// # Returns
/// - `200 OK` with `{TotalCount, Items}`.
/// - `500 Internal Server Error` with a generic message on database failure.
pub(crate) async fn process(
    repository: web::Data<VehicleRepository>,
    params: web::Query<VinsQueryParams>,
) -> impl Responder {
    let query = GetVinsQuery::from(params.into_inner());
    let repository = repository.get_ref().clone();

    match db::blocking(move || repository.get_vehicles(&query)).await {
        Ok(page) => HttpResponse::Ok().json(page),
        Err(e) => {
            error!("Error fetching VINs: {}", e);
            HttpResponse::InternalServerError()
                .body("An unexpected error occurred while fetching VINs. Please try again later.")
        }
    }
}
