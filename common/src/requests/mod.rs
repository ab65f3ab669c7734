use serde::{Deserialize, Serialize};

/// Filter, sort and page parameters for the vehicle list query.
///
/// Every field is optional; the repository decides how absent or invalid
/// values degrade (see `VehicleRepository::get_vehicles`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetVinsQuery {
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
    pub dealer_id: Option<String>,
    /// Only vehicles modified after this calendar date (`MM/dd/yyyy`).
    pub modified_date: Option<String>,
}

/// Request payload for starting a CSV import.
///
/// Both fields fall back to the preset import location when missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ImportInput {
    pub container_name: Option<String>,
    pub filename: Option<String>,
}

/// Returned with `202 Accepted` once an import orchestration is scheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrchestrationStatusResponse {
    pub id: String,
    pub status_query_get_uri: String,
    pub send_event_post_uri: Option<String>,
    pub terminate_post_uri: Option<String>,
    pub rewind_post_uri: Option<String>,
    pub restart_post_uri: Option<String>,
}
