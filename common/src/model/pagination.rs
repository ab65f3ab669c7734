use crate::model::vehicle::VehicleSummary;
use serde::{Deserialize, Serialize};

/// A page of vehicles plus the number of rows matching the filters.
///
/// `total_count` ignores the page window so clients can size their pager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaginationResponse {
    pub total_count: i64,
    pub items: Vec<VehicleSummary>,
}
