use crate::model::variable::VehicleVariable;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A vehicle keyed by its VIN, together with the attributes decoded for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Vehicle {
    pub vin: String,
    pub dealer_id: String,
    pub modified_date: NaiveDateTime,
    #[serde(default)]
    pub additional_vehicle_info: Vec<AdditionalVehicleInfo>,
}

impl Vehicle {
    /// Builds a vehicle without any decoded attributes, as read from a CSV row.
    pub fn new(vin: impl Into<String>, dealer_id: impl Into<String>, modified_date: NaiveDateTime) -> Self {
        Self {
            vin: vin.into(),
            dealer_id: dealer_id.into(),
            modified_date,
            additional_vehicle_info: Vec::new(),
        }
    }
}

/// The list view of a vehicle returned by the paginated query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VehicleSummary {
    pub vin: String,
    pub dealer_id: String,
    pub modified_date: NaiveDateTime,
}

impl From<Vehicle> for VehicleSummary {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            vin: vehicle.vin,
            dealer_id: vehicle.dealer_id,
            modified_date: vehicle.modified_date,
        }
    }
}

/// One decoded property of a vehicle.
///
/// Identity is the triple (`vehicle_id`, `variable_id`, `value`); the decoder
/// may return the same variable id more than once with different values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AdditionalVehicleInfo {
    pub value: String,
    pub variable_id: i32,
    pub vehicle_id: String,
    /// Populated only when the attribute is read back with its catalog entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variable: Option<VehicleVariable>,
}
