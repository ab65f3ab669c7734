use serde::{Deserialize, Serialize};

/// A decodable property known to the service (e.g. `26` = "Make").
///
/// The set of variables doubles as the allow-list applied to decoder output:
/// only attributes whose variable id appears here are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct VehicleVariable {
    pub id: i32,
    pub name: String,
}
