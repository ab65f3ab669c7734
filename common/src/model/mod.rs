pub mod pagination;
pub mod variable;
pub mod vehicle;

pub use pagination::PaginationResponse;
pub use variable::VehicleVariable;
pub use vehicle::{AdditionalVehicleInfo, Vehicle, VehicleSummary};
