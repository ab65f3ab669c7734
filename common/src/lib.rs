//! Types shared between the VIN service and its clients.
//!
//! Everything in here is plain serde data: the persisted vehicle model, the
//! orchestration status documents reported while an import runs, and the
//! request payloads accepted by the HTTP surface.

pub mod jobs;
pub mod model;
pub mod requests;
