//! CSV import pipeline: parse, stage, decode, persist.

pub mod batch;
pub mod csv_parser;
pub mod decoder;
pub mod orchestrator;
pub mod source;

use crate::db::VehicleRepository;
use decoder::VinDecoder;
use source::ImportSource;

/// Everything a running import needs, cloned into each batch task.
#[derive(Clone, Debug)]
pub struct ImportPipeline {
    pub repository: VehicleRepository,
    pub decoder: VinDecoder,
    pub source: ImportSource,
    pub batch_size: usize,
}
