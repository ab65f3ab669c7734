//! VIN import service: CSV ingestion, VIN decoding and vehicle queries over SQLite.

pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod job_controller;
pub mod services;

use crate::config::Config;
use crate::db::catalog::{apply_catalog, VariableCatalog};
use crate::db::schema::init_schema;
use crate::db::{Database, VehicleRepository};
use crate::error::Result;
use crate::import::decoder::VinDecoder;
use crate::import::source::ImportSource;
use crate::import::ImportPipeline;
use log::info;

/// Prepares the database (schema and variable catalog) and assembles the
/// import pipeline from configuration.
pub async fn initialize(config: &Config) -> Result<ImportPipeline> {
    config.validate()?;

    let catalog = match &config.variables {
        Some(path) => VariableCatalog::from_path(path)?,
        None => VariableCatalog::builtin()?,
    };

    let database = Database::new(&config.database);
    let target = database.clone();
    let applied = db::blocking(move || {
        let mut conn = target.open()?;
        init_schema(&conn)?;
        apply_catalog(&mut conn, &catalog)
    })
    .await?;
    if applied {
        info!("Variable catalog applied to {}", database.path().display());
    }

    Ok(ImportPipeline {
        repository: VehicleRepository::new(database),
        decoder: VinDecoder::new(&config.api_base_url, config.request_timeout())?,
        source: ImportSource::new(&config.import_root),
        batch_size: config.batch_size,
    })
}
