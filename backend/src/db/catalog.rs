//! The variable allow-list, shipped as a versioned JSON table and applied at startup.

use crate::error::Result;
use common::model::VehicleVariable;
use log::info;
use rusqlite::{params, Connection, OptionalExtension};
use serde::Deserialize;
use std::path::Path;

const CATALOG_NAME: &str = "VehicleVariable";

static BUILTIN_CATALOG: &str = include_str!("../../config/variables.json");

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VariableCatalog {
    pub version: u32,
    pub variables: Vec<VehicleVariable>,
}

impl VariableCatalog {
    /// The catalog compiled into the binary.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Upserts the catalog into `VehicleVariable` unless the stored version is
/// already at or beyond it.
///
/// Variables missing from a newer catalog are kept, since stored attributes
/// may still reference them. Returns whether the catalog was applied.
pub fn apply_catalog(conn: &mut Connection, catalog: &VariableCatalog) -> Result<bool> {
    let tx = conn.transaction()?;

    let current: Option<u32> = tx
        .query_row(
            "SELECT Version FROM CatalogVersion WHERE Name = ?1",
            params![CATALOG_NAME],
            |row| row.get(0),
        )
        .optional()?;

    if let Some(current) = current {
        if current >= catalog.version {
            info!(
                "Variable catalog v{} already applied (requested v{}), skipping",
                current, catalog.version
            );
            return Ok(false);
        }
    }

    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO VehicleVariable (Id, Name) VALUES (?1, ?2)
             ON CONFLICT(Id) DO UPDATE SET Name = excluded.Name",
        )?;
        for variable in &catalog.variables {
            stmt.execute(params![variable.id, &variable.name])?;
        }
    }

    tx.execute(
        "INSERT INTO CatalogVersion (Name, Version) VALUES (?1, ?2)
         ON CONFLICT(Name) DO UPDATE SET Version = excluded.Version",
        params![CATALOG_NAME, catalog.version],
    )?;
    tx.commit()?;

    info!(
        "Applied variable catalog v{} ({} variables)",
        catalog.version,
        catalog.variables.len()
    );
    Ok(true)
}
