//! Vehicle persistence and the paginated vehicle query.
//!
//! All SQL uses bound parameters. The only dynamic SQL text is the ORDER BY
//! column, which comes from the closed [`SortKey`] enum.

use crate::db::Database;
use crate::error::Result;
use chrono::NaiveDate;
use common::model::{
    AdditionalVehicleInfo, PaginationResponse, Vehicle, VehicleSummary, VehicleVariable,
};
use common::requests::GetVinsQuery;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row, TransactionBehavior};
use std::collections::HashMap;

/// `MM/dd/yyyy`, two-digit month and day.
static FILTER_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}/\d{2}/\d{4}$").expect("filter date pattern"));

/// Keeps `IN (...)` lists well below SQLite's bound-parameter limit.
const LOOKUP_CHUNK: usize = 500;

/// Columns the vehicle list can be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    DealerId,
    Vin,
    ModifiedDate,
}

impl SortKey {
    /// Case-insensitive match against the public column names.
    pub fn parse(name: &str) -> Option<Self> {
        [SortKey::DealerId, SortKey::Vin, SortKey::ModifiedDate]
            .into_iter()
            .find(|key| key.column().eq_ignore_ascii_case(name.trim()))
    }

    fn column(self) -> &'static str {
        match self {
            SortKey::DealerId => "DealerId",
            SortKey::Vin => "Vin",
            SortKey::ModifiedDate => "ModifiedDate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    /// `descending` or `desc` in any case selects descending; everything else ascends.
    pub fn parse(direction: Option<&str>) -> Self {
        match direction.map(|d| d.trim().to_ascii_lowercase()) {
            Some(d) if d == "descending" || d == "desc" => SortDirection::Descending,
            _ => SortDirection::Ascending,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

/// The SQL pieces derived from a [`GetVinsQuery`], plus the warnings raised
/// while degrading invalid parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleQueryPlan {
    pub filter_sql: String,
    pub filter_params: Vec<Value>,
    pub sort_key: SortKey,
    pub direction: SortDirection,
    /// `(limit, offset)`; `None` returns every matching row.
    pub page: Option<(i64, i64)>,
    pub warnings: Vec<String>,
}

impl VehicleQueryPlan {
    pub fn from_query(query: &GetVinsQuery) -> Self {
        let mut clauses = Vec::new();
        let mut filter_params = Vec::new();
        let mut warnings = Vec::new();

        if let Some(dealer_id) = query.dealer_id.as_deref().filter(|d| !d.is_empty()) {
            clauses.push("instr(DealerId, ?) > 0");
            filter_params.push(Value::Text(dealer_id.to_string()));
        }

        if let Some(modified) = query.modified_date.as_deref().filter(|d| !d.is_empty()) {
            match parse_filter_date(modified) {
                Some(date) => {
                    clauses.push("date(ModifiedDate) > ?");
                    filter_params.push(Value::Text(date.format("%Y-%m-%d").to_string()));
                }
                None => warnings.push(format!(
                    "Invalid 'modifiedDate' format received: '{}'. Skipping date filter.",
                    modified
                )),
            }
        }

        let requested = query.sort_by.as_deref().unwrap_or_default();
        let sort_key = SortKey::parse(requested).unwrap_or_else(|| {
            warnings.push(format!(
                "Invalid sort column '{}' provided. Defaulting to 'DealerId'.",
                requested
            ));
            SortKey::DealerId
        });
        let direction = SortDirection::parse(query.sort_direction.as_deref());

        let page = match (query.page_number, query.page_size) {
            (Some(number), Some(size)) if number > 0 && size > 0 => {
                Some((size, (number - 1).saturating_mul(size)))
            }
            (number, size) => {
                warnings.push(format!(
                    "Invalid pagination parameters: PageNumber={:?}, PageSize={:?}. Skipping pagination.",
                    number, size
                ));
                None
            }
        };

        let filter_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };

        Self {
            filter_sql,
            filter_params,
            sort_key,
            direction,
            page,
            warnings,
        }
    }

    fn order_sql(&self) -> String {
        // VIN breaks ties so pages stay stable across requests.
        if self.sort_key == SortKey::Vin {
            format!(" ORDER BY Vin {}", self.direction.keyword())
        } else {
            format!(
                " ORDER BY {} {}, Vin ASC",
                self.sort_key.column(),
                self.direction.keyword()
            )
        }
    }
}

/// Parses an exact `MM/dd/yyyy` date.
fn parse_filter_date(value: &str) -> Option<NaiveDate> {
    if !FILTER_DATE.is_match(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%m/%d/%Y").ok()
}

fn vehicle_from_row(row: &Row<'_>) -> rusqlite::Result<Vehicle> {
    Ok(Vehicle::new(
        row.get::<_, String>(0)?,
        row.get::<_, String>(1)?,
        row.get(2)?,
    ))
}

#[derive(Clone, Debug)]
pub struct VehicleRepository {
    db: Database,
}

impl VehicleRepository {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Filtered, sorted and optionally paginated vehicle list.
    ///
    /// Invalid parameters never fail the request: a bad date drops the date
    /// filter, an unknown sort column falls back to `DealerId`, and bad page
    /// values disable pagination. Each fallback is logged as a warning.
    pub fn get_vehicles(&self, query: &GetVinsQuery) -> Result<PaginationResponse> {
        let plan = VehicleQueryPlan::from_query(query);
        for warning in &plan.warnings {
            warn!("{}", warning);
        }

        let conn = self.db.open()?;

        let total_count: i64 = conn.query_row(
            &format!("SELECT COUNT(*) FROM Vehicle{}", plan.filter_sql),
            params_from_iter(plan.filter_params.iter()),
            |row| row.get(0),
        )?;

        let mut sql = format!(
            "SELECT Vin, DealerId, ModifiedDate FROM Vehicle{}{}",
            plan.filter_sql,
            plan.order_sql()
        );
        let mut bound = plan.filter_params.clone();
        if let Some((limit, offset)) = plan.page {
            sql.push_str(" LIMIT ? OFFSET ?");
            bound.push(Value::Integer(limit));
            bound.push(Value::Integer(offset));
        }

        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(params_from_iter(bound.iter()), vehicle_from_row)?
            .map(|vehicle| vehicle.map(VehicleSummary::from))
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(PaginationResponse { total_count, items })
    }

    /// One vehicle with its attributes ordered by variable id.
    ///
    /// Blank input is logged and treated as not found.
    pub fn get_vehicle_by_vin(&self, vin: &str) -> Result<Option<Vehicle>> {
        if vin.trim().is_empty() {
            warn!("Attempted to get vehicle data with empty or null VIN.");
            return Ok(None);
        }

        let conn = self.db.open()?;
        let vehicle = conn
            .query_row(
                "SELECT Vin, DealerId, ModifiedDate FROM Vehicle WHERE Vin = ?1",
                params![vin],
                vehicle_from_row,
            )
            .optional()?;

        let Some(mut vehicle) = vehicle else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT a.Value, a.VariableId, a.VehicleId, v.Name
             FROM AdditionalCarInfo a
             JOIN VehicleVariable v ON v.Id = a.VariableId
             WHERE a.VehicleId = ?1
             ORDER BY a.VariableId ASC, a.Value ASC",
        )?;
        vehicle.additional_vehicle_info = stmt
            .query_map(params![vin], |row| {
                let variable_id: i32 = row.get(1)?;
                Ok(AdditionalVehicleInfo {
                    value: row.get(0)?,
                    variable_id,
                    vehicle_id: row.get(2)?,
                    variable: Some(VehicleVariable {
                        id: variable_id,
                        name: row.get(3)?,
                    }),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Some(vehicle))
    }

    /// Every catalog variable; the ids form the decoder allow-list.
    pub fn get_variable_filter(&self) -> Result<Vec<VehicleVariable>> {
        let conn = self.db.open()?;
        let mut stmt = conn.prepare("SELECT Id, Name FROM VehicleVariable ORDER BY Id")?;
        let variables = stmt
            .query_map([], |row| {
                Ok(VehicleVariable {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(variables)
    }

    /// Stored vehicles (without attributes) for the given VINs, keyed by VIN.
    pub fn get_vehicles_by_vin(&self, vins: &[String]) -> Result<HashMap<String, Vehicle>> {
        let mut found = HashMap::new();
        if vins.is_empty() {
            return Ok(found);
        }

        let conn = self.db.open()?;
        for chunk in vins.chunks(LOOKUP_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let mut stmt = conn.prepare(&format!(
                "SELECT Vin, DealerId, ModifiedDate FROM Vehicle WHERE Vin IN ({})",
                placeholders
            ))?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), vehicle_from_row)?;
            for vehicle in rows {
                let vehicle = vehicle?;
                found.insert(vehicle.vin.clone(), vehicle);
            }
        }
        Ok(found)
    }

    /// Inserts or updates vehicles and their attributes in one transaction.
    ///
    /// A vehicle carrying attributes replaces its stored attribute set; one
    /// with none (its decode failed) keeps what is already stored. Returns the
    /// number of vehicles submitted.
    pub fn save_vehicles_batch(&self, vehicles: &[Vehicle]) -> Result<usize> {
        if vehicles.is_empty() {
            return Ok(0);
        }

        let mut conn = self.db.open()?;
        // Take the write lock up front so concurrent batches queue on the busy timeout.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        {
            let mut upsert_vehicle = tx.prepare_cached(
                "INSERT INTO Vehicle (Vin, DealerId, ModifiedDate) VALUES (?1, ?2, ?3)
                 ON CONFLICT(Vin) DO UPDATE SET
                     DealerId = excluded.DealerId,
                     ModifiedDate = excluded.ModifiedDate",
            )?;
            let mut clear_attributes =
                tx.prepare_cached("DELETE FROM AdditionalCarInfo WHERE VehicleId = ?1")?;
            let mut insert_attribute = tx.prepare_cached(
                "INSERT OR IGNORE INTO AdditionalCarInfo (VariableId, VehicleId, Value)
                 VALUES (?1, ?2, ?3)",
            )?;

            for vehicle in vehicles {
                upsert_vehicle.execute(params![
                    &vehicle.vin,
                    &vehicle.dealer_id,
                    vehicle.modified_date
                ])?;

                if vehicle.additional_vehicle_info.is_empty() {
                    continue;
                }
                clear_attributes.execute(params![&vehicle.vin])?;
                for info in &vehicle.additional_vehicle_info {
                    insert_attribute.execute(params![info.variable_id, &vehicle.vin, &info.value])?;
                }
            }
        }
        tx.commit()?;

        info!("Upserted {} vehicles into database", vehicles.len());
        Ok(vehicles.len())
    }
}
