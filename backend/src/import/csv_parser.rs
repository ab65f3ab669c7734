//! Parses VIN CSV exports into vehicle records.
//!
//! Expected header (matched case-insensitively): `Vin,DealerId,ModifiedDate`.
//! Invalid rows are logged and dropped; the rest of the file still imports.

use crate::error::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use common::model::Vehicle;
use csv::{Reader, ReaderBuilder, StringRecord, Trim};
use log::{error, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use thiserror::Error;

/// 17 characters, no I, O or Q.
static POST_1981_VIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-HJ-NPR-Z0-9]{17}$").expect("post-1981 VIN pattern"));
/// Older VINs: 11 to 17 letters or digits.
static PRE_1981_VIN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]{11,17}$").expect("pre-1981 VIN pattern"));
static NUMERIC_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+$").expect("numeric pattern"));

const DATE_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %H:%M",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Why a single CSV row was rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowError {
    #[error("VIN cannot be empty or whitespace.")]
    EmptyVin,
    #[error("Invalid VIN format: '{0}'. Must be 17 alphanumeric (no I, O, Q) or 11-17 alphanumeric.")]
    InvalidVin(String),
    #[error("DealerId cannot be empty or whitespace.")]
    EmptyDealerId,
    #[error("DealerId must contain only numeric characters. Found: '{0}'.")]
    NonNumericDealerId(String),
    #[error("ModifiedDate cannot be empty.")]
    EmptyModifiedDate,
    #[error("Invalid ModifiedDate: '{0}'.")]
    InvalidModifiedDate(String),
}

pub fn validate_vin(vin: &str) -> std::result::Result<(), RowError> {
    if vin.trim().is_empty() {
        return Err(RowError::EmptyVin);
    }
    if POST_1981_VIN.is_match(vin) || PRE_1981_VIN.is_match(vin) {
        Ok(())
    } else {
        Err(RowError::InvalidVin(vin.to_string()))
    }
}

pub fn validate_dealer_id(dealer_id: &str) -> std::result::Result<(), RowError> {
    if dealer_id.trim().is_empty() {
        return Err(RowError::EmptyDealerId);
    }
    if NUMERIC_ONLY.is_match(dealer_id) {
        Ok(())
    } else {
        Err(RowError::NonNumericDealerId(dealer_id.to_string()))
    }
}

/// Accepts RFC 3339, ISO and US-style dates with or without a time of day.
pub fn parse_modified_date(value: &str) -> std::result::Result<NaiveDateTime, RowError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(RowError::EmptyModifiedDate);
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.naive_utc());
    }
    for format in DATE_TIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed);
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                return Ok(midnight);
            }
        }
    }
    Err(RowError::InvalidModifiedDate(value.to_string()))
}

/// Decodes the base64 CSV payload carried by an orchestration input.
pub fn decode_payload(base64_csv: &str) -> Result<Vec<u8>> {
    let bytes = STANDARD.decode(base64_csv.trim())?;
    info!("Decoded import payload to {} bytes", bytes.len());
    Ok(bytes)
}

/// Column positions of the required fields.
struct Columns {
    vin: usize,
    dealer_id: usize,
    modified_date: usize,
}

impl Columns {
    fn locate(headers: &StringRecord) -> Option<Self> {
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        Some(Self {
            vin: find("vin")?,
            dealer_id: find("dealerid")?,
            modified_date: find("modifieddate")?,
        })
    }

    fn read(&self, record: &StringRecord) -> std::result::Result<Vehicle, RowError> {
        let vin = record.get(self.vin).unwrap_or_default();
        let dealer_id = record.get(self.dealer_id).unwrap_or_default();
        let modified = record.get(self.modified_date).unwrap_or_default();

        validate_vin(vin)?;
        validate_dealer_id(dealer_id)?;
        let modified_date = parse_modified_date(modified)?;
        Ok(Vehicle::new(vin, dealer_id, modified_date))
    }
}

fn csv_reader(text: &str) -> Reader<&[u8]> {
    ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b',')
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes())
}

/// Line on which a record starts (the header is line 1). Quoted fields may
/// span lines, so this is not the record index.
fn row_number(record: &StringRecord) -> u64 {
    record.position().map_or(0, |p| p.line())
}

/// Parses CSV bytes into vehicles, one per VIN.
///
/// Returns an empty list when the input is not UTF-8 or lacks a required
/// column. When a VIN repeats, the row with the latest modified date wins.
pub fn parse_vehicle_csv(bytes: &[u8]) -> Vec<Vehicle> {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text.trim_start_matches('\u{feff}'),
        Err(e) => {
            error!("Error reading CSV file: input is not valid UTF-8 ({})", e);
            return Vec::new();
        }
    };

    let mut reader = csv_reader(text);

    let columns = match reader.headers() {
        Ok(headers) => match Columns::locate(headers) {
            Some(columns) => columns,
            None => {
                error!(
                    "Error reading CSV file: header must contain Vin, DealerId and ModifiedDate (found: {:?})",
                    headers.iter().collect::<Vec<_>>()
                );
                return Vec::new();
            }
        },
        Err(e) => {
            error!("Error reading CSV file: {}", e);
            return Vec::new();
        }
    };

    let mut records = Vec::new();
    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map_or(0, |p| p.line());
                error!("CSV Reader Error in row {}: {}", line, e);
                continue;
            }
        };
        if record.iter().all(str::is_empty) {
            continue;
        }
        match columns.read(&record) {
            Ok(vehicle) => records.push(vehicle),
            Err(e) => warn!("CSV Field Validation Error in row {}: {}", row_number(&record), e),
        }
    }

    let parsed = records.len();
    let unique = dedupe_latest(records);
    info!(
        "Parsed {} valid rows into {} unique VIN records",
        parsed,
        unique.len()
    );
    unique
}

/// Keeps one record per VIN, the one with the greatest modified date, in
/// first-seen order.
pub fn dedupe_latest(records: Vec<Vehicle>) -> Vec<Vehicle> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<Vehicle> = Vec::with_capacity(records.len());

    for record in records {
        match positions.get(&record.vin) {
            Some(&pos) => {
                if record.modified_date > unique[pos].modified_date {
                    unique[pos] = record;
                }
            }
            None => {
                positions.insert(record.vin.clone(), unique.len());
                unique.push(record);
            }
        }
    }
    unique
}
