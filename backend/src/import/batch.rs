//! One import batch: stage against stored vehicles, decode, persist.

use crate::db;
use crate::error::Result;
use crate::import::ImportPipeline;
use common::model::Vehicle;
use log::{error, info};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Records from one batch that need to be written.
#[derive(Debug, Default, PartialEq)]
pub struct StagedBatch {
    pub inserts: Vec<Vehicle>,
    pub updates: Vec<Vehicle>,
    pub skipped: usize,
}

impl StagedBatch {
    pub fn len(&self) -> usize {
        self.inserts.len() + self.updates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_records(self) -> Vec<Vehicle> {
        let mut records = self.inserts;
        records.extend(self.updates);
        records
    }
}

/// Unknown VINs become inserts, VINs with a newer modified date become
/// updates, everything else is skipped.
pub fn stage_vehicles(records: Vec<Vehicle>, existing: &HashMap<String, Vehicle>) -> StagedBatch {
    let mut staged = StagedBatch::default();
    for record in records {
        match existing.get(&record.vin) {
            None => staged.inserts.push(record),
            Some(stored) if record.modified_date > stored.modified_date => staged.updates.push(record),
            Some(_) => staged.skipped += 1,
        }
    }
    staged
}

/// Result of one batch as reported to the orchestrator.
#[derive(Clone, Debug, PartialEq)]
pub enum BatchOutcome {
    Saved(usize),
    Failed(String),
}

impl BatchOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, BatchOutcome::Failed(_))
    }
}

impl fmt::Display for BatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchOutcome::Saved(count) => write!(f, "Batch processed ({} records) - Success", count),
            BatchOutcome::Failed(reason) => {
                write!(f, "Batch processing failed during DB save - {}", reason)
            }
        }
    }
}

/// Processes one batch. Errors never escape; they come back as
/// [`BatchOutcome::Failed`].
pub async fn process_batch(pipeline: &ImportPipeline, records: Vec<Vehicle>) -> BatchOutcome {
    let outcome = match save_batch(pipeline, records).await {
        Ok(count) => BatchOutcome::Saved(count),
        Err(e) => BatchOutcome::Failed(e.to_string()),
    };
    if outcome.is_failed() {
        error!("{}", outcome);
    } else {
        info!("{}", outcome);
    }
    outcome
}

async fn save_batch(pipeline: &ImportPipeline, records: Vec<Vehicle>) -> Result<usize> {
    let repository = pipeline.repository.clone();
    let vins: Vec<String> = records.iter().map(|record| record.vin.clone()).collect();
    let (variables, existing) = db::blocking(move || {
        Ok((
            repository.get_variable_filter()?,
            repository.get_vehicles_by_vin(&vins)?,
        ))
    })
    .await?;

    let allowed: HashSet<i32> = variables.iter().map(|variable| variable.id).collect();
    let staged = stage_vehicles(records, &existing);
    info!(
        "Staged {} inserts and {} updates, skipped {} unchanged records",
        staged.inserts.len(),
        staged.updates.len(),
        staged.skipped
    );
    if staged.is_empty() {
        return Ok(0);
    }

    let mut vehicles = staged.into_records();
    for vehicle in vehicles.iter_mut() {
        vehicle.additional_vehicle_info = pipeline.decoder.decode(&vehicle.vin, Some(&allowed)).await;
    }

    let repository = pipeline.repository.clone();
    db::blocking(move || repository.save_vehicles_batch(&vehicles)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn vehicle(vin: &str, date: &str) -> Vehicle {
        let modified =
            NaiveDateTime::parse_from_str(&format!("{date} 00:00:00"), "%Y-%m-%d %H:%M:%S").unwrap();
        Vehicle::new(vin, "D1", modified)
    }

    #[test]
    fn stages_inserts_updates_and_skips() {
        let existing: HashMap<String, Vehicle> = [
            vehicle("OLDER", "2023-01-01"),
            vehicle("SAME", "2023-01-01"),
            vehicle("NEWER", "2023-06-01"),
        ]
        .into_iter()
        .map(|v| (v.vin.clone(), v))
        .collect();

        let staged = stage_vehicles(
            vec![
                vehicle("FRESH", "2023-03-01"),
                vehicle("OLDER", "2023-03-01"),
                vehicle("SAME", "2023-01-01"),
                vehicle("NEWER", "2023-03-01"),
            ],
            &existing,
        );

        assert_eq!(staged.inserts, vec![vehicle("FRESH", "2023-03-01")]);
        assert_eq!(staged.updates, vec![vehicle("OLDER", "2023-03-01")]);
        assert_eq!(staged.skipped, 2);
        assert_eq!(staged.len(), 2);
    }

    #[test]
    fn empty_store_stages_everything_as_insert() {
        let staged = stage_vehicles(vec![vehicle("A", "2023-01-01"), vehicle("B", "2023-01-02")], &HashMap::new());
        assert_eq!(staged.inserts.len(), 2);
        assert!(staged.updates.is_empty());
        assert_eq!(staged.into_records().len(), 2);
    }

    #[test]
    fn outcome_messages() {
        assert_eq!(BatchOutcome::Saved(3).to_string(), "Batch processed (3 records) - Success");
        assert_eq!(
            BatchOutcome::Failed("Database error: locked".into()).to_string(),
            "Batch processing failed during DB save - Database error: locked"
        );
    }
}
