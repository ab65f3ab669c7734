use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use common::jobs::{ImportProgress, JobStatus};
use common::requests::GetVinsQuery;
use std::time::Duration;
use tempfile::TempDir;
use tokio::sync::mpsc;
use vin_backend::db::catalog::{apply_catalog, VariableCatalog};
use vin_backend::db::schema::init_schema;
use vin_backend::db::{Database, VehicleRepository};
use vin_backend::error::AppError;
use vin_backend::import::decoder::VinDecoder;
use vin_backend::import::orchestrator::{run_import, OrchestratorInput};
use vin_backend::import::source::{ImportSource, ARCHIVE_CONTAINER};
use vin_backend::import::ImportPipeline;
use vin_backend::job_controller::state::JobUpdate;
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn decode_body() -> serde_json::Value {
    serde_json::json!({
        "Count": 2,
        "Message": "Results returned successfully",
        "SearchCriteria": "VIN",
        "Results": [
            { "Value": "HONDA", "Variable": "Make", "VariableId": 26 },
            { "Value": "0", "Variable": "Error Code", "VariableId": 143 }
        ]
    })
}

async fn decode_api(expected_calls: Option<u64>) -> MockServer {
    let server = MockServer::start().await;
    let mock = Mock::given(method("GET"))
        .and(path_regex(r"^/vehicles/decodevin/[A-Z0-9]+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(decode_body()));
    match expected_calls {
        Some(calls) => mock.expect(calls).mount(&server).await,
        None => mock.mount(&server).await,
    }
    server
}

fn seeded_database(dir: &TempDir) -> Database {
    let database = Database::new(dir.path().join("vins.sqlite"));
    let mut conn = database.open().unwrap();
    init_schema(&conn).unwrap();
    apply_catalog(&mut conn, &VariableCatalog::builtin().unwrap()).unwrap();
    database
}

fn pipeline(dir: &TempDir, database: Database, server: &MockServer, batch_size: usize) -> ImportPipeline {
    ImportPipeline {
        repository: VehicleRepository::new(database),
        decoder: VinDecoder::new(&server.uri(), Duration::from_secs(5)).unwrap(),
        source: ImportSource::new(dir.path().join("blobs")),
        batch_size,
    }
}

fn vin(i: usize) -> String {
    format!("1HGCM82633A{:06}", i)
}

fn csv_payload(rows: &[(String, &str)]) -> String {
    let mut csv = String::from("Vin,DealerId,ModifiedDate\n");
    for (vin, date) in rows {
        csv.push_str(&format!("{},{},{}\n", vin, 100, date));
    }
    STANDARD.encode(csv)
}

fn input(base64_csv_content: String) -> OrchestratorInput {
    OrchestratorInput {
        base64_csv_content,
        original_file_name: Some("cars.csv".into()),
    }
}

/// Runs an import and returns its output with every progress update it published.
async fn import(pipeline: &ImportPipeline, payload: String) -> (String, Vec<ImportProgress>) {
    let (tx, mut rx) = mpsc::channel::<JobUpdate>(256);
    let output = run_import(pipeline.clone(), "instance-1".into(), input(payload), tx)
        .await
        .unwrap();

    let mut progress = Vec::new();
    while let Some(update) = rx.recv().await {
        assert_eq!(update.job_id, "instance-1");
        match update.status {
            JobStatus::InProgress(p) => progress.push(p),
            other => panic!("unexpected status {:?}", other),
        }
    }
    (output, progress)
}

fn stored_count(pipeline: &ImportPipeline) -> i64 {
    pipeline
        .repository
        .get_vehicles(&GetVinsQuery::default())
        .unwrap()
        .total_count
}

#[tokio::test]
async fn imports_101_records_in_three_batches() {
    let dir = TempDir::new().unwrap();
    let server = decode_api(Some(101)).await;
    let pipeline = pipeline(&dir, seeded_database(&dir), &server, 40);
    let rows: Vec<(String, &str)> = (0..101).map(|i| (vin(i), "2023-05-26")).collect();

    let (output, progress) = import(&pipeline, csv_payload(&rows)).await;

    assert_eq!(output, "CSV processing completed for 101 records in 3 batches.");

    let batch_updates: Vec<&ImportProgress> = progress
        .iter()
        .filter(|p| p.message.starts_with("Processing batches:"))
        .collect();
    let completed: Vec<usize> = batch_updates.iter().map(|p| p.completed_count).collect();
    assert_eq!(completed, vec![0, 1, 2, 3]);
    assert_eq!(
        batch_updates.iter().map(|p| p.progress).collect::<Vec<_>>(),
        vec![0, 33, 67, 100]
    );
    assert_eq!(batch_updates[2].message, "Processing batches: 2 of 3 completed.");

    let last = progress.last().unwrap();
    assert_eq!(last.progress, 100);
    assert_eq!(last.message, "CSV processing completed successfully!");
    assert_eq!(last.completed_count, last.total_count);
    assert_eq!(last.total_count, 3);

    assert_eq!(stored_count(&pipeline), 101);
    let vehicle = pipeline.repository.get_vehicle_by_vin(&vin(7)).unwrap().unwrap();
    let attributes: Vec<(i32, &str)> = vehicle
        .additional_vehicle_info
        .iter()
        .map(|a| (a.variable_id, a.value.as_str()))
        .collect();
    assert_eq!(attributes, vec![(26, "HONDA")]);

    let archived = dir
        .path()
        .join("blobs")
        .join(ARCHIVE_CONTAINER)
        .join("processed-cars.csv-instance-1.csv");
    assert!(archived.is_file());
}

#[tokio::test]
async fn reimport_only_decodes_newer_records() {
    let dir = TempDir::new().unwrap();
    // 3 inserts on the first run, 1 update on the third.
    let server = decode_api(Some(4)).await;
    let pipeline = pipeline(&dir, seeded_database(&dir), &server, 2);
    let first: Vec<(String, &str)> = (0..3).map(|i| (vin(i), "2023-05-26")).collect();

    import(&pipeline, csv_payload(&first)).await;
    let (output, _) = import(&pipeline, csv_payload(&first)).await;
    assert_eq!(output, "CSV processing completed for 3 records in 2 batches.");

    let newer = vec![(vin(0), "2023-06-01"), (vin(1), "2023-05-26")];
    import(&pipeline, csv_payload(&newer)).await;

    assert_eq!(stored_count(&pipeline), 3);
    let updated = pipeline.repository.get_vehicle_by_vin(&vin(0)).unwrap().unwrap();
    assert_eq!(updated.modified_date.date().to_string(), "2023-06-01");
    assert_eq!(updated.additional_vehicle_info.len(), 1);
}

#[tokio::test]
async fn failed_batches_are_counted_and_run_still_completes() {
    let dir = TempDir::new().unwrap();
    let server = decode_api(None).await;
    // No schema: every batch fails on its first query.
    let broken = Database::new(dir.path().join("empty.sqlite"));
    let pipeline = pipeline(&dir, broken, &server, 1);
    let rows = vec![(vin(1), "2023-05-26"), (vin(2), "2023-05-26")];

    let (output, progress) = import(&pipeline, csv_payload(&rows)).await;

    assert_eq!(
        output,
        "CSV processing completed for 2 records in 2 batches. 2 batch(es) failed."
    );
    let last = progress.last().unwrap();
    assert_eq!(last.progress, 100);
    assert_eq!((last.completed_count, last.total_count), (2, 2));
}

#[tokio::test]
async fn csv_without_valid_rows_processes_nothing() {
    let dir = TempDir::new().unwrap();
    let server = decode_api(Some(0)).await;
    let pipeline = pipeline(&dir, seeded_database(&dir), &server, 40);
    let payload = STANDARD.encode("Vin,DealerId,ModifiedDate\nBAD!,abc,never\n");

    let (output, progress) = import(&pipeline, payload).await;

    assert_eq!(output, "No records processed.");
    assert_eq!(progress.len(), 1);
    assert_eq!(progress[0].progress, 0);
    assert_eq!(stored_count(&pipeline), 0);
    assert!(!dir.path().join("blobs").join(ARCHIVE_CONTAINER).exists());
}

#[tokio::test]
async fn invalid_base64_fails_the_run() {
    let dir = TempDir::new().unwrap();
    let server = decode_api(Some(0)).await;
    let pipeline = pipeline(&dir, seeded_database(&dir), &server, 40);
    let (tx, _rx) = mpsc::channel(8);

    let result = run_import(pipeline, "instance-2".into(), input("%%% not base64 %%%".into()), tx).await;

    let err = result.unwrap_err();
    assert!(err.to_string().starts_with("Input string is not a valid Base64 string"));
}

#[tokio::test]
async fn empty_payload_or_file_name_fails_before_parsing() {
    let dir = TempDir::new().unwrap();
    let server = decode_api(Some(0)).await;
    let pipeline = pipeline(&dir, seeded_database(&dir), &server, 40);
    let unnamed = OrchestratorInput {
        base64_csv_content: csv_payload(&[(vin(1), "2023-05-26")]),
        original_file_name: None,
    };

    for run_input in [input(String::new()), unnamed] {
        let (tx, mut rx) = mpsc::channel::<JobUpdate>(8);

        let err = run_import(pipeline.clone(), "instance-3".into(), run_input, tx)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::MissingPayload));
        assert_eq!(err.to_string(), "Orchestration failed: Missing or invalid Base64 CSV.");
        match rx.recv().await.map(|update| update.status) {
            Some(JobStatus::InProgress(progress)) => {
                assert_eq!(progress.progress, 0);
                assert_eq!(progress.message, "Orchestration failed: Empty Base64 CSV.");
            }
            other => panic!("unexpected status {:?}", other),
        }
        assert!(rx.recv().await.is_none());
    }
    assert_eq!(stored_count(&pipeline), 0);
}
