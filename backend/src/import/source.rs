//! Local directory tree standing in for blob containers:
//! `{root}/{container}/{file}`.

use crate::error::{AppError, Result};
use log::info;
use std::path::PathBuf;

pub const DEFAULT_CONTAINER: &str = "evntest";
pub const DEFAULT_FILE: &str = "sample-vin-data.csv";
pub const ARCHIVE_CONTAINER: &str = "processed-csv-output";

#[derive(Clone, Debug)]
pub struct ImportSource {
    root: PathBuf,
}

impl ImportSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn blob_path(&self, container: &str, name: &str) -> Result<PathBuf> {
        check_name("container", container)?;
        check_name("file", name)?;
        Ok(self.root.join(container).join(name))
    }

    pub async fn exists(&self, container: &str, name: &str) -> Result<bool> {
        let path = self.blob_path(container, name)?;
        match tokio::fs::metadata(&path).await {
            Ok(metadata) => Ok(metadata.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn read(&self, container: &str, name: &str) -> Result<Vec<u8>> {
        let path = self.blob_path(container, name)?;
        Ok(tokio::fs::read(&path).await?)
    }

    /// Copies an imported file into the archive container as
    /// `processed-{file}-{instance}.csv`.
    pub async fn archive(&self, file_name: &str, instance_id: &str, bytes: &[u8]) -> Result<PathBuf> {
        let archived = format!("processed-{}-{}.csv", file_name, instance_id);
        let path = self.blob_path(ARCHIVE_CONTAINER, &archived)?;
        tokio::fs::create_dir_all(self.root.join(ARCHIVE_CONTAINER)).await?;
        tokio::fs::write(&path, bytes).await?;
        info!("Archived {} to {}", file_name, path.display());
        Ok(path)
    }
}

fn check_name(kind: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() || name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(AppError::BadRequest(format!("Invalid {} name '{}'.", kind, name)));
    }
    Ok(())
}
