//! Grade store backed by a single JSON file.
//!
//! The file holds every record of every course as one JSON array. A batch is
//! written to a sibling temp file and renamed over the old file, so a crash
//! mid-write leaves the previous contents intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use gradecurve_core::model::StudentGradeRecord;
use gradecurve_core::traits::GradeStore;
use gradecurve_core::StoreError;

/// A grade store persisting to a JSON file on disk.
pub struct JsonFileStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: tokio::sync::Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: tokio::sync::Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<Vec<StudentGradeRecord>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StoreError::Io(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            StoreError::Serialization(format!("{}: {e}", self.path.display()))
        })
    }

    async fn write_all(&self, records: &[StudentGradeRecord]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(records)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::Io(format!("failed to create {}: {e}", parent.display())))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| StoreError::Io(format!("failed to write {}: {e}", tmp.display())))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| StoreError::Io(format!("failed to replace {}: {e}", self.path.display())))
    }

    async fn upsert(&self, batch: &[StudentGradeRecord]) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.read_all().await?;
        for record in batch {
            match records
                .iter_mut()
                .find(|r| r.student_id == record.student_id && r.course_id == record.course_id)
            {
                Some(existing) => *existing = record.clone(),
                None => records.push(record.clone()),
            }
        }
        self.write_all(&records).await?;
        tracing::debug!(path = %self.path.display(), written = batch.len(), "saved grade records");
        Ok(())
    }
}

#[async_trait]
impl GradeStore for JsonFileStore {
    fn name(&self) -> &str {
        "json"
    }

    async fn save(&self, record: &StudentGradeRecord) -> Result<(), StoreError> {
        self.upsert(std::slice::from_ref(record)).await
    }

    async fn save_batch(&self, records: &[StudentGradeRecord]) -> Result<(), StoreError> {
        self.upsert(records).await
    }

    async fn load_roster(&self, course_id: &str) -> Result<Vec<StudentGradeRecord>, StoreError> {
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .filter(|r| r.course_id == course_id)
            .collect())
    }
}
