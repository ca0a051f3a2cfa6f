//! In-memory grade store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use gradecurve_core::model::StudentGradeRecord;
use gradecurve_core::traits::GradeStore;
use gradecurve_core::StoreError;

/// A grade store that keeps records in process memory.
///
/// Records of a course are returned in the order they were first saved.
/// Write failures can be switched on to exercise error paths.
#[derive(Default)]
pub struct MemoryStore {
    /// Course ID → records of that course.
    courses: Mutex<HashMap<String, Vec<StudentGradeRecord>>>,
    /// Number of `save_batch` calls that succeeded.
    batch_count: AtomicU32,
    /// Number of single `save` calls that succeeded.
    save_count: AtomicU32,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with records.
    pub fn with_records(records: impl IntoIterator<Item = StudentGradeRecord>) -> Self {
        let store = Self::new();
        {
            let mut courses = store.lock();
            for record in records {
                upsert(&mut courses, record);
            }
        }
        store
    }

    /// Make every subsequent write fail with `StoreError::Unavailable`.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }

    pub fn batch_count(&self) -> u32 {
        self.batch_count.load(Ordering::Relaxed)
    }

    pub fn save_count(&self) -> u32 {
        self.save_count.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<StudentGradeRecord>>> {
        self.courses.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("memory store is read-only".into()));
        }
        Ok(())
    }
}

fn upsert(courses: &mut HashMap<String, Vec<StudentGradeRecord>>, record: StudentGradeRecord) {
    let roster = courses.entry(record.course_id.clone()).or_default();
    match roster
        .iter_mut()
        .find(|r| r.student_id == record.student_id)
    {
        Some(existing) => *existing = record,
        None => roster.push(record),
    }
}

#[async_trait]
impl GradeStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn save(&self, record: &StudentGradeRecord) -> Result<(), StoreError> {
        self.check_writable()?;
        upsert(&mut self.lock(), record.clone());
        self.save_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn save_batch(&self, records: &[StudentGradeRecord]) -> Result<(), StoreError> {
        self.check_writable()?;
        // One guard for the whole batch, so readers see all of it or none.
        let mut courses = self.lock();
        for record in records {
            upsert(&mut courses, record.clone());
        }
        self.batch_count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn load_roster(&self, course_id: &str) -> Result<Vec<StudentGradeRecord>, StoreError> {
        Ok(self.lock().get(course_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_is_an_upsert() {
        let store = MemoryStore::new();
        let mut record = StudentGradeRecord::scored("s1", "CS101", 70.0);
        store.save(&record).await.unwrap();
        store.save(&record).await.unwrap();

        record.percentage = 80.0;
        store.save(&record).await.unwrap();

        let roster = store.load_roster("CS101").await.unwrap();
        assert_eq!(roster.len(), 1);
        assert_eq!(roster[0].percentage, 80.0);
        assert_eq!(store.save_count(), 3);
    }

    #[tokio::test]
    async fn rosters_are_per_course_and_ordered() {
        let store = MemoryStore::with_records([
            StudentGradeRecord::scored("zed", "CS101", 70.0),
            StudentGradeRecord::scored("amy", "CS101", 60.0),
            StudentGradeRecord::scored("amy", "MATH200", 90.0),
        ]);
        let roster = store.load_roster("CS101").await.unwrap();
        let ids: Vec<_> = roster.iter().map(|r| r.student_id.as_str()).collect();
        assert_eq!(ids, vec!["zed", "amy"]);
        assert_eq!(store.load_roster("MATH200").await.unwrap().len(), 1);
        assert!(store.load_roster("NONE").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_batch_changes_nothing() {
        let store = MemoryStore::with_records([StudentGradeRecord::scored("s1", "CS101", 70.0)]);
        store.fail_writes(true);

        let mut updated = StudentGradeRecord::scored("s1", "CS101", 10.0);
        updated.finalized = true;
        let err = store.save_batch(&[updated]).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(!err.is_permanent());

        let roster = store.load_roster("CS101").await.unwrap();
        assert_eq!(roster[0].percentage, 70.0);
        assert_eq!(store.batch_count(), 0);
    }
}
