//! Course-level orchestration over the persistence and policy collaborators.
//!
//! The curve algorithm itself is a pure function. This engine supplies what it
//! expects from its caller: one consistent roster read, a single batch write,
//! and at most one scoring or finalization run per course at a time.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::curve::{self, FinalizedCourse};
use crate::error::GradeError;
use crate::model::StudentGradeRecord;
use crate::scoring::{score_student, ScoreOutcome, StudentInput};
use crate::traits::{GradeStore, PolicySource};

/// Outcome of rescoring a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringReport {
    pub course_id: String,
    pub outcomes: Vec<ScoreOutcome>,
    /// Records as they were written to the store.
    pub records: Vec<StudentGradeRecord>,
}

impl ScoringReport {
    pub fn warning_count(&self) -> usize {
        self.outcomes.iter().map(|o| o.warnings.len()).sum()
    }
}

type CourseLocks = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// Scores and finalizes courses against a store.
pub struct FinalizationEngine {
    store: Arc<dyn GradeStore>,
    policies: Arc<dyn PolicySource>,
    locks: CourseLocks,
}

/// Holds a course's lock. On drop the map entry is removed once nobody else
/// holds or waits on it.
struct CourseGuard<'a> {
    locks: &'a CourseLocks,
    course_id: String,
    guard: Option<tokio::sync::OwnedMutexGuard<()>>,
}

impl Drop for CourseGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        if locks
            .get(&self.course_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.course_id);
        }
    }
}

impl FinalizationEngine {
    pub fn new(store: Arc<dyn GradeStore>, policies: Arc<dyn PolicySource>) -> Self {
        Self {
            store,
            policies,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn lock_course(&self, course_id: &str) -> CourseGuard<'_> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            Arc::clone(locks.entry(course_id.to_string()).or_default())
        };
        CourseGuard {
            locks: &self.locks,
            course_id: course_id.to_string(),
            guard: Some(lock.lock_owned().await),
        }
    }

    /// Recompute every given student's percentage and persist the records.
    ///
    /// Students with unusable component data are scored with a zero
    /// contribution and a warning; only an invalid policy or a store failure
    /// aborts, and then nothing is written.
    pub async fn score_course(
        &self,
        course_id: &str,
        inputs: &[StudentInput],
    ) -> Result<ScoringReport, GradeError> {
        let _guard = self.lock_course(course_id).await;

        let policy = self.policies.get_policy(course_id).await?;
        policy.validate_attendance()?;

        let mut existing: HashMap<String, StudentGradeRecord> = self
            .store
            .load_roster(course_id)
            .await?
            .into_iter()
            .map(|r| (r.student_id.clone(), r))
            .collect();

        let now = Utc::now();
        let mut outcomes = Vec::with_capacity(inputs.len());
        let mut records: Vec<StudentGradeRecord> = Vec::with_capacity(inputs.len());
        let mut positions: HashMap<String, usize> = HashMap::new();

        for input in inputs {
            let outcome = score_student(input, &policy)?;

            if let Some(&pos) = positions.get(&input.student_id) {
                tracing::warn!(student = %input.student_id, "student scored twice, keeping the later input");
                records[pos].apply_score(outcome.total.percentage, now);
                outcomes[pos] = outcome;
                continue;
            }

            let mut record = existing
                .remove(&input.student_id)
                .unwrap_or_else(|| StudentGradeRecord::new(&input.student_id, course_id));
            record.apply_score(outcome.total.percentage, now);

            positions.insert(input.student_id.clone(), records.len());
            records.push(record);
            outcomes.push(outcome);
        }

        self.store.save_batch(&records).await?;

        let report = ScoringReport {
            course_id: course_id.to_string(),
            outcomes,
            records,
        };
        tracing::info!(
            course = course_id,
            students = report.records.len(),
            warnings = report.warning_count(),
            store = self.store.name(),
            "scored course"
        );
        Ok(report)
    }

    /// Assign letter grades and ranks for a whole course and persist them.
    ///
    /// Any failure before the final batch write leaves the store untouched.
    pub async fn finalize_course(&self, course_id: &str) -> Result<FinalizedCourse, GradeError> {
        let _guard = self.lock_course(course_id).await;

        let roster = self.store.load_roster(course_id).await?;
        if roster.is_empty() {
            return Err(GradeError::EmptyRoster {
                course_id: course_id.to_string(),
            });
        }
        let policy = self.policies.get_policy(course_id).await?;

        let finalized = curve::finalize(&roster, &policy)?;
        self.store.save_batch(&finalized.records).await?;

        tracing::info!(
            course = course_id,
            students = finalized.records.len(),
            store = self.store.name(),
            "persisted finalized grades"
        );
        Ok(finalized)
    }
}
