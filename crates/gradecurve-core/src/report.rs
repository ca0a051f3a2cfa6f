//! Course report types with JSON persistence and grade-change detection.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::curve::FinalizedCourse;
use crate::model::{CourseGradeSummary, LetterGrade, StudentGradeRecord};
use crate::policy::CoursePolicy;

/// A complete finalization report for one course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    pub course_id: String,
    pub course_name: String,
    /// Policy the grades were computed under.
    pub policy: CoursePolicy,
    /// Finalized records, in roster order.
    pub records: Vec<StudentGradeRecord>,
    pub summary: CourseGradeSummary,
    /// Scoring and validation warnings gathered along the way.
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl CourseReport {
    /// Build a report from a finalized course.
    pub fn new(
        course_name: impl Into<String>,
        policy: CoursePolicy,
        course: FinalizedCourse,
        warnings: Vec<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: course.finalized_at,
            course_id: course.course_id,
            course_name: course_name.into(),
            policy,
            records: course.records,
            summary: course.summary,
            warnings,
        }
    }

    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: CourseReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    /// Compare this report against a baseline to find students whose grade
    /// or rank moved.
    pub fn compare(&self, baseline: &CourseReport) -> GradeChangeReport {
        let index = |report: &CourseReport| -> HashMap<String, StudentGradeRecord> {
            report
                .records
                .iter()
                .map(|r| (r.student_id.clone(), r.clone()))
                .collect()
        };

        let baseline_records = index(baseline);
        let current_records = index(self);

        let mut changes = Vec::new();
        let mut unchanged = 0usize;
        let mut new_students = Vec::new();

        for record in &self.records {
            match baseline_records.get(&record.student_id) {
                Some(before) => {
                    if before.letter_grade != record.letter_grade || before.rank != record.rank {
                        changes.push(GradeChange {
                            student_id: record.student_id.clone(),
                            baseline_grade: before.letter_grade,
                            current_grade: record.letter_grade,
                            baseline_rank: before.rank,
                            current_rank: record.rank,
                            baseline_percentage: before.percentage,
                            current_percentage: record.percentage,
                        });
                    } else {
                        unchanged += 1;
                    }
                }
                None => new_students.push(record.student_id.clone()),
            }
        }

        let mut removed_students: Vec<String> = baseline
            .records
            .iter()
            .filter(|r| !current_records.contains_key(&r.student_id))
            .map(|r| r.student_id.clone())
            .collect();
        removed_students.sort();
        changes.sort_by(|a, b| a.student_id.cmp(&b.student_id));
        new_students.sort();

        GradeChangeReport {
            changes,
            unchanged,
            new_students,
            removed_students,
        }
    }
}

/// Result of comparing two course reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeChangeReport {
    /// Students whose letter grade or rank differs.
    pub changes: Vec<GradeChange>,
    pub unchanged: usize,
    /// Students in current but not baseline.
    pub new_students: Vec<String>,
    /// Students in baseline but not current.
    pub removed_students: Vec<String>,
}

/// A single student's movement between two reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradeChange {
    pub student_id: String,
    pub baseline_grade: Option<LetterGrade>,
    pub current_grade: Option<LetterGrade>,
    pub baseline_rank: Option<u32>,
    pub current_rank: Option<u32>,
    pub baseline_percentage: f64,
    pub current_percentage: f64,
}

impl GradeChange {
    /// True when the letter grade moved toward A.
    pub fn is_promotion(&self) -> bool {
        match (self.baseline_grade, self.current_grade) {
            (Some(before), Some(after)) => after < before,
            _ => false,
        }
    }
}

fn grade_cell(grade: Option<LetterGrade>) -> String {
    grade.map_or_else(|| "-".to_string(), |g| g.to_string())
}

fn rank_cell(rank: Option<u32>) -> String {
    rank.map_or_else(|| "-".to_string(), |r| r.to_string())
}

impl GradeChangeReport {
    /// Format the change report as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "**Summary:** {} changed, {} unchanged, {} new, {} removed\n\n",
            self.changes.len(),
            self.unchanged,
            self.new_students.len(),
            self.removed_students.len()
        ));

        if !self.changes.is_empty() {
            md.push_str("### Changes\n\n");
            md.push_str("| Student | Grade | Rank | Percentage |\n");
            md.push_str("|---------|-------|------|------------|\n");
            for c in &self.changes {
                md.push_str(&format!(
                    "| {} | {} → {} | {} → {} | {:.2}% → {:.2}% |\n",
                    c.student_id,
                    grade_cell(c.baseline_grade),
                    grade_cell(c.current_grade),
                    rank_cell(c.baseline_rank),
                    rank_cell(c.current_rank),
                    c.baseline_percentage,
                    c.current_percentage
                ));
            }
            md.push('\n');
        }

        if !self.new_students.is_empty() {
            md.push_str(&format!("**New:** {}\n\n", self.new_students.join(", ")));
        }
        if !self.removed_students.is_empty() {
            md.push_str(&format!(
                "**Removed:** {}\n",
                self.removed_students.join(", ")
            ));
        }

        md
    }

    /// Returns true if any student moved, appeared, or disappeared.
    pub fn has_changes(&self) -> bool {
        !self.changes.is_empty() || !self.new_students.is_empty() || !self.removed_students.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::finalize;

    fn make_report(percentages: &[(&str, f64)]) -> CourseReport {
        let roster: Vec<StudentGradeRecord> = percentages
            .iter()
            .map(|&(id, p)| StudentGradeRecord::scored(id, "CS101", p))
            .collect();
        let policy = CoursePolicy::default();
        let course = finalize(&roster, &policy).unwrap();
        CourseReport::new("Intro", policy, course, vec![])
    }

    #[test]
    fn compare_identical_reports() {
        let baseline = make_report(&[("a", 90.0), ("b", 70.0), ("c", 40.0)]);
        let current = make_report(&[("a", 90.0), ("b", 70.0), ("c", 40.0)]);

        let report = current.compare(&baseline);
        assert!(report.changes.is_empty());
        assert_eq!(report.unchanged, 3);
        assert!(!report.has_changes());
    }

    #[test]
    fn compare_detects_grade_change() {
        let baseline = make_report(&[("a", 90.0), ("b", 70.0), ("c", 40.0)]);
        let current = make_report(&[("a", 90.0), ("b", 70.0), ("c", 65.0)]);

        let report = current.compare(&baseline);
        assert_eq!(report.changes.len(), 1);
        let change = &report.changes[0];
        assert_eq!(change.student_id, "c");
        assert_eq!(change.baseline_grade, Some(LetterGrade::F));
        assert!(change.is_promotion());
        assert!(report.has_changes());
    }

    #[test]
    fn compare_with_new_and_removed() {
        let baseline = make_report(&[("old", 80.0)]);
        let current = make_report(&[("new", 80.0)]);

        let report = current.compare(&baseline);
        assert_eq!(report.new_students, vec!["new"]);
        assert_eq!(report.removed_students, vec!["old"]);
    }

    #[test]
    fn json_roundtrip() {
        let report = make_report(&[("a", 90.0), ("b", 50.0)]);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("report.json");

        report.save_json(&path).unwrap();
        let loaded = CourseReport::load_json(&path).unwrap();

        assert_eq!(loaded.id, report.id);
        assert_eq!(loaded.course_id, "CS101");
        assert_eq!(loaded.records, report.records);
    }

    #[test]
    fn markdown_output() {
        let baseline = make_report(&[("a", 90.0), ("b", 40.0)]);
        let current = make_report(&[("a", 90.0), ("b", 75.0)]);

        let md = current.compare(&baseline).to_markdown();
        assert!(md.contains("### Changes"));
        assert!(md.contains("| b | F → "));
    }
}
