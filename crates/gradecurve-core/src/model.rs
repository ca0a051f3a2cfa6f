//! Core data model types for gradecurve.
//!
//! These are the types every other module exchanges: letter grades, score
//! components, per-student grade records, and the course-level summary.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A letter grade. `A` through `D` are passing bands, `F` is failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LetterGrade {
    A,
    B,
    C,
    D,
    F,
}

impl LetterGrade {
    /// Passing bands in assignment order (best first).
    pub const PASSING: [LetterGrade; 4] = [
        LetterGrade::A,
        LetterGrade::B,
        LetterGrade::C,
        LetterGrade::D,
    ];

    /// Every grade, best first.
    pub const ALL: [LetterGrade; 5] = [
        LetterGrade::A,
        LetterGrade::B,
        LetterGrade::C,
        LetterGrade::D,
        LetterGrade::F,
    ];

    pub fn is_passing(self) -> bool {
        self != LetterGrade::F
    }
}

impl fmt::Display for LetterGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LetterGrade::A => "A",
            LetterGrade::B => "B",
            LetterGrade::C => "C",
            LetterGrade::D => "D",
            LetterGrade::F => "F",
        };
        f.write_str(s)
    }
}

impl FromStr for LetterGrade {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(LetterGrade::A),
            "B" => Ok(LetterGrade::B),
            "C" => Ok(LetterGrade::C),
            "D" => Ok(LetterGrade::D),
            "F" => Ok(LetterGrade::F),
            other => Err(format!("unknown letter grade: {other}")),
        }
    }
}

/// One scored part of a student's grade (attendance, assignments, or the total).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradeComponent {
    pub max_score: f64,
    pub current_score: f64,
    pub percentage: f64,
}

impl GradeComponent {
    /// A component worth nothing out of nothing.
    pub fn empty() -> Self {
        Self {
            max_score: 0.0,
            current_score: 0.0,
            percentage: 0.0,
        }
    }

    /// A component that scored zero out of `max_score`.
    pub fn zero(max_score: f64) -> Self {
        Self {
            max_score,
            current_score: 0.0,
            percentage: 0.0,
        }
    }
}

/// An externally graded assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentScore {
    pub name: String,
    pub score: f64,
    pub max_score: f64,
}

/// Lifecycle of a grade record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GradeState {
    Unscored,
    Scored,
    Finalized,
}

/// The per-student grade record exchanged with the persistence collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentGradeRecord {
    pub student_id: String,
    pub course_id: String,
    #[serde(default)]
    pub percentage: f64,
    #[serde(default)]
    pub letter_grade: Option<LetterGrade>,
    /// 1-based rank within the passing order. Failing students have none.
    #[serde(default)]
    pub rank: Option<u32>,
    #[serde(default)]
    pub finalized: bool,
    #[serde(default)]
    pub finalized_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub scored_at: Option<DateTime<Utc>>,
}

impl StudentGradeRecord {
    /// A fresh, unscored record.
    pub fn new(student_id: impl Into<String>, course_id: impl Into<String>) -> Self {
        Self {
            student_id: student_id.into(),
            course_id: course_id.into(),
            percentage: 0.0,
            letter_grade: None,
            rank: None,
            finalized: false,
            finalized_at: None,
            scored_at: None,
        }
    }

    /// A record that already carries a computed percentage.
    pub fn scored(
        student_id: impl Into<String>,
        course_id: impl Into<String>,
        percentage: f64,
    ) -> Self {
        let mut record = Self::new(student_id, course_id);
        record.apply_score(percentage, Utc::now());
        record
    }

    /// Store a recomputed percentage.
    ///
    /// Letter grade, rank and the finalized flag are left alone: a score change
    /// never moves a finalized record back to `Scored`.
    pub fn apply_score(&mut self, percentage: f64, at: DateTime<Utc>) {
        self.percentage = percentage;
        self.scored_at = Some(at);
    }

    pub fn state(&self) -> GradeState {
        if self.finalized {
            GradeState::Finalized
        } else if self.scored_at.is_some() {
            GradeState::Scored
        } else {
            GradeState::Unscored
        }
    }
}

/// Number of students per letter grade.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeCounts {
    pub a: usize,
    pub b: usize,
    pub c: usize,
    pub d: usize,
    pub f: usize,
}

impl GradeCounts {
    pub fn get(&self, grade: LetterGrade) -> usize {
        match grade {
            LetterGrade::A => self.a,
            LetterGrade::B => self.b,
            LetterGrade::C => self.c,
            LetterGrade::D => self.d,
            LetterGrade::F => self.f,
        }
    }

    pub fn increment(&mut self, grade: LetterGrade) {
        match grade {
            LetterGrade::A => self.a += 1,
            LetterGrade::B => self.b += 1,
            LetterGrade::C => self.c += 1,
            LetterGrade::D => self.d += 1,
            LetterGrade::F => self.f += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.a + self.b + self.c + self.d + self.f
    }
}

/// Course-level outcome of a finalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseGradeSummary {
    pub grade_counts: GradeCounts,
    pub total_students: usize,
    pub passing_students: usize,
    pub failing_students: usize,
    pub average_percentage: f64,
    pub passing_threshold: f64,
}
