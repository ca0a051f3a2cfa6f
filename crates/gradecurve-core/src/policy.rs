//! Course grading policy.
//!
//! A `CoursePolicy` is a read-only snapshot handed to every scoring and
//! finalization call. Nothing in this crate persists or mutates it.

use serde::{Deserialize, Serialize};

use crate::error::GradeError;
use crate::model::LetterGrade;

/// Grading configuration for a single course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoursePolicy {
    /// Minimum percentage (inclusive) needed to pass.
    #[serde(default = "default_threshold")]
    pub passing_threshold_percent: f64,
    /// Share of the class each passing band may hold, in percent.
    #[serde(default)]
    pub quota_percent: BandQuotas,
    /// Points deducted from the attendance score per late session.
    #[serde(default)]
    pub late_penalty_per_session: f64,
    /// Number of sessions the attendance score is measured against.
    #[serde(default = "default_total_sessions")]
    pub total_sessions: i32,
    /// Maximum attendance score.
    #[serde(default = "default_attendance_max")]
    pub attendance_max_score: f64,
}

/// Band quotas in percent of the whole class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandQuotas {
    #[serde(default = "default_quota_a")]
    pub a: i32,
    #[serde(default = "default_quota_b")]
    pub b: i32,
    #[serde(default = "default_quota_c")]
    pub c: i32,
    #[serde(default = "default_quota_d")]
    pub d: i32,
}

fn default_threshold() -> f64 {
    60.0
}
fn default_total_sessions() -> i32 {
    80
}
fn default_attendance_max() -> f64 {
    20.0
}
fn default_quota_a() -> i32 {
    30
}
fn default_quota_b() -> i32 {
    40
}
fn default_quota_c() -> i32 {
    20
}
fn default_quota_d() -> i32 {
    10
}

impl Default for BandQuotas {
    fn default() -> Self {
        Self {
            a: default_quota_a(),
            b: default_quota_b(),
            c: default_quota_c(),
            d: default_quota_d(),
        }
    }
}

impl BandQuotas {
    /// Quota percent for a passing band. `F` has no quota.
    pub fn get(&self, band: LetterGrade) -> i32 {
        match band {
            LetterGrade::A => self.a,
            LetterGrade::B => self.b,
            LetterGrade::C => self.c,
            LetterGrade::D => self.d,
            LetterGrade::F => 0,
        }
    }

    /// Sum of the four band quotas.
    pub fn total(&self) -> i32 {
        self.a + self.b + self.c + self.d
    }
}

impl Default for CoursePolicy {
    fn default() -> Self {
        Self {
            passing_threshold_percent: default_threshold(),
            quota_percent: BandQuotas::default(),
            late_penalty_per_session: 0.0,
            total_sessions: default_total_sessions(),
            attendance_max_score: default_attendance_max(),
        }
    }
}

impl CoursePolicy {
    /// Check the values the attendance scorer depends on.
    pub fn validate_attendance(&self) -> Result<(), GradeError> {
        if self.total_sessions <= 0 {
            return Err(GradeError::config(format!(
                "total_sessions must be positive, got {}",
                self.total_sessions
            )));
        }
        if !self.attendance_max_score.is_finite() || self.attendance_max_score <= 0.0 {
            return Err(GradeError::config(format!(
                "attendance_max_score must be positive, got {}",
                self.attendance_max_score
            )));
        }
        if !self.late_penalty_per_session.is_finite() || self.late_penalty_per_session < 0.0 {
            return Err(GradeError::config(format!(
                "late_penalty_per_session must be zero or more, got {}",
                self.late_penalty_per_session
            )));
        }
        Ok(())
    }

    /// Check the values the curve assigner depends on.
    pub fn validate_curve(&self) -> Result<(), GradeError> {
        let threshold = self.passing_threshold_percent;
        if !threshold.is_finite() || !(0.0..=100.0).contains(&threshold) {
            return Err(GradeError::config(format!(
                "passing_threshold_percent must be within [0, 100], got {threshold}"
            )));
        }
        for band in LetterGrade::PASSING {
            let quota = self.quota_percent.get(band);
            if quota < 0 {
                return Err(GradeError::config(format!(
                    "quota for band {band} must not be negative, got {quota}"
                )));
            }
        }
        Ok(())
    }

    /// Check every field.
    pub fn validate(&self) -> Result<(), GradeError> {
        self.validate_attendance()?;
        self.validate_curve()
    }
}
