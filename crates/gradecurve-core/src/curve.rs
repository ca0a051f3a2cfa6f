//! Relative (curved) letter-grade assignment.
//!
//! Students at or above the passing threshold share the A to D bands in
//! proportion to the class size. Failing students occupy the lowest seats of
//! the class, so their count erodes band capacity from D upward before any
//! passing student is placed. Students with identical percentages are never
//! split across bands and always share a rank.

use std::cmp::Ordering;
use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GradeError;
use crate::model::{CourseGradeSummary, GradeCounts, LetterGrade, StudentGradeRecord};
use crate::policy::{BandQuotas, CoursePolicy};
use crate::scoring::round2;

/// Seat counts per passing band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BandCapacity {
    pub a: usize,
    pub b: usize,
    pub c: usize,
    pub d: usize,
}

impl BandCapacity {
    pub fn get(&self, band: LetterGrade) -> usize {
        match band {
            LetterGrade::A => self.a,
            LetterGrade::B => self.b,
            LetterGrade::C => self.c,
            LetterGrade::D => self.d,
            LetterGrade::F => 0,
        }
    }

    fn set(&mut self, band: LetterGrade, seats: usize) {
        match band {
            LetterGrade::A => self.a = seats,
            LetterGrade::B => self.b = seats,
            LetterGrade::C => self.c = seats,
            LetterGrade::D => self.d = seats,
            LetterGrade::F => {}
        }
    }

    pub fn total(&self) -> usize {
        self.a + self.b + self.c + self.d
    }
}

/// Nominal seats per band: `ceil(total * quota / 100)`.
pub fn nominal_capacity(total_students: usize, quotas: &BandQuotas) -> BandCapacity {
    let mut capacity = BandCapacity::default();
    for band in LetterGrade::PASSING {
        // Negative quotas are rejected by policy validation; treat them as empty here.
        let quota = quotas.get(band).max(0) as usize;
        capacity.set(band, (total_students * quota).div_ceil(100));
    }
    capacity
}

/// Remove `failing` seats from the nominal capacity, starting at D.
///
/// Whatever D cannot absorb comes out of C, then B, then A. Capacity never
/// drops below zero and never rises above the nominal value.
pub fn cascade(nominal: BandCapacity, failing: usize) -> BandCapacity {
    let mut actual = nominal;
    let mut remaining = failing;
    for band in LetterGrade::PASSING.iter().rev().copied() {
        let seats = nominal.get(band);
        let consumed = remaining.min(seats);
        actual.set(band, seats - consumed);
        remaining -= consumed;
    }
    actual
}

/// Result of a finalization: updated records and the course summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalizedCourse {
    pub course_id: String,
    /// Records in the order they were given.
    pub records: Vec<StudentGradeRecord>,
    pub summary: CourseGradeSummary,
    pub nominal_capacity: BandCapacity,
    pub actual_capacity: BandCapacity,
    pub finalized_at: DateTime<Utc>,
}

/// Finalize a course roster at the current time.
pub fn finalize(
    roster: &[StudentGradeRecord],
    policy: &CoursePolicy,
) -> Result<FinalizedCourse, GradeError> {
    finalize_at(roster, policy, Utc::now())
}

/// Finalize a course roster with an explicit timestamp.
///
/// The input is never modified; on error no record has been touched.
pub fn finalize_at(
    roster: &[StudentGradeRecord],
    policy: &CoursePolicy,
    now: DateTime<Utc>,
) -> Result<FinalizedCourse, GradeError> {
    let Some(first) = roster.first() else {
        return Err(GradeError::EmptyRoster {
            course_id: String::new(),
        });
    };
    let course_id = first.course_id.clone();
    policy.validate_curve()?;
    check_roster(roster, &course_id)?;

    let threshold = policy.passing_threshold_percent;
    let total = roster.len();

    let mut records = roster.to_vec();
    let mut passing: Vec<usize> = Vec::with_capacity(total);
    let mut failing = 0usize;

    for (idx, record) in records.iter_mut().enumerate() {
        if record.percentage >= threshold {
            passing.push(idx);
        } else {
            record.letter_grade = Some(LetterGrade::F);
            record.rank = None;
            failing += 1;
        }
    }

    let nominal = nominal_capacity(total, &policy.quota_percent);
    let actual = cascade(nominal, failing);
    tracing::debug!(?nominal, ?actual, failing, "band capacity after cascade");

    passing.sort_by(|&x, &y| {
        let (rx, ry) = (&records[x], &records[y]);
        ry.percentage
            .partial_cmp(&rx.percentage)
            .unwrap_or(Ordering::Equal)
            .then_with(|| rx.student_id.cmp(&ry.student_id))
    });

    let placements = place_passing(&records, &passing, &actual);
    let overflow = placements.overflow;
    for (idx, grade, rank) in placements.assigned {
        records[idx].letter_grade = Some(grade);
        records[idx].rank = Some(rank);
    }
    if overflow > 0 {
        tracing::warn!(
            course = %course_id,
            overflow,
            "passing students exceeded band capacity and fell back to A"
        );
    }

    for record in &mut records {
        record.finalized = true;
        record.finalized_at = Some(now);
    }

    let summary = summarize(&records, threshold);
    tracing::info!(
        course = %course_id,
        total = summary.total_students,
        passing = summary.passing_students,
        failing = summary.failing_students,
        a = summary.grade_counts.a,
        b = summary.grade_counts.b,
        c = summary.grade_counts.c,
        d = summary.grade_counts.d,
        "finalized course grades"
    );

    Ok(FinalizedCourse {
        course_id,
        records,
        summary,
        nominal_capacity: nominal,
        actual_capacity: actual,
        finalized_at: now,
    })
}

fn check_roster(roster: &[StudentGradeRecord], course_id: &str) -> Result<(), GradeError> {
    let mut seen = HashSet::with_capacity(roster.len());
    for record in roster {
        if record.course_id != course_id {
            return Err(GradeError::InvalidRoster(format!(
                "student '{}' belongs to course '{}', expected '{course_id}'",
                record.student_id, record.course_id
            )));
        }
        if !seen.insert(record.student_id.as_str()) {
            return Err(GradeError::InvalidRoster(format!(
                "duplicate student '{}'",
                record.student_id
            )));
        }
        if !record.percentage.is_finite() || !(0.0..=100.0).contains(&record.percentage) {
            return Err(GradeError::InvalidRoster(format!(
                "student '{}' has percentage {} outside [0, 100]",
                record.student_id, record.percentage
            )));
        }
        if record.scored_at.is_none() && !record.finalized {
            tracing::warn!(student = %record.student_id, "finalizing a student that was never scored");
        }
    }
    Ok(())
}

struct Placements {
    /// `(record index, grade, rank)` for every passing student.
    assigned: Vec<(usize, LetterGrade, u32)>,
    /// Students placed by the A fallback after D ran out.
    overflow: usize,
}

/// Walk the sorted passing order and fill the bands tie group by tie group.
fn place_passing(
    records: &[StudentGradeRecord],
    order: &[usize],
    capacity: &BandCapacity,
) -> Placements {
    let groups = tie_groups(records, order);
    let mut assigned = Vec::with_capacity(order.len());
    let mut next_group = 0usize;

    for band in LetterGrade::PASSING {
        let seats = capacity.get(band);
        let mut filled = 0usize;
        while filled < seats && next_group < groups.len() {
            let (start, end) = groups[next_group];
            for &idx in &order[start..end] {
                assigned.push((idx, band, start as u32 + 1));
            }
            filled += end - start;
            next_group += 1;
        }
    }

    let mut overflow = 0usize;
    for &(start, end) in &groups[next_group..] {
        for &idx in &order[start..end] {
            assigned.push((idx, LetterGrade::A, start as u32 + 1));
        }
        overflow += end - start;
    }

    Placements { assigned, overflow }
}

/// Maximal runs of equal percentage in `order`, as half-open position ranges.
fn tie_groups(records: &[StudentGradeRecord], order: &[usize]) -> Vec<(usize, usize)> {
    let mut groups = Vec::new();
    let mut start = 0usize;
    while start < order.len() {
        let value = records[order[start]].percentage;
        let mut end = start + 1;
        while end < order.len() && records[order[end]].percentage == value {
            end += 1;
        }
        groups.push((start, end));
        start = end;
    }
    groups
}

fn summarize(records: &[StudentGradeRecord], threshold: f64) -> CourseGradeSummary {
    let mut counts = GradeCounts::default();
    for record in records {
        counts.increment(record.letter_grade.unwrap_or(LetterGrade::F));
    }
    let total = records.len();
    let average = if total == 0 {
        0.0
    } else {
        records.iter().map(|r| r.percentage).sum::<f64>() / total as f64
    };

    CourseGradeSummary {
        grade_counts: counts,
        total_students: total,
        passing_students: total - counts.f,
        failing_students: counts.f,
        average_percentage: round2(average),
        passing_threshold: threshold,
    }
}
