//! Per-student scoring: attendance, assignments, and the combined total.
//!
//! Every function here is pure. Scoring one student never fails because of
//! that student's data: unusable inputs contribute zero and are reported as
//! [`ScoringWarning`]s. Only an invalid policy aborts with an error.

use serde::{Deserialize, Serialize};

use crate::attendance::{self, AttendanceLedger, AttendanceTally};
use crate::error::GradeError;
use crate::model::{AssignmentScore, GradeComponent};
use crate::policy::CoursePolicy;

/// Round half-up to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn percent_of(score: f64, max: f64) -> f64 {
    if max > 0.0 {
        round2(score / max * 100.0)
    } else {
        0.0
    }
}

/// Attendance score with the details that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttendanceScore {
    pub component: GradeComponent,
    pub tally: AttendanceTally,
    /// Points deducted for late sessions before flooring at zero.
    pub late_penalty: f64,
}

/// Score a ledger against the policy's attendance settings.
pub fn score_attendance(
    ledger: &AttendanceLedger,
    policy: &CoursePolicy,
) -> Result<GradeComponent, GradeError> {
    score_attendance_detailed(ledger, policy).map(|s| s.component)
}

/// Like [`score_attendance`], also returning the tally and applied penalty.
pub fn score_attendance_detailed(
    ledger: &AttendanceLedger,
    policy: &CoursePolicy,
) -> Result<AttendanceScore, GradeError> {
    policy.validate_attendance()?;

    // validate_attendance guarantees total_sessions > 0
    let total_sessions = policy.total_sessions as u32;
    let max_score = policy.attendance_max_score;
    let tally = ledger.tally(total_sessions);

    let raw = tally.present_equivalent() as f64 / total_sessions as f64 * max_score;

    let late_penalty = if policy.late_penalty_per_session > 0.0 {
        tally.late as f64 * policy.late_penalty_per_session
    } else {
        0.0
    };

    let score = round2((raw - late_penalty).max(0.0));
    let percentage = percent_of(score, max_score);

    tracing::debug!(
        present = tally.present,
        late = tally.late,
        absent = tally.absent,
        raw,
        late_penalty,
        score,
        "scored attendance"
    );

    Ok(AttendanceScore {
        component: GradeComponent {
            max_score,
            current_score: score,
            percentage,
        },
        tally,
        late_penalty,
    })
}

/// Sum assignment scores into one component.
///
/// Each item is clamped to `[0, max_score]` first, and a negative maximum is
/// treated as zero. A non-finite score counts as zero against its maximum;
/// only an item whose maximum is non-finite is skipped.
pub fn aggregate_assignments(items: &[AssignmentScore]) -> GradeComponent {
    let mut total_score = 0.0;
    let mut total_max = 0.0;

    for item in items {
        if !item.max_score.is_finite() {
            tracing::warn!(assignment = %item.name, "skipping assignment with non-finite max_score");
            continue;
        }
        let max = item.max_score.max(0.0);
        if !item.score.is_finite() {
            tracing::warn!(assignment = %item.name, "assignment has no usable score, counting zero");
            total_max += max;
            continue;
        }
        let score = item.score.clamp(0.0, max);
        if score != item.score {
            tracing::warn!(
                assignment = %item.name,
                given = item.score,
                clamped = score,
                "assignment score outside [0, max_score]"
            );
        }
        total_score += score;
        total_max += max;
    }

    GradeComponent {
        max_score: total_max,
        current_score: total_score,
        percentage: percent_of(total_score, total_max),
    }
}

/// Combine attendance and assignment components into the total.
///
/// This is the only place the total is rounded.
pub fn combine(attendance: &GradeComponent, assignments: &[GradeComponent]) -> GradeComponent {
    let total_score =
        attendance.current_score + assignments.iter().map(|a| a.current_score).sum::<f64>();
    let total_max = attendance.max_score + assignments.iter().map(|a| a.max_score).sum::<f64>();

    let percentage = if total_max > 0.0 {
        round2(total_score / total_max * 100.0)
    } else {
        0.0
    };

    GradeComponent {
        max_score: round2(total_max),
        current_score: round2(total_score),
        percentage,
    }
}

/// Raw inputs for one student.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentInput {
    pub student_id: String,
    /// Encoded attendance ledger, if any was recorded.
    #[serde(default)]
    pub attendance: Option<String>,
    #[serde(default)]
    pub assignments: Vec<AssignmentScore>,
    /// A percentage computed elsewhere. When present the components are skipped.
    #[serde(default)]
    pub percentage: Option<f64>,
}

/// A non-fatal problem found while scoring one student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringWarning {
    pub student_id: String,
    pub message: String,
}

impl From<ScoringWarning> for GradeError {
    fn from(w: ScoringWarning) -> Self {
        GradeError::computation(&w.student_id, w.message)
    }
}

/// Everything computed for one student.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreOutcome {
    pub student_id: String,
    pub attendance: GradeComponent,
    pub assignments: GradeComponent,
    pub total: GradeComponent,
    pub tally: AttendanceTally,
    pub late_penalty: f64,
    #[serde(default)]
    pub warnings: Vec<ScoringWarning>,
}

/// Run the whole per-student pipeline: decode, score attendance, aggregate
/// assignments, combine.
pub fn score_student(
    input: &StudentInput,
    policy: &CoursePolicy,
) -> Result<ScoreOutcome, GradeError> {
    policy.validate_attendance()?;

    let mut warnings = Vec::new();
    let mut warn = |message: String| {
        let warning = ScoringWarning {
            student_id: input.student_id.clone(),
            message,
        };
        tracing::warn!("{}", GradeError::from(warning.clone()));
        warnings.push(warning);
    };

    if let Some(p) = input.percentage {
        let percentage = if p.is_finite() {
            round2(p.clamp(0.0, 100.0))
        } else {
            warn(format!("precomputed percentage {p} is not a number, using 0"));
            0.0
        };
        if p.is_finite() && percentage != round2(p) {
            warn(format!("precomputed percentage {p} clamped to {percentage}"));
        }
        return Ok(ScoreOutcome {
            student_id: input.student_id.clone(),
            attendance: GradeComponent::empty(),
            assignments: GradeComponent::empty(),
            total: GradeComponent {
                max_score: 100.0,
                current_score: percentage,
                percentage,
            },
            tally: AttendanceTally::default(),
            late_penalty: 0.0,
            warnings,
        });
    }

    let (attendance, tally, late_penalty) = match input.attendance.as_deref() {
        Some(text) => {
            let ledger = attendance::decode(text);
            if let Some(last) = ledger.last_session() {
                if last > policy.total_sessions as u32 {
                    warn(format!(
                        "session {last} is past the course's {} sessions and was ignored",
                        policy.total_sessions
                    ));
                }
            }
            let scored = score_attendance_detailed(&ledger, policy)?;
            (scored.component, scored.tally, scored.late_penalty)
        }
        None => {
            warn("no attendance ledger, attendance counts as zero".to_string());
            (
                GradeComponent::zero(policy.attendance_max_score),
                AttendanceTally::default(),
                0.0,
            )
        }
    };

    for item in &input.assignments {
        if !item.max_score.is_finite() {
            warn(format!(
                "assignment '{}' has no usable max_score and is skipped",
                item.name
            ));
        } else if !item.score.is_finite() {
            warn(format!(
                "assignment '{}' has no usable score and counts as zero",
                item.name
            ));
        }
    }
    let assignments = aggregate_assignments(&input.assignments);
    let total = combine(&attendance, &[assignments]);

    Ok(ScoreOutcome {
        student_id: input.student_id.clone(),
        attendance,
        assignments,
        total,
        tally,
        late_penalty,
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(total_sessions: i32, max: f64, late_penalty: f64) -> CoursePolicy {
        CoursePolicy {
            total_sessions,
            attendance_max_score: max,
            late_penalty_per_session: late_penalty,
            ..Default::default()
        }
    }

    fn item(name: &str, score: f64, max: f64) -> AssignmentScore {
        AssignmentScore {
            name: name.into(),
            score,
            max_score: max,
        }
    }

    #[test]
    fn round2_half_up() {
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(1.235_000_1), 1.24);
        assert_eq!(round2(2.5), 2.5);
        assert_eq!(round2(0.125), 0.13);
    }

    #[test]
    fn attendance_with_late_penalty() {
        let ledger = attendance::decode("1P2P3A4L5P");
        let scored = score_attendance_detailed(&ledger, &policy(5, 20.0, 1.0)).unwrap();
        assert_eq!(scored.tally.present_equivalent(), 4);
        assert_eq!(scored.late_penalty, 1.0);
        assert_eq!(scored.component.current_score, 15.0);
        assert_eq!(scored.component.percentage, 75.0);
        assert_eq!(scored.component.max_score, 20.0);
    }

    #[test]
    fn attendance_without_penalty_counts_late_fully() {
        let ledger = attendance::decode("1P2P3A4L5P");
        let component = score_attendance(&ledger, &policy(5, 20.0, 0.0)).unwrap();
        assert_eq!(component.current_score, 16.0);
        assert_eq!(component.percentage, 80.0);
    }

    #[test]
    fn attendance_penalty_never_goes_negative() {
        let ledger = attendance::decode("1L2L3L");
        let component = score_attendance(&ledger, &policy(3, 3.0, 5.0)).unwrap();
        assert_eq!(component.current_score, 0.0);
        assert_eq!(component.percentage, 0.0);
    }

    #[test]
    fn attendance_rounding() {
        // 77 of 80 sessions for a 20 point maximum.
        let mut text = String::new();
        for s in 1..=77 {
            text.push_str(&format!("{s}P"));
        }
        let component = score_attendance(&attendance::decode(&text), &policy(80, 20.0, 0.0)).unwrap();
        assert_eq!(component.current_score, 19.25);
        assert_eq!(component.percentage, 96.25);
    }

    #[test]
    fn attendance_invalid_policy() {
        let ledger = attendance::decode("1P");
        assert!(matches!(
            score_attendance(&ledger, &policy(0, 20.0, 0.0)),
            Err(GradeError::Config(_))
        ));
        assert!(matches!(
            score_attendance(&ledger, &policy(5, 0.0, 0.0)),
            Err(GradeError::Config(_))
        ));
    }

    #[test]
    fn aggregate_clamps_each_item() {
        let component = aggregate_assignments(&[
            item("hw1", 12.0, 10.0),
            item("hw2", -3.0, 10.0),
            item("hw3", 7.5, 10.0),
        ]);
        assert_eq!(component.current_score, 17.5);
        assert_eq!(component.max_score, 30.0);
        assert_eq!(component.percentage, 58.33);
    }

    #[test]
    fn aggregate_counts_non_finite_score_as_zero() {
        let component = aggregate_assignments(&[
            item("nan", f64::NAN, 10.0),
            item("inf", f64::INFINITY, 5.0),
            item("neg-max", 5.0, -10.0),
            item("ok", 4.0, 5.0),
        ]);
        assert_eq!(component.current_score, 4.0);
        assert_eq!(component.max_score, 20.0);
        assert_eq!(component.percentage, 20.0);
        assert_eq!(aggregate_assignments(&[]), GradeComponent::empty());
    }

    #[test]
    fn aggregate_skips_non_finite_max() {
        let component = aggregate_assignments(&[
            item("broken", 3.0, f64::NAN),
            item("unbounded", 3.0, f64::INFINITY),
            item("ok", 4.0, 5.0),
        ]);
        assert_eq!(component.current_score, 4.0);
        assert_eq!(component.max_score, 5.0);
    }

    #[test]
    fn score_student_missing_assignment_score_lowers_total() {
        let input = StudentInput {
            student_id: "s5".into(),
            attendance: Some("1P2P3P4P".into()),
            assignments: vec![item("hw1", f64::NAN, 80.0)],
            ..Default::default()
        };
        let outcome = score_student(&input, &policy(4, 20.0, 0.0)).unwrap();
        assert_eq!(outcome.assignments.max_score, 80.0);
        assert_eq!(outcome.total.current_score, 20.0);
        assert_eq!(outcome.total.max_score, 100.0);
        assert_eq!(outcome.total.percentage, 20.0);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].message.contains("counts as zero"));
    }

    #[test]
    fn combine_rounds_once() {
        let attendance = GradeComponent {
            max_score: 20.0,
            current_score: 19.25,
            percentage: 96.25,
        };
        let assignments = GradeComponent {
            max_score: 30.0,
            current_score: 17.5,
            percentage: 58.33,
        };
        let total = combine(&attendance, &[assignments]);
        assert_eq!(total.current_score, 36.75);
        assert_eq!(total.max_score, 50.0);
        assert_eq!(total.percentage, 73.5);
    }

    #[test]
    fn combine_with_no_max_is_zero() {
        let total = combine(&GradeComponent::empty(), &[]);
        assert_eq!(total.percentage, 0.0);
    }

    #[test]
    fn score_student_full_pipeline() {
        let input = StudentInput {
            student_id: "s1".into(),
            attendance: Some("1P2P3A4L5P".into()),
            assignments: vec![item("hw1", 8.0, 10.0), item("hw2", 7.0, 10.0)],
            percentage: None,
        };
        let outcome = score_student(&input, &policy(5, 20.0, 1.0)).unwrap();
        assert_eq!(outcome.attendance.current_score, 15.0);
        assert_eq!(outcome.assignments.current_score, 15.0);
        assert_eq!(outcome.total.current_score, 30.0);
        assert_eq!(outcome.total.max_score, 40.0);
        assert_eq!(outcome.total.percentage, 75.0);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn score_student_missing_attendance_is_zero_with_warning() {
        let input = StudentInput {
            student_id: "s2".into(),
            assignments: vec![item("hw1", 10.0, 10.0)],
            ..Default::default()
        };
        let outcome = score_student(&input, &policy(5, 20.0, 0.0)).unwrap();
        assert_eq!(outcome.attendance.current_score, 0.0);
        assert_eq!(outcome.total.max_score, 30.0);
        assert_eq!(outcome.total.percentage, 33.33);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].message.contains("attendance"));
    }

    #[test]
    fn score_student_reports_out_of_range_session() {
        let input = StudentInput {
            student_id: "s3".into(),
            attendance: Some("1P2P9P".into()),
            ..Default::default()
        };
        let outcome = score_student(&input, &policy(2, 10.0, 0.0)).unwrap();
        assert_eq!(outcome.total.percentage, 100.0);
        assert_eq!(outcome.warnings.len(), 1);
    }

    #[test]
    fn scoring_warning_converts_to_computation_error() {
        let warning = ScoringWarning {
            student_id: "s9".into(),
            message: "ledger unreadable".into(),
        };
        let err = GradeError::from(warning);
        assert!(matches!(
            &err,
            GradeError::Computation { student_id, message }
                if student_id == "s9" && message == "ledger unreadable"
        ));
    }

    #[test]
    fn score_student_precomputed_percentage() {
        let input = StudentInput {
            student_id: "s4".into(),
            percentage: Some(104.0),
            ..Default::default()
        };
        let outcome = score_student(&input, &CoursePolicy::default()).unwrap();
        assert_eq!(outcome.total.percentage, 100.0);
        assert_eq!(outcome.warnings.len(), 1);
    }
}
