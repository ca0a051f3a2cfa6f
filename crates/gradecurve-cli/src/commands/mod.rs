pub mod attendance;
pub mod compare;
pub mod finalize;
pub mod init;
pub mod score;
pub mod validate;

use comfy_table::{Cell, Table};

use gradecurve_core::model::StudentGradeRecord;
use gradecurve_core::parser::CourseFile;
use gradecurve_core::policy::CoursePolicy;
use gradecurve_store::GradecurveConfig;

/// The policy a course file is graded under: its own, else the configured one.
pub(crate) fn effective_policy(course: &CourseFile, config: &GradecurveConfig) -> CoursePolicy {
    course
        .policy
        .clone()
        .unwrap_or_else(|| config.policy_for(&course.id))
}

pub(crate) fn grade_table(records: &[StudentGradeRecord]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Student", "Percentage", "Grade", "Rank"]);
    for r in records {
        table.add_row(vec![
            Cell::new(&r.student_id),
            Cell::new(format!("{:.2}", r.percentage)),
            Cell::new(
                r.letter_grade
                    .map_or_else(|| "-".to_string(), |g| g.to_string()),
            ),
            Cell::new(r.rank.map_or_else(|| "-".to_string(), |n| n.to_string())),
        ]);
    }
    table
}
