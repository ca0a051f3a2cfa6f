//! The `gradecurve score` command.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};
use serde::Serialize;

use gradecurve_core::parser;
use gradecurve_core::scoring::{score_student, ScoreOutcome};
use gradecurve_store::config::load_config_from;

use super::effective_policy;

#[derive(Serialize)]
struct ScoreListing<'a> {
    course_id: &'a str,
    students: &'a [ScoreOutcome],
}

pub fn execute(course_path: PathBuf, config_path: Option<PathBuf>, format: String) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let course = parser::parse_course_file(&course_path)?;
    let policy = effective_policy(&course, &config);

    let outcomes = course
        .students
        .iter()
        .map(|s| score_student(s, &policy))
        .collect::<Result<Vec<_>, _>>()?;

    match format.as_str() {
        "json" => {
            let listing = ScoreListing {
                course_id: &course.id,
                students: &outcomes,
            };
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        _ => {
            let mut table = Table::new();
            table.set_header(vec![
                "Student",
                "Attendance",
                "Assignments",
                "Total",
                "Percentage",
                "Warnings",
            ]);
            for o in &outcomes {
                table.add_row(vec![
                    Cell::new(&o.student_id),
                    Cell::new(format!(
                        "{:.2}/{:.2}",
                        o.attendance.current_score, o.attendance.max_score
                    )),
                    Cell::new(format!(
                        "{:.2}/{:.2}",
                        o.assignments.current_score, o.assignments.max_score
                    )),
                    Cell::new(format!(
                        "{:.2}/{:.2}",
                        o.total.current_score, o.total.max_score
                    )),
                    Cell::new(format!("{:.2}%", o.total.percentage)),
                    Cell::new(o.warnings.len()),
                ]);
            }
            println!("{table}");
        }
    }

    Ok(())
}
