//! The `gradecurve validate` command.

use std::path::PathBuf;

use anyhow::Result;

use gradecurve_core::parser;
use gradecurve_core::policy::CoursePolicy;

pub fn execute(course_path: PathBuf) -> Result<()> {
    let courses = parser::load_courses(&course_path)?;
    if courses.is_empty() {
        anyhow::bail!("no course files found in {}", course_path.display());
    }

    let fallback = CoursePolicy::default();
    let mut total_warnings = 0;

    for course in &courses {
        println!("Course: {} ({} students)", course.name, course.students.len());

        let warnings = parser::validate_course(course, &fallback);
        for w in &warnings {
            let prefix = w
                .student_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if total_warnings == 0 {
        println!("All courses valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
