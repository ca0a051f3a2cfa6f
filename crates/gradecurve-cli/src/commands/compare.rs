//! The `gradecurve compare` command.

use std::path::PathBuf;

use anyhow::Result;

use gradecurve_core::report::CourseReport;

fn cell<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

pub fn execute(
    baseline_path: PathBuf,
    current_path: PathBuf,
    fail_on_change: bool,
    format: String,
) -> Result<()> {
    let baseline = CourseReport::load_json(&baseline_path)?;
    let current = CourseReport::load_json(&current_path)?;

    if baseline.course_id != current.course_id {
        eprintln!(
            "Warning: comparing different courses ({} vs {})",
            baseline.course_id, current.course_id
        );
    }

    let report = current.compare(&baseline);

    match format.as_str() {
        "markdown" | "md" => {
            println!("{}", report.to_markdown());
        }
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            // text format
            println!(
                "Comparison: {} changed, {} unchanged",
                report.changes.len(),
                report.unchanged
            );

            if !report.changes.is_empty() {
                println!("\nChanges:");
                for c in &report.changes {
                    println!(
                        "  {} grade {} -> {}, rank {} -> {} ({:.2}% -> {:.2}%)",
                        c.student_id,
                        cell(c.baseline_grade),
                        cell(c.current_grade),
                        cell(c.baseline_rank),
                        cell(c.current_rank),
                        c.baseline_percentage,
                        c.current_percentage
                    );
                }
            }

            if !report.new_students.is_empty() {
                println!("\n{} new student(s): {}", report.new_students.len(), report.new_students.join(", "));
            }
            if !report.removed_students.is_empty() {
                println!(
                    "{} removed student(s): {}",
                    report.removed_students.len(),
                    report.removed_students.join(", ")
                );
            }
        }
    }

    if fail_on_change && report.has_changes() {
        std::process::exit(1);
    }

    Ok(())
}
