//! The `gradecurve finalize` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::Table;

use gradecurve_core::engine::FinalizationEngine;
use gradecurve_core::model::LetterGrade;
use gradecurve_core::parser;
use gradecurve_core::report::CourseReport;
use gradecurve_core::traits::GradeStore;
use gradecurve_report::html::write_html_report;
use gradecurve_store::config::load_config_from;
use gradecurve_store::{create_store, MemoryStore};

use super::{effective_policy, grade_table};

pub async fn execute(
    course_path: PathBuf,
    config_path: Option<PathBuf>,
    output: Option<PathBuf>,
    format: String,
    persist: bool,
) -> Result<()> {
    let config = load_config_from(config_path.as_deref())?;
    let course = parser::parse_course_file(&course_path)?;
    let policy = effective_policy(&course, &config);
    tracing::debug!(course = %course.id, ?policy, "effective policy");

    let store: Arc<dyn GradeStore> = if persist {
        create_store(&config.store)?
    } else {
        Arc::new(MemoryStore::new())
    };
    let policies = config
        .policy_source()
        .with_course(course.id.clone(), policy.clone());
    let engine = FinalizationEngine::new(store, Arc::new(policies));

    eprintln!(
        "gradecurve v{}: finalizing {} ({} students)",
        env!("CARGO_PKG_VERSION"),
        course.name,
        course.students.len()
    );

    let scoring = engine
        .score_course(&course.id, &course.students)
        .await
        .with_context(|| format!("failed to score course '{}'", course.id))?;
    let warnings: Vec<String> = scoring
        .outcomes
        .iter()
        .flat_map(|o| &o.warnings)
        .map(|w| format!("{}: {}", w.student_id, w.message))
        .collect();

    let finalized = engine
        .finalize_course(&course.id)
        .await
        .with_context(|| format!("failed to finalize course '{}'", course.id))?;

    println!("{}", grade_table(&finalized.records));
    println!("{}", distribution_table(&finalized.summary));
    for w in &warnings {
        eprintln!("  WARNING: {w}");
    }

    let report = CourseReport::new(course.name.clone(), policy, finalized, warnings);
    let output = output.unwrap_or_else(|| config.output_dir.clone());
    let timestamp = report.created_at.format("%Y-%m-%dT%H%M%S");

    let formats: Vec<&str> = if format == "all" {
        vec!["json", "html"]
    } else {
        format.split(',').map(str::trim).collect()
    };

    for fmt in &formats {
        match *fmt {
            "json" => {
                let path = output.join(format!("{}-{timestamp}.json", report.course_id));
                report.save_json(&path)?;
                eprintln!("Report saved to: {}", path.display());
            }
            "html" => {
                let path = output.join(format!("{}-{timestamp}.html", report.course_id));
                write_html_report(&report, &path)?;
                eprintln!("HTML report: {}", path.display());
            }
            "none" => {}
            _ => {
                eprintln!("Unknown format: {fmt}");
            }
        }
    }

    Ok(())
}

fn distribution_table(summary: &gradecurve_core::model::CourseGradeSummary) -> Table {
    let mut table = Table::new();
    let mut header = vec!["Students".to_string()];
    header.extend(LetterGrade::ALL.iter().map(|g| g.to_string()));
    header.push("Average".into());
    table.set_header(header);

    let mut row = vec![summary.total_students.to_string()];
    row.extend(
        LetterGrade::ALL
            .iter()
            .map(|&g| summary.grade_counts.get(g).to_string()),
    );
    row.push(format!("{:.2}", summary.average_percentage));
    table.add_row(row);
    table
}
