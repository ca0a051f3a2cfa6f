//! HTML report generator.
//!
//! Produces a self-contained HTML file with all CSS/JS inlined.

use anyhow::{Context, Result};
use chrono::SecondsFormat;
use std::path::Path;

use gradecurve_core::model::{GradeCounts, LetterGrade};
use gradecurve_core::report::CourseReport;
use gradecurve_core::statistics::{class_statistics, rank_percentile};

/// Escape a string for safe HTML insertion.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

fn grade_class(grade: Option<LetterGrade>) -> &'static str {
    match grade {
        Some(LetterGrade::F) => "fail",
        Some(_) => "pass",
        None => "",
    }
}

/// Generate an HTML report from a course report.
pub fn generate_html(report: &CourseReport) -> String {
    let mut html = String::new();
    let summary = &report.summary;

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    html.push_str(&format!(
        "<title>gradecurve report: {}</title>\n",
        html_escape(&report.course_name)
    ));
    html.push_str("<style>\n");
    html.push_str(CSS);
    html.push_str("</style>\n");
    html.push_str("</head>\n<body>\n");

    // Header
    html.push_str("<header>\n");
    html.push_str(&format!(
        "<h1>{} ({})</h1>\n",
        html_escape(&report.course_name),
        html_escape(&report.course_id)
    ));
    html.push_str(&format!(
        "<p class=\"meta\">{} students | pass mark {}% | finalized {}</p>\n",
        summary.total_students,
        summary.passing_threshold,
        report.created_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    ));
    html.push_str("</header>\n");

    // Summary dashboard
    let stats = class_statistics(&report.records);
    html.push_str("<section class=\"dashboard\">\n");
    html.push_str("<h2>Summary</h2>\n");
    html.push_str("<table class=\"summary\">\n");
    html.push_str("<thead><tr><th>Passing</th><th>Failing</th><th>Average</th><th>Median</th><th>Highest</th><th>Lowest</th><th>Std dev</th></tr></thead>\n");
    html.push_str(&format!(
        "<tbody><tr><td>{}</td><td>{}</td><td>{:.2}%</td><td>{:.2}%</td><td>{:.2}%</td><td>{:.2}%</td><td>{:.2}</td></tr></tbody></table>\n",
        summary.passing_students,
        summary.failing_students,
        summary.average_percentage,
        stats.median,
        stats.highest,
        stats.lowest,
        stats.std_dev,
    ));
    html.push_str(&generate_distribution_chart(&summary.grade_counts));
    html.push_str("</section>\n");

    // Per-student records
    html.push_str("<section class=\"results\">\n");
    html.push_str("<h2>Grades</h2>\n");
    html.push_str("<table class=\"results-table\" id=\"results\">\n");
    html.push_str("<thead><tr><th onclick=\"sortTable(0)\">Student</th><th onclick=\"sortTable(1)\">Percentage</th><th onclick=\"sortTable(2)\">Grade</th><th onclick=\"sortTable(3)\">Rank</th><th onclick=\"sortTable(4)\">Top %</th></tr></thead>\n");
    html.push_str("<tbody>\n");

    let total = report.records.len();
    for r in &report.records {
        let grade = r
            .letter_grade
            .map_or_else(|| "-".to_string(), |g| g.to_string());
        let (rank, top) = match r.rank {
            Some(rank) => (
                rank.to_string(),
                format!("{:.2}", rank_percentile(rank, total)),
            ),
            None => ("-".to_string(), "-".to_string()),
        };
        html.push_str(&format!(
            "<tr class=\"{}\"><td>{}</td><td>{:.2}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            grade_class(r.letter_grade),
            html_escape(&r.student_id),
            r.percentage,
            grade,
            rank,
            top
        ));
    }

    html.push_str("</tbody></table>\n");
    html.push_str("</section>\n");

    if !report.warnings.is_empty() {
        html.push_str("<section class=\"warnings\">\n<h2>Warnings</h2>\n<ul>\n");
        for w in &report.warnings {
            html.push_str(&format!("<li>{}</li>\n", html_escape(w)));
        }
        html.push_str("</ul>\n</section>\n");
    }

    // Raw JSON
    html.push_str("<section class=\"raw-data\">\n");
    html.push_str("<details>\n<summary>Raw JSON Data</summary>\n");
    html.push_str("<pre><code>");
    html.push_str(&html_escape(
        &serde_json::to_string_pretty(report).unwrap_or_default(),
    ));
    html.push_str("</code></pre>\n");
    html.push_str("</details>\n</section>\n");

    html.push_str("<script>\n");
    html.push_str(JS);
    html.push_str("</script>\n");

    html.push_str("</body>\n</html>");
    html
}

/// Write an HTML report to a file.
pub fn write_html_report(report: &CourseReport, path: &Path) -> Result<()> {
    let html = generate_html(report);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, html)
        .with_context(|| format!("failed to write HTML report to {}", path.display()))?;
    Ok(())
}

/// Horizontal bar per letter grade, scaled to the largest band.
fn generate_distribution_chart(counts: &GradeCounts) -> String {
    let bar_height = 30;
    let max_width = 400;
    let padding = 10;
    let label_width = 60;

    let largest = LetterGrade::ALL
        .iter()
        .map(|&g| counts.get(g))
        .max()
        .unwrap_or(0)
        .max(1);
    let total_height = LetterGrade::ALL.len() * (bar_height + padding) + padding;

    let mut svg = format!(
        "<svg width=\"{}\" height=\"{}\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        label_width + max_width + 60,
        total_height
    );

    for (i, grade) in LetterGrade::ALL.iter().enumerate() {
        let y = i * (bar_height + padding) + padding;
        let count = counts.get(*grade);
        let width = count * max_width / largest;
        let color = if grade.is_passing() {
            "#22c55e"
        } else {
            "#ef4444"
        };

        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"14\" fill=\"currentColor\" text-anchor=\"end\" dominant-baseline=\"middle\">{}</text>\n",
            label_width - 10,
            y + bar_height / 2,
            grade
        ));
        svg.push_str(&format!(
            "  <rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" fill=\"{}\" rx=\"4\"/>\n",
            label_width, y, width, bar_height, color
        ));
        svg.push_str(&format!(
            "  <text x=\"{}\" y=\"{}\" font-size=\"12\" fill=\"currentColor\" dominant-baseline=\"middle\">{}</text>\n",
            label_width + width + 8,
            y + bar_height / 2,
            count
        ));
    }

    svg.push_str("</svg>\n");
    svg
}

const CSS: &str = r#"
:root { --bg: #fff; --fg: #1a1a1a; --border: #e5e7eb; --pass: #dcfce7; --fail: #fde2e2; }
@media (prefers-color-scheme: dark) {
  :root { --bg: #111827; --fg: #f9fafb; --border: #374151; --pass: #064e3b; --fail: #7f1d1d; }
}
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif; margin: 0; padding: 2rem; background: var(--bg); color: var(--fg); }
h1, h2 { margin-top: 2rem; }
.meta { color: #6b7280; }
table { border-collapse: collapse; width: 100%; margin: 1rem 0; }
th, td { border: 1px solid var(--border); padding: 0.5rem 1rem; text-align: left; }
th { background: var(--border); cursor: pointer; }
.pass { background: var(--pass); }
.fail { background: var(--fail); }
.warnings li { margin: 0.25rem 0; }
pre { overflow-x: auto; padding: 1rem; background: var(--border); border-radius: 8px; }
code { font-family: 'JetBrains Mono', 'Fira Code', monospace; font-size: 0.85rem; }
details { margin: 1rem 0; }
summary { cursor: pointer; font-weight: bold; }
svg { margin: 1rem 0; }
"#;

const JS: &str = r#"
function sortTable(col) {
  const table = document.getElementById('results');
  const tbody = table.querySelector('tbody');
  const rows = Array.from(tbody.querySelectorAll('tr'));
  const asc = table.dataset.sortCol == col && table.dataset.sortDir == 'asc' ? false : true;
  const key = cell => {
    const n = parseFloat(cell.textContent);
    return isNaN(n) ? cell.textContent : n;
  };
  rows.sort((a, b) => {
    const va = key(a.cells[col]);
    const vb = key(b.cells[col]);
    const cmp = typeof va === 'number' && typeof vb === 'number'
      ? va - vb
      : String(va).localeCompare(String(vb));
    return asc ? cmp : -cmp;
  });
  table.dataset.sortCol = col;
  table.dataset.sortDir = asc ? 'asc' : 'desc';
  rows.forEach(r => tbody.appendChild(r));
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use gradecurve_core::model::{CourseGradeSummary, StudentGradeRecord};
    use gradecurve_core::policy::CoursePolicy;

    fn make_test_report() -> CourseReport {
        let mut top = StudentGradeRecord::scored("s<1>", "CS101", 92.5);
        top.letter_grade = Some(LetterGrade::A);
        top.rank = Some(1);
        top.finalized = true;
        let mut low = StudentGradeRecord::scored("s2", "CS101", 41.0);
        low.letter_grade = Some(LetterGrade::F);
        low.finalized = true;

        let mut counts = GradeCounts::default();
        counts.increment(LetterGrade::A);
        counts.increment(LetterGrade::F);

        CourseReport {
            id: uuid::Uuid::nil(),
            created_at: chrono::Utc::now(),
            course_id: "CS101".into(),
            course_name: "Intro & Basics".into(),
            policy: CoursePolicy::default(),
            records: vec![top, low],
            summary: CourseGradeSummary {
                grade_counts: counts,
                total_students: 2,
                passing_students: 1,
                failing_students: 1,
                average_percentage: 66.75,
                passing_threshold: 60.0,
            },
            warnings: vec!["s2: no attendance recorded".into()],
        }
    }

    #[test]
    fn html_report_contains_required_elements() {
        let report = make_test_report();
        let html = generate_html(&report);

        assert!(html.contains("<html"));
        assert!(html.contains("</html>"));
        assert!(html.contains("Intro &amp; Basics"));
        assert!(html.contains("s&lt;1&gt;"));
        assert!(html.contains("66.75%"));
        assert!(html.contains("no attendance recorded"));
        assert!(html.contains("<svg"));
    }

    #[test]
    fn html_report_write_to_file() {
        let report = make_test_report();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.html");

        write_html_report(&report, &path).unwrap();
        assert!(path.exists());

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("<html"));
    }
}
