//! The `gradecurve init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("gradecurve.toml").exists() {
        println!("gradecurve.toml already exists, skipping.");
    } else {
        std::fs::write("gradecurve.toml", SAMPLE_CONFIG)?;
        println!("Created gradecurve.toml");
    }

    std::fs::create_dir_all("courses")?;
    let example_path = std::path::Path::new("courses/example.toml");
    if example_path.exists() {
        println!("courses/example.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_COURSE)?;
        println!("Created courses/example.toml");
    }

    println!("\nNext steps:");
    println!("  1. Edit gradecurve.toml to pick a store and default policy");
    println!("  2. Run: gradecurve validate --course courses/example.toml");
    println!("  3. Run: gradecurve finalize --course courses/example.toml --format all");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# gradecurve configuration

output_dir = "./gradecurve-reports"

# Where finalized records go when running with --persist.
[store]
type = "json"
path = "./gradecurve-data/grades.json"

# Policy for courses that do not define their own.
[default_policy]
passing_threshold_percent = 60
late_penalty_per_session = 0
total_sessions = 80
attendance_max_score = 20

[default_policy.quota_percent]
a = 30
b = 40
c = 20
d = 10

# Per-course overrides replace the default policy entirely.
# [courses.CS101]
# passing_threshold_percent = 55
# total_sessions = 30
"#;

const EXAMPLE_COURSE: &str = r#"[course]
id = "EXAMPLE101"
name = "Example Course"

[course.policy]
passing_threshold_percent = 60
total_sessions = 4
attendance_max_score = 20
late_penalty_per_session = 0.5

[[students]]
id = "s001"
attendance = "1P2P3P4P"

[[students.assignments]]
name = "midterm"
score = 38
max_score = 40

[[students.assignments]]
name = "final"
score = 37
max_score = 40

[[students]]
id = "s002"
attendance = "1P2L3P4A"

[[students.assignments]]
name = "midterm"
score = 30
max_score = 40

[[students.assignments]]
name = "final"
score = 28
max_score = 40

[[students]]
id = "s003"
attendance = "1A2A3P4A"

[[students.assignments]]
name = "midterm"
score = 12
max_score = 40

[[students.assignments]]
name = "final"
score = 15
max_score = 40

[[students]]
id = "s004"
percentage = 71.5
"#;
