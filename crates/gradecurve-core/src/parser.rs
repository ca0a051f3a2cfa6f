//! TOML course file parser.
//!
//! Loads course rosters (policy plus per-student raw inputs) from TOML files
//! and directories, and validates them.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::attendance;
use crate::model::AssignmentScore;
use crate::policy::CoursePolicy;
use crate::scoring::StudentInput;

/// A course as described by a course file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseFile {
    pub id: String,
    pub name: String,
    /// Policy given in the file, if any. Callers fall back to their configured policy.
    pub policy: Option<CoursePolicy>,
    pub students: Vec<StudentInput>,
}

/// Intermediate TOML structure for course files.
#[derive(Debug, Deserialize)]
struct TomlCourseFile {
    course: TomlCourseHeader,
    #[serde(default)]
    students: Vec<TomlStudent>,
}

#[derive(Debug, Deserialize)]
struct TomlCourseHeader {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    policy: Option<CoursePolicy>,
}

#[derive(Debug, Deserialize)]
struct TomlStudent {
    id: String,
    #[serde(default)]
    attendance: Option<String>,
    #[serde(default)]
    percentage: Option<f64>,
    #[serde(default)]
    assignments: Vec<TomlAssignment>,
}

#[derive(Debug, Deserialize)]
struct TomlAssignment {
    name: String,
    score: f64,
    max_score: f64,
}

/// Parse a single TOML course file.
pub fn parse_course_file(path: &Path) -> Result<CourseFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read course file: {}", path.display()))?;

    parse_course_str(&content, path)
}

/// Parse TOML course text (useful for testing).
pub fn parse_course_str(content: &str, source_path: &Path) -> Result<CourseFile> {
    let parsed: TomlCourseFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;

    let students = parsed
        .students
        .into_iter()
        .map(|s| StudentInput {
            student_id: s.id,
            attendance: s.attendance,
            assignments: s
                .assignments
                .into_iter()
                .map(|a| AssignmentScore {
                    name: a.name,
                    score: a.score,
                    max_score: a.max_score,
                })
                .collect(),
            percentage: s.percentage,
        })
        .collect();

    let name = parsed
        .course
        .name
        .unwrap_or_else(|| parsed.course.id.clone());

    Ok(CourseFile {
        id: parsed.course.id,
        name,
        policy: parsed.course.policy,
        students,
    })
}

/// Recursively load all `.toml` course files from a directory.
pub fn load_course_directory(dir: &Path) -> Result<Vec<CourseFile>> {
    let mut courses = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    let mut entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();

        if path.is_dir() {
            courses.extend(load_course_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_course_file(&path) {
                Ok(course) => courses.push(course),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(courses)
}

/// Load a single file or every course file under a directory.
pub fn load_courses(path: &Path) -> Result<Vec<CourseFile>> {
    if path.is_dir() {
        load_course_directory(path)
    } else {
        Ok(vec![parse_course_file(path)?])
    }
}

/// A warning from course validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The student ID (if applicable).
    pub student_id: Option<String>,
    pub message: String,
}

/// Validate a course for common issues.
pub fn validate_course(course: &CourseFile, fallback: &CoursePolicy) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let policy = course.policy.as_ref().unwrap_or(fallback);

    if let Err(e) = policy.validate() {
        warnings.push(ValidationWarning {
            student_id: None,
            message: e.to_string(),
        });
    }

    if policy.quota_percent.total() != 100 {
        warnings.push(ValidationWarning {
            student_id: None,
            message: format!(
                "band quotas add up to {}%, not 100%",
                policy.quota_percent.total()
            ),
        });
    }

    if course.students.is_empty() {
        warnings.push(ValidationWarning {
            student_id: None,
            message: "course has no students".into(),
        });
    }

    let mut seen_ids = HashSet::new();
    for student in &course.students {
        if !seen_ids.insert(&student.student_id) {
            warnings.push(ValidationWarning {
                student_id: Some(student.student_id.clone()),
                message: format!("duplicate student ID: {}", student.student_id),
            });
        }
    }

    for student in &course.students {
        let mut warn = |message: String| {
            warnings.push(ValidationWarning {
                student_id: Some(student.student_id.clone()),
                message,
            })
        };

        if let Some(p) = student.percentage {
            if !(0.0..=100.0).contains(&p) {
                warn(format!("percentage {p} is outside [0, 100]"));
            }
            if student.attendance.is_some() || !student.assignments.is_empty() {
                warn("percentage is given, attendance and assignments will be ignored".into());
            }
            continue;
        }

        match &student.attendance {
            Some(text) => {
                let ledger = attendance::decode(text);
                if policy.total_sessions > 0 {
                    if let Some(last) = ledger.last_session() {
                        if last > policy.total_sessions as u32 {
                            warn(format!(
                                "attendance records session {last} but the course has {} sessions",
                                policy.total_sessions
                            ));
                        }
                    }
                }
                if ledger.is_empty() && !text.trim().is_empty() {
                    warn(format!("attendance '{text}' has no readable sessions"));
                }
            }
            None => warn("no attendance recorded".into()),
        }

        for a in &student.assignments {
            if a.score < 0.0 || a.score > a.max_score {
                warn(format!(
                    "assignment '{}' score {} is outside [0, {}]",
                    a.name, a.score, a.max_score
                ));
            }
        }
    }

    warnings
}
