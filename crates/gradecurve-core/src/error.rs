//! Error types for scoring, finalization, and persistence.
//!
//! `StoreError` lives here rather than in `gradecurve-store` so the engine can
//! classify collaborator failures without string matching.

use thiserror::Error;

/// Errors produced while scoring or finalizing a course.
#[derive(Debug, Error)]
pub enum GradeError {
    /// The course policy holds values the computation cannot work with.
    #[error("invalid course policy: {0}")]
    Config(String),

    /// There are no students to finalize.
    #[error("roster for course '{course_id}' is empty")]
    EmptyRoster { course_id: String },

    /// The roster itself is inconsistent (duplicates, mixed courses, bad percentages).
    #[error("invalid roster: {0}")]
    InvalidRoster(String),

    /// Component data for a student was missing or unusable.
    #[error("computation problem for student '{student_id}': {message}")]
    Computation { student_id: String, message: String },

    /// Failure reported by the persistence collaborator.
    #[error(transparent)]
    Persistence(#[from] StoreError),
}

impl GradeError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        GradeError::Config(message.into())
    }

    pub(crate) fn computation(student_id: &str, message: impl Into<String>) -> Self {
        GradeError::Computation {
            student_id: student_id.to_string(),
            message: message.into(),
        }
    }
}

/// Errors that can occur when talking to a persistence or policy collaborator.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested course or record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Reading or writing the backing storage failed.
    #[error("storage I/O error: {0}")]
    Io(String),

    /// Stored data could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backend is temporarily unreachable.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Returns `true` if retrying the same call cannot succeed.
    ///
    /// Retrying is always the caller's decision; the engine never retries.
    pub fn is_permanent(&self) -> bool {
        matches!(self, StoreError::NotFound(_) | StoreError::Serialization(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_classification() {
        assert!(StoreError::NotFound("CS101".into()).is_permanent());
        assert!(StoreError::Serialization("bad json".into()).is_permanent());
        assert!(!StoreError::Io("disk full".into()).is_permanent());
        assert!(!StoreError::Unavailable("timeout".into()).is_permanent());
    }

    #[test]
    fn persistence_error_is_transparent() {
        let err: GradeError = StoreError::Io("disk full".into()).into();
        assert_eq!(err.to_string(), "storage I/O error: disk full");
    }
}
