//! gradecurve-core: Scoring, curve grading, and finalization.
//!
//! This crate defines the grade data model, the attendance codec, the score
//! aggregators, and the relative curve algorithm that the rest of gradecurve
//! builds on.

pub mod attendance;
pub mod curve;
pub mod engine;
pub mod error;
pub mod model;
pub mod parser;
pub mod policy;
pub mod report;
pub mod scoring;
pub mod statistics;
pub mod traits;

pub use error::{GradeError, StoreError};
