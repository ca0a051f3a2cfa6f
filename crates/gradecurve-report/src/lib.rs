//! gradecurve-report: Report rendering for finalized courses.

pub mod html;

pub use html::{generate_html, write_html_report};
