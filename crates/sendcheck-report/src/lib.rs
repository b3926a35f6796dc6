//! SendCheck Reports
//!
//! Turns a compliance verdict and the content it was computed on into a
//! downloadable artifact: a status line, the violation list (or an
//! empty-state message) and a bounded excerpt of the source.
//!
//! Reports render as plain text, JSON, or a simple paginated PDF.

pub mod pdf;
pub mod report;

pub use report::{
    excerpt, Report, ReportFormat, EXCERPT_LIMIT, NO_ISSUES_MESSAGE, TRUNCATION_MARKER,
};
