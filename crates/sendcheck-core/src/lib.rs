//! SendCheck Core
//!
//! Core types, traits, and utilities shared across SendCheck components.
//!
//! This crate provides:
//! - The campaign data model (recipients, templates, verdicts, send tallies)
//! - Error types and result handling
//! - Recipient table loading and validation
//! - Visible-text extraction from HTML templates

pub mod error;
pub mod extract;
pub mod recipients;
pub mod types;

pub use error::{Error, Result};
pub use extract::extract_visible_text;
pub use recipients::{load_recipients, load_recipients_from_path};
pub use types::{
    personalize, ComplianceVerdict, Recipient, SendResult, Template, Violation,
    FIRST_NAME_PLACEHOLDER,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::extract::extract_visible_text;
    pub use crate::types::{ComplianceVerdict, Recipient, SendResult, Template, Violation};
}
