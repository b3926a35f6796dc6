//! Compliance report model and plain-text rendering

use sendcheck_core::{ComplianceVerdict, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Maximum number of source characters kept in the excerpt
pub const EXCERPT_LIMIT: usize = 500;

/// Appended to the excerpt when the source was cut
pub const TRUNCATION_MARKER: &str = "... [truncated]";

/// Shown in place of a violation list for passing verdicts
pub const NO_ISSUES_MESSAGE: &str = "No compliance issues found.";

const TITLE: &str = "Compliance Report";

/// Rendered outcome of one compliance evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Whether the evaluated content passed
    pub passed: bool,

    /// One-line summary
    pub status_line: String,

    /// Violation descriptions in verdict order, empty when passed
    pub violations: Vec<String>,

    /// Leading part of the evaluated content
    pub excerpt: String,

    /// Whether the excerpt was cut
    pub truncated: bool,
}

impl Report {
    /// Build a report for a verdict and the content it was computed on
    pub fn build(verdict: &ComplianceVerdict, source_content: &str) -> Self {
        let status_line = if verdict.passed() {
            "Status: PASSED - no compliance issues found".to_string()
        } else {
            format!(
                "Status: FAILED - {} compliance issue(s) found",
                verdict.violations().len()
            )
        };

        let violations = verdict
            .violations()
            .iter()
            .map(|v| v.describe())
            .collect();

        let (excerpt, truncated) = excerpt(source_content);

        Self {
            passed: verdict.passed(),
            status_line,
            violations,
            excerpt,
            truncated,
        }
    }

    /// Lines of the report, shared by every output format
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            TITLE.to_string(),
            "=".repeat(TITLE.len()),
            String::new(),
            self.status_line.clone(),
            String::new(),
            "Violations:".to_string(),
        ];

        if self.violations.is_empty() {
            lines.push(format!("  {}", NO_ISSUES_MESSAGE));
        } else {
            lines.extend(
                self.violations
                    .iter()
                    .enumerate()
                    .map(|(i, v)| format!("  {}. {}", i + 1, v)),
            );
        }

        lines.push(String::new());
        lines.push("Content excerpt:".to_string());
        lines.extend(self.excerpt.lines().map(str::to_string));
        lines
    }

    /// Render as plain text
    pub fn to_text(&self) -> String {
        let mut text = self.lines().join("\n");
        text.push('\n');
        text
    }

    /// Render as a paginated PDF document
    pub fn to_pdf(&self) -> Result<Vec<u8>> {
        crate::pdf::render(TITLE, &self.lines())
    }

    /// Write the report, choosing the format from the file extension
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<ReportFormat> {
        let path = path.as_ref();
        let format = ReportFormat::from_path(path);
        let bytes = match format {
            ReportFormat::Text => self.to_text().into_bytes(),
            ReportFormat::Pdf => self.to_pdf()?,
            ReportFormat::Json => serde_json::to_vec_pretty(self)?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, bytes).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to write report '{}': {}", path.display(), e),
            ))
        })?;

        tracing::info!(path = %path.display(), format = ?format, "Report written");
        Ok(format)
    }
}

/// Output format of a written report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Plain text
    Text,
    /// PDF document
    Pdf,
    /// JSON document
    Json,
}

impl ReportFormat {
    /// Pick a format from a file extension, defaulting to text
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("pdf") => Self::Pdf,
            Some("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// First [`EXCERPT_LIMIT`] characters of `content`, marked when cut
pub fn excerpt(content: &str) -> (String, bool) {
    match content.char_indices().nth(EXCERPT_LIMIT) {
        Some((cut, _)) => (format!("{}{}", &content[..cut], TRUNCATION_MARKER), true),
        None => (content.to_string(), false),
    }
}
