//! Core types for SendCheck

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Placeholder replaced with the recipient's given name at send time
pub const FIRST_NAME_PLACEHOLDER: &str = "{first_name}";

/// A single campaign recipient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    /// Destination address
    pub email: String,

    /// Given name substituted into the template
    pub first_name: String,
}

impl Recipient {
    /// Create a new recipient
    pub fn new(email: impl Into<String>, first_name: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            first_name: first_name.into(),
        }
    }
}

/// A rule that matched during compliance evaluation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Name of the rule that fired
    pub rule_name: String,

    /// The trigger phrase that was found
    pub matched_phrase: String,

    /// Why the phrase is not allowed
    pub explanation: String,
}

impl Violation {
    /// Create a new violation
    pub fn new(
        rule_name: impl Into<String>,
        matched_phrase: impl Into<String>,
        explanation: impl Into<String>,
    ) -> Self {
        Self {
            rule_name: rule_name.into(),
            matched_phrase: matched_phrase.into(),
            explanation: explanation.into(),
        }
    }

    /// One-line description used in reports and logs
    pub fn describe(&self) -> String {
        format!(
            "[{}] \"{}\": {}",
            self.rule_name, self.matched_phrase, self.explanation
        )
    }
}

/// Outcome of one compliance evaluation
///
/// `passed` is derived from the violation list, so a verdict can never claim
/// to pass while carrying violations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceVerdict {
    violations: Vec<Violation>,
}

impl ComplianceVerdict {
    /// A verdict with no violations
    pub fn pass() -> Self {
        Self::default()
    }

    /// Build a verdict from violations in evaluation order
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    /// True iff no rule matched
    pub fn passed(&self) -> bool {
        self.violations.is_empty()
    }

    /// Violations in rule-evaluation order
    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }
}

/// Running tally of a campaign send
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendResult {
    /// Deliveries accepted by the collaborator
    pub success_count: usize,

    /// Deliveries rejected or errored
    pub failure_count: usize,
}

impl SendResult {
    /// Count one accepted delivery
    pub fn record_success(&mut self) {
        self.success_count += 1;
    }

    /// Count one failed delivery
    pub fn record_failure(&mut self) {
        self.failure_count += 1;
    }

    /// Number of recipients attempted
    pub fn attempted(&self) -> usize {
        self.success_count + self.failure_count
    }
}

/// Raw HTML/text email template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    content: String,
}

impl Template {
    /// Wrap template content
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
        }
    }

    /// Decode an uploaded template, rejecting invalid UTF-8
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        String::from_utf8(bytes)
            .map(Self::new)
            .map_err(|e| Error::extraction(format!("template is not valid UTF-8: {}", e)))
    }

    /// The unsubstituted content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Whether the template carries at least one placeholder
    pub fn has_placeholder(&self) -> bool {
        self.content.contains(FIRST_NAME_PLACEHOLDER)
    }

    /// Substitute every placeholder with the given name
    pub fn personalize(&self, first_name: &str) -> String {
        personalize(&self.content, first_name)
    }
}

/// Replace every `{first_name}` in `body` with `first_name`
pub fn personalize(body: &str, first_name: &str) -> String {
    body.replace(FIRST_NAME_PLACEHOLDER, first_name)
}
