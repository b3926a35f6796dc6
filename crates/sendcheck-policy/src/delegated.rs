//! Delegated compliance analysis
//!
//! Forwards the visible template text and a description of the rule set to
//! an external text-analysis collaborator (typically a generative language
//! model) and turns its answer into a [`ComplianceVerdict`].
//!
//! The collaborator is asked to answer with JSON of the form:
//!
//! ```json
//! {"compliant": false, "violations": [{"rule": "guaranteed-returns", "phrase": "assured income", "explanation": "..."}]}
//! ```
//!
//! Answers that cannot be read as that document are errors. A verdict is
//! never reported as passing because the collaborator's reply was unusable.

use async_trait::async_trait;
use sendcheck_core::{ComplianceVerdict, Error, Result, Violation};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::engine::Evaluator;
use crate::rule::RuleSet;

/// Upper bound on guideline text forwarded with each analysis
pub const MAX_GUIDELINE_CHARS: usize = 20_000;

/// Rule name used when the collaborator flags the text without naming a rule
pub const UNSPECIFIED_RULE: &str = "delegated-analysis";

/// Text-analysis collaborator
#[async_trait]
pub trait Analyze: Send + Sync {
    /// Analyse visible text against a textual description of the rules
    async fn analyze(&self, visible_text: &str, rules_description: &str) -> Result<String>;

    /// Collaborator name
    fn name(&self) -> &str;
}

/// Evaluator backed by an [`Analyze`] collaborator
pub struct DelegatedEvaluator {
    analyzer: Arc<dyn Analyze>,
    guidelines: Option<String>,
}

impl DelegatedEvaluator {
    /// Create a delegated evaluator
    pub fn new(analyzer: Arc<dyn Analyze>) -> Self {
        Self {
            analyzer,
            guidelines: None,
        }
    }

    /// Attach regulator guideline text as extra analysis context
    pub fn with_guidelines(mut self, guidelines: impl Into<String>) -> Self {
        let guidelines: String = guidelines.into();
        let bounded: String = guidelines.chars().take(MAX_GUIDELINE_CHARS).collect();
        if bounded.len() < guidelines.len() {
            debug!(limit = MAX_GUIDELINE_CHARS, "Guideline text truncated");
        }
        self.guidelines = Some(bounded);
        self
    }

    /// Build the rules description sent to the collaborator
    pub fn rules_description(&self, rules: &RuleSet) -> String {
        let mut description = rules.describe();
        if let Some(guidelines) = &self.guidelines {
            description.push_str("\nRegulator guidelines:\n");
            description.push_str(guidelines);
            description.push('\n');
        }
        description
    }
}

#[async_trait]
impl Evaluator for DelegatedEvaluator {
    async fn evaluate(&self, plain_text: &str, rules: &RuleSet) -> Result<ComplianceVerdict> {
        let description = self.rules_description(rules);
        let answer = self.analyzer.analyze(plain_text, &description).await?;
        debug!(
            analyzer = %self.analyzer.name(),
            answer_len = answer.len(),
            "Received analysis"
        );
        parse_analysis(&answer, rules)
    }

    fn name(&self) -> &str {
        "delegated"
    }

    fn is_deterministic(&self) -> bool {
        false
    }
}

#[derive(Debug, Deserialize)]
struct AnalysisDocument {
    compliant: bool,

    #[serde(default)]
    violations: Vec<AnalysisViolation>,
}

#[derive(Debug, Deserialize)]
struct AnalysisViolation {
    #[serde(default)]
    rule: Option<String>,

    #[serde(default)]
    phrase: String,

    #[serde(default)]
    explanation: String,
}

/// Turn a collaborator answer into a verdict ordered by rule position
///
/// Violations naming a known rule are sorted into rule-set order; unknown
/// rule names follow in the order the collaborator listed them.
///
/// The `compliant` flag is required. An answer without it, or one claiming
/// compliance while listing violations, is an error.
pub fn parse_analysis(answer: &str, rules: &RuleSet) -> Result<ComplianceVerdict> {
    let body = strip_code_fence(answer);
    let document: AnalysisDocument = serde_json::from_str(body).map_err(|e| {
        Error::collaborator("analysis", format!("unreadable analysis answer: {}", e))
    })?;

    if document.compliant && !document.violations.is_empty() {
        return Err(Error::collaborator(
            "analysis",
            format!(
                "contradictory analysis answer: compliant with {} violation(s)",
                document.violations.len()
            ),
        ));
    }

    let mut violations: Vec<(usize, Violation)> = document
        .violations
        .into_iter()
        .map(|v| {
            let rule_name = v
                .rule
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| UNSPECIFIED_RULE.to_string());
            let explanation = if v.explanation.is_empty() {
                rules
                    .position(&rule_name)
                    .map(|idx| rules.rules()[idx].explanation.clone())
                    .unwrap_or_default()
            } else {
                v.explanation
            };
            let order = rules.position(&rule_name).unwrap_or(usize::MAX);
            (order, Violation::new(rule_name, v.phrase, explanation))
        })
        .collect();
    violations.sort_by_key(|(order, _)| *order);

    let mut violations: Vec<Violation> = violations.into_iter().map(|(_, v)| v).collect();

    if !document.compliant && violations.is_empty() {
        warn!("Analysis reported non-compliance without listing violations");
        violations.push(Violation::new(
            UNSPECIFIED_RULE,
            "",
            "Analysis reported the content as non-compliant without details.",
        ));
    }

    Ok(ComplianceVerdict::from_violations(violations))
}

fn strip_code_fence(answer: &str) -> &str {
    let trimmed = answer.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // drop an optional language tag on the opening fence
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
