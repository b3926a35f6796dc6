//! Compliance evaluation engine

use async_trait::async_trait;
use sendcheck_core::{ComplianceVerdict, Result, Violation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::delegated::DelegatedEvaluator;
use crate::rule::RuleSet;

/// Trait for all compliance evaluators
///
/// Implementations receive the visible text of a template and the active
/// rule set and return a verdict whose violations follow rule order.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// Evaluate plain text against the rule set
    async fn evaluate(&self, plain_text: &str, rules: &RuleSet) -> Result<ComplianceVerdict>;

    /// Evaluator name
    fn name(&self) -> &str;

    /// Whether identical input always yields an identical verdict
    fn is_deterministic(&self) -> bool;
}

/// Which backing strategy computes verdicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EvaluatorStrategy {
    /// Substring matching against trigger phrases
    #[default]
    Keyword,
    /// Outsourced analysis by a text-analysis collaborator
    Delegated,
}

/// Substring-matching evaluator
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordEvaluator;

impl KeywordEvaluator {
    /// Create a keyword evaluator
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Evaluator for KeywordEvaluator {
    async fn evaluate(&self, plain_text: &str, rules: &RuleSet) -> Result<ComplianceVerdict> {
        Ok(evaluate_keywords(plain_text, rules))
    }

    fn name(&self) -> &str {
        "keyword"
    }

    fn is_deterministic(&self) -> bool {
        true
    }
}

/// Evaluate text against trigger phrases
///
/// For each enabled rule in order, the first of its trigger phrases found in
/// the lowercased text records one violation for that rule. Rules with
/// qualifiers additionally need one qualifier to be present.
pub fn evaluate_keywords(plain_text: &str, rules: &RuleSet) -> ComplianceVerdict {
    let lowered = plain_text.to_lowercase();
    let hits = rules.phrase_hits(&lowered);

    let mut violations = Vec::new();
    for (rule, compiled) in rules.rules().iter().zip(rules.compiled()) {
        if !rule.enabled {
            continue;
        }

        let matched = compiled.phrases.iter().position(|&id| hits[id]);
        let Some(phrase_idx) = matched else {
            continue;
        };

        if !compiled.qualifiers.is_empty() && !compiled.qualifiers.iter().any(|&id| hits[id]) {
            continue;
        }

        let phrase = &rule.trigger_phrases[phrase_idx];
        debug!(rule = %rule.name, phrase = %phrase, "Rule triggered");
        violations.push(Violation::new(&rule.name, phrase, &rule.explanation));
    }

    ComplianceVerdict::from_violations(violations)
}

/// Evaluator selected by configuration
pub enum ComplianceEvaluator {
    /// Deterministic keyword matching
    Keyword(KeywordEvaluator),
    /// Collaborator-backed analysis
    Delegated(DelegatedEvaluator),
}

impl ComplianceEvaluator {
    /// Keyword evaluator
    pub fn keyword() -> Self {
        Self::Keyword(KeywordEvaluator::new())
    }

    /// Strategy backing this evaluator
    pub fn strategy(&self) -> EvaluatorStrategy {
        match self {
            Self::Keyword(_) => EvaluatorStrategy::Keyword,
            Self::Delegated(_) => EvaluatorStrategy::Delegated,
        }
    }
}

#[async_trait]
impl Evaluator for ComplianceEvaluator {
    async fn evaluate(&self, plain_text: &str, rules: &RuleSet) -> Result<ComplianceVerdict> {
        let verdict = match self {
            Self::Keyword(inner) => inner.evaluate(plain_text, rules).await?,
            Self::Delegated(inner) => inner.evaluate(plain_text, rules).await?,
        };

        debug!(
            evaluator = %self.name(),
            passed = verdict.passed(),
            violations = verdict.violations().len(),
            "Evaluation complete"
        );
        Ok(verdict)
    }

    fn name(&self) -> &str {
        match self {
            Self::Keyword(inner) => inner.name(),
            Self::Delegated(inner) => inner.name(),
        }
    }

    fn is_deterministic(&self) -> bool {
        match self {
            Self::Keyword(inner) => inner.is_deterministic(),
            Self::Delegated(inner) => inner.is_deterministic(),
        }
    }
}
