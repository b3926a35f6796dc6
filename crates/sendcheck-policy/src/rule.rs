//! Rule and rule set definitions

use aho_corasick::AhoCorasick;
use sendcheck_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A single named compliance rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Rule identifier, reported on violations
    pub name: String,

    /// Literal phrases whose presence violates the rule, checked in order
    pub trigger_phrases: Vec<String>,

    /// Message shown to the operator when the rule fires
    pub explanation: String,

    /// Words of which at least one must also appear for the rule to fire
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub qualifiers: Vec<String>,

    /// Whether this rule is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Rule {
    /// Create an enabled rule without qualifiers
    pub fn new<I, S>(name: impl Into<String>, trigger_phrases: I, explanation: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            trigger_phrases: trigger_phrases.into_iter().map(Into::into).collect(),
            explanation: explanation.into(),
            qualifiers: Vec::new(),
            enabled: true,
        }
    }

    /// Require one of `qualifiers` to co-occur with a trigger phrase
    pub fn with_qualifiers<I, S>(mut self, qualifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.qualifiers = qualifiers.into_iter().map(Into::into).collect();
        self
    }
}

fn default_true() -> bool {
    true
}

/// On-disk rule set document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleSetDocument {
    /// Rule set name
    pub name: String,

    /// What the rule set enforces
    #[serde(default)]
    pub description: String,

    /// Version of the rule set
    #[serde(default)]
    pub version: String,

    /// Regulatory framework the rules derive from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regulation: Option<String>,

    /// Rules in evaluation order
    pub rules: Vec<Rule>,
}

/// Phrase positions inside the shared matcher
#[derive(Debug, Clone)]
pub(crate) struct CompiledRule {
    pub(crate) phrases: Vec<usize>,
    pub(crate) qualifiers: Vec<usize>,
}

/// An ordered, validated collection of rules
///
/// Every distinct lowercased phrase and qualifier is compiled into one
/// Aho-Corasick automaton so a template is scanned once regardless of how
/// many rules the set holds.
#[derive(Debug, Clone)]
pub struct RuleSet {
    document: RuleSetDocument,
    matcher: Option<AhoCorasick>,
    pattern_count: usize,
    compiled: Vec<CompiledRule>,
}

impl RuleSet {
    /// Validate and compile a rule set document
    pub fn new(document: RuleSetDocument) -> Result<Self> {
        let mut seen = std::collections::HashSet::new();
        for rule in &document.rules {
            if rule.name.trim().is_empty() {
                return Err(Error::config(format!(
                    "rule set '{}' contains a rule without a name",
                    document.name
                )));
            }
            if !seen.insert(rule.name.as_str()) {
                return Err(Error::config(format!("duplicate rule name '{}'", rule.name)));
            }
            if rule.trigger_phrases.is_empty() {
                return Err(Error::config(format!(
                    "rule '{}' has no trigger phrases",
                    rule.name
                )));
            }
            if rule
                .trigger_phrases
                .iter()
                .chain(&rule.qualifiers)
                .any(|p| p.trim().is_empty())
            {
                return Err(Error::config(format!(
                    "rule '{}' contains an empty phrase",
                    rule.name
                )));
            }
        }

        let mut patterns: Vec<String> = Vec::new();
        let mut ids: HashMap<String, usize> = HashMap::new();
        let mut intern = |phrase: &str| -> usize {
            let key = phrase.to_lowercase();
            *ids.entry(key.clone()).or_insert_with(|| {
                patterns.push(key);
                patterns.len() - 1
            })
        };

        let compiled: Vec<CompiledRule> = document
            .rules
            .iter()
            .map(|rule| CompiledRule {
                phrases: rule.trigger_phrases.iter().map(|p| intern(p)).collect(),
                qualifiers: rule.qualifiers.iter().map(|q| intern(q)).collect(),
            })
            .collect();

        let matcher = if patterns.is_empty() {
            None
        } else {
            Some(AhoCorasick::new(&patterns).map_err(|e| {
                Error::config(format!("failed to build phrase matcher: {}", e))
            })?)
        };

        tracing::debug!(
            rule_set = %document.name,
            rules = document.rules.len(),
            patterns = patterns.len(),
            "Compiled rule set"
        );

        Ok(Self {
            document,
            matcher,
            pattern_count: patterns.len(),
            compiled,
        })
    }

    /// Load a rule set from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let document: RuleSetDocument = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("invalid rule set YAML: {}", e)))?;
        Self::new(document)
    }

    /// Load a rule set from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read rule set '{}': {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    /// The regulator-derived default rule set
    pub fn builtin() -> Self {
        // Validated by test_builtin_rule_set_is_valid
        Self::new(crate::builtin::sebi_advertising_code())
            .unwrap_or_else(|e| unreachable!("built-in rule set is invalid: {}", e))
    }

    /// Rule set name
    pub fn name(&self) -> &str {
        &self.document.name
    }

    /// The underlying document
    pub fn document(&self) -> &RuleSetDocument {
        &self.document
    }

    /// All rules in evaluation order
    pub fn rules(&self) -> &[Rule] {
        &self.document.rules
    }

    /// Number of enabled rules
    pub fn active_count(&self) -> usize {
        self.document.rules.iter().filter(|r| r.enabled).count()
    }

    /// Indices of every phrase that occurs in `lowered` text
    pub(crate) fn phrase_hits(&self, lowered: &str) -> Vec<bool> {
        let mut hits = vec![false; self.pattern_count];
        if let Some(matcher) = &self.matcher {
            for m in matcher.find_overlapping_iter(lowered) {
                hits[m.pattern().as_usize()] = true;
            }
        }
        hits
    }

    pub(crate) fn compiled(&self) -> &[CompiledRule] {
        &self.compiled
    }

    /// Position of a rule by name
    pub fn position(&self, rule_name: &str) -> Option<usize> {
        self.document.rules.iter().position(|r| r.name == rule_name)
    }

    /// Human-readable rule listing, used as analysis context
    pub fn describe(&self) -> String {
        let mut out = format!("Rule set: {}", self.document.name);
        if let Some(regulation) = &self.document.regulation {
            out.push_str(&format!(" ({})", regulation));
        }
        out.push('\n');

        for rule in self.document.rules.iter().filter(|r| r.enabled) {
            out.push_str(&format!(
                "- {}: {} Trigger phrases: {}.",
                rule.name,
                rule.explanation,
                rule.trigger_phrases.join(", ")
            ));
            if !rule.qualifiers.is_empty() {
                out.push_str(&format!(
                    " Only when the text also mentions one of: {}.",
                    rule.qualifiers.join(", ")
                ));
            }
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_set_deserialization() {
        let yaml = r#"
name: test-rules
description: Test rules
version: "1.0"
rules:
  - name: no-guarantees
    trigger_phrases: ["guaranteed", "assured"]
    explanation: Do not guarantee anything
  - name: percent
    trigger_phrases: ["%"]
    qualifiers: ["return"]
    explanation: Clarify percentages
    enabled: false
"#;

        let rules = RuleSet::from_yaml(yaml).unwrap();
        assert_eq!(rules.name(), "test-rules");
        assert_eq!(rules.rules().len(), 2);
        assert_eq!(rules.active_count(), 1);
        assert!(rules.rules()[0].enabled);
        assert_eq!(rules.rules()[1].qualifiers, vec!["return"]);
    }

    #[test]
    fn test_duplicate_rule_names_rejected() {
        let document = RuleSetDocument {
            name: "dup".to_string(),
            description: String::new(),
            version: String::new(),
            regulation: None,
            rules: vec![
                Rule::new("a", ["x"], "first"),
                Rule::new("a", ["y"], "second"),
            ],
        };
        assert!(matches!(RuleSet::new(document), Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_phrase_rejected() {
        let yaml = r#"
name: bad
rules:
  - name: empty
    trigger_phrases: ["  "]
    explanation: matches everything
"#;
        assert!(RuleSet::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_rule_without_phrases_rejected() {
        let yaml = "name: bad\nrules:\n  - name: none\n    trigger_phrases: []\n    explanation: x\n";
        assert!(RuleSet::from_yaml(yaml).is_err());
    }

    #[test]
    fn test_shared_phrases_are_interned_once() {
        let document = RuleSetDocument {
            name: "shared".to_string(),
            description: String::new(),
            version: String::new(),
            regulation: None,
            rules: vec![
                Rule::new("a", ["Return"], "first"),
                Rule::new("b", ["return", "growth"], "second"),
            ],
        };
        let rules = RuleSet::new(document).unwrap();
        assert_eq!(rules.pattern_count, 2);
        assert_eq!(rules.compiled()[0].phrases, rules.compiled()[1].phrases[..1]);
    }

    #[test]
    fn test_builtin_rule_set_is_valid() {
        let document = crate::builtin::sebi_advertising_code();
        assert!(RuleSet::new(document).is_ok());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.yaml");
        std::fs::write(
            &path,
            "name: file-rules\nrules:\n  - name: r\n    trigger_phrases: [x]\n    explanation: y\n",
        )
        .unwrap();
        assert_eq!(RuleSet::from_file(&path).unwrap().name(), "file-rules");
        assert!(RuleSet::from_file(dir.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn test_describe_lists_enabled_rules() {
        let description = RuleSet::builtin().describe();
        assert!(description.contains("guaranteed-returns"));
        assert!(description.contains("Only when the text also mentions one of: return, growth."));
    }
}
