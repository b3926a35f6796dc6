//! SendCheck Policy Engine
//!
//! Declarative compliance rules for email campaign content.
//!
//! Rule sets are defined in YAML (or taken from the built-in regulator set)
//! and specify, per rule:
//! - Trigger phrases, matched case-insensitively as substrings
//! - Optional qualifiers that must co-occur for the rule to fire
//! - The explanation reported to the operator
//!
//! Verdicts come from one [`Evaluator`] interface with interchangeable
//! strategies: deterministic keyword matching or delegated analysis by an
//! external collaborator.

pub mod builtin;
pub mod delegated;
pub mod engine;
pub mod rule;

pub use delegated::{parse_analysis, Analyze, DelegatedEvaluator};
pub use engine::{evaluate_keywords, ComplianceEvaluator, Evaluator, EvaluatorStrategy, KeywordEvaluator};
pub use rule::{Rule, RuleSet, RuleSetDocument};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::delegated::{Analyze, DelegatedEvaluator};
    pub use crate::engine::{ComplianceEvaluator, Evaluator, EvaluatorStrategy, KeywordEvaluator};
    pub use crate::rule::{Rule, RuleSet};
}
