//! Built-in rule sets
//!
//! Mutual fund advertising checks derived from the SEBI advertisement code.
//! Phrases are matched case-insensitively as substrings, so `guarantee` also
//! covers `guaranteed` and `guarantees`.

use crate::rule::{Rule, RuleSetDocument};

/// SEBI mutual fund advertisement checks, in reporting order
pub fn sebi_advertising_code() -> RuleSetDocument {
    RuleSetDocument {
        name: "sebi-mf-advertising".to_string(),
        description: "Mutual fund advertisement content checks".to_string(),
        version: "1.0".to_string(),
        regulation: Some("SEBI Mutual Fund Advertisement Code".to_string()),
        rules: vec![
            Rule::new(
                "guaranteed-returns",
                ["guaranteed return", "guarantee"],
                "Avoid guaranteeing returns without reserves or third-party backing.",
            ),
            Rule::new(
                "performance-forecast",
                ["future returns", "forecast"],
                "Avoid forecasting NAV or performance.",
            ),
            Rule::new(
                "percentage-returns",
                ["%"],
                "Verify and clarify any percentage returns mentioned.",
            )
            .with_qualifiers(["return", "growth"]),
            Rule::new(
                "exaggerated-comparison",
                ["best fund", "number one"],
                "Avoid exaggerated/unsubstantiated comparisons.",
            ),
        ],
    }
}
