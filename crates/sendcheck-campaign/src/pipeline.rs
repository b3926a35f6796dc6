//! End-to-end campaign pipeline
//!
//! template → visible text → compliance evaluation → report
//!   → (blocked: stop) → optional translation → campaign runner
//!
//! Compliance always runs on the untranslated template; the translated body
//! is threaded explicitly from [`translate_or_passthrough`] into the runner.

use sendcheck_core::{
    extract_visible_text, ComplianceVerdict, Error, Recipient, Result, SendResult, Template,
};
use sendcheck_policy::{Evaluator, RuleSet};
use sendcheck_report::Report;
use std::sync::Arc;
use tracing::{info, warn};

use crate::collaborator::Translate;
use crate::runner::CampaignRunner;
use crate::translation::{translate_or_passthrough, Language, PreparedTemplate};

/// Everything needed for one campaign run
#[derive(Debug, Clone)]
pub struct CampaignRequest {
    /// Validated recipients
    pub recipients: Vec<Recipient>,

    /// Untranslated template
    pub template: Template,

    /// Subject line
    pub subject: String,

    /// Language to send in
    pub language: Language,
}

/// Result of the compliance step
#[derive(Debug, Clone)]
pub struct ComplianceCheck {
    /// Visible text the verdict was computed on
    pub visible_text: String,

    /// Evaluation outcome
    pub verdict: ComplianceVerdict,

    /// Rendered report
    pub report: Report,
}

/// How a campaign run ended
#[derive(Debug, Clone)]
pub enum CampaignOutcome {
    /// The template failed compliance; nothing was sent
    Blocked {
        /// The failing check
        check: ComplianceCheck,
    },

    /// Every recipient was attempted
    Sent {
        /// The passing check
        check: ComplianceCheck,
        /// Body that was personalized and sent
        prepared: PreparedTemplate,
        /// Delivery tally
        result: SendResult,
    },
}

impl CampaignOutcome {
    /// The compliance step of this run
    pub fn check(&self) -> &ComplianceCheck {
        match self {
            Self::Blocked { check } | Self::Sent { check, .. } => check,
        }
    }

    /// Delivery tally, all zero when blocked
    pub fn send_result(&self) -> SendResult {
        match self {
            Self::Blocked { .. } => SendResult::default(),
            Self::Sent { result, .. } => *result,
        }
    }
}

/// Compliance-gated campaign pipeline
pub struct Pipeline {
    rules: Arc<RuleSet>,
    evaluator: Box<dyn Evaluator>,
    translator: Option<Arc<dyn Translate>>,
    runner: CampaignRunner,
}

impl Pipeline {
    /// Create a pipeline without translation
    pub fn new(rules: Arc<RuleSet>, evaluator: Box<dyn Evaluator>, runner: CampaignRunner) -> Self {
        Self {
            rules,
            evaluator,
            translator: None,
            runner,
        }
    }

    /// Enable the translation step
    pub fn with_translator(mut self, translator: Arc<dyn Translate>) -> Self {
        self.translator = Some(translator);
        self
    }

    /// Replace the campaign runner
    ///
    /// Lets a caller check the template before its delivery collaborator
    /// exists.
    pub fn with_runner(mut self, runner: CampaignRunner) -> Self {
        self.runner = runner;
        self
    }

    /// Active rule set
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Extract visible text, evaluate it and build the report
    pub async fn check(&self, template: &Template) -> Result<ComplianceCheck> {
        let visible_text = extract_visible_text(template.content())?;
        let verdict = self.evaluator.evaluate(&visible_text, &self.rules).await?;
        let report = Report::build(&verdict, template.content());

        if verdict.passed() {
            info!(
                rule_set = %self.rules.name(),
                evaluator = %self.evaluator.name(),
                "Template passed compliance check"
            );
        } else {
            for violation in verdict.violations() {
                warn!(
                    rule = %violation.rule_name,
                    phrase = %violation.matched_phrase,
                    "Compliance issue: {}",
                    violation.explanation
                );
            }
        }

        Ok(ComplianceCheck {
            visible_text,
            verdict,
            report,
        })
    }

    /// Apply the optional translation step to an approved template
    pub async fn prepare(&self, template: &Template, language: Language) -> PreparedTemplate {
        translate_or_passthrough(self.translator.as_deref(), template.content(), language).await
    }

    /// Run the whole pipeline for one campaign
    pub async fn run(&self, request: &CampaignRequest) -> Result<CampaignOutcome> {
        ensure_recipients(request)?;
        let check = self.check(&request.template).await?;
        self.dispatch(request, check).await
    }

    /// Translate and send a campaign whose template was already checked
    ///
    /// A failing `check` yields [`CampaignOutcome::Blocked`] and nothing is
    /// delivered.
    pub async fn dispatch(
        &self,
        request: &CampaignRequest,
        check: ComplianceCheck,
    ) -> Result<CampaignOutcome> {
        ensure_recipients(request)?;
        if !check.verdict.passed() {
            return Ok(CampaignOutcome::Blocked { check });
        }

        let prepared = self.prepare(&request.template, request.language).await;
        let result = self
            .runner
            .send(&request.recipients, &prepared.body, &request.subject, &check.verdict)
            .await?;

        Ok(CampaignOutcome::Sent {
            check,
            prepared,
            result,
        })
    }
}

fn ensure_recipients(request: &CampaignRequest) -> Result<()> {
    if request.recipients.is_empty() {
        return Err(Error::input_validation("recipient list is empty"));
    }
    Ok(())
}
