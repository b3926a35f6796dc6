//! Subcommand implementations
//!
//! Each command assembles the pipeline from configuration, runs the part it
//! needs, prints to stdout, and reports a [`Status`] for the exit code.

use anyhow::{bail, Context};
use sendcheck_campaign::{
    CampaignOutcome, CampaignRequest, CampaignRunner, ComplianceCheck, Deliver, Language, Pipeline,
    RecordingDeliverer, Translate,
};
use sendcheck_connectors::{
    GeminiAnalyzer, GoogleTranslator, GuidelineFetcher, HttpConfig, MailgunConfig,
    MailgunDeliverer,
};
use sendcheck_core::{load_recipients_from_path, personalize, Template};
use sendcheck_policy::{ComplianceEvaluator, DelegatedEvaluator, EvaluatorStrategy, RuleSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{secret, AppConfig};
use crate::security::{validate_endpoint_url, AccessGate, UrlValidationConfig};
use crate::{CampaignArgs, CheckArgs, Cli, Command, PreviewArgs, SendArgs, Status};

/// Run the selected subcommand
pub async fn run(cli: &Cli) -> anyhow::Result<Status> {
    let config = AppConfig::load(&cli.config, cli)?;

    if let Command::Rules = cli.command {
        let rules = load_rules(&config)?;
        print!("{}", rules.describe());
        return Ok(Status::Ok);
    }

    if !authorize(cli, &config) {
        eprintln!("access denied: a valid access key is required");
        return Ok(Status::AccessDenied);
    }

    match &cli.command {
        Command::Check(args) => check(args, &config).await,
        Command::Preview(args) => preview(args, &config).await,
        Command::Send(args) => send(args, &config).await,
        Command::Rules => Ok(Status::Ok),
    }
}

fn authorize(cli: &Cli, config: &AppConfig) -> bool {
    let gate = AccessGate::from_list(&secret(&config.access.keys_env).unwrap_or_default());
    if gate.is_empty() {
        warn!(env = %config.access.keys_env, "No access keys configured, denying access");
        return false;
    }

    let authorized = cli
        .access_key
        .as_deref()
        .is_some_and(|key| gate.is_authorized(key));
    if !authorized {
        warn!("Access key rejected");
    }
    authorized
}

async fn check(args: &CheckArgs, config: &AppConfig) -> anyhow::Result<Status> {
    let template = read_template(&args.template)?;
    let pipeline = build_pipeline(config, recording_runner(), None).await?;

    let check = pipeline.check(&template).await?;
    emit_report(&check, args.report.as_deref(), config)?;

    Ok(verdict_status(&check))
}

async fn preview(args: &PreviewArgs, config: &AppConfig) -> anyhow::Result<Status> {
    let campaign = &args.campaign;
    let request = build_request(campaign, config)?;
    let translator = build_translator(config, request.language)?;
    let pipeline = build_pipeline(config, recording_runner(), translator).await?;

    let check = pipeline.check(&request.template).await?;
    emit_report(&check, None, config)?;
    if !check.verdict.passed() {
        return Ok(Status::Blocked);
    }

    let prepared = pipeline.prepare(&request.template, request.language).await;
    if let Some(first) = request.recipients.first() {
        println!();
        println!("Recipients: {}", request.recipients.len());
        println!("To: {}", first.email);
        println!("Subject: {}", request.subject);
        println!(
            "Language: {}{}",
            prepared.language,
            if prepared.translated { "" } else { " (untranslated)" }
        );
        println!();
        println!("{}", personalize(&prepared.body, &first.first_name));
    }

    Ok(Status::Ok)
}

async fn send(args: &SendArgs, config: &AppConfig) -> anyhow::Result<Status> {
    if !args.confirm && !args.dry_run {
        bail!("refusing to send without --confirm (use --dry-run to rehearse)");
    }

    let request = build_request(&args.campaign, config)?;
    let translator = build_translator(config, request.language)?;
    let pipeline = build_pipeline(config, recording_runner(), translator).await?;

    let check = pipeline.check(&request.template).await?;
    emit_report(&check, args.report.as_deref(), config)?;
    if !check.verdict.passed() {
        println!("Campaign blocked: nothing was sent.");
        return Ok(Status::Blocked);
    }

    // the delivery collaborator is only needed once the template has passed
    let recorder = Arc::new(RecordingDeliverer::new());
    let deliverer: Arc<dyn Deliver> = if args.dry_run {
        recorder.clone()
    } else {
        Arc::new(build_mailgun(config)?)
    };
    let concurrency = args.concurrency.unwrap_or(config.campaign.concurrency);
    let pipeline =
        pipeline.with_runner(CampaignRunner::new(deliverer).with_concurrency(concurrency));

    match pipeline.dispatch(&request, check).await? {
        CampaignOutcome::Blocked { .. } => {
            println!("Campaign blocked: nothing was sent.");
            Ok(Status::Blocked)
        }
        CampaignOutcome::Sent { result, .. } => {
            if args.dry_run {
                println!(
                    "Dry run: {} message(s) prepared, none sent.",
                    recorder.messages().len()
                );
            } else {
                println!(
                    "Sent {} of {} message(s), {} failed.",
                    result.success_count,
                    result.attempted(),
                    result.failure_count
                );
            }
            if result.failure_count > 0 {
                warn!(failed = result.failure_count, "Some deliveries failed");
            }
            Ok(Status::Ok)
        }
    }
}

fn verdict_status(check: &ComplianceCheck) -> Status {
    if check.verdict.passed() {
        Status::Ok
    } else {
        Status::Blocked
    }
}

fn read_template(path: &Path) -> anyhow::Result<Template> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read template '{}'", path.display()))?;
    Ok(Template::from_bytes(bytes)?)
}

fn build_request(args: &CampaignArgs, config: &AppConfig) -> anyhow::Result<CampaignRequest> {
    let template = read_template(&args.template)?;
    let recipients = load_recipients_from_path(&args.recipients)?;
    info!(recipients = recipients.len(), "Loaded recipient list");

    Ok(CampaignRequest {
        recipients,
        template,
        subject: args
            .subject
            .clone()
            .unwrap_or_else(|| config.campaign.subject.clone()),
        language: args.language.unwrap_or(config.campaign.language),
    })
}

fn emit_report(
    check: &ComplianceCheck,
    path: Option<&Path>,
    config: &AppConfig,
) -> anyhow::Result<()> {
    print!("{}", check.report.to_text());

    let path = path
        .map(Path::to_path_buf)
        .or_else(|| config.report.path.as_ref().map(PathBuf::from));
    if let Some(path) = path {
        check
            .report
            .write_to(&path)
            .with_context(|| format!("failed to write report '{}'", path.display()))?;
    }
    Ok(())
}

fn recording_runner() -> CampaignRunner {
    CampaignRunner::new(Arc::new(RecordingDeliverer::new()))
}

fn load_rules(config: &AppConfig) -> anyhow::Result<RuleSet> {
    match &config.evaluator.rules_path {
        Some(path) => Ok(RuleSet::from_file(path)?),
        None => Ok(RuleSet::builtin()),
    }
}

async fn build_pipeline(
    config: &AppConfig,
    runner: CampaignRunner,
    translator: Option<Arc<dyn Translate>>,
) -> anyhow::Result<Pipeline> {
    let rules = load_rules(config)?;
    info!(
        rule_set = %rules.name(),
        active = rules.active_count(),
        strategy = ?config.evaluator.strategy,
        "Loaded rule set"
    );

    let evaluator = build_evaluator(config).await?;
    let pipeline = Pipeline::new(Arc::new(rules), Box::new(evaluator), runner);
    Ok(match translator {
        Some(translator) => pipeline.with_translator(translator),
        None => pipeline,
    })
}

fn endpoint(url: &str, what: &str) -> anyhow::Result<String> {
    validated_endpoint(url, what, &UrlValidationConfig::from_env())
}

fn validated_endpoint(
    url: &str,
    what: &str,
    validation: &UrlValidationConfig,
) -> anyhow::Result<String> {
    let validated = validate_endpoint_url(url, validation)
        .with_context(|| format!("invalid {} endpoint", what))?;
    Ok(validated.as_str().trim_end_matches('/').to_string())
}

fn required_secret(env_name: &str, what: &str) -> anyhow::Result<String> {
    secret(env_name).with_context(|| format!("{} key missing: set {}", what, env_name))
}

async fn build_evaluator(config: &AppConfig) -> anyhow::Result<ComplianceEvaluator> {
    if config.evaluator.strategy == EvaluatorStrategy::Keyword {
        return Ok(ComplianceEvaluator::keyword());
    }

    let analysis = &config.analysis;
    let http = HttpConfig::new(
        endpoint(&analysis.base_url, "analysis")?,
        required_secret(&analysis.api_key_env, "analysis")?,
    )
    .with_timeout(analysis.timeout_secs);
    let analyzer = GeminiAnalyzer::new(http, &analysis.model)?;
    let mut evaluator = DelegatedEvaluator::new(Arc::new(analyzer));

    if let Some(url) = &analysis.guidelines_url {
        let fetcher = GuidelineFetcher::new(&endpoint(url, "guidelines")?, analysis.timeout_secs)?;
        if let Some(guidelines) = fetcher.fetch_or_skip().await {
            evaluator = evaluator.with_guidelines(guidelines);
        }
    }

    Ok(ComplianceEvaluator::Delegated(evaluator))
}

fn build_translator(
    config: &AppConfig,
    language: Language,
) -> anyhow::Result<Option<Arc<dyn Translate>>> {
    let section = &config.translation;
    if !language.needs_translation() || !section.enabled {
        return Ok(None);
    }

    let Some(key) = secret(&section.api_key_env) else {
        warn!(env = %section.api_key_env, "Translation key not set, sending untranslated");
        return Ok(None);
    };

    let http = HttpConfig::new(endpoint(&section.base_url, "translation")?, key)
        .with_timeout(section.timeout_secs);
    Ok(Some(Arc::new(GoogleTranslator::new(http)?)))
}

fn build_mailgun(config: &AppConfig) -> anyhow::Result<MailgunDeliverer> {
    let section = &config.mailgun;
    let key = required_secret(&section.api_key_env, "Mailgun")?;
    let mut mailgun = MailgunConfig::new(key, &section.domain, &section.from)
        .with_base_url(endpoint(&section.base_url, "Mailgun")?);
    mailgun.http.timeout_secs = section.timeout_secs;
    Ok(MailgunDeliverer::new(mailgun)?)
}
