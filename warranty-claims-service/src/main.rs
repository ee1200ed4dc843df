use anyhow::Context as _;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use warranty_claims_service::batch::{load_claims, save_outcomes, write_outcomes};
use warranty_claims_service::policy::PdfiumTextExtractor;
use warranty_claims_service::{
    ClaimPipeline, FailurePolicy, LogProgress, PolicyDocument, RigReasoningClient,
    ServiceConfig,
};

#[derive(Parser)]
#[command(name = "warranty-claims")]
#[command(about = "Adjudicate a batch of warranty claims with an LLM-driven review pipeline")]
struct Cli {
    /// Claims file: a JSON array of objects or JSON Lines
    input: PathBuf,

    /// Where to write the results (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Record failing claims and keep going instead of aborting the batch
    #[arg(long)]
    isolate_failures: bool,

    /// Policy manual PDF (overrides POLICY_PDF_PATH)
    #[arg(long)]
    policy_pdf: Option<PathBuf>,

    /// Model name (overrides LLM_MODEL)
    #[arg(long)]
    model: Option<String>,
}

/// Initialize tracing; LOG_FORMAT=pretty for development, JSON otherwise
fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warranty_claims_service=debug,graph_flow=debug".into());

    match log_format.as_str() {
        "pretty" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true)
                        .with_writer(std::io::stderr),
                )
                .init();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();

    let mut config = ServiceConfig::from_env()?;
    if let Some(path) = cli.policy_pdf {
        config.policy_pdf_path = path;
    }
    if let Some(model) = cli.model {
        config.llm.model = model;
    }
    if cli.isolate_failures {
        config.failure_policy = FailurePolicy::IsolateClaim;
    }

    info!(
        provider = ?config.llm.provider,
        model = %config.llm.model,
        failure_policy = ?config.failure_policy,
        "Configuration loaded"
    );

    let pdf_path = config.policy_pdf_path.clone();
    let policy_text = config.policy_text.clone();
    let policy = tokio::task::spawn_blocking(move || {
        PolicyDocument::resolve(&pdf_path, policy_text.as_deref(), &PdfiumTextExtractor)
    })
    .await
    .context("Policy resolution task panicked")?;
    info!(source = ?policy.source(), characters = policy.text().len(), "Policy document ready");

    let claims = load_claims(&cli.input)?;
    info!(claims = claims.len(), input = %cli.input.display(), "Claims loaded");

    let reasoning = Arc::new(RigReasoningClient::from_config(&config.llm));
    let pipeline = ClaimPipeline::new(policy, reasoning).with_failure_policy(config.failure_policy);

    let outcomes = pipeline.process_claims(claims, &LogProgress).await?;

    match &cli.output {
        Some(path) => {
            save_outcomes(&outcomes, path)?;
            info!(output = %path.display(), "Results written");
        }
        None => write_outcomes(&outcomes, std::io::stdout().lock())?,
    }

    Ok(())
}
