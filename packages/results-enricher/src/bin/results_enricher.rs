//! CLI for enriching result rows
//!
//! `enrich` reads a JSON array of source rows and writes the enriched rows as
//! JSON. `club` scrapes every row of one club from a single results page.
//! Diagnostics go to stderr so stdout carries only JSON.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use results_enricher::{
    parse_rows_for_club, ApiKey, BatchEnricher, BatchObserver, EnrichConfig, EnrichedResult,
    FetchOutcome, LayeredFetcher, MemoryLog, MemoryStore, ResultPageFetcher, RetryPolicy,
    TransportConfig, DEFAULT_BASE_URL,
};

#[derive(Parser)]
#[command(name = "results-enricher")]
#[command(about = "Adds course length and starter counts to competition result rows")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich a JSON array of result rows
    Enrich {
        /// JSON file with the source rows
        #[arg(long, short)]
        input: PathBuf,

        /// Where to write the enriched rows (stdout when omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Who runs the batch; one run per actor at a time
        #[arg(long, default_value = "cli")]
        actor: String,

        /// Seconds to wait between rows
        #[arg(long)]
        delay: Option<u64>,

        /// Attempts per direct fetch
        #[arg(long)]
        max_retries: Option<u32>,

        /// Skip network access and emit rows without enrichment
        #[arg(long)]
        dry_run: bool,

        /// Fetch every row's page even when the event repeats
        #[arg(long)]
        no_page_reuse: bool,
    },

    /// Scrape every row of one club from a results page
    Club {
        /// Results page URL
        #[arg(long)]
        url: String,

        /// Club name as printed on the page
        #[arg(long)]
        club: String,

        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

/// Settings loaded from environment variables. CLI flags take precedence.
#[derive(Debug, Clone)]
struct Settings {
    delay_seconds: u64,
    max_retries: u32,
    dry_run: bool,
    base_url: String,
    proxy_url: Option<String>,
    api_key: Option<ApiKey>,
}

impl Settings {
    fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            delay_seconds: env::var("ENRICH_DELAY_SECONDS")
                .unwrap_or_else(|_| "15".to_string())
                .parse()
                .context("ENRICH_DELAY_SECONDS must be a whole number of seconds")?,
            max_retries: env::var("ENRICH_MAX_RETRIES")
                .unwrap_or_else(|_| "3".to_string())
                .parse()
                .context("ENRICH_MAX_RETRIES must be a valid number")?,
            dry_run: env::var("ENRICH_DRY_RUN")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
            base_url: env::var("EVENTOR_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            proxy_url: env::var("ENRICH_PROXY_URL").ok().filter(|v| !v.trim().is_empty()),
            api_key: env::var("EVENTOR_API_KEY")
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(ApiKey::new),
        })
    }

    fn transport(&self, max_retries: u32) -> TransportConfig {
        let config = TransportConfig::default()
            .with_retry(RetryPolicy::default().with_max_retries(max_retries));
        match &self.proxy_url {
            Some(url) => config.with_proxy_url(url.clone()),
            None => config,
        }
    }
}

/// Reports progress through tracing.
struct ProgressLogger;

impl BatchObserver for ProgressLogger {
    fn progress(&self, progress: u8, status: &str) {
        tracing::info!(progress, "{}", status);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,results_enricher=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    match cli.command {
        Commands::Enrich {
            input,
            output,
            actor,
            delay,
            max_retries,
            dry_run,
            no_page_reuse,
        } => {
            let config = EnrichConfig::new()
                .with_delay(Duration::from_secs(delay.unwrap_or(settings.delay_seconds)))
                .with_dry_run(dry_run || settings.dry_run)
                .with_base_url(settings.base_url.clone())
                .with_page_reuse(!no_page_reuse);
            let config = match &settings.api_key {
                Some(key) => config.with_api_key(key.clone()),
                None => config,
            };
            let transport = settings.transport(max_retries.unwrap_or(settings.max_retries));
            cmd_enrich(&input, output.as_deref(), &actor, config, &transport).await
        }
        Commands::Club { url, club, output } => {
            let transport = settings.transport(settings.max_retries);
            cmd_club(&url, &club, output.as_deref(), &transport).await
        }
    }
}

async fn cmd_enrich(
    input: &Path,
    output: Option<&Path>,
    actor: &str,
    config: EnrichConfig,
    transport: &TransportConfig,
) -> Result<()> {
    let raw = tokio::fs::read_to_string(input)
        .await
        .with_context(|| format!("Failed to read {}", input.display()))?;

    let fetcher = LayeredFetcher::new(transport).context("Failed to create HTTP client")?;
    let proxy = fetcher.proxy();
    let mut enricher = BatchEnricher::new(Arc::new(fetcher), Arc::new(MemoryStore::new()), config);
    if let Some(proxy) = proxy {
        enricher = enricher.with_proxy(proxy);
    }

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Ctrl-C received, stopping after the current row");
            on_ctrl_c.cancel();
        }
    });

    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "rows".to_string());
    let outcome = enricher
        .run_json(actor, &name, &raw, &ProgressLogger, &cancel)
        .await
        .context("Batch run failed")?;

    tracing::info!(
        status = ?outcome.job.status,
        rows = outcome.results.len(),
        enriched = outcome.job.enriched_rows,
        "{}",
        outcome.job.message.as_deref().unwrap_or_default()
    );

    write_json(output, &outcome.results).await
}

async fn cmd_club(
    url: &str,
    club: &str,
    output: Option<&Path>,
    transport: &TransportConfig,
) -> Result<()> {
    let fetcher = LayeredFetcher::new(transport).context("Failed to create HTTP client")?;
    let log = MemoryLog::new();

    let html = match fetcher.fetch_result_page("", url, &log).await {
        FetchOutcome::Success { html } => html,
        FetchOutcome::Failure { kind, message } => {
            bail!("Could not fetch {}: {} ({})", url, message, kind)
        }
    };

    let rows = parse_rows_for_club(&html, club);
    tracing::info!(club = %club, rows = rows.len(), "Club rows extracted");

    write_json(output, &rows).await
}

async fn write_json(output: Option<&Path>, rows: &[EnrichedResult]) -> Result<()> {
    let json = serde_json::to_string_pretty(rows).context("Failed to serialize results")?;
    match output {
        Some(path) => tokio::fs::write(path, json)
            .await
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            println!("{}", json);
            Ok(())
        }
    }
}
