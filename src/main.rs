use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use campus_events::app::enrich_use_case::{EnrichUseCase, RunSummary};
use campus_events::app::ports::EnrichOutputPort;
use campus_events::config::{Config, OutputFormat};
use campus_events::constants::{DEFAULT_CONFIG_PATH, ENV_CONFIG_PATH, FEED_FETCH_TIMEOUT_SECS};
use campus_events::infra::{
    GoogleGeocoder, NdjsonOutputAdapter, RateLimiterAdapter, TextReportOutputAdapter,
};
use campus_events::observability;
use campus_events::pipeline::ingestion::ical_feed::IcalFeedReader;
use campus_events::pipeline::ingestion::rate_limiter::RateLimiter;
use campus_events::pipeline::processing::address::AddressValidator;
use campus_events::pipeline::processing::enrich::EventEnricher;
use campus_events::pipeline::processing::location::LocationNormalizer;
use campus_events::pipeline::processing::tags::TagClassifier;
use campus_events::types::FeedSource;

#[derive(Parser)]
#[command(name = "campus_events")]
#[command(about = "Enrich campus iCalendar feeds with validated locations and topic tags")]
#[command(version)]
struct Cli {
    /// Path to the TOML config (defaults to $CAMPUS_EVENTS_CONFIG or campus_events.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, enrich and write every configured feed
    Run {
        /// Feed URLs or file paths (comma-separated); overrides the config
        #[arg(long)]
        feeds: Option<String>,
        /// Output file path
        #[arg(long)]
        output: Option<String>,
        /// Output format
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Print the cleaned form of a raw location string
    Normalize {
        location: String,
    },
    /// Print the tags assigned to a title and description
    Classify {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
}

fn load_config(flag: Option<PathBuf>) -> anyhow::Result<Config> {
    let (path, required) = match flag {
        Some(path) => (path, true),
        None => match std::env::var(ENV_CONFIG_PATH) {
            Ok(path) if !path.trim().is_empty() => (PathBuf::from(path), true),
            _ => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        },
    };
    Ok(Config::load(&path, required)?)
}

fn print_summary(summary: &RunSummary, output_path: &str) {
    println!("\n📊 Enrichment results:");
    for feed in &summary.feeds {
        println!(
            "   {}: fetched {}, enriched {}, duplicates {}, past {}",
            feed.source, feed.fetched, feed.enriched, feed.duplicates, feed.past
        );
    }
    for failure in &summary.failures {
        println!("   ❌ {}: {}", failure.source, failure.error);
    }
    println!("   Total enriched: {}", summary.total_enriched());
    println!("   Output file: {}", output_path);
}

async fn run(
    config: Config,
    feeds: Option<String>,
    output: Option<String>,
    format: Option<OutputFormat>,
) -> anyhow::Result<RunSummary> {
    let sources: Vec<FeedSource> = match feeds {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(FeedSource::new)
            .collect(),
        None => config.feed_sources(),
    };
    if sources.is_empty() {
        anyhow::bail!("No feeds configured");
    }

    if config.provider_key.is_none() {
        warn!("No geocoding key configured; non-remote locations will be marked 'no'");
    }

    let limiter = RateLimiterAdapter(RateLimiter::new(config.requests_per_min()));
    let geocoder = GoogleGeocoder::new(
        config.provider_key.clone(),
        config.geocode_timeout(),
        Box::new(limiter),
    )?;

    let enricher = EventEnricher::new(
        LocationNormalizer::new(config.location_rules()),
        AddressValidator::new(Arc::new(geocoder))
            .with_reference(config.reference_point(), config.proximity_threshold_miles),
        TagClassifier::new(&config.taxonomy()),
    );

    let output_path = output.unwrap_or_else(|| config.output.path.clone());
    let sink: Box<dyn EnrichOutputPort> = match format.unwrap_or(config.output.format) {
        OutputFormat::Text => Box::new(TextReportOutputAdapter::new(&output_path)?),
        OutputFormat::Ndjson => Box::new(NdjsonOutputAdapter::new(&output_path)?),
    };

    let use_case = EnrichUseCase::new(enricher, sink);
    info!(cutoff = %use_case.cutoff(), feeds = sources.len(), "Starting enrichment run");

    let reader = IcalFeedReader::with_timeout(Duration::from_secs(FEED_FETCH_TIMEOUT_SECS))?;
    let summary = use_case.run_feeds(&reader, &sources).await?;

    print_summary(&summary, &output_path);
    Ok(summary)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let _guard = observability::init_logging();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;

    match cli.command {
        Commands::Run {
            feeds,
            output,
            format,
        } => {
            if let Err(e) = observability::init("cli") {
                warn!("Metrics disabled: {}", e);
            }

            let result = run(config, feeds, output, format).await;
            observability::push_to_gateway().await;

            match result {
                Ok(summary) if summary.has_failures() => {
                    anyhow::bail!("{} feed(s) failed", summary.failures.len());
                }
                Ok(_) => println!("✅ Enrichment run completed successfully"),
                Err(e) => {
                    error!("Enrichment run failed: {:#}", e);
                    return Err(e);
                }
            }
        }
        Commands::Normalize { location } => {
            let normalizer = LocationNormalizer::new(config.location_rules());
            let normalized = normalizer.normalize(&location);
            println!("{}", normalized.cleaned());
            if normalized.is_remote() {
                println!("(remote)");
            }
        }
        Commands::Classify { title, description } => {
            let classifier = TagClassifier::new(&config.taxonomy());
            println!("{}", classifier.classify(&title, &description).join(", "));
        }
    }

    Ok(())
}
