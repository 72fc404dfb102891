use clap::Parser;
use mapscene::common::error::{IngestError, Result};
use mapscene::config::AppConfig;
use mapscene::logging::init_logging;
use mapscene::pipeline::ingestion::fetcher::{Fetcher, HttpRecordSource, RecordSource};
use mapscene::state::AppState;
use tracing::{error, info};

/// Fetches event and location payloads, runs the ingest pipeline, and
/// prints a summary of the built indexes.
#[derive(Parser, Debug)]
#[command(name = "mapscene", about = "Event/location ingest and index engine")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(long, default_value = "mapscene.toml")]
    config: String,

    /// Override the events payload URL from the config
    #[arg(long)]
    events_url: Option<String>,

    /// Override the locations payload URL from the config
    #[arg(long)]
    locations_url: Option<String>,
}

async fn run(args: Args) -> Result<()> {
    let config = AppConfig::load_from(&args.config).unwrap_or_else(|e| {
        info!("using default configuration ({e})");
        AppConfig::default()
    });

    let locations_url = args
        .locations_url
        .or_else(|| config.locations_url.clone())
        .ok_or_else(|| IngestError::Config("no locations_url configured".to_string()))?;
    let events_url = args
        .events_url
        .or_else(|| config.events_url.clone())
        .ok_or_else(|| IngestError::Config("no events_url configured".to_string()))?;

    let source = HttpRecordSource::new(config.fetch_timeout_ms, locations_url, events_url);
    let raw_locations = source.fetch_locations().await?;
    let raw_events = source.fetch_events().await?;

    let mut state = AppState::new(&config);
    let initial = state.ingest_batch(&raw_locations, &raw_events);
    info!(
        locations = initial.locations_added,
        events = initial.events_added,
        "initial load complete"
    );

    if let Some(append_url) = config.append_events_url.clone() {
        let fetcher = Fetcher::new(config.fetch_timeout_ms);
        let more_events = fetcher.fetch_records(&append_url).await?;
        let appended = state.ingest_batch(&[], &more_events);
        info!(events = appended.events_added, "append load complete");
    }

    println!(
        "{} events at {} locations, {} tags",
        state.events().len(),
        state.indexes().by_location.len(),
        state.indexes().all_tags.len()
    );
    for tag in &state.indexes().all_tags {
        println!("  {:>4}  {}", state.indexes().tag_frequency[tag], tag);
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_logging();
    let args = Args::parse();
    if let Err(e) = run(args).await {
        error!("ingest failed: {e}");
        std::process::exit(1);
    }
}
