use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};

use contact_pipeline::app::fetch_use_case::FetchUseCase;
use contact_pipeline::app::ports::{ContactSinkPort, ContactSourcePort, FetchCriteria, GeocoderPort};
use contact_pipeline::app::run_use_case::{RunOutput, RunUseCase};
use contact_pipeline::config::{Config, GeocoderProvider};
use contact_pipeline::infra::hubspot::HubspotClient;
use contact_pipeline::infra::json_file::{write_raw_contacts, JsonFileSource, NdjsonFileSink};
use contact_pipeline::infra::nominatim::NominatimGeocoder;
use contact_pipeline::infra::offline_geocoder::OfflineGeocoder;
use contact_pipeline::observability::{init_logging, init_metrics};

const DEFAULT_DRY_RUN_OUTPUT: &str = "output/contacts.ndjson";

#[derive(Parser)]
#[command(name = "contact_pipeline")]
#[command(about = "Clean, deduplicate and re-upload CRM contacts")]
#[command(version = "0.1.0")]
struct Cli {
    /// Configuration file (defaults apply when config.toml is absent)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch from HubSpot, clean, and upload
    Run {
        /// Write cleaned contacts to a file instead of uploading
        #[arg(long)]
        dry_run: bool,
        /// Output file for --dry-run
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Clean a JSON dump without touching the CRM
    Clean {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Resolve cities from the embedded gazetteer instead of Nominatim
        #[arg(long)]
        offline: bool,
    },
    /// Dump eligible raw contacts as JSON
    Fetch {
        #[arg(long)]
        output: PathBuf,
    },
}

fn build_geocoder(config: &Config, offline: bool) -> Result<Arc<dyn GeocoderPort>> {
    if offline || config.geocoder.provider == GeocoderProvider::Offline {
        info!("Using offline gazetteer geocoder");
        return Ok(Arc::new(OfflineGeocoder));
    }
    let geocoder = NominatimGeocoder::new(&config.geocoder)
        .context("Failed to build Nominatim client")?;
    Ok(Arc::new(geocoder))
}

fn hubspot_client(config: &Config) -> Result<Arc<HubspotClient>> {
    let api_key = Config::api_key().context("HubSpot access needs HUBSPOT_API_KEY")?;
    Ok(Arc::new(HubspotClient::new(&config.hubspot, api_key)?))
}

async fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Ok(())
}

fn finish(output: RunOutput) {
    output.report.print_summary();
    if output.report.fetch_interrupted_by.is_none() && output.report.failures.is_empty() {
        println!("\n✅ Run completed cleanly");
    } else {
        println!("\n✅ Run completed with {} recorded issues", output.report.failures.len());
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_logging();
    init_metrics();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let criteria = FetchCriteria::from(&config.hubspot);

    match cli.command {
        Commands::Run { dry_run, output } => {
            println!("🚀 Running contact pipeline...");
            let hubspot = hubspot_client(&config)?;
            let geocoder = build_geocoder(&config, false)?;

            let sink: Arc<dyn ContactSinkPort> = if dry_run {
                let path = output.unwrap_or_else(|| PathBuf::from(DEFAULT_DRY_RUN_OUTPUT));
                ensure_parent_dir(&path).await?;
                println!("📝 Dry run, writing to {}", path.display());
                Arc::new(NdjsonFileSink::create(&path).await?)
            } else {
                if output.is_some() {
                    warn!("--output only applies to --dry-run, ignoring it");
                }
                hubspot.clone()
            };

            let use_case = RunUseCase::new(
                hubspot,
                geocoder,
                sink,
                criteria,
                config.dedup.clone(),
                config.upload.clone(),
            );
            match use_case.run().await {
                Ok(output) => finish(output),
                Err(e) => {
                    error!("Pipeline run failed: {}", e);
                    println!("❌ Pipeline run failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::Clean { input, output, offline } => {
            println!("🔨 Cleaning {}...", input.display());
            let source: Arc<dyn ContactSourcePort> = Arc::new(JsonFileSource::open(&input).await?);
            let geocoder = build_geocoder(&config, offline)?;
            ensure_parent_dir(&output).await?;
            let sink = Arc::new(NdjsonFileSink::create(&output).await?);

            let use_case = RunUseCase::new(
                source,
                geocoder,
                sink,
                criteria,
                config.dedup.clone(),
                config.upload.clone(),
            );
            let result = use_case.run().await?;
            println!("📝 Cleaned contacts written to {}", output.display());
            finish(result);
        }
        Commands::Fetch { output } => {
            println!("📥 Fetching eligible contacts...");
            let hubspot = hubspot_client(&config)?;
            let records = FetchUseCase::new(hubspot, criteria).fetch_all().await?;
            ensure_parent_dir(&output).await?;
            write_raw_contacts(&output, records.contacts()).await?;

            println!("   Pages: {}", records.pages());
            println!("   Contacts: {}", records.len());
            println!("   Rejected: {}", records.rejected().len());
            if let Some(reason) = records.interrupted_by() {
                println!("⚠️  Fetch interrupted ({}), dump is partial", reason);
            }
            println!("✅ Wrote {}", output.display());
        }
    }
    Ok(())
}
