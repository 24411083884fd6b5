use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{error, info};
use serde::Serialize;

use devscan::analysis::{
    count_multi_number_contacts, image_resolution_distribution, AnalysisSummary,
};
use devscan::models::{ContactRecord, DeviceProfile, MediaRecord, DIMENSIONS_UNKNOWN};
use devscan::{default_data_dir, sample, Extractor, ExtractorConfig, Settings, SettingsStore};

#[derive(Parser)]
#[command(name = "devscan")]
#[command(about = "Extract and aggregate device, media, and contact metadata", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory for the cache, settings, and default index locations
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override the media index location
    #[arg(long, global = true)]
    media_index: Option<PathBuf>,

    /// Override the contacts index location
    #[arg(long, global = true)]
    contacts_index: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the device profile (cached after the first run)
    Device,

    /// List media records from the platform index
    Media {
        /// Which records to show
        #[arg(long, value_parser = ["images", "videos", "all"], default_value = "all")]
        kind: String,
    },

    /// List contacts that have phone numbers
    Contacts,

    /// Aggregate statistics over contacts and images
    Analyze,

    /// Everything at once: device profile, media, contacts, analysis
    Report,

    /// Seed sample platform indexes under the data directory, then report
    Demo,
}

#[tokio::main]
async fn main() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        error!("{err:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    fs::create_dir_all(&data_dir)
        .with_context(|| format!("failed to create data directory {}", data_dir.display()))?;

    let settings_store = SettingsStore::new(data_dir.join("settings.json"))?;

    if matches!(cli.command, Commands::Demo) {
        let media = data_dir.join("indexes").join("media.db");
        let contacts = data_dir.join("indexes").join("contacts.db");
        sample::seed_demo_indexes(&media, &contacts)?;
        settings_store.update(Settings {
            media_index: Some(media),
            contacts_index: Some(contacts),
        })?;
        info!("Sample indexes seeded under {}", data_dir.display());
    }

    let settings = settings_store.settings();
    let media_index = cli
        .media_index
        .clone()
        .unwrap_or_else(|| settings.media_index_path(&data_dir));
    let contacts_index = cli
        .contacts_index
        .clone()
        .unwrap_or_else(|| settings.contacts_index_path(&data_dir));

    let extractor = Extractor::new(ExtractorConfig {
        data_dir,
        media_index,
        contacts_index,
    })?;

    match cli.command {
        Commands::Device => {
            let profile = extractor.device_profile().await?;
            print_device(&profile, cli.json)
        }
        Commands::Media { kind } => {
            let records = filter_media(extractor.media_metadata()?, &kind);
            print_media(&records, cli.json)
        }
        Commands::Contacts => {
            let contacts = extractor.collect_contacts().finish().await?;
            print_contacts(&contacts, cli.json)
        }
        Commands::Analyze => {
            let summary = extractor.analysis_summary().await?;
            print_analysis(&summary, cli.json)
        }
        Commands::Report | Commands::Demo => {
            let profile = extractor.device_profile().await?;
            let media = extractor.media_metadata()?;
            let contacts = extractor.collect_contacts().finish().await?;
            let analysis = AnalysisSummary {
                contacts_with_multiple_numbers: count_multi_number_contacts(&contacts),
                resolution_distribution: image_resolution_distribution(&media),
            };

            if cli.json {
                let report = Report {
                    device_profile: &profile,
                    media: &media,
                    contacts: &contacts,
                    analysis: &analysis,
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            print_device(&profile, false)?;
            println!();
            print_media(&media, false)?;
            println!();
            print_contacts(&contacts, false)?;
            println!();
            print_analysis(&analysis, false)
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report<'a> {
    device_profile: &'a DeviceProfile,
    media: &'a [MediaRecord],
    contacts: &'a [ContactRecord],
    analysis: &'a AnalysisSummary,
}

fn filter_media(records: Vec<MediaRecord>, kind: &str) -> Vec<MediaRecord> {
    match kind {
        "images" => records.into_iter().filter(|r| !r.is_video()).collect(),
        "videos" => records.into_iter().filter(|r| r.is_video()).collect(),
        _ => records,
    }
}

fn print_device(profile: &DeviceProfile, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(profile)?);
        return Ok(());
    }

    println!("Device Profile");
    for (key, value) in profile.entries() {
        let shown = if value.is_empty() { "(unknown)" } else { value };
        println!("  {key}: {shown}");
    }
    Ok(())
}

fn print_media(records: &[MediaRecord], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    println!("Media ({})", records.len());
    for record in records {
        println!(
            "  {}  {}  {}  {} bytes  {}",
            record.file_name,
            record.dimensions.as_deref().unwrap_or(DIMENSIONS_UNKNOWN),
            record.duration,
            record.file_size,
            record.date_created.format("%Y-%m-%d %H:%M"),
        );
    }
    Ok(())
}

fn print_contacts(contacts: &[ContactRecord], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(contacts)?);
        return Ok(());
    }

    println!("Contacts ({})", contacts.len());
    for contact in contacts {
        println!("  {}: {}", contact.name, contact.phone_numbers.join(", "));
    }
    Ok(())
}

fn print_analysis(summary: &AnalysisSummary, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(summary)?);
        return Ok(());
    }

    println!("Analysis");
    println!(
        "  Contacts with multiple numbers: {}",
        summary.contacts_with_multiple_numbers
    );
    if summary.resolution_distribution.is_empty() {
        println!("  Image resolution distribution: (no images)");
    } else {
        println!("  Image resolution distribution:");
        for bucket in summary.resolution_distribution.buckets() {
            println!("    {}: {}", bucket.dimensions, bucket.count);
        }
    }
    Ok(())
}
