use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use channel_scribe::audio::{AudioStore, YtDlpDownloader};
use channel_scribe::cli::{Cli, Commands};
use channel_scribe::config::WhisperConfig;
use channel_scribe::transcribe::{TranscriptStore, WhisperCli};
use channel_scribe::{
    utils, BatchJob, BatchPipeline, ChannelCatalog, Config, RestCatalog, ScribeError, VideoRecord,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "channel_scribe=debug"
    } else {
        "channel_scribe=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // External tools may be missing at startup; warn but continue so runs
    // that only hit the skip paths keep working.
    for dep in utils::check_dependencies().await {
        tracing::warn!("Missing external tool: {}", dep);
    }

    match cli.command {
        Commands::Scrape {
            api,
            channel,
            storage,
            whisper,
            concurrency,
            output,
        } => {
            let config = Config {
                api_key: api.api_key,
                channel: Some(channel.channel),
                video_limit: channel.limit,
                concurrency,
                storage: storage.into(),
                whisper: whisper.into(),
                output_path: output,
            };
            config.validate()?;
            run_scrape(&config).await?;
        }
        Commands::Download {
            api,
            channel,
            storage,
        } => {
            let config = Config {
                api_key: api.api_key,
                channel: Some(channel.channel),
                video_limit: channel.limit,
                concurrency: 1,
                storage: storage.into(),
                whisper: WhisperConfig::default(),
                output_path: "videos.json".into(),
            };
            config.validate()?;
            run_download(&config).await?;
        }
        Commands::Transcribe {
            api,
            storage,
            whisper,
            concurrency,
        } => {
            let config = Config {
                api_key: api.api_key,
                channel: None,
                // No enumeration in this mode; every audio file on disk is taken.
                video_limit: usize::MAX,
                concurrency,
                storage: storage.into(),
                whisper: whisper.into(),
                output_path: "videos.json".into(),
            };
            config.validate()?;
            run_transcribe(&config).await?;
        }
        Commands::Duration { input } => {
            run_duration(&input)?;
        }
    }

    Ok(())
}

fn required_channel(config: &Config) -> Result<&str> {
    config
        .channel
        .as_deref()
        .ok_or_else(|| ScribeError::Config("CHANNEL_NAME is required".into()).into())
}

fn build_stores(config: &Config) -> (Arc<AudioStore>, Arc<TranscriptStore>) {
    let downloader = Arc::new(YtDlpDownloader::new(config.storage.cookies_file.clone()));
    let audio = Arc::new(AudioStore::new(
        config.storage.audio_dir.clone(),
        downloader,
    ));
    let stt = Arc::new(WhisperCli::new(config.whisper.clone()));
    let transcripts = Arc::new(TranscriptStore::new(
        config.storage.transcript_dir.clone(),
        stt,
    ));
    (audio, transcripts)
}

/// Full pipeline: enumerate the channel, process every video, write the
/// aggregate document.
async fn run_scrape(config: &Config) -> Result<()> {
    tracing::info!("Starting channel extraction");
    config.display();

    let api = Arc::new(RestCatalog::new(config.api_key.clone()));
    let catalog = ChannelCatalog::new(api.clone());
    let video_ids = catalog
        .enumerate(required_channel(config)?, config.video_limit)
        .await?;
    tracing::info!("Enumerated {} video(s)", video_ids.len());

    let (audio, transcripts) = build_stores(config);
    let pipeline = BatchPipeline::new(api, audio, transcripts);
    let job = BatchJob {
        video_ids,
        concurrency: config.concurrency,
        output_path: config.output_path.clone(),
    };

    let records = pipeline.run(&job).await?;

    println!(
        "Process complete. {} record(s) written to {}",
        records.len(),
        config.output_path.display()
    );
    Ok(())
}

/// Download-only variant: acquire the audio artifacts one by one, isolating
/// per-item failures.
async fn run_download(config: &Config) -> Result<()> {
    tracing::info!("Starting audio download from channel");

    let api = Arc::new(RestCatalog::new(config.api_key.clone()));
    let catalog = ChannelCatalog::new(api);
    let video_ids = catalog
        .enumerate(required_channel(config)?, config.video_limit)
        .await?;

    let downloader = Arc::new(YtDlpDownloader::new(config.storage.cookies_file.clone()));
    let audio = AudioStore::new(config.storage.audio_dir.clone(), downloader);

    let mut failed = 0usize;
    for video_id in &video_ids {
        if let Err(err) = audio.ensure_audio(video_id).await {
            tracing::error!("Download failed for {}: {:#}", video_id, err);
            failed += 1;
        }
    }

    println!(
        "Download complete. {} of {} audio file(s) in {}",
        video_ids.len() - failed,
        video_ids.len(),
        config.storage.audio_dir.display()
    );
    Ok(())
}

/// Transcribe-only variant over already-downloaded audio. Acquisition
/// short-circuits on the existing artifacts, so the per-item pipeline
/// reduces to transcribe + persist-metadata.
async fn run_transcribe(config: &Config) -> Result<()> {
    let video_ids = utils::video_ids_in_dir(&config.storage.audio_dir)?;
    if video_ids.is_empty() {
        println!(
            "No audio files found in {}",
            config.storage.audio_dir.display()
        );
        return Ok(());
    }

    let api = Arc::new(RestCatalog::new(config.api_key.clone()));
    let (audio, transcripts) = build_stores(config);
    let pipeline = BatchPipeline::new(api, audio, transcripts);

    let records = pipeline
        .process_all(&video_ids, config.concurrency)
        .await?;

    println!(
        "Transcription complete. {} of {} video(s) processed into {}",
        records.len(),
        video_ids.len(),
        config.storage.transcript_dir.display()
    );
    Ok(())
}

/// Sum the ISO-8601 durations of an existing aggregate document and report
/// the catalog's total length in hours.
fn run_duration(input: &std::path::Path) -> Result<()> {
    let content = fs_err::read_to_string(input)
        .with_context(|| format!("failed to read aggregate document {}", input.display()))?;
    let records: Vec<VideoRecord> = serde_json::from_str(&content)
        .with_context(|| format!("failed to decode aggregate document {}", input.display()))?;

    let hours = utils::total_duration_hours(records.iter().map(|r| r.duration.as_str()));

    println!(
        "Total video duration: {:.2} hours across {} video(s)",
        hours,
        records.len()
    );
    Ok(())
}
