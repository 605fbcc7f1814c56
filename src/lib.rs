//! Channel Scribe - A Rust CLI tool for scraping and transcribing a YouTube channel
//!
//! This library enumerates a channel's upload catalog via the YouTube Data API,
//! downloads each video's audio track with yt-dlp, transcribes it with Whisper,
//! and persists the aggregated metadata and transcripts as JSON documents.

pub mod audio;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod pipeline;
pub mod transcribe;
pub mod utils;

pub use catalog::{CatalogApi, ChannelCatalog, RestCatalog, VideoRecord};
pub use config::Config;
pub use pipeline::{BatchJob, BatchPipeline};

/// Result type used throughout the library
pub type Result<T> = anyhow::Result<T>;

/// Error types specific to the scraper pipeline
#[derive(thiserror::Error, Debug)]
pub enum ScribeError {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("not found upstream: {0}")]
    NotFound(String),

    #[error("audio download failed for {video_id}: {message}")]
    Download { video_id: String, message: String },

    #[error("transcription failed for {video_id}: {message}")]
    Transcription { video_id: String, message: String },
}
