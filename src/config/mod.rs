use std::path::PathBuf;

use crate::cli::{StorageArgs, WhisperArgs};
use crate::{Result, ScribeError};

/// Resolved run configuration, built once from the CLI/environment and passed
/// into the catalog and pipeline constructors.
#[derive(Debug, Clone)]
pub struct Config {
    /// YouTube Data API key
    pub api_key: String,

    /// Channel name to enumerate (absent for the transcribe-only command)
    pub channel: Option<String>,

    /// Maximum number of videos taken from the upload listing
    pub video_limit: usize,

    /// Maximum number of videos processed concurrently
    pub concurrency: usize,

    /// Artifact directories and cookie file
    pub storage: StorageConfig,

    /// External speech-to-text settings
    pub whisper: WhisperConfig,

    /// Path of the aggregate JSON document
    pub output_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory for downloaded audio tracks
    pub audio_dir: PathBuf,

    /// Directory for per-video transcripts and metadata documents
    pub transcript_dir: PathBuf,

    /// Cookie file handed to yt-dlp when it exists on disk
    pub cookies_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct WhisperConfig {
    /// Spoken-language hint
    pub language: String,

    /// Model tier (tiny, base, small, medium, large)
    pub model: String,
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            language: "Spanish".to_string(),
            model: "base".to_string(),
        }
    }
}

impl From<StorageArgs> for StorageConfig {
    fn from(args: StorageArgs) -> Self {
        Self {
            audio_dir: args.audio_dir,
            transcript_dir: args.transcript_dir,
            cookies_file: args.cookies_file,
        }
    }
}

impl From<WhisperArgs> for WhisperConfig {
    fn from(args: WhisperArgs) -> Self {
        Self {
            language: args.language,
            model: args.model,
        }
    }
}

impl Config {
    /// Validate configuration before any work starts
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(ScribeError::Config("YOUTUBE_API_KEY must not be empty".into()).into());
        }

        if let Some(channel) = &self.channel {
            if channel.trim().is_empty() {
                return Err(ScribeError::Config("CHANNEL_NAME must not be empty".into()).into());
            }
        }

        if self.video_limit == 0 {
            return Err(ScribeError::Config("VIDEO_LIMIT must be at least 1".into()).into());
        }

        if self.concurrency == 0 {
            return Err(ScribeError::Config("CONCURRENCY must be at least 1".into()).into());
        }

        Ok(())
    }

    /// Display the resolved settings with the API key masked
    pub fn display(&self) {
        println!("Run configuration:");
        if let Some(channel) = &self.channel {
            println!("  Channel: {}", channel);
        }
        println!("  Video limit: {}", self.video_limit);
        println!("  Concurrency: {}", self.concurrency);
        println!("  Audio dir: {}", self.storage.audio_dir.display());
        println!("  Transcript dir: {}", self.storage.transcript_dir.display());
        println!("  Whisper: {} / {}", self.whisper.language, self.whisper.model);
        println!("  Aggregate output: {}", self.output_path.display());
    }
}
