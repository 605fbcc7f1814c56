use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "channel-scribe",
    about = "Channel Scribe - Scrape a YouTube channel's catalog, download audio, and transcribe it",
    version,
    long_about = "A CLI tool that enumerates a YouTube channel's uploads through the Data API, \
downloads each video's audio track with yt-dlp, transcribes it with Whisper, and persists the \
combined metadata and transcripts as JSON documents."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full pipeline and write the aggregate videos.json
    Scrape {
        #[command(flatten)]
        api: ApiArgs,

        #[command(flatten)]
        channel: ChannelArgs,

        #[command(flatten)]
        storage: StorageArgs,

        #[command(flatten)]
        whisper: WhisperArgs,

        /// Maximum number of videos processed concurrently
        #[arg(long, env = "CONCURRENCY", value_name = "COUNT", default_value_t = 1)]
        concurrency: usize,

        /// Path of the aggregate JSON document
        #[arg(short, long, value_name = "FILE", default_value = "videos.json")]
        output: PathBuf,
    },

    /// Download audio tracks for the channel's videos without transcribing
    Download {
        #[command(flatten)]
        api: ApiArgs,

        #[command(flatten)]
        channel: ChannelArgs,

        #[command(flatten)]
        storage: StorageArgs,
    },

    /// Transcribe already-downloaded audio files and write per-video metadata
    Transcribe {
        #[command(flatten)]
        api: ApiArgs,

        #[command(flatten)]
        storage: StorageArgs,

        #[command(flatten)]
        whisper: WhisperArgs,

        /// Maximum number of audio files transcribed concurrently
        #[arg(long, env = "CONCURRENCY", value_name = "COUNT", default_value_t = 1)]
        concurrency: usize,
    },

    /// Report the catalog's total video duration from the aggregate document
    Duration {
        /// Path of the aggregate JSON document to read
        #[arg(short, long, value_name = "FILE", default_value = "videos.json")]
        input: PathBuf,
    },
}

#[derive(Args)]
pub struct ApiArgs {
    /// YouTube Data API key
    #[arg(long, env = "YOUTUBE_API_KEY", value_name = "KEY", hide_env_values = true)]
    pub api_key: String,
}

#[derive(Args)]
pub struct ChannelArgs {
    /// Channel name resolved through the catalog search endpoint
    #[arg(long, env = "CHANNEL_NAME", value_name = "NAME")]
    pub channel: String,

    /// Maximum number of videos taken from the upload listing
    #[arg(long, env = "VIDEO_LIMIT", value_name = "COUNT", default_value_t = 10)]
    pub limit: usize,
}

#[derive(Args)]
pub struct StorageArgs {
    /// Directory holding downloaded audio tracks
    #[arg(long, value_name = "DIR", default_value = "audios")]
    pub audio_dir: PathBuf,

    /// Directory holding per-video transcripts and metadata
    #[arg(long, value_name = "DIR", default_value = "transcripciones")]
    pub transcript_dir: PathBuf,

    /// Netscape cookie file handed to yt-dlp when it exists
    #[arg(long, value_name = "FILE", default_value = "cookies.txt")]
    pub cookies_file: PathBuf,
}

#[derive(Args)]
pub struct WhisperArgs {
    /// Spoken-language hint passed to Whisper
    #[arg(long, value_name = "LANG", default_value = "Spanish")]
    pub language: String,

    /// Whisper model tier (tiny, base, small, medium, large)
    #[arg(long, value_name = "MODEL", default_value = "base")]
    pub model: String,
}
