use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;

use crate::config::WhisperConfig;
use crate::{Result, ScribeError};

/// Canonical transcript filename inside each per-video directory
pub const TRANSCRIPT_FILENAME: &str = "transcription.txt";

/// External speech-to-text tool invoked per audio artifact.
///
/// Implementations write a text file named after the audio file's stem into
/// `output_dir`; the store renames it to the canonical name afterwards.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, audio_path: &Path, output_dir: &Path) -> Result<()>;
}

/// Whisper CLI invocation with captured stdio
pub struct WhisperCli {
    whisper_path: String,
    config: WhisperConfig,
}

impl WhisperCli {
    pub fn new(config: WhisperConfig) -> Self {
        Self {
            whisper_path: "whisper".to_string(),
            config,
        }
    }
}

#[async_trait]
impl SpeechToText for WhisperCli {
    async fn transcribe(&self, audio_path: &Path, output_dir: &Path) -> Result<()> {
        let output = Command::new(&self.whisper_path)
            .arg(audio_path)
            .args(["--language", &self.config.language])
            .args(["--model", &self.config.model])
            .args(["--output_format", "txt"])
            .arg("--output_dir")
            .arg(output_dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("whisper exited with {}: {}", output.status, stderr.trim());
        }

        Ok(())
    }
}

/// Filesystem-addressed transcript artifacts keyed by video id. Existence of
/// `{transcript_dir}/{id}/transcription.txt` is the completion marker.
pub struct TranscriptStore {
    transcript_dir: PathBuf,
    stt: Arc<dyn SpeechToText>,
}

impl TranscriptStore {
    pub fn new(transcript_dir: PathBuf, stt: Arc<dyn SpeechToText>) -> Self {
        Self {
            transcript_dir,
            stt,
        }
    }

    /// Per-video output directory
    pub fn video_dir(&self, video_id: &str) -> PathBuf {
        self.transcript_dir.join(video_id)
    }

    /// Canonical transcript path for a video id
    pub fn transcript_path(&self, video_id: &str) -> PathBuf {
        self.video_dir(video_id).join(TRANSCRIPT_FILENAME)
    }

    /// Path of the per-video metadata document used as the skip marker
    pub fn metadata_path(&self, video_id: &str) -> PathBuf {
        self.video_dir(video_id).join("metadata.json")
    }

    /// Make sure the transcript exists, invoking the speech-to-text tool if
    /// necessary, and return it as an ordered sequence of lines. A second
    /// call for the same id reads the existing file back without
    /// re-transcribing.
    pub async fn ensure_transcript(
        &self,
        video_id: &str,
        audio_path: &Path,
    ) -> Result<Vec<String>> {
        let transcript_path = self.transcript_path(video_id);
        if transcript_path.exists() {
            tracing::info!("Transcript already exists for {}", video_id);
            return read_lines(&transcript_path);
        }

        let output_dir = self.video_dir(video_id);
        fs_err::create_dir_all(&output_dir)?;

        tracing::info!("Transcribing {}", video_id);
        self.stt
            .transcribe(audio_path, &output_dir)
            .await
            .map_err(|err| ScribeError::Transcription {
                video_id: video_id.to_string(),
                message: format!("{:#}", err),
            })?;

        // The tool names its output after the audio file's stem; normalize
        // it to the canonical filename.
        let stem = audio_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| video_id.to_string());
        let raw_path = output_dir.join(format!("{}.txt", stem));

        if !raw_path.exists() {
            return Err(ScribeError::Transcription {
                video_id: video_id.to_string(),
                message: format!("expected output file missing: {}", raw_path.display()),
            }
            .into());
        }

        fs_err::rename(&raw_path, &transcript_path)?;

        read_lines(&transcript_path)
    }
}

/// Read a transcript back as lines, preserving the original split-on-newline
/// shape (including a trailing empty line when the file ends with one).
fn read_lines(path: &Path) -> Result<Vec<String>> {
    let content = fs_err::read_to_string(path)?;
    Ok(content.split('\n').map(str::to_string).collect())
}
