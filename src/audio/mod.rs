use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;

use crate::{Result, ScribeError};

/// External audio downloader invoked per video id
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AudioDownloader: Send + Sync {
    /// Download the audio track for a video to `dest`
    async fn download(&self, video_id: &str, dest: &Path) -> Result<()>;
}

/// yt-dlp invocation with captured stdio
pub struct YtDlpDownloader {
    yt_dlp_path: String,
    cookies_file: PathBuf,
}

impl YtDlpDownloader {
    pub fn new(cookies_file: PathBuf) -> Self {
        Self {
            yt_dlp_path: "yt-dlp".to_string(),
            cookies_file,
        }
    }
}

#[async_trait]
impl AudioDownloader for YtDlpDownloader {
    async fn download(&self, video_id: &str, dest: &Path) -> Result<()> {
        let watch_url = crate::utils::watch_url(video_id);

        let mut command = Command::new(&self.yt_dlp_path);
        if self.cookies_file.exists() {
            command.arg("--cookies").arg(&self.cookies_file);
        }
        command
            .args(["-x", "--audio-format", "mp3", "-o"])
            .arg(dest)
            .arg(&watch_url)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let output = command.output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("yt-dlp exited with {}: {}", output.status, stderr.trim());
        }

        Ok(())
    }
}

/// Filesystem-addressed audio artifacts keyed by video id. Existence of
/// `{audio_dir}/{id}.mp3` is the completion marker.
pub struct AudioStore {
    audio_dir: PathBuf,
    downloader: Arc<dyn AudioDownloader>,
}

impl AudioStore {
    pub fn new(audio_dir: PathBuf, downloader: Arc<dyn AudioDownloader>) -> Self {
        Self {
            audio_dir,
            downloader,
        }
    }

    /// Deterministic artifact path for a video id
    pub fn audio_path(&self, video_id: &str) -> PathBuf {
        self.audio_dir.join(format!("{}.mp3", video_id))
    }

    /// Make sure the audio artifact exists, downloading it if necessary.
    /// A second call for the same id returns the path without re-downloading.
    pub async fn ensure_audio(&self, video_id: &str) -> Result<PathBuf> {
        fs_err::create_dir_all(&self.audio_dir)?;

        let audio_path = self.audio_path(video_id);
        if audio_path.exists() {
            tracing::info!("Audio already exists for {}", video_id);
            return Ok(audio_path);
        }

        tracing::info!("Downloading audio for {}", video_id);
        self.downloader
            .download(video_id, &audio_path)
            .await
            .map_err(|err| ScribeError::Download {
                video_id: video_id.to_string(),
                message: format!("{:#}", err),
            })?;

        Ok(audio_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn download_happens_at_most_once() {
        let dir = TempDir::new().unwrap();
        let audio_dir = dir.path().join("audios");

        let mut downloader = MockAudioDownloader::new();
        downloader.expect_download().times(1).returning(|_, dest| {
            std::fs::write(dest, b"mp3 bytes").unwrap();
            Ok(())
        });

        let store = AudioStore::new(audio_dir.clone(), Arc::new(downloader));

        let first = store.ensure_audio("a1").await.unwrap();
        let second = store.ensure_audio("a1").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first, audio_dir.join("a1.mp3"));
        assert!(first.exists());
    }

    #[tokio::test]
    async fn failed_download_is_a_download_error() {
        let dir = TempDir::new().unwrap();

        let mut downloader = MockAudioDownloader::new();
        downloader
            .expect_download()
            .returning(|_, _| Err(anyhow::anyhow!("yt-dlp exited with 1")));

        let store = AudioStore::new(dir.path().join("audios"), Arc::new(downloader));
        let err = store.ensure_audio("a2").await.unwrap_err();

        match err.downcast_ref::<ScribeError>() {
            Some(ScribeError::Download { video_id, .. }) => assert_eq!(video_id, "a2"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn creates_audio_dir_if_missing() {
        let dir = TempDir::new().unwrap();
        let audio_dir = dir.path().join("nested").join("audios");

        let mut downloader = MockAudioDownloader::new();
        downloader.expect_download().returning(|_, dest| {
            std::fs::write(dest, b"x").unwrap();
            Ok(())
        });

        let store = AudioStore::new(audio_dir.clone(), Arc::new(downloader));
        store.ensure_audio("a3").await.unwrap();

        assert!(audio_dir.is_dir());
    }
}
