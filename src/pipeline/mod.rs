use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::audio::AudioStore;
use crate::catalog::{CatalogApi, VideoRecord};
use crate::transcribe::TranscriptStore;
use crate::{Result, ScribeError};

/// One batch run: an ordered, already-bounded id list, a concurrency
/// ceiling, and the aggregate output path.
#[derive(Debug, Clone)]
pub struct BatchJob {
    pub video_ids: Vec<String>,
    pub concurrency: usize,
    pub output_path: PathBuf,
}

/// Drives the fetch → download → transcribe → persist sequence over a batch
/// of independent video ids under a sliding-window concurrency ceiling.
#[derive(Clone)]
pub struct BatchPipeline {
    api: Arc<dyn CatalogApi>,
    audio: Arc<AudioStore>,
    transcripts: Arc<TranscriptStore>,
}

impl BatchPipeline {
    pub fn new(
        api: Arc<dyn CatalogApi>,
        audio: Arc<AudioStore>,
        transcripts: Arc<TranscriptStore>,
    ) -> Self {
        Self {
            api,
            audio,
            transcripts,
        }
    }

    /// Process the whole job and write the aggregate JSON array. Failed
    /// items are filtered out; the surviving records keep the job's order.
    pub async fn run(&self, job: &BatchJob) -> Result<Vec<VideoRecord>> {
        let records = self.process_all(&job.video_ids, job.concurrency).await?;

        if let Some(parent) = job.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs_err::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&records)?;
        fs_err::write(&job.output_path, json)?;

        tracing::info!(
            "Wrote {} of {} records to {}",
            records.len(),
            job.video_ids.len(),
            job.output_path.display()
        );

        Ok(records)
    }

    /// Fan the per-item pipeline out over `video_ids` with at most
    /// `concurrency` items in flight; completion of one item admits the
    /// next. Item failures are logged and dropped, never aborting siblings.
    pub async fn process_all(
        &self,
        video_ids: &[String],
        concurrency: usize,
    ) -> Result<Vec<VideoRecord>> {
        let total = video_ids.len();
        let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));

        let progress = ProgressBar::new(total as u64);
        progress.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap(),
        );
        progress.set_message("Processing videos...");

        let mut tasks: JoinSet<(usize, Option<VideoRecord>)> = JoinSet::new();
        for (index, video_id) in video_ids.iter().cloned().enumerate() {
            let pipeline = self.clone();
            let semaphore = Arc::clone(&semaphore);

            tasks.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .expect("semaphore is never closed");

                tracing::info!("Processing video {}/{}: {}", index + 1, total, video_id);

                match pipeline.process_video(&video_id).await {
                    Ok(record) => (index, Some(record)),
                    Err(err) => {
                        tracing::error!("Failed to process {}: {:#}", video_id, err);
                        (index, None)
                    }
                }
            });
        }

        // Slots are indexed by the input position so the aggregate keeps the
        // original order regardless of completion order.
        let mut slots: Vec<Option<VideoRecord>> = vec![None; total];
        while let Some(joined) = tasks.join_next().await {
            let (index, record) = joined?;
            slots[index] = record;
            progress.inc(1);
        }
        progress.finish_and_clear();

        Ok(slots.into_iter().flatten().collect())
    }

    /// Run the full per-item sequence for one id, short-circuiting on the
    /// per-video metadata document when it already exists.
    pub async fn process_video(&self, video_id: &str) -> Result<VideoRecord> {
        let metadata_path = self.transcripts.metadata_path(video_id);
        if metadata_path.exists() {
            tracing::info!("Already processed: {}", video_id);
            let content = fs_err::read_to_string(&metadata_path)?;
            return Ok(serde_json::from_str(&content)?);
        }

        let details = self
            .api
            .video_details(video_id)
            .await?
            .ok_or_else(|| ScribeError::NotFound(format!("no metadata for video {}", video_id)))?;

        let audio_path = self.audio.ensure_audio(video_id).await?;
        let transcript = self
            .transcripts
            .ensure_transcript(video_id, &audio_path)
            .await?;

        let record = VideoRecord::from_details(details, Some(transcript));

        fs_err::create_dir_all(self.transcripts.video_dir(video_id))?;
        fs_err::write(&metadata_path, serde_json::to_string_pretty(&record)?)?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{AudioDownloader, MockAudioDownloader};
    use crate::catalog::{MockCatalogApi, VideoDetails};
    use crate::transcribe::MockSpeechToText;
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    fn sample_details(video_id: &str) -> VideoDetails {
        let mut thumbnails = BTreeMap::new();
        thumbnails.insert(
            "default".to_string(),
            format!("https://i.ytimg.com/vi/{}/default.jpg", video_id),
        );
        VideoDetails {
            video_id: video_id.to_string(),
            title: format!("Video {}", video_id),
            published_at: "2023-05-01T12:00:00Z".parse().unwrap(),
            view_count: "100".to_string(),
            like_count: "10".to_string(),
            comment_count: "1".to_string(),
            description: "desc".to_string(),
            channel_title: "Acme".to_string(),
            duration: "PT4M13S".to_string(),
            definition: "hd".to_string(),
            caption: "false".to_string(),
            licensed_content: false,
            thumbnails,
        }
    }

    fn any_details_api() -> MockCatalogApi {
        let mut api = MockCatalogApi::new();
        api.expect_video_details()
            .returning(|id| Ok(Some(sample_details(id))));
        api
    }

    fn writing_stt() -> MockSpeechToText {
        let mut stt = MockSpeechToText::new();
        stt.expect_transcribe().returning(|audio, out_dir| {
            let stem = audio.file_stem().unwrap().to_string_lossy().into_owned();
            std::fs::write(out_dir.join(format!("{}.txt", stem)), "transcript line").unwrap();
            Ok(())
        });
        stt
    }

    fn pipeline_in(
        dir: &Path,
        api: MockCatalogApi,
        downloader: Arc<dyn AudioDownloader>,
        stt: MockSpeechToText,
    ) -> BatchPipeline {
        BatchPipeline::new(
            Arc::new(api),
            Arc::new(AudioStore::new(dir.join("audios"), downloader)),
            Arc::new(TranscriptStore::new(
                dir.join("transcripciones"),
                Arc::new(stt),
            )),
        )
    }

    fn ids(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn failed_download_only_drops_that_item() {
        let dir = TempDir::new().unwrap();

        let mut downloader = MockAudioDownloader::new();
        downloader.expect_download().returning(|id, dest| {
            if id == "a2" {
                Err(anyhow::anyhow!("yt-dlp exited with 1"))
            } else {
                std::fs::write(dest, b"mp3").unwrap();
                Ok(())
            }
        });

        let pipeline = pipeline_in(
            dir.path(),
            any_details_api(),
            Arc::new(downloader),
            writing_stt(),
        );
        let job = BatchJob {
            video_ids: ids(&["a1", "a2", "a3"]),
            concurrency: 2,
            output_path: dir.path().join("videos.json"),
        };

        let records = pipeline.run(&job).await.unwrap();

        let record_ids: Vec<&str> = records.iter().map(|r| r.video_id.as_str()).collect();
        assert_eq!(record_ids, vec!["a1", "a3"]);

        let aggregate: Vec<VideoRecord> =
            serde_json::from_str(&std::fs::read_to_string(&job.output_path).unwrap()).unwrap();
        assert_eq!(aggregate, records);
    }

    #[tokio::test]
    async fn empty_job_writes_empty_aggregate() {
        let dir = TempDir::new().unwrap();

        let pipeline = pipeline_in(
            dir.path(),
            MockCatalogApi::new(),
            Arc::new(MockAudioDownloader::new()),
            MockSpeechToText::new(),
        );
        let job = BatchJob {
            video_ids: Vec::new(),
            concurrency: 2,
            output_path: dir.path().join("videos.json"),
        };

        let records = pipeline.run(&job).await.unwrap();
        assert!(records.is_empty());

        let aggregate: Vec<VideoRecord> =
            serde_json::from_str(&std::fs::read_to_string(&job.output_path).unwrap()).unwrap();
        assert!(aggregate.is_empty());
    }

    #[tokio::test]
    async fn processed_item_is_skipped_and_reread_verbatim() {
        let dir = TempDir::new().unwrap();

        let mut downloader = MockAudioDownloader::new();
        downloader.expect_download().times(1).returning(|_, dest| {
            std::fs::write(dest, b"mp3").unwrap();
            Ok(())
        });

        let pipeline = pipeline_in(
            dir.path(),
            any_details_api(),
            Arc::new(downloader),
            writing_stt(),
        );
        let first = pipeline.process_video("a1").await.unwrap();

        // Second pipeline over the same directories: nothing may be fetched,
        // downloaded, or transcribed again.
        let mut silent_api = MockCatalogApi::new();
        silent_api.expect_video_details().times(0);
        let mut silent_downloader = MockAudioDownloader::new();
        silent_downloader.expect_download().times(0);
        let mut silent_stt = MockSpeechToText::new();
        silent_stt.expect_transcribe().times(0);

        let pipeline = pipeline_in(
            dir.path(),
            silent_api,
            Arc::new(silent_downloader),
            silent_stt,
        );
        let second = pipeline.process_video("a1").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second.transcript, Some(vec!["transcript line".to_string()]));
        assert_eq!(second.url, "https://www.youtube.com/watch?v=a1");
    }

    /// Downloader that records how many items hold it concurrently.
    #[derive(Default)]
    struct StallingDownloader {
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    #[async_trait]
    impl AudioDownloader for StallingDownloader {
        async fn download(&self, _video_id: &str, dest: &Path) -> crate::Result<()> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(25)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            std::fs::write(dest, b"mp3")?;
            Ok(())
        }
    }

    #[tokio::test]
    async fn ceiling_bounds_in_flight_items() {
        let dir = TempDir::new().unwrap();
        let downloader = Arc::new(StallingDownloader::default());

        let pipeline = pipeline_in(
            dir.path(),
            any_details_api(),
            downloader.clone(),
            writing_stt(),
        );
        let records = pipeline
            .process_all(&ids(&["a1", "a2", "a3", "a4", "a5", "a6"]), 2)
            .await
            .unwrap();

        assert_eq!(records.len(), 6);
        assert!(downloader.max_in_flight.load(Ordering::SeqCst) <= 2);
    }
}
