use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub mod rest;

pub use rest::RestCatalog;

use crate::{Result, ScribeError};

/// Page size requested from the playlist listing endpoint
pub const PAGE_SIZE: usize = 50;

/// One page of a channel's upload listing
#[derive(Debug, Clone)]
pub struct PlaylistPage {
    pub video_ids: Vec<String>,
    pub next_page_token: Option<String>,
}

/// Normalized result of a single-video metadata lookup
#[derive(Debug, Clone, PartialEq)]
pub struct VideoDetails {
    pub video_id: String,
    pub title: String,
    pub published_at: DateTime<Utc>,
    pub view_count: String,
    pub like_count: String,
    pub comment_count: String,
    pub description: String,
    pub channel_title: String,
    pub duration: String,
    pub definition: String,
    pub caption: String,
    pub licensed_content: bool,
    pub thumbnails: BTreeMap<String, String>,
}

/// The per-video document persisted to disk and aggregated into videos.json.
///
/// Field names follow the original camelCase wire format so existing
/// documents keep decoding on the skip path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub title: String,
    pub video_id: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub view_count: String,
    pub like_count: String,
    pub comment_count: String,
    pub description: String,
    pub channel_title: String,
    pub duration: String,
    pub definition: String,
    pub caption: String,
    pub licensed_content: bool,
    pub thumbnails: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<Vec<String>>,
}

impl VideoRecord {
    /// Assemble the persisted record from a metadata lookup and a transcript
    pub fn from_details(details: VideoDetails, transcript: Option<Vec<String>>) -> Self {
        let url = crate::utils::watch_url(&details.video_id);
        Self {
            title: details.title,
            video_id: details.video_id,
            url,
            published_at: details.published_at,
            view_count: details.view_count,
            like_count: details.like_count,
            comment_count: details.comment_count,
            description: details.description,
            channel_title: details.channel_title,
            duration: details.duration,
            definition: details.definition,
            caption: details.caption,
            licensed_content: details.licensed_content,
            thumbnails: details.thumbnails,
            transcript,
        }
    }
}

/// Read access to the remote video catalog.
///
/// `None` return values mean "the upstream had no matching item"; the callers
/// decide whether that is fatal.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// Resolve a channel name to its opaque channel id
    async fn search_channel(&self, query: &str) -> Result<Option<String>>;

    /// Resolve a channel id to its canonical uploads playlist id
    async fn channel_uploads(&self, channel_id: &str) -> Result<Option<String>>;

    /// Fetch one page of the upload listing
    async fn playlist_page(
        &self,
        playlist_id: &str,
        page_token: Option<String>,
    ) -> Result<PlaylistPage>;

    /// Fetch snippet/statistics/content-detail fields for one video
    async fn video_details(&self, video_id: &str) -> Result<Option<VideoDetails>>;
}

/// Catalog enumerator: resolves a channel name to its upload listing and
/// paginates through it up to a configured maximum.
pub struct ChannelCatalog {
    api: Arc<dyn CatalogApi>,
}

impl ChannelCatalog {
    pub fn new(api: Arc<dyn CatalogApi>) -> Self {
        Self { api }
    }

    /// Resolve a channel name to its uploads playlist id
    pub async fn uploads_playlist(&self, channel: &str) -> Result<String> {
        let channel_id = self
            .api
            .search_channel(channel)
            .await?
            .ok_or_else(|| ScribeError::NotFound(format!("no channel matches '{}'", channel)))?;

        tracing::info!("Resolved channel '{}' to {}", channel, channel_id);

        let playlist_id = self.api.channel_uploads(&channel_id).await?.ok_or_else(|| {
            ScribeError::NotFound(format!("channel {} has no uploads playlist", channel_id))
        })?;

        Ok(playlist_id)
    }

    /// Concatenate video ids across listing pages until the continuation
    /// token is exhausted or `limit` ids have accumulated.
    pub async fn list_video_ids(&self, playlist_id: &str, limit: usize) -> Result<Vec<String>> {
        let mut video_ids: Vec<String> = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let page = self
                .api
                .playlist_page(playlist_id, page_token.take())
                .await?;

            video_ids.extend(page.video_ids);
            page_token = page.next_page_token;

            if page_token.is_none() || video_ids.len() >= limit {
                break;
            }
        }

        video_ids.truncate(limit);
        Ok(video_ids)
    }

    /// Full enumeration: channel name to a bounded, ordered id list
    pub async fn enumerate(&self, channel: &str, limit: usize) -> Result<Vec<String>> {
        let playlist_id = self.uploads_playlist(channel).await?;
        self.list_video_ids(&playlist_id, limit).await
    }
}
