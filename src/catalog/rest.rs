use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use url::Url;

use super::{CatalogApi, PlaylistPage, VideoDetails, PAGE_SIZE};
use crate::Result;

const BASE_URL: &str = "https://www.googleapis.com/youtube/v3/";

/// YouTube Data API v3 client
pub struct RestCatalog {
    http: Client,
    base_url: Url,
    api_key: String,
}

impl RestCatalog {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: Url::parse(BASE_URL).expect("base URL is valid"),
            api_key: api_key.into(),
        }
    }

    /// Point the client at a different API root (used by tests)
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    async fn get_json<T>(&self, endpoint: &str, query: &[(&str, &str)]) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let url = self
            .base_url
            .join(endpoint)
            .with_context(|| format!("invalid API endpoint: {}", endpoint))?;

        tracing::debug!("GET {} {:?}", endpoint, query);

        let response = self
            .http
            .get(url)
            .query(&[("key", self.api_key.as_str())])
            .query(query)
            .send()
            .await
            .with_context(|| format!("request to {} failed", endpoint))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let body: String = body.chars().take(300).collect();
            anyhow::bail!("catalog API returned {} for {}: {}", status, endpoint, body);
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("failed to decode {} response", endpoint))
    }
}

#[async_trait]
impl CatalogApi for RestCatalog {
    async fn search_channel(&self, query: &str) -> Result<Option<String>> {
        let response: SearchResponse = self
            .get_json(
                "search",
                &[
                    ("part", "snippet"),
                    ("q", query),
                    ("type", "channel"),
                    ("maxResults", "1"),
                ],
            )
            .await?;

        Ok(response
            .items
            .into_iter()
            .next()
            .map(|item| item.snippet.channel_id))
    }

    async fn channel_uploads(&self, channel_id: &str) -> Result<Option<String>> {
        let response: ChannelsResponse = self
            .get_json("channels", &[("part", "contentDetails"), ("id", channel_id)])
            .await?;

        Ok(response
            .items
            .into_iter()
            .next()
            .map(|item| item.content_details.related_playlists.uploads))
    }

    async fn playlist_page(
        &self,
        playlist_id: &str,
        page_token: Option<String>,
    ) -> Result<PlaylistPage> {
        let max_results = PAGE_SIZE.to_string();
        let mut query = vec![
            ("part", "contentDetails"),
            ("playlistId", playlist_id),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(token) = page_token.as_deref() {
            query.push(("pageToken", token));
        }

        let response: PlaylistItemsResponse = self.get_json("playlistItems", &query).await?;

        Ok(PlaylistPage {
            video_ids: response
                .items
                .into_iter()
                .map(|item| item.content_details.video_id)
                .collect(),
            next_page_token: response.next_page_token,
        })
    }

    async fn video_details(&self, video_id: &str) -> Result<Option<VideoDetails>> {
        let response: VideosResponse = self
            .get_json(
                "videos",
                &[("part", "snippet,statistics,contentDetails"), ("id", video_id)],
            )
            .await?;

        Ok(response.items.into_iter().next().map(VideoDetails::from))
    }
}

// Response schemas, decoded at the boundary. Only the consumed fields are
// declared; everything else the API sends is ignored.

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    snippet: SearchSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchSnippet {
    channel_id: String,
}

#[derive(Debug, Deserialize)]
struct ChannelsResponse {
    #[serde(default)]
    items: Vec<ChannelItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelItem {
    content_details: ChannelContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChannelContentDetails {
    related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
struct RelatedPlaylists {
    uploads: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemsResponse {
    #[serde(default)]
    items: Vec<PlaylistItem>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItem {
    content_details: PlaylistItemContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaylistItemContentDetails {
    video_id: String,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoItem {
    id: String,
    snippet: VideoSnippet,
    #[serde(default)]
    statistics: VideoStatistics,
    content_details: VideoContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    title: String,
    published_at: DateTime<Utc>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    thumbnails: HashMap<String, Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoContentDetails {
    duration: String,
    definition: String,
    caption: String,
    #[serde(default)]
    licensed_content: bool,
}

impl From<VideoItem> for VideoDetails {
    fn from(item: VideoItem) -> Self {
        // Collapse each thumbnail descriptor down to its URL; missing
        // counters become the string "0" as in the original documents.
        let thumbnails = item
            .snippet
            .thumbnails
            .into_iter()
            .map(|(label, thumb)| (label, thumb.url))
            .collect();

        Self {
            video_id: item.id,
            title: item.snippet.title,
            published_at: item.snippet.published_at,
            view_count: item.statistics.view_count.unwrap_or_else(|| "0".to_string()),
            like_count: item.statistics.like_count.unwrap_or_else(|| "0".to_string()),
            comment_count: item
                .statistics
                .comment_count
                .unwrap_or_else(|| "0".to_string()),
            description: item.snippet.description,
            channel_title: item.snippet.channel_title,
            duration: item.content_details.duration,
            definition: item.content_details.definition,
            caption: item.content_details.caption,
            licensed_content: item.content_details.licensed_content,
            thumbnails,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn video_item_normalizes_thumbnails_and_counters() {
        let item: VideoItem = serde_json::from_value(json!({
            "id": "a1",
            "snippet": {
                "title": "First video",
                "publishedAt": "2023-05-01T12:00:00Z",
                "channelTitle": "Acme",
                "thumbnails": {
                    "default": { "url": "https://i.ytimg.com/vi/a1/default.jpg", "width": 120 },
                    "high": { "url": "https://i.ytimg.com/vi/a1/hq.jpg" }
                }
            },
            "statistics": { "viewCount": "1200" },
            "contentDetails": {
                "duration": "PT4M13S",
                "definition": "hd",
                "caption": "false",
                "licensedContent": true
            }
        }))
        .unwrap();

        let details = VideoDetails::from(item);

        assert_eq!(details.video_id, "a1");
        assert_eq!(details.view_count, "1200");
        assert_eq!(details.like_count, "0");
        assert_eq!(details.comment_count, "0");
        assert_eq!(details.description, "");
        assert_eq!(details.duration, "PT4M13S");
        assert!(details.licensed_content);
        assert_eq!(
            details.thumbnails.get("default").map(String::as_str),
            Some("https://i.ytimg.com/vi/a1/default.jpg")
        );
        assert_eq!(details.thumbnails.len(), 2);
    }

    #[test]
    fn playlist_response_decodes_continuation_token() {
        let response: PlaylistItemsResponse = serde_json::from_value(json!({
            "items": [
                { "contentDetails": { "videoId": "a1" } },
                { "contentDetails": { "videoId": "a2" } }
            ],
            "nextPageToken": "p2"
        }))
        .unwrap();

        let ids: Vec<String> = response
            .items
            .into_iter()
            .map(|item| item.content_details.video_id)
            .collect();
        assert_eq!(ids, vec!["a1", "a2"]);
        assert_eq!(response.next_page_token.as_deref(), Some("p2"));
    }

    #[test]
    fn empty_responses_decode_to_empty_items() {
        let search: SearchResponse = serde_json::from_value(json!({})).unwrap();
        assert!(search.items.is_empty());

        let channels: ChannelsResponse = serde_json::from_value(json!({ "items": [] })).unwrap();
        assert!(channels.items.is_empty());
    }
}
