//! Video source backed by a self-hosted Consumet API instance.
//!
//! Consumet fronts a number of streaming scrapers behind one REST shape:
//! `/anime/{provider}/{query}` to search, `/anime/{provider}/info` for the
//! episode list, `/anime/{provider}/watch` for the stream manifest plus the
//! transport headers the player must send.

use async_trait::async_trait;
use catalog_models::{MediaArtifact, RawItem, SeriesUnitList};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use crate::error::SourceError;
use crate::traits::Source;

pub struct ConsumetSource {
    client: Client,
    base_url: String,
    provider: String,
    language: String,
}

impl ConsumetSource {
    pub fn new(
        base_url: String,
        provider: String,
        language: String,
    ) -> Result<Self, SourceError> {
        let client = Client::new();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            provider,
            language,
        })
    }

    fn provider_url(&self, tail: &str) -> String {
        format!("{}/anime/{}/{}", self.base_url, self.provider, tail)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: String,
    title: String,
}

#[derive(Debug, Deserialize)]
struct InfoResponse {
    #[serde(default)]
    episodes: Vec<Episode>,
}

#[derive(Debug, Deserialize)]
struct Episode {
    id: String,
    number: Option<f32>,
    title: Option<String>,
}

impl Episode {
    fn display_title(&self) -> String {
        let number = self
            .number
            .map(|n| {
                if n.fract() == 0.0 {
                    format!("{}", n as u32)
                } else {
                    format!("{}", n)
                }
            })
            .unwrap_or_else(|| "?".to_string());
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => format!("Episode {}: {}", number, title),
            _ => format!("Episode {}", number),
        }
    }
}

#[derive(Debug, Deserialize)]
struct WatchResponse {
    #[serde(default)]
    headers: HashMap<String, String>,
    sources: Vec<StreamSource>,
}

#[derive(Debug, Deserialize)]
struct StreamSource {
    url: String,
    #[serde(default, rename = "isM3U8")]
    is_m3u8: bool,
    #[serde(default)]
    quality: Option<String>,
}

/// Prefers the stream a player wants: an auto/default HLS manifest first,
/// then any manifest, then whatever is left.
fn pick_stream(sources: &[StreamSource]) -> Option<&StreamSource> {
    sources
        .iter()
        .find(|s| s.is_m3u8 && matches!(s.quality.as_deref(), Some("auto") | Some("default")))
        .or_else(|| sources.iter().find(|s| s.is_m3u8))
        .or_else(|| sources.first())
}

#[async_trait]
impl Source for ConsumetSource {
    fn name(&self) -> &str {
        "consumet"
    }

    fn language(&self) -> &str {
        &self.language
    }

    async fn search(&self, query: &str) -> Result<Vec<RawItem>, SourceError> {
        let url = self.provider_url(&urlencoding::encode(query));
        let response: SearchResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let items = response
            .results
            .into_iter()
            .map(|result| RawItem {
                title: result.title,
                locator: result.id,
                unit_count: None,
                synopsis: None,
            })
            .collect::<Vec<_>>();

        debug!("Consumet ({}) search returned {} items", self.provider, items.len());
        Ok(items)
    }

    async fn list_units(&self, item_locator: &str) -> Result<SeriesUnitList, SourceError> {
        let url = self.provider_url("info");
        let response: InfoResponse = self
            .client
            .get(&url)
            .query(&[("id", item_locator)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut titles = Vec::with_capacity(response.episodes.len());
        let mut locators = Vec::with_capacity(response.episodes.len());
        for episode in response.episodes {
            titles.push(episode.display_title());
            locators.push(episode.id);
        }
        Ok(SeriesUnitList::new(titles, locators))
    }

    async fn resolve_media(&self, unit_locator: &str) -> Result<MediaArtifact, SourceError> {
        let url = self.provider_url("watch");
        let response: WatchResponse = self
            .client
            .get(&url)
            .query(&[("episodeId", unit_locator)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let stream = pick_stream(&response.sources)
            .ok_or_else(|| SourceError::api("watch response carried no sources"))?;
        let mut artifact = MediaArtifact::from_locator(stream.url.clone())
            .map_err(|e| SourceError::api(e.to_string()))?;
        artifact.headers = response.headers;
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(url: &str, is_m3u8: bool, quality: Option<&str>) -> StreamSource {
        StreamSource {
            url: url.to_string(),
            is_m3u8,
            quality: quality.map(str::to_string),
        }
    }

    #[test]
    fn test_pick_stream_prefers_default_manifest() {
        let sources = vec![
            stream("https://cdn.example.com/720.m3u8", true, Some("720p")),
            stream("https://cdn.example.com/auto.m3u8", true, Some("auto")),
            stream("https://cdn.example.com/fallback.mp4", false, None),
        ];
        assert_eq!(
            pick_stream(&sources).unwrap().url,
            "https://cdn.example.com/auto.m3u8"
        );
    }

    #[test]
    fn test_pick_stream_falls_back_in_order() {
        let manifest_only = vec![stream("https://cdn.example.com/720.m3u8", true, Some("720p"))];
        assert_eq!(
            pick_stream(&manifest_only).unwrap().url,
            "https://cdn.example.com/720.m3u8"
        );

        let file_only = vec![stream("https://cdn.example.com/ep.mp4", false, None)];
        assert_eq!(
            pick_stream(&file_only).unwrap().url,
            "https://cdn.example.com/ep.mp4"
        );

        assert!(pick_stream(&[]).is_none());
    }

    #[test]
    fn test_episode_display_title() {
        let episode = Episode {
            id: "ep-1".to_string(),
            number: Some(1.0),
            title: Some("Opening Night".to_string()),
        };
        assert_eq!(episode.display_title(), "Episode 1: Opening Night");

        let half = Episode {
            id: "ep-6-5".to_string(),
            number: Some(6.5),
            title: None,
        };
        assert_eq!(half.display_title(), "Episode 6.5");
    }
}
