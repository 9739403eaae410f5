//! MangaDex source: reading content over the public MangaDex REST API.
//!
//! Search goes through `/manga`, chapter listings through the manga feed,
//! and resolution through the at-home server, which hands back the CDN
//! location of the chapter's pages.

use async_trait::async_trait;
use catalog_models::{MediaArtifact, RawItem, SeriesUnitList};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

use crate::error::SourceError;
use crate::traits::Source;

const USER_AGENT: &str = concat!("tsugi/", env!("CARGO_PKG_VERSION"));
const SEARCH_LIMIT: u32 = 20;
const FEED_LIMIT: u32 = 500;

pub struct MangadexSource {
    client: Client,
    api_url: String,
    language: String,
}

impl MangadexSource {
    pub fn new(api_url: String, language: String) -> Result<Self, SourceError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            language,
        })
    }
}

#[derive(Debug, Deserialize)]
struct MangaListResponse {
    data: Vec<Manga>,
}

#[derive(Debug, Deserialize)]
struct Manga {
    id: String,
    attributes: MangaAttributes,
}

#[derive(Debug, Deserialize)]
struct MangaAttributes {
    title: HashMap<String, String>,
    #[serde(default)]
    description: HashMap<String, String>,
    #[serde(rename = "lastChapter")]
    last_chapter: Option<String>,
}

impl MangaAttributes {
    /// MangaDex titles are localized maps; prefer the configured language,
    /// then English, then whatever is there.
    fn display_title(&self, language: &str) -> Option<String> {
        self.title
            .get(language)
            .or_else(|| self.title.get("en"))
            .or_else(|| self.title.values().next())
            .cloned()
    }
}

#[derive(Debug, Deserialize)]
struct ChapterFeedResponse {
    data: Vec<Chapter>,
}

#[derive(Debug, Deserialize)]
struct Chapter {
    id: String,
    attributes: ChapterAttributes,
}

#[derive(Debug, Deserialize)]
struct ChapterAttributes {
    chapter: Option<String>,
    title: Option<String>,
}

impl ChapterAttributes {
    fn display_title(&self) -> String {
        let number = self.chapter.as_deref().unwrap_or("?");
        match self.title.as_deref() {
            Some(title) if !title.is_empty() => format!("Chapter {}: {}", number, title),
            _ => format!("Chapter {}", number),
        }
    }
}

#[derive(Debug, Deserialize)]
struct AtHomeResponse {
    #[serde(rename = "baseUrl")]
    base_url: String,
    chapter: AtHomeChapter,
}

#[derive(Debug, Deserialize)]
struct AtHomeChapter {
    hash: String,
    data: Vec<String>,
}

#[async_trait]
impl Source for MangadexSource {
    fn name(&self) -> &str {
        "mangadex"
    }

    fn language(&self) -> &str {
        &self.language
    }

    async fn search(&self, query: &str) -> Result<Vec<RawItem>, SourceError> {
        let url = format!("{}/manga", self.api_url);
        let limit = SEARCH_LIMIT.to_string();
        let response: MangaListResponse = self
            .client
            .get(&url)
            .query(&[
                ("title", query),
                ("limit", limit.as_str()),
                ("availableTranslatedLanguage[]", self.language.as_str()),
                ("order[relevance]", "desc"),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let items = response
            .data
            .into_iter()
            .filter_map(|manga| {
                let title = manga.attributes.display_title(&self.language)?;
                let unit_count = manga
                    .attributes
                    .last_chapter
                    .as_deref()
                    .and_then(|c| c.parse::<f32>().ok())
                    .map(|c| c as u32);
                Some(RawItem {
                    title,
                    locator: manga.id,
                    unit_count,
                    synopsis: manga.attributes.description.get(&self.language).cloned(),
                })
            })
            .collect::<Vec<_>>();

        debug!("MangaDex search returned {} items", items.len());
        Ok(items)
    }

    async fn list_units(&self, item_locator: &str) -> Result<SeriesUnitList, SourceError> {
        let url = format!("{}/manga/{}/feed", self.api_url, item_locator);
        let limit = FEED_LIMIT.to_string();
        let response: ChapterFeedResponse = self
            .client
            .get(&url)
            .query(&[
                ("translatedLanguage[]", self.language.as_str()),
                ("order[chapter]", "asc"),
                ("limit", limit.as_str()),
            ])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let mut titles = Vec::with_capacity(response.data.len());
        let mut locators = Vec::with_capacity(response.data.len());
        for chapter in response.data {
            titles.push(chapter.attributes.display_title());
            locators.push(chapter.id);
        }
        Ok(SeriesUnitList::new(titles, locators))
    }

    async fn resolve_media(&self, unit_locator: &str) -> Result<MediaArtifact, SourceError> {
        let url = format!("{}/at-home/server/{}", self.api_url, unit_locator);
        let response: AtHomeResponse = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let first_page = response
            .chapter
            .data
            .first()
            .ok_or_else(|| SourceError::api("chapter has no pages"))?;
        let locator = format!(
            "{}/data/{}/{}",
            response.base_url, response.chapter.hash, first_page
        );
        MediaArtifact::from_locator(locator).map_err(|e| SourceError::api(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_title_prefers_configured_language() {
        let mut title = HashMap::new();
        title.insert("en".to_string(), "Dandadan".to_string());
        title.insert("ja".to_string(), "ダンダダン".to_string());
        let attributes = MangaAttributes {
            title,
            description: HashMap::new(),
            last_chapter: None,
        };
        assert_eq!(attributes.display_title("ja").unwrap(), "ダンダダン");
        assert_eq!(attributes.display_title("fr").unwrap(), "Dandadan");
    }

    #[test]
    fn test_chapter_display_title() {
        let with_title = ChapterAttributes {
            chapter: Some("3".to_string()),
            title: Some("The Turbo Granny".to_string()),
        };
        assert_eq!(with_title.display_title(), "Chapter 3: The Turbo Granny");

        let bare = ChapterAttributes {
            chapter: Some("4".to_string()),
            title: None,
        };
        assert_eq!(bare.display_title(), "Chapter 4");
    }
}
