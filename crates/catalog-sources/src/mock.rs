//! Controllable in-memory source for tests and demos.
//!
//! Fan-out and race behavior is timing-dependent, so tests script each
//! source's results, failures, and delays explicitly instead of asserting
//! on real network interleavings.

use async_trait::async_trait;
use catalog_models::{MediaArtifact, RawItem, SeriesUnitList};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::SourceError;
use crate::traits::Source;

#[derive(Debug, Clone)]
enum ResolveBehavior {
    Succeed { locator: String, delay: Option<Duration> },
    Fail { message: String, delay: Option<Duration> },
    /// Never completes; stands in for a source stuck past its timeout.
    Hang,
}

#[derive(Debug, Default)]
pub struct MockSource {
    name: String,
    language: String,
    search_results: Vec<RawItem>,
    search_error: Option<String>,
    search_delay: Option<Duration>,
    search_calls: AtomicUsize,
    unit_lists: HashMap<String, SeriesUnitList>,
    resolve_behaviors: HashMap<String, ResolveBehavior>,
}

impl MockSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: "en".to_string(),
            ..Default::default()
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_raw_item(mut self, title: impl Into<String>, locator: impl Into<String>) -> Self {
        self.search_results.push(RawItem {
            title: title.into(),
            locator: locator.into(),
            unit_count: None,
            synopsis: None,
        });
        self
    }

    pub fn with_search_results(mut self, results: Vec<RawItem>) -> Self {
        self.search_results = results;
        self
    }

    pub fn with_search_error(mut self, message: impl Into<String>) -> Self {
        self.search_error = Some(message.into());
        self
    }

    pub fn with_search_delay(mut self, delay: Duration) -> Self {
        self.search_delay = Some(delay);
        self
    }

    pub fn with_units(mut self, item_locator: impl Into<String>, units: SeriesUnitList) -> Self {
        self.unit_lists.insert(item_locator.into(), units);
        self
    }

    pub fn with_resolve_success(
        mut self,
        unit_locator: impl Into<String>,
        media_locator: impl Into<String>,
        delay: Option<Duration>,
    ) -> Self {
        self.resolve_behaviors.insert(
            unit_locator.into(),
            ResolveBehavior::Succeed {
                locator: media_locator.into(),
                delay,
            },
        );
        self
    }

    pub fn with_resolve_failure(
        mut self,
        unit_locator: impl Into<String>,
        message: impl Into<String>,
        delay: Option<Duration>,
    ) -> Self {
        self.resolve_behaviors.insert(
            unit_locator.into(),
            ResolveBehavior::Fail {
                message: message.into(),
                delay,
            },
        );
        self
    }

    pub fn with_resolve_hang(mut self, unit_locator: impl Into<String>) -> Self {
        self.resolve_behaviors
            .insert(unit_locator.into(), ResolveBehavior::Hang);
        self
    }

    /// How many times `search` has been invoked; used by cache tests.
    pub fn search_call_count(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Source for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn language(&self) -> &str {
        &self.language
    }

    async fn search(&self, _query: &str) -> Result<Vec<RawItem>, SourceError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.search_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.search_error {
            return Err(SourceError::api(message.clone()));
        }
        Ok(self.search_results.clone())
    }

    async fn list_units(&self, item_locator: &str) -> Result<SeriesUnitList, SourceError> {
        self.unit_lists
            .get(item_locator)
            .cloned()
            .ok_or_else(|| SourceError::api(format!("unknown item locator '{}'", item_locator)))
    }

    async fn resolve_media(&self, unit_locator: &str) -> Result<MediaArtifact, SourceError> {
        let behavior = self
            .resolve_behaviors
            .get(unit_locator)
            .cloned()
            .ok_or_else(|| SourceError::api(format!("unknown unit locator '{}'", unit_locator)))?;

        match behavior {
            ResolveBehavior::Succeed { locator, delay } => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                MediaArtifact::from_locator(locator)
                    .map_err(|e| SourceError::api(e.to_string()))
            }
            ResolveBehavior::Fail { message, delay } => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                Err(SourceError::api(message))
            }
            ResolveBehavior::Hang => std::future::pending().await,
        }
    }
}
