//! The aggregation engine: concurrent search fan-out with incremental
//! dedup/merge, a per-session catalog and query cache, parallel unit
//! listing, and the media race.

use catalog_models::{CatalogItem, MediaArtifact, RawItem, SeriesUnitList, UnitRef};
use catalog_sources::SourceDescriptor;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::AbortHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::error::{EngineError, RaceCause};
use crate::normalize::normalize;
use crate::race::{run_race, RaceEntry, RaceOutcome, TaskState};
use crate::similarity::similarity;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Similarity score at or above which two titles merge into one item.
    pub threshold: f64,
    /// Global deadline for a media race.
    pub resolve_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            threshold: 0.95,
            resolve_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&catalog_config::Config> for EngineConfig {
    fn from(config: &catalog_config::Config) -> Self {
        Self {
            threshold: config.matcher.threshold,
            resolve_timeout: config.resolve.timeout(),
        }
    }
}

#[derive(Default)]
struct CatalogState {
    catalog: Vec<CatalogItem>,
    /// normalized query -> the sequence produced for that query.
    cache: HashMap<String, Vec<CatalogItem>>,
}

/// One engine instance owns one session's catalog and cache. Sources are
/// fixed at construction; `clear_search_results` resets the session
/// without touching them.
pub struct CatalogEngine {
    sources: Vec<SourceDescriptor>,
    config: EngineConfig,
    /// Guards the serialized merge step. Held only for synchronous merge
    /// work, never across a suspension point.
    state: Mutex<CatalogState>,
    cancel: CancellationToken,
}

impl CatalogEngine {
    pub fn new(sources: Vec<SourceDescriptor>, config: EngineConfig) -> Self {
        Self {
            sources,
            config,
            state: Mutex::new(CatalogState::default()),
            cancel: CancellationToken::new(),
        }
    }

    pub fn sources(&self) -> &[SourceDescriptor] {
        &self.sources
    }

    /// Session-level interruption handle. Cancelling it stops every
    /// in-flight fan-out and race task; completed merge commits stay,
    /// uncommitted work is discarded.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Read-only snapshot of the running catalog, in merge-commit order.
    pub async fn catalog_snapshot(&self) -> Vec<CatalogItem> {
        self.state.lock().await.catalog.clone()
    }

    /// Empties the running catalog and the query cache. The registry and
    /// its descriptors are untouched. Safe between operations, not
    /// concurrently with one.
    pub async fn clear_search_results(&self) {
        let mut state = self.state.lock().await;
        state.catalog.clear();
        state.cache.clear();
        debug!("Cleared catalog and search cache");
    }

    /// Searches every active source concurrently and returns the merged,
    /// deduplicated sequence for `query`. Memoized per session under the
    /// normalized query; a failing source contributes nothing.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<CatalogItem>, EngineError> {
        let key = normalize(query);
        if let Some(cached) = self.state.lock().await.cache.get(&key) {
            debug!("Search cache hit for '{}'", key);
            return Ok(cached.clone());
        }

        let cancel = self.cancel.child_token();
        let mut tasks = FuturesUnordered::new();
        let mut abort_handles: Vec<AbortHandle> = Vec::with_capacity(self.sources.len());
        for descriptor in &self.sources {
            let source = descriptor.source().clone();
            let name = descriptor.name().to_string();
            let query = query.to_string();
            let handle = tokio::spawn(async move { source.search(&query).await });
            abort_handles.push(handle.abort_handle());
            tasks.push(async move { (name, handle.await) });
        }

        // Indices into the catalog of the items this query produced, in
        // merge-commit order.
        let mut result_indices: Vec<usize> = Vec::new();

        loop {
            if tasks.is_empty() {
                break;
            }
            tokio::select! {
                _ = cancel.cancelled() => {
                    for handle in &abort_handles {
                        handle.abort();
                    }
                    debug!("Search cancelled with {} sources in flight", tasks.len());
                    return Err(EngineError::Cancelled);
                }
                Some((name, joined)) = tasks.next() => {
                    match joined {
                        Ok(Ok(batch)) => {
                            debug!("Source '{}' returned {} raw items", name, batch.len());
                            // Serialized merge: one batch commits atomically
                            // under the state lock.
                            let mut state = self.state.lock().await;
                            merge_batch(
                                &mut state,
                                &mut result_indices,
                                &name,
                                batch,
                                self.config.threshold,
                            );
                        }
                        Ok(Err(e)) => {
                            warn!("Source '{}' search failed: {}", name, e);
                        }
                        Err(e) => {
                            warn!("Search task for '{}' panicked: {}", name, e);
                        }
                    }
                }
            }
        }

        let mut state = self.state.lock().await;
        let results: Vec<CatalogItem> = result_indices
            .iter()
            .map(|&i| state.catalog[i].clone())
            .collect();
        state.cache.insert(key, results.clone());
        info!("Search produced {} merged items", results.len());
        Ok(results)
    }

    /// Fetches unit lists from the item's contributing sources in
    /// parallel. An invalid or failed list is dropped without touching
    /// the others.
    #[instrument(skip(self, item), fields(item = %item.title))]
    pub async fn list_units(&self, item: &CatalogItem) -> HashMap<String, SeriesUnitList> {
        let mut tasks = FuturesUnordered::new();
        for entry in &item.sources {
            let Some(descriptor) = self.sources.iter().find(|d| d.name() == entry.source) else {
                warn!("Source '{}' is no longer registered", entry.source);
                continue;
            };
            let source = descriptor.source().clone();
            let name = entry.source.clone();
            let locator = entry.locator.clone();
            tasks.push(tokio::spawn(async move {
                let result = source.list_units(&locator).await;
                (name, result)
            }));
        }

        let mut lists = HashMap::new();
        while let Some(joined) = tasks.next().await {
            match joined {
                Ok((name, Ok(list))) => match list.validate(&name) {
                    Ok(()) => {
                        debug!("Source '{}' listed {} units", name, list.len());
                        lists.insert(name, list);
                    }
                    Err(e) => warn!("Discarding unit list: {}", e),
                },
                Ok((name, Err(e))) => {
                    warn!("Source '{}' unit listing failed: {}", name, e);
                }
                Err(e) => {
                    warn!("Unit listing task panicked: {}", e);
                }
            }
        }
        lists
    }

    /// Races the unit's candidate sources for a playable artifact. First
    /// valid result wins and the rest are aborted; if every candidate
    /// fails (or the deadline passes first) the per-source causes come
    /// back in the error. An empty `candidates` means every source the
    /// unit has a locator for.
    #[instrument(skip(self, unit), fields(unit = %unit.title))]
    pub async fn resolve_media(
        &self,
        unit: &UnitRef,
        candidates: &[String],
    ) -> Result<MediaArtifact, EngineError> {
        let candidate_names: Vec<String> = if candidates.is_empty() {
            unit.locators.iter().map(|e| e.source.clone()).collect()
        } else {
            candidates.to_vec()
        };

        let mut causes: Vec<RaceCause> = Vec::new();
        let mut entries: Vec<RaceEntry> = Vec::new();
        for name in candidate_names {
            let Some(locator) = unit.locator_for(&name) else {
                causes.push(RaceCause {
                    source: name,
                    state: TaskState::Pending,
                    message: "no locator for this unit".to_string(),
                });
                continue;
            };
            let Some(descriptor) = self.sources.iter().find(|d| d.name() == name) else {
                causes.push(RaceCause {
                    source: name,
                    state: TaskState::Pending,
                    message: "source not registered".to_string(),
                });
                continue;
            };
            entries.push(RaceEntry {
                source_name: name,
                source: descriptor.source().clone(),
                locator: locator.to_string(),
            });
        }

        let outcome = run_race(
            entries,
            causes,
            self.config.resolve_timeout,
            self.cancel.child_token(),
        )
        .await;

        match outcome {
            RaceOutcome::Won { source, artifact } => {
                info!("Media resolved by '{}'", source);
                Ok(artifact)
            }
            RaceOutcome::AllFailed { causes } => Err(EngineError::MediaUnavailable {
                unit: unit.title.clone(),
                causes,
            }),
            RaceOutcome::Cancelled => Err(EngineError::Cancelled),
        }
    }
}

/// The single-writer merge step. Each raw title is normalized once, scored
/// against every item already in the catalog, and either folded into the
/// best match at or above the threshold or inserted as a new item.
fn merge_batch(
    state: &mut CatalogState,
    result_indices: &mut Vec<usize>,
    source: &str,
    batch: Vec<RawItem>,
    threshold: f64,
) {
    for raw in batch {
        let normalized = normalize(&raw.title);
        if normalized.is_empty() {
            warn!("Source '{}' produced an unusable title '{}'", source, raw.title);
            continue;
        }

        let best = state
            .catalog
            .iter()
            .enumerate()
            .map(|(i, item)| (i, similarity(&normalized, &item.normalized_title)))
            .max_by(|a, b| a.1.total_cmp(&b.1));

        match best {
            Some((index, score)) if score >= threshold => {
                debug!(
                    "Merging '{}' from '{}' into '{}' (score {:.3})",
                    raw.title, source, state.catalog[index].title, score
                );
                state.catalog[index].merge_raw(source, raw);
                if !result_indices.contains(&index) {
                    result_indices.push(index);
                }
            }
            _ => {
                state
                    .catalog
                    .push(CatalogItem::from_raw(source, raw, normalized));
                result_indices.push(state.catalog.len() - 1);
            }
        }
    }
}
