use anyhow::{Context, Result};
use catalog_config::{Config, PathManager};
use catalog_core::{CatalogEngine, EngineConfig};
use catalog_models::{CatalogItem, SeriesUnitList, UnitRef};
use catalog_sources::{LoadReport, SourceRegistry};
use std::collections::HashMap;
use tracing::debug;

use crate::output::Output;

pub fn load_config() -> Result<Config> {
    let paths = PathManager::new()?;
    let path = paths.config_file();
    debug!("Loading config from {}", path.display());
    Config::load(&path)
}

pub async fn load_sources(config: &Config) -> Result<LoadReport> {
    let registry = SourceRegistry::new();
    registry
        .load(config, &config.languages)
        .await
        .context("Failed to load sources")
}

async fn build_engine(config: &Config) -> Result<(CatalogEngine, LoadReport)> {
    let report = load_sources(config).await?;
    let engine = CatalogEngine::new(report.usable.clone(), EngineConfig::from(config));
    Ok((engine, report))
}

/// Ctrl-C propagates to every in-flight fan-out and race task through the
/// engine's cancellation token.
fn hook_interrupt(engine: &CatalogEngine) {
    let token = engine.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });
}

pub async fn sources(output: &Output) -> Result<()> {
    let config = load_config()?;
    let report = load_sources(&config).await?;
    output.print_load_report(&report);
    Ok(())
}

pub async fn search(output: &Output, query: &str) -> Result<()> {
    let config = load_config()?;
    let (engine, _) = build_engine(&config).await?;
    hook_interrupt(&engine);
    let items = engine.search(query).await?;
    output.print_items(&items);
    Ok(())
}

pub async fn units(output: &Output, query: &str, index: usize) -> Result<()> {
    let config = load_config()?;
    let (engine, _) = build_engine(&config).await?;
    hook_interrupt(&engine);
    let items = engine.search(query).await?;
    let item = pick_item(&items, index)?;
    let lists = engine.list_units(item).await;
    output.print_unit_lists(&lists);
    Ok(())
}

pub async fn resolve(
    output: &Output,
    query: &str,
    index: usize,
    unit: usize,
    candidates: &[String],
) -> Result<()> {
    let config = load_config()?;
    let (engine, _) = build_engine(&config).await?;
    hook_interrupt(&engine);

    let items = engine.search(query).await?;
    let item = pick_item(&items, index)?;
    let lists = engine.list_units(item).await;
    let unit_ref = unit_ref_at(item, &lists, unit)?;

    let artifact = engine.resolve_media(&unit_ref, candidates).await?;
    output.print_artifact(&artifact);
    Ok(())
}

fn pick_item(items: &[CatalogItem], index: usize) -> Result<&CatalogItem> {
    items.get(index).ok_or_else(|| {
        anyhow::anyhow!(
            "result index {} out of range ({} results)",
            index,
            items.len()
        )
    })
}

/// Builds the logical unit at position `unit` across every source that
/// listed that many units, keeping the item's source order.
fn unit_ref_at(
    item: &CatalogItem,
    lists: &HashMap<String, SeriesUnitList>,
    unit: usize,
) -> Result<UnitRef> {
    let mut unit_ref: Option<UnitRef> = None;

    for source in item.source_names() {
        let Some(list) = lists.get(source) else {
            continue;
        };
        let (Some(unit_title), Some(locator)) = (list.titles.get(unit), list.locators.get(unit))
        else {
            continue;
        };
        // First source with enough units names the unit.
        let current = unit_ref.get_or_insert_with(|| UnitRef::new(unit_title.clone()));
        current.locators.push(catalog_models::SourceEntry {
            source: source.to_string(),
            locator: locator.clone(),
        });
    }

    unit_ref.ok_or_else(|| anyhow::anyhow!("no source lists a unit at position {}", unit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_models::RawItem;

    #[test]
    fn test_unit_ref_at_spans_sources_with_enough_units() {
        let mut item = CatalogItem::from_raw(
            "a",
            RawItem {
                title: "Dandadan".to_string(),
                locator: "itemA".to_string(),
                unit_count: None,
                synopsis: None,
            },
            "dandadan".to_string(),
        );
        item.upsert_source("b", "itemB".to_string());

        let mut lists = HashMap::new();
        lists.insert(
            "a".to_string(),
            SeriesUnitList::new(
                vec!["Episode 1".to_string(), "Episode 2".to_string()],
                vec!["a/1".to_string(), "a/2".to_string()],
            ),
        );
        lists.insert(
            "b".to_string(),
            SeriesUnitList::new(vec!["Episode 1".to_string()], vec!["b/1".to_string()]),
        );

        let unit = unit_ref_at(&item, &lists, 1).unwrap();
        assert_eq!(unit.title, "Episode 2");
        assert_eq!(unit.locator_for("a"), Some("a/2"));
        assert_eq!(unit.locator_for("b"), None);

        let first = unit_ref_at(&item, &lists, 0).unwrap();
        assert_eq!(first.locator_for("a"), Some("a/1"));
        assert_eq!(first.locator_for("b"), Some("b/1"));
    }

    #[test]
    fn test_unit_ref_at_fails_past_every_list() {
        let item = CatalogItem::from_raw(
            "a",
            RawItem {
                title: "Dandadan".to_string(),
                locator: "itemA".to_string(),
                unit_count: None,
                synopsis: None,
            },
            "dandadan".to_string(),
        );
        let mut lists = HashMap::new();
        lists.insert(
            "a".to_string(),
            SeriesUnitList::new(vec!["Episode 1".to_string()], vec!["a/1".to_string()]),
        );
        assert!(unit_ref_at(&item, &lists, 5).is_err());
    }
}
