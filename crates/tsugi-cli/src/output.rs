use catalog_models::{CatalogItem, MediaArtifact, SeriesUnitList};
use catalog_sources::LoadReport;
use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Table};
use owo_colors::OwoColorize;
use serde_json::json;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

pub struct Output {
    format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn print_load_report(&self, report: &LoadReport) {
        match self.format {
            OutputFormat::Human => {
                let mut table = Table::new();
                table.load_preset(UTF8_FULL_CONDENSED);
                table.set_header(vec!["Source", "Language", "Status"]);
                for descriptor in &report.usable {
                    table.add_row(vec![
                        descriptor.name().to_string(),
                        descriptor.language().to_string(),
                        "usable".to_string(),
                    ]);
                }
                for rejected in &report.rejected {
                    table.add_row(vec![
                        rejected.name.clone(),
                        "-".to_string(),
                        format!("rejected: {}", rejected.reason),
                    ]);
                }
                println!("{table}");
            }
            OutputFormat::Json => {
                let value = json!({
                    "usable": report.usable.iter().map(|d| json!({
                        "name": d.name(),
                        "language": d.language(),
                    })).collect::<Vec<_>>(),
                    "rejected": report.rejected.iter().map(|r| json!({
                        "name": r.name,
                        "reason": r.reason,
                    })).collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
            }
        }
    }

    pub fn print_items(&self, items: &[CatalogItem]) {
        match self.format {
            OutputFormat::Human => {
                if items.is_empty() {
                    println!("{}", "No results.".yellow());
                    return;
                }
                let mut table = Table::new();
                table.load_preset(UTF8_FULL_CONDENSED);
                table.set_header(vec!["#", "Title", "Units", "Sources"]);
                for (index, item) in items.iter().enumerate() {
                    table.add_row(vec![
                        index.to_string(),
                        item.title.clone(),
                        item.unit_count
                            .map(|c| c.to_string())
                            .unwrap_or_else(|| "-".to_string()),
                        item.source_names().collect::<Vec<_>>().join(", "),
                    ]);
                }
                println!("{table}");
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(items).unwrap_or_default());
            }
        }
    }

    pub fn print_unit_lists(&self, lists: &HashMap<String, SeriesUnitList>) {
        match self.format {
            OutputFormat::Human => {
                if lists.is_empty() {
                    println!("{}", "No unit lists available.".yellow());
                    return;
                }
                for source in sorted_sources(lists) {
                    let list = &lists[source];
                    println!("{} ({} units)", source.bold(), list.len());
                    let mut table = Table::new();
                    table.load_preset(UTF8_FULL_CONDENSED);
                    table.set_header(vec!["#", "Title"]);
                    for (index, (title, _)) in list.units().enumerate() {
                        table.add_row(vec![index.to_string(), title.to_string()]);
                    }
                    println!("{table}");
                }
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(lists).unwrap_or_default());
            }
        }
    }

    pub fn print_artifact(&self, artifact: &MediaArtifact) {
        match self.format {
            OutputFormat::Human => {
                println!("{} {:?}", "Kind:".bold(), artifact.kind);
                println!("{} {}", "Location:".bold(), artifact.locator.green());
                for (name, value) in &artifact.headers {
                    println!("{} {}: {}", "Header:".bold(), name, value);
                }
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(artifact).unwrap_or_default()
                );
            }
        }
    }
}

/// HashMap iteration order varies run to run; human output sorts by source
/// name so repeated invocations print the same thing.
fn sorted_sources(lists: &HashMap<String, SeriesUnitList>) -> Vec<&str> {
    let mut sources: Vec<_> = lists.keys().map(String::as_str).collect();
    sources.sort_unstable();
    sources
}
