use serde::{Deserialize, Serialize};

/// A single search hit exactly as one source reported it, before any
/// normalization or merging.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RawItem {
    pub title: String,
    /// The source's own locator for this item (URL or opaque id).
    pub locator: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
}

/// One contributing source's entry inside a merged [`CatalogItem`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceEntry {
    pub source: String,
    pub locator: String,
}

/// A deduplicated catalog entry merged from one or more sources.
///
/// `title` is the first-seen raw title and is what gets displayed.
/// `normalized_title` is the dedup key, computed once at merge time and
/// never recomputed afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogItem {
    pub title: String,
    pub normalized_title: String,
    /// Insertion-ordered, one entry per contributing source.
    pub sources: Vec<SourceEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synopsis: Option<String>,
}

impl CatalogItem {
    /// Builds a fresh item from one source's raw hit. The caller supplies
    /// the normalized form so normalization happens exactly once.
    pub fn from_raw(source: &str, raw: RawItem, normalized_title: String) -> Self {
        Self {
            title: raw.title,
            normalized_title,
            sources: vec![SourceEntry {
                source: source.to_string(),
                locator: raw.locator,
            }],
            unit_count: raw.unit_count,
            synopsis: raw.synopsis,
        }
    }

    /// Adds or replaces `source`'s locator. A source may update its own
    /// entry but never ends up listed twice; insertion order is preserved.
    pub fn upsert_source(&mut self, source: &str, locator: String) {
        if let Some(entry) = self.sources.iter_mut().find(|e| e.source == source) {
            entry.locator = locator;
        } else {
            self.sources.push(SourceEntry {
                source: source.to_string(),
                locator,
            });
        }
    }

    /// Folds another source's raw hit into this item. Display title and
    /// merge order stay as first seen; descriptive fields only fill gaps.
    pub fn merge_raw(&mut self, source: &str, raw: RawItem) {
        self.upsert_source(source, raw.locator);
        if self.unit_count.is_none() {
            self.unit_count = raw.unit_count;
        }
        if self.synopsis.is_none() {
            self.synopsis = raw.synopsis;
        }
    }

    pub fn locator_for(&self, source: &str) -> Option<&str> {
        self.sources
            .iter()
            .find(|e| e.source == source)
            .map(|e| e.locator.as_str())
    }

    pub fn source_names(&self) -> impl Iterator<Item = &str> {
        self.sources.iter().map(|e| e.source.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: &str, locator: &str) -> RawItem {
        RawItem {
            title: title.to_string(),
            locator: locator.to_string(),
            unit_count: None,
            synopsis: None,
        }
    }

    #[test]
    fn test_upsert_keeps_one_entry_per_source() {
        let mut item = CatalogItem::from_raw("a", raw("Dandadan", "url-1"), "dandadan".into());
        item.upsert_source("a", "url-2".to_string());
        assert_eq!(item.sources.len(), 1);
        assert_eq!(item.locator_for("a"), Some("url-2"));
    }

    #[test]
    fn test_merge_preserves_first_seen_title_and_order() {
        let mut item = CatalogItem::from_raw("a", raw("Dandadan", "url-a"), "dandadan".into());
        item.merge_raw(
            "b",
            RawItem {
                title: "Dan Da Dan".to_string(),
                locator: "url-b".to_string(),
                unit_count: Some(12),
                synopsis: None,
            },
        );
        assert_eq!(item.title, "Dandadan");
        assert_eq!(item.unit_count, Some(12));
        let names: Vec<_> = item.source_names().collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
