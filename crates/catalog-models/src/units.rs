use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::item::SourceEntry;

/// One source's episode/chapter listing: parallel title and locator
/// sequences. The two must be the same length or the whole list is
/// rejected before it reaches the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct SeriesUnitList {
    pub titles: Vec<String>,
    pub locators: Vec<String>,
}

impl SeriesUnitList {
    pub fn new(titles: Vec<String>, locators: Vec<String>) -> Self {
        Self { titles, locators }
    }

    pub fn validate(&self, source: &str) -> Result<(), ValidationError> {
        if self.titles.len() != self.locators.len() {
            return Err(ValidationError::MismatchedUnitLists {
                source: source.to_string(),
                titles: self.titles.len(),
                locators: self.locators.len(),
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn units(&self) -> impl Iterator<Item = (&str, &str)> {
        self.titles
            .iter()
            .map(String::as_str)
            .zip(self.locators.iter().map(String::as_str))
    }
}

/// One logical unit (episode or chapter) with the locator each
/// contributing source uses for it. Built by the caller from the
/// per-source unit lists; handed to the media race.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UnitRef {
    pub title: String,
    /// Per-source locators for this unit, in the item's source order.
    pub locators: Vec<SourceEntry>,
}

impl UnitRef {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            locators: Vec::new(),
        }
    }

    pub fn with_locator(mut self, source: impl Into<String>, locator: impl Into<String>) -> Self {
        self.locators.push(SourceEntry {
            source: source.into(),
            locator: locator.into(),
        });
        self
    }

    pub fn locator_for(&self, source: &str) -> Option<&str> {
        self.locators
            .iter()
            .find(|e| e.source == source)
            .map(|e| e.locator.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_mismatched_lengths() {
        let list = SeriesUnitList::new(
            (1..=10).map(|n| format!("Episode {}", n)).collect(),
            (1..=9).map(|n| format!("ep/{}", n)).collect(),
        );
        let err = list.validate("gogo").unwrap_err();
        assert_eq!(
            err,
            ValidationError::MismatchedUnitLists {
                source: "gogo".to_string(),
                titles: 10,
                locators: 9,
            }
        );
    }

    #[test]
    fn test_validate_accepts_matching_lengths() {
        let list = SeriesUnitList::new(
            vec!["Episode 1".to_string()],
            vec!["ep/1".to_string()],
        );
        assert!(list.validate("gogo").is_ok());
    }

    #[test]
    fn test_unit_ref_lookup() {
        let unit = UnitRef::new("Episode 1")
            .with_locator("a", "a/ep1")
            .with_locator("b", "b/ep1");
        assert_eq!(unit.locator_for("b"), Some("b/ep1"));
        assert_eq!(unit.locator_for("c"), None);
    }
}
