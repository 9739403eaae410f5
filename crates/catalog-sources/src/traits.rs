use async_trait::async_trait;
use catalog_models::{MediaArtifact, RawItem, SeriesUnitList};

use crate::error::SourceError;

/// The capability contract every source must satisfy: search, unit
/// listing, media resolution, and a declared language tag.
///
/// Every call may block on network I/O and is independently fallible.
/// A source must not assume shared state with any other source; the
/// engine may invoke several sources' calls concurrently.
#[async_trait]
pub trait Source: Send + Sync {
    /// Stable identifier used as the key in catalog source mappings.
    fn name(&self) -> &str;

    /// Declared content language, a lowercase tag like `en` or `ja`.
    fn language(&self) -> &str;

    /// Searches this source's own catalog for `query`.
    async fn search(&self, query: &str) -> Result<Vec<RawItem>, SourceError>;

    /// Lists the episodes/chapters behind one of this source's own item
    /// locators (as previously returned from [`Source::search`]).
    async fn list_units(&self, item_locator: &str) -> Result<SeriesUnitList, SourceError>;

    /// Resolves one of this source's own unit locators to a playable
    /// location.
    async fn resolve_media(&self, unit_locator: &str) -> Result<MediaArtifact, SourceError>;
}
