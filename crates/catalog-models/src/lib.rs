pub mod artifact;
pub mod error;
pub mod item;
pub mod units;

pub use artifact::{ArtifactKind, MediaArtifact};
pub use error::ValidationError;
pub use item::{CatalogItem, RawItem, SourceEntry};
pub use units::{SeriesUnitList, UnitRef};
