use std::fmt;

/// Rejections applied before data enters the catalog or a return value.
// Implemented by hand rather than via `#[derive(thiserror::Error)]` because
// the `source: String` field would otherwise be picked up as the error source,
// which requires it to implement `std::error::Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    MismatchedUnitLists {
        source: String,
        titles: usize,
        locators: usize,
    },

    UnrecognizedArtifact { locator: String },

    InvalidLocator { locator: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MismatchedUnitLists {
                source,
                titles,
                locators,
            } => write!(
                f,
                "unit list from '{source}' has {titles} titles but {locators} locators"
            ),
            ValidationError::UnrecognizedArtifact { locator } => write!(
                f,
                "locator '{locator}' is neither a streaming manifest nor a direct file"
            ),
            ValidationError::InvalidLocator { locator } => {
                write!(f, "locator '{locator}' is not a valid URL")
            }
        }
    }
}

impl std::error::Error for ValidationError {}
