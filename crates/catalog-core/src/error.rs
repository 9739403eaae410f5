use thiserror::Error;

use crate::race::TaskState;

/// One source's recorded failure from a media race.
#[derive(Debug, Clone)]
pub struct RaceCause {
    pub source: String,
    pub state: TaskState,
    pub message: String,
}

impl std::fmt::Display for RaceCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} ({:?})", self.source, self.message, self.state)
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    /// Terminal failure of a media race: every candidate failed, or the
    /// global timeout elapsed before any success.
    #[error("no source could provide media for '{unit}': [{}]", format_causes(.causes))]
    MediaUnavailable { unit: String, causes: Vec<RaceCause> },

    /// The caller interrupted the operation.
    #[error("operation cancelled")]
    Cancelled,
}

fn format_causes(causes: &[RaceCause]) -> String {
    causes
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}
