pub mod engine;
pub mod error;
pub mod normalize;
pub mod race;
pub mod similarity;

pub use engine::{CatalogEngine, EngineConfig};
pub use error::{EngineError, RaceCause};
pub use normalize::normalize;
pub use race::TaskState;
pub use similarity::similarity;
