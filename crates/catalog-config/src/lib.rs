pub mod config;
pub mod paths;

pub use config::{
    Config, ConsumetConfig, MangadexConfig, MatcherConfig, ResolveConfig, SourcesConfig,
};
pub use paths::PathManager;
