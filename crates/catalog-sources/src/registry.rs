//! Source factory pattern for creating sources from configuration.
//!
//! Registration is where conformance is decided: a candidate that cannot
//! produce a valid descriptor is recorded and excluded here, never at
//! call time, and never aborts loading of the remaining candidates.

use anyhow::Result;
use async_trait::async_trait;
use catalog_config::Config;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::traits::Source;

/// A validated handle to one plugin: identity, language tag, and the
/// capability operations. Created once at registry load time and never
/// mutated by search operations.
#[derive(Clone)]
pub struct SourceDescriptor {
    name: String,
    language: String,
    source: Arc<dyn Source>,
}

impl SourceDescriptor {
    /// Wraps an already-constructed source, taking its declared identity
    /// at face value. Registry loading goes through [`SourceRegistry::load`]
    /// instead, which validates the declaration first; this is for callers
    /// (and tests) embedding their own source implementations.
    pub fn new(source: Arc<dyn Source>) -> Self {
        Self {
            name: source.name().to_string(),
            language: source.language().to_ascii_lowercase(),
            source,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn source(&self) -> &Arc<dyn Source> {
        &self.source
    }
}

impl std::fmt::Debug for SourceDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceDescriptor")
            .field("name", &self.name)
            .field("language", &self.language)
            .finish()
    }
}

/// A candidate that failed validation during load. Non-fatal; the
/// remaining candidates still load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedSource {
    pub name: String,
    pub reason: String,
}

/// Outcome of a registry load: the usable descriptors plus everything
/// that was excluded and why.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub usable: Vec<SourceDescriptor>,
    pub rejected: Vec<RejectedSource>,
}

#[derive(Debug, Error)]
pub enum RegistryError {
    /// Configuration-level failure: the caller asked for languages and
    /// no usable source survived.
    #[error("no usable sources for requested languages [{}]", .languages.join(", "))]
    NoUsableSources { languages: Vec<String> },
}

/// Factory trait for creating sources from configuration.
#[async_trait]
pub trait SourceFactory: Send + Sync {
    /// The name of the source this factory creates.
    fn source_name(&self) -> &str;

    /// Create a source instance from configuration.
    /// Returns None if the source is not enabled or not configured.
    async fn create_source(&self, config: &Config) -> Result<Option<Arc<dyn Source>>>;

    /// Validate that the source configuration is valid before creation.
    fn validate_config(&self, config: &Config) -> Result<()>;
}

/// Registry of source factories.
pub struct SourceRegistry {
    factories: Vec<Box<dyn SourceFactory>>,
}

impl SourceRegistry {
    /// Create a new registry with all built-in factories registered.
    pub fn new() -> Self {
        let mut registry = Self {
            factories: Vec::new(),
        };
        registry.register(Box::new(mangadex::MangadexSourceFactory));
        registry.register(Box::new(consumet::ConsumetSourceFactory));
        registry
    }

    pub fn empty() -> Self {
        Self {
            factories: Vec::new(),
        }
    }

    pub fn register(&mut self, factory: Box<dyn SourceFactory>) {
        self.factories.push(factory);
    }

    pub fn registered_sources(&self) -> Vec<&str> {
        self.factories.iter().map(|f| f.source_name()).collect()
    }

    /// Creates and validates every candidate, keeping those whose
    /// declared language is in the requested set. A candidate failure is
    /// recorded and excluded without touching the others; the only error
    /// is zero usable sources against a non-empty language request.
    pub async fn load(
        &self,
        config: &Config,
        requested_languages: &[String],
    ) -> Result<LoadReport, RegistryError> {
        let mut report = LoadReport::default();

        for factory in &self.factories {
            let name = factory.source_name().to_string();

            if let Err(e) = factory.validate_config(config) {
                warn!("Source '{}' rejected: {:#}", name, e);
                report.rejected.push(RejectedSource {
                    name,
                    reason: format!("{:#}", e),
                });
                continue;
            }

            let source = match factory.create_source(config).await {
                Ok(Some(source)) => source,
                Ok(None) => {
                    debug!("Source '{}' not enabled, skipping", name);
                    continue;
                }
                Err(e) => {
                    warn!("Source '{}' rejected: {:#}", name, e);
                    report.rejected.push(RejectedSource {
                        name,
                        reason: format!("{:#}", e),
                    });
                    continue;
                }
            };

            match validate_descriptor(&name, source.as_ref()) {
                Ok(()) => {}
                Err(reason) => {
                    warn!("Source '{}' rejected: {}", name, reason);
                    report.rejected.push(RejectedSource { name, reason });
                    continue;
                }
            }

            let language = source.language().to_ascii_lowercase();
            if !requested_languages.is_empty()
                && !requested_languages
                    .iter()
                    .any(|l| l.eq_ignore_ascii_case(&language))
            {
                debug!(
                    "Source '{}' excluded: language '{}' not requested",
                    name, language
                );
                report.rejected.push(RejectedSource {
                    name,
                    reason: format!("language '{}' not in requested set", language),
                });
                continue;
            }

            report.usable.push(SourceDescriptor {
                name: source.name().to_string(),
                language,
                source,
            });
        }

        if report.usable.is_empty() && !requested_languages.is_empty() {
            return Err(RegistryError::NoUsableSources {
                languages: requested_languages.to_vec(),
            });
        }

        Ok(report)
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Descriptor-level conformance checks: a source has to declare a usable
/// identity and language before any of its operations get called.
fn validate_descriptor(factory_name: &str, source: &dyn Source) -> Result<(), String> {
    if source.name().trim().is_empty() {
        return Err("source declares an empty name".to_string());
    }
    if source.name() != factory_name {
        return Err(format!(
            "source declares name '{}' but was registered as '{}'",
            source.name(),
            factory_name
        ));
    }
    if source.language().trim().is_empty() {
        return Err("source declares an empty language tag".to_string());
    }
    Ok(())
}

mod mangadex {
    use super::*;
    use crate::mangadex::MangadexSource;

    pub struct MangadexSourceFactory;

    #[async_trait]
    impl SourceFactory for MangadexSourceFactory {
        fn source_name(&self) -> &str {
            "mangadex"
        }

        async fn create_source(&self, config: &Config) -> Result<Option<Arc<dyn Source>>> {
            if let Some(mangadex_config) = &config.sources.mangadex {
                if mangadex_config.enabled {
                    let source = MangadexSource::new(
                        mangadex_config.api_url.clone(),
                        mangadex_config.language.clone(),
                    )?;
                    return Ok(Some(Arc::new(source)));
                }
            }
            Ok(None)
        }

        fn validate_config(&self, config: &Config) -> Result<()> {
            if let Some(mangadex_config) = &config.sources.mangadex {
                if mangadex_config.enabled && mangadex_config.api_url.is_empty() {
                    return Err(anyhow::anyhow!(
                        "MangaDex is enabled but api_url is not configured"
                    ));
                }
            }
            Ok(())
        }
    }
}

mod consumet {
    use super::*;
    use crate::consumet::ConsumetSource;

    pub struct ConsumetSourceFactory;

    #[async_trait]
    impl SourceFactory for ConsumetSourceFactory {
        fn source_name(&self) -> &str {
            "consumet"
        }

        async fn create_source(&self, config: &Config) -> Result<Option<Arc<dyn Source>>> {
            if let Some(consumet_config) = &config.sources.consumet {
                if consumet_config.enabled {
                    let source = ConsumetSource::new(
                        consumet_config.base_url.clone(),
                        consumet_config.provider.clone(),
                        consumet_config.language.clone(),
                    )?;
                    return Ok(Some(Arc::new(source)));
                }
            }
            Ok(None)
        }

        fn validate_config(&self, config: &Config) -> Result<()> {
            if let Some(consumet_config) = &config.sources.consumet {
                if consumet_config.enabled && consumet_config.base_url.is_empty() {
                    return Err(anyhow::anyhow!(
                        "Consumet is enabled but base_url is not configured"
                    ));
                }
            }
            Ok(())
        }
    }
}
