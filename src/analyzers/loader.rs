//! Analyzer registry and loader.
//!
//! Analyzers are resolved by identifier through a static registration table.
//! Required analyzers are resolved first and handed to the dependent's
//! factory; every instance is memoized, so one identifier yields one shared
//! instance per loader.

use indexmap::IndexMap;
use tracing::debug;

use super::class_level::{self, ClassLevelAnalyzer};
use super::coderank::{self, CodeRankAnalyzer};
use super::coupling::{self, CouplingAnalyzer};
use super::cyclomatic::{self, CyclomaticAnalyzer};
use super::dependency::{self, DependencyAnalyzer};
use super::inheritance::{self, InheritanceAnalyzer};
use super::loc::{self, LocAnalyzer};
use super::node_count::{self, NodeCountAnalyzer};
use super::{shared, SharedAnalyzer};
use crate::core::config::MetricsConfig;
use crate::core::errors::{MetricsError, Result};
use crate::io::cache::SharedCacheDriver;

/// Builds an analyzer from configuration and its resolved requirements,
/// which arrive in the order of [`AnalyzerRegistration::requires`]
pub type AnalyzerFactory = fn(&MetricsConfig, &[SharedAnalyzer]) -> Result<SharedAnalyzer>;

/// Static description of one analyzer
#[derive(Debug, Clone, Copy)]
pub struct AnalyzerRegistration {
    pub id: &'static str,
    pub requires: &'static [&'static str],
    pub cache_aware: bool,
    pub factory: AnalyzerFactory,
}

/// Analyzers shipped with the crate
pub const BUILTIN_ANALYZERS: &[AnalyzerRegistration] = &[
    AnalyzerRegistration {
        id: loc::ID,
        requires: &[],
        cache_aware: true,
        factory: build_loc,
    },
    AnalyzerRegistration {
        id: cyclomatic::ID,
        requires: &[],
        cache_aware: true,
        factory: build_cyclomatic,
    },
    AnalyzerRegistration {
        id: coupling::ID,
        requires: &[],
        cache_aware: false,
        factory: build_coupling,
    },
    AnalyzerRegistration {
        id: node_count::ID,
        requires: &[],
        cache_aware: false,
        factory: build_node_count,
    },
    AnalyzerRegistration {
        id: inheritance::ID,
        requires: &[],
        cache_aware: false,
        factory: build_inheritance,
    },
    AnalyzerRegistration {
        id: class_level::ID,
        requires: class_level::REQUIRES,
        cache_aware: false,
        factory: build_class_level,
    },
    AnalyzerRegistration {
        id: dependency::ID,
        requires: &[],
        cache_aware: false,
        factory: build_dependency,
    },
    AnalyzerRegistration {
        id: coderank::ID,
        requires: &[],
        cache_aware: false,
        factory: build_coderank,
    },
];

fn build_loc(_: &MetricsConfig, _: &[SharedAnalyzer]) -> Result<SharedAnalyzer> {
    Ok(shared(LocAnalyzer::new()))
}

fn build_cyclomatic(_: &MetricsConfig, _: &[SharedAnalyzer]) -> Result<SharedAnalyzer> {
    Ok(shared(CyclomaticAnalyzer::new()))
}

fn build_coupling(_: &MetricsConfig, _: &[SharedAnalyzer]) -> Result<SharedAnalyzer> {
    Ok(shared(CouplingAnalyzer::new()))
}

fn build_node_count(_: &MetricsConfig, _: &[SharedAnalyzer]) -> Result<SharedAnalyzer> {
    Ok(shared(NodeCountAnalyzer::new()))
}

fn build_inheritance(_: &MetricsConfig, _: &[SharedAnalyzer]) -> Result<SharedAnalyzer> {
    Ok(shared(InheritanceAnalyzer::new()))
}

fn build_class_level(_: &MetricsConfig, required: &[SharedAnalyzer]) -> Result<SharedAnalyzer> {
    let cyclomatic = required
        .first()
        .cloned()
        .ok_or_else(|| MetricsError::missing_analyzer(cyclomatic::ID, class_level::ID))?;
    Ok(shared(ClassLevelAnalyzer::new(cyclomatic)))
}

fn build_dependency(config: &MetricsConfig, _: &[SharedAnalyzer]) -> Result<SharedAnalyzer> {
    Ok(shared(DependencyAnalyzer::new(config.dependency.clone())))
}

fn build_coderank(config: &MetricsConfig, _: &[SharedAnalyzer]) -> Result<SharedAnalyzer> {
    Ok(shared(CodeRankAnalyzer::new(&config.coderank)?))
}

/// Resolves analyzer identifiers to memoized, fully wired instances.
#[derive(Debug)]
pub struct AnalyzerLoader {
    config: MetricsConfig,
    cache: Option<SharedCacheDriver>,
    registry: Vec<AnalyzerRegistration>,
    instances: IndexMap<&'static str, SharedAnalyzer>,
    resolving: Vec<&'static str>,
}

impl AnalyzerLoader {
    /// Loader over [`BUILTIN_ANALYZERS`]
    pub fn new(config: MetricsConfig, cache: Option<SharedCacheDriver>) -> Self {
        Self::with_registry(config, cache, BUILTIN_ANALYZERS.to_vec())
    }

    pub fn with_registry(
        config: MetricsConfig,
        cache: Option<SharedCacheDriver>,
        registry: Vec<AnalyzerRegistration>,
    ) -> Self {
        Self {
            config,
            cache,
            registry,
            instances: IndexMap::new(),
            resolving: Vec::new(),
        }
    }

    /// Whether an identifier is registered
    pub fn is_registered(&self, id: &str) -> bool {
        self.registration(id).is_some()
    }

    /// Resolve one analyzer and everything it requires
    pub fn load(&mut self, id: &str) -> Result<SharedAnalyzer> {
        self.resolve(id, None)
    }

    /// Resolve several analyzers; duplicates share one instance
    pub fn load_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) -> Result<Vec<SharedAnalyzer>> {
        ids.into_iter().map(|id| self.load(id)).collect()
    }

    /// Every instance created so far, requirements before their dependents
    pub fn loaded(&self) -> Vec<SharedAnalyzer> {
        self.instances.values().cloned().collect()
    }

    pub fn loaded_ids(&self) -> Vec<&'static str> {
        self.instances.keys().copied().collect()
    }

    fn registration(&self, id: &str) -> Option<AnalyzerRegistration> {
        self.registry.iter().find(|registration| registration.id == id).copied()
    }

    fn resolve(&mut self, id: &str, required_by: Option<&'static str>) -> Result<SharedAnalyzer> {
        if let Some(instance) = self.instances.get(id) {
            return Ok(instance.clone());
        }

        let registration = self.registration(id).ok_or_else(|| match required_by {
            Some(parent) => MetricsError::missing_analyzer(id, parent),
            None => MetricsError::config_field(format!("Unknown analyzer '{}'", id), "analyzers"),
        })?;

        if self.resolving.contains(&registration.id) {
            return Err(MetricsError::config(format!(
                "Analyzer requirements form a cycle: {} -> {}",
                self.resolving.join(" -> "),
                registration.id
            )));
        }

        self.resolving.push(registration.id);
        let mut required = Vec::with_capacity(registration.requires.len());
        for &child in registration.requires {
            match self.resolve(child, Some(registration.id)) {
                Ok(analyzer) => required.push(analyzer),
                Err(err) => {
                    self.resolving.pop();
                    return Err(err);
                }
            }
        }
        self.resolving.pop();

        let analyzer = (registration.factory)(&self.config, &required)?;
        if registration.cache_aware {
            if let Some(cache) = &self.cache {
                if let Some(aware) = analyzer.borrow_mut().as_cache_aware() {
                    aware.set_cache(cache.clone());
                }
            }
        }

        debug!(
            "loaded analyzer {} (requires: {:?})",
            registration.id, registration.requires
        );
        self.instances.insert(registration.id, analyzer.clone());
        Ok(analyzer)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::io::cache::{shared as shared_cache, MemoryCacheDriver};

    #[test]
    fn same_identifier_yields_same_instance() {
        let mut loader = AnalyzerLoader::new(MetricsConfig::default(), None);
        let first = loader.load(loc::ID).unwrap();
        let second = loader.load(loc::ID).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(loader.loaded().len(), 1);
    }

    #[test]
    fn requirements_load_first_and_are_shared() {
        let mut loader = AnalyzerLoader::new(MetricsConfig::default(), None);
        loader.load(class_level::ID).unwrap();
        let cyclomatic = loader.load(cyclomatic::ID).unwrap();

        assert_eq!(loader.loaded_ids(), vec![cyclomatic::ID, class_level::ID]);
        assert_eq!(Rc::strong_count(&cyclomatic), 3);
    }

    #[test]
    fn cache_is_injected_into_cache_aware_analyzers() {
        let cache = shared_cache(MemoryCacheDriver::new());
        let mut loader = AnalyzerLoader::new(MetricsConfig::default(), Some(cache));

        let loc = loader.load(loc::ID).unwrap();
        assert!(loc.borrow_mut().as_cache_aware().unwrap().cache().is_some());
        let coupling = loader.load(coupling::ID).unwrap();
        assert!(coupling.borrow_mut().as_cache_aware().is_none());
    }

    #[test]
    fn missing_requirement_names_both_analyzers() {
        let registry = BUILTIN_ANALYZERS
            .iter()
            .copied()
            .filter(|registration| registration.id != cyclomatic::ID)
            .collect();
        let mut loader = AnalyzerLoader::with_registry(MetricsConfig::default(), None, registry);

        let err = loader.load(class_level::ID).unwrap_err();
        match err {
            MetricsError::MissingAnalyzer {
                analyzer,
                required_by,
            } => {
                assert_eq!(analyzer, cyclomatic::ID);
                assert_eq!(required_by, class_level::ID);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(loader.loaded().is_empty());
    }

    #[test]
    fn unknown_identifier_is_a_configuration_error() {
        let mut loader = AnalyzerLoader::new(MetricsConfig::default(), None);
        let err = loader.load("npath").unwrap_err();
        assert!(err.is_configuration());
        assert!(!loader.is_registered("npath"));
    }

    #[test]
    fn requirement_cycles_are_rejected() {
        const A: &[&str] = &["b"];
        const B: &[&str] = &["a"];
        let registry = vec![
            AnalyzerRegistration {
                id: "a",
                requires: A,
                cache_aware: false,
                factory: build_loc,
            },
            AnalyzerRegistration {
                id: "b",
                requires: B,
                cache_aware: false,
                factory: build_loc,
            },
        ];
        let mut loader = AnalyzerLoader::with_registry(MetricsConfig::default(), None, registry);
        assert!(loader.load("a").unwrap_err().is_configuration());
    }

    #[test]
    fn bad_coderank_strategy_fails_loading() {
        let mut config = MetricsConfig::default();
        config.coderank.strategies = vec!["unknown".into()];
        let mut loader = AnalyzerLoader::new(config, None);
        assert!(loader.load(coderank::ID).unwrap_err().is_configuration());
    }
}
