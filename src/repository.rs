// src/repository.rs

//! Feature repository lookup
//!
//! The resolver consumes a read-only view over the universe of feature
//! definitions. [`FeatureRepository`] is that contract; [`StaticRepository`]
//! is the in-memory implementation used by tests and by callers that load a
//! feature universe from a JSON document.
//!
//! `StaticRepository` precomputes its lookup tables (lowercase name index,
//! compatibility-feature-by-platform table) at construction. The tables are
//! plain instance state rebuilt whenever a new repository is constructed;
//! nothing is cached process-wide.

use crate::error::{Error, Result};
use crate::feature::FeatureDefinition;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

/// Read-only query interface over the feature universe
///
/// Must behave as a pure read view during one resolution call: no mutation
/// may become visible mid-call.
pub trait FeatureRepository {
    /// Look up a feature by versioned symbolic name or short name,
    /// case-insensitively.
    fn feature(&self, name: &str) -> Option<&FeatureDefinition>;

    /// Every known feature definition
    fn features(&self) -> &[FeatureDefinition];

    /// All auto-features (features with an activation conjunction)
    fn auto_features(&self) -> Vec<&FeatureDefinition> {
        self.features().iter().filter(|f| f.is_auto()).collect()
    }

    /// Features matching a predicate
    fn select(&self, predicate: &dyn Fn(&FeatureDefinition) -> bool) -> Vec<&FeatureDefinition> {
        self.features().iter().filter(|f| predicate(f)).collect()
    }

    /// Extra tolerated versions configured for a base name, beyond what the
    /// dependents themselves declare. Ordered.
    fn configured_tolerates(&self, _base_name: &str) -> Vec<String> {
        Vec::new()
    }

    /// The compatibility feature representing a platform name, if any
    fn compatibility_feature(&self, platform: &str) -> Option<&FeatureDefinition> {
        self.features().iter().find(|f| {
            f.compatibility && f.platforms.iter().any(|p| p.eq_ignore_ascii_case(platform))
        })
    }
}

#[derive(Deserialize)]
struct RepositoryDocument {
    features: Vec<FeatureDefinition>,
    #[serde(default)]
    configured_tolerates: HashMap<String, Vec<String>>,
}

/// In-memory feature repository
#[derive(Debug)]
pub struct StaticRepository {
    features: Vec<FeatureDefinition>,
    /// Lowercased symbolic and short names -> index into `features`
    by_name: HashMap<String, usize>,
    /// Lowercased platform name -> index of its compatibility feature
    compatibility_by_platform: HashMap<String, usize>,
    configured_tolerates: HashMap<String, Vec<String>>,
}

impl StaticRepository {
    pub fn new(features: Vec<FeatureDefinition>) -> Self {
        let mut by_name = HashMap::new();
        let mut compatibility_by_platform = HashMap::new();
        for (idx, feature) in features.iter().enumerate() {
            by_name.insert(feature.symbolic_name.to_ascii_lowercase(), idx);
            if let Some(short) = &feature.short_name {
                by_name.insert(short.to_ascii_lowercase(), idx);
            }
            if feature.compatibility {
                for platform in &feature.platforms {
                    compatibility_by_platform.insert(platform.to_ascii_lowercase(), idx);
                }
            }
        }
        debug!(
            features = features.len(),
            platforms = compatibility_by_platform.len(),
            "indexed feature repository"
        );
        Self {
            features,
            by_name,
            compatibility_by_platform,
            configured_tolerates: HashMap::new(),
        }
    }

    /// Load a repository from a JSON document:
    ///
    /// ```json
    /// {
    ///   "features": [ { "symbolic_name": "web-1.0", "visibility": "public" } ],
    ///   "configured_tolerates": { "base": ["2.0"] }
    /// }
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let doc: RepositoryDocument = serde_json::from_str(json)?;
        for feature in &doc.features {
            if feature.symbolic_name.trim().is_empty() {
                return Err(Error::Definition(
                    "feature definition with an empty symbolic name".to_string(),
                ));
            }
        }
        let mut repo = Self::new(doc.features);
        repo.configured_tolerates = doc.configured_tolerates;
        Ok(repo)
    }

    /// Add configured toleration overrides for a base name
    pub fn with_tolerates(mut self, base_name: impl Into<String>, versions: &[&str]) -> Self {
        self.configured_tolerates
            .insert(base_name.into(), versions.iter().map(|v| v.to_string()).collect());
        self
    }
}

impl FeatureRepository for StaticRepository {
    fn feature(&self, name: &str) -> Option<&FeatureDefinition> {
        self.by_name
            .get(&name.to_ascii_lowercase())
            .map(|&idx| &self.features[idx])
    }

    fn features(&self) -> &[FeatureDefinition] {
        &self.features
    }

    fn configured_tolerates(&self, base_name: &str) -> Vec<String> {
        self.configured_tolerates
            .get(base_name)
            .cloned()
            .unwrap_or_default()
    }

    fn compatibility_feature(&self, platform: &str) -> Option<&FeatureDefinition> {
        self.compatibility_by_platform
            .get(&platform.to_ascii_lowercase())
            .map(|&idx| &self.features[idx])
    }
}
