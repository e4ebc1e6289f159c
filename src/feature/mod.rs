// src/feature/mod.rs

//! Feature definition model
//!
//! A feature is a named, versioned capability unit with declared
//! dependencies, visibility, singleton and process-type constraints, and
//! optional auto-activation rules. Definitions are immutable and owned by
//! the repository; the resolver never mutates them.

mod name;
mod version;

pub use name::{base_name, split_name_and_version, version_of};
pub use version::FeatureVersion;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Who may reference a feature
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Visibility {
    /// Directly requestable by callers and other features
    Public,
    /// Referenced by other features, not by callers
    Protected,
    /// Internal; accessible only to features of the same origin
    Private,
    /// Installable unit, never a dependency target for callers
    Install,
}

/// The process kinds a feature can run in
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum ProcessType {
    Server,
    Client,
}

/// One dependency edge as authored: the required symbolic name plus the
/// alternate versions the dependent explicitly accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureRequirement {
    pub symbolic_name: String,
    /// Alternate versions accepted besides the preferred one, in order
    #[serde(default)]
    pub tolerates: Vec<String>,
}

impl FeatureRequirement {
    pub fn new(symbolic_name: impl Into<String>) -> Self {
        Self {
            symbolic_name: symbolic_name.into(),
            tolerates: Vec::new(),
        }
    }

    pub fn tolerating(mut self, versions: &[&str]) -> Self {
        self.tolerates = versions.iter().map(|v| v.to_string()).collect();
        self
    }
}

fn default_origin() -> String {
    "core".to_string()
}

fn default_process_types() -> Vec<ProcessType> {
    vec![ProcessType::Server, ProcessType::Client]
}

fn default_visibility() -> Visibility {
    Visibility::Private
}

/// Read-only description of one feature
///
/// Constructed either from a repository document (serde) or through the
/// builder methods, which exist mostly for fixture construction:
///
/// ```
/// use provisor::FeatureDefinition;
///
/// let servlet = FeatureDefinition::new("servlet-6.0")
///     .public()
///     .singleton()
///     .with_short_name("servlet6");
/// assert_eq!(servlet.base_name(), "servlet");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDefinition {
    /// Canonical versioned name, e.g. "servlet-6.0"
    pub symbolic_name: String,
    /// Case-insensitive alias callers may use for public features
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default = "default_visibility")]
    pub visibility: Visibility,
    /// At most one version of this base name may be active
    #[serde(default)]
    pub singleton: bool,
    #[serde(default = "default_process_types")]
    pub process_types: Vec<ProcessType>,
    /// Ordered dependency list
    #[serde(default)]
    pub requirements: Vec<FeatureRequirement>,
    /// Auto-activation conjunction: every named feature must be present
    /// among the kernel and resolved sets for this feature to activate.
    /// Empty for ordinary features.
    #[serde(default)]
    pub activation_requires: Vec<String>,
    /// Platform names: the generations a compatibility feature represents,
    /// or the platforms a feature declares it runs under.
    #[serde(default)]
    pub platforms: Vec<String>,
    /// Generic request that binds to a platform before resolution
    #[serde(default)]
    pub versionless: bool,
    /// Represents a named programming-model generation
    #[serde(default)]
    pub compatibility: bool,
    /// Repository type this definition came from; PRIVATE features are
    /// only accessible to dependents of the same origin.
    #[serde(default = "default_origin")]
    pub origin: String,
}

impl FeatureDefinition {
    pub fn new(symbolic_name: impl Into<String>) -> Self {
        Self {
            symbolic_name: symbolic_name.into(),
            short_name: None,
            visibility: default_visibility(),
            singleton: false,
            process_types: default_process_types(),
            requirements: Vec::new(),
            activation_requires: Vec::new(),
            platforms: Vec::new(),
            versionless: false,
            compatibility: false,
            origin: default_origin(),
        }
    }

    pub fn public(mut self) -> Self {
        self.visibility = Visibility::Public;
        self
    }

    pub fn protected(mut self) -> Self {
        self.visibility = Visibility::Protected;
        self
    }

    pub fn private(mut self) -> Self {
        self.visibility = Visibility::Private;
        self
    }

    pub fn singleton(mut self) -> Self {
        self.singleton = true;
        self
    }

    pub fn with_short_name(mut self, short_name: impl Into<String>) -> Self {
        self.short_name = Some(short_name.into());
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    pub fn requires(mut self, symbolic_name: impl Into<String>) -> Self {
        self.requirements.push(FeatureRequirement::new(symbolic_name));
        self
    }

    pub fn requires_tolerating(
        mut self,
        symbolic_name: impl Into<String>,
        tolerates: &[&str],
    ) -> Self {
        self.requirements
            .push(FeatureRequirement::new(symbolic_name).tolerating(tolerates));
        self
    }

    pub fn auto_activated_by(mut self, names: &[&str]) -> Self {
        self.activation_requires = names.iter().map(|n| n.to_string()).collect();
        self
    }

    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platforms.push(platform.into());
        self
    }

    pub fn versionless(mut self) -> Self {
        self.versionless = true;
        self
    }

    pub fn compatibility(mut self) -> Self {
        self.compatibility = true;
        self
    }

    pub fn server_only(mut self) -> Self {
        self.process_types = vec![ProcessType::Server];
        self
    }

    pub fn client_only(mut self) -> Self {
        self.process_types = vec![ProcessType::Client];
        self
    }

    /// The symbolic name with its version suffix stripped
    pub fn base_name(&self) -> &str {
        base_name(&self.symbolic_name)
    }

    /// The version suffix of the symbolic name, when present
    pub fn version(&self) -> Option<&str> {
        version_of(&self.symbolic_name)
    }

    /// Whether this is an auto-feature
    pub fn is_auto(&self) -> bool {
        !self.activation_requires.is_empty()
    }

    /// Whether the feature supports any of the given process types
    pub fn supports_any(&self, types: &[ProcessType]) -> bool {
        self.process_types.iter().any(|t| types.contains(t))
    }

    /// Evaluate the auto-activation conjunction against a set of present
    /// feature names (lowercased symbolic names).
    pub fn activation_satisfied(&self, present_lowercase: &std::collections::HashSet<String>) -> bool {
        self.is_auto()
            && self
                .activation_requires
                .iter()
                .all(|n| present_lowercase.contains(&n.to_ascii_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_builder_defaults() {
        let f = FeatureDefinition::new("internal-thing-1.0");
        assert_eq!(f.visibility, Visibility::Private);
        assert!(!f.singleton);
        assert!(f.supports_any(&[ProcessType::Server]));
        assert!(f.supports_any(&[ProcessType::Client]));
        assert_eq!(f.origin, "core");
    }

    #[test]
    fn test_base_name_and_version() {
        let f = FeatureDefinition::new("servlet-6.0");
        assert_eq!(f.base_name(), "servlet");
        assert_eq!(f.version(), Some("6.0"));
    }

    #[test]
    fn test_process_type_filter() {
        let f = FeatureDefinition::new("client-ui-1.0").client_only();
        assert!(!f.supports_any(&[ProcessType::Server]));
        assert!(f.supports_any(&[ProcessType::Client, ProcessType::Server]));
    }

    #[test]
    fn test_activation_satisfied() {
        let auto = FeatureDefinition::new("bridge-1.0").auto_activated_by(&["a-1.0", "b-1.0"]);
        let mut present: HashSet<String> = HashSet::new();
        present.insert("a-1.0".to_string());
        assert!(!auto.activation_satisfied(&present));
        present.insert("b-1.0".to_string());
        assert!(auto.activation_satisfied(&present));
    }

    #[test]
    fn test_activation_requires_empty_never_satisfied() {
        let plain = FeatureDefinition::new("plain-1.0");
        assert!(!plain.activation_satisfied(&HashSet::new()));
    }

    #[test]
    fn test_serde_round_trip() {
        let f = FeatureDefinition::new("web-1.0")
            .public()
            .singleton()
            .with_short_name("web")
            .requires_tolerating("base-1.0", &["2.0"]);
        let json = serde_json::to_string(&f).unwrap();
        let back: FeatureDefinition = serde_json::from_str(&json).unwrap();
        assert_eq!(f, back);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let f: FeatureDefinition =
            serde_json::from_str(r#"{"symbolic_name": "bare-1.0"}"#).unwrap();
        assert_eq!(f.visibility, Visibility::Private);
        assert_eq!(f.process_types.len(), 2);
        assert!(f.requirements.is_empty());
    }
}
