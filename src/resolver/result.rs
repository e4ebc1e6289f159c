// src/resolver/result.rs

//! Resolution result accumulator
//!
//! Pure bookkeeping: deduplicating add-methods that log a human-readable
//! chain description at trace level on first insertion per key and are
//! idempotent on repeats. The resolved set preserves insertion order so the
//! downstream install ordering stays deterministic.

use crate::feature::base_name;
use crate::resolver::chain::Chain;
use indexmap::IndexSet;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

/// The outcome of one resolution
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolutionResult {
    resolved: IndexSet<String>,
    missing: BTreeSet<String>,
    non_public_roots: BTreeSet<String>,
    wrong_process_types: BTreeMap<String, Chain>,
    conflicts: BTreeMap<String, Vec<Chain>>,
    resolved_platforms: BTreeSet<String>,
    missing_platforms: BTreeSet<String>,
    duplicate_platforms: BTreeSet<String>,
    versionless: BTreeMap<String, Option<String>>,
}

impl ResolutionResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolved feature names in traversal order
    pub fn resolved(&self) -> &IndexSet<String> {
        &self.resolved
    }

    /// Root or reference names that do not exist in the repository
    pub fn missing(&self) -> &BTreeSet<String> {
        &self.missing
    }

    /// Requested roots that are not PUBLIC
    pub fn non_public_roots(&self) -> &BTreeSet<String> {
        &self.non_public_roots
    }

    /// Names whose candidates exist only for other process types
    pub fn wrong_process_types(&self) -> &BTreeMap<String, Chain> {
        &self.wrong_process_types
    }

    /// Base names for which no singleton-valid candidate could be selected
    pub fn conflicts(&self) -> &BTreeMap<String, Vec<Chain>> {
        &self.conflicts
    }

    pub fn resolved_platforms(&self) -> &BTreeSet<String> {
        &self.resolved_platforms
    }

    pub fn missing_platforms(&self) -> &BTreeSet<String> {
        &self.missing_platforms
    }

    pub fn duplicate_platforms(&self) -> &BTreeSet<String> {
        &self.duplicate_platforms
    }

    /// Versionless request -> concrete feature it resolved to, or `None`
    /// when no platform could be determined for it.
    pub fn versionless(&self) -> &BTreeMap<String, Option<String>> {
        &self.versionless
    }

    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }

    pub fn has_conflicts(&self) -> bool {
        !self.conflicts.is_empty()
    }

    /// Whether every request was satisfied without diagnostics
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
            && self.non_public_roots.is_empty()
            && self.wrong_process_types.is_empty()
            && self.conflicts.is_empty()
            && self.missing_platforms.is_empty()
            && self.duplicate_platforms.is_empty()
    }

    /// Add a feature to the resolved set. Returns false when it was
    /// already present.
    pub fn add_resolved(&mut self, name: impl Into<String>) -> bool {
        self.resolved.insert(name.into())
    }

    /// Drop every resolved entry whose base name matches. Used when a base
    /// name becomes conflicted after some of its versions were resolved.
    pub fn remove_resolved_base(&mut self, base: &str) {
        self.resolved.retain(|n| base_name(n) != base);
    }

    /// Clear the resolved set for a fresh walk pass
    pub fn clear_resolved(&mut self) {
        self.resolved.clear();
    }

    pub fn add_missing(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.missing.insert(name.clone()) {
            trace!(feature = %name, "missing feature");
        }
    }

    pub fn add_non_public_root(&mut self, name: impl Into<String>) {
        let name = name.into();
        if self.non_public_roots.insert(name.clone()) {
            trace!(feature = %name, "root feature is not public");
        }
    }

    pub fn add_wrong_process_type(&mut self, name: impl Into<String>, chain: Chain) {
        let name = name.into();
        if !self.wrong_process_types.contains_key(&name) {
            trace!(feature = %name, chain = %chain, "no candidate supports the process type");
            self.wrong_process_types.insert(name, chain);
        }
    }

    pub fn add_conflict(&mut self, base: impl Into<String>, chains: Vec<Chain>) {
        let base = base.into();
        if !self.conflicts.contains_key(&base) {
            let description = chains
                .iter()
                .map(Chain::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            trace!(base = %base, chains = %description, "conflicting singleton requirements");
            self.conflicts.insert(base, chains);
        }
    }

    pub fn add_resolved_platform(&mut self, platform: impl Into<String>) {
        let platform = platform.into();
        if self.resolved_platforms.insert(platform.clone()) {
            trace!(platform = %platform, "platform bound");
        }
    }

    pub fn add_missing_platform(&mut self, platform: impl Into<String>) {
        let platform = platform.into();
        if self.missing_platforms.insert(platform.clone()) {
            trace!(platform = %platform, "platform has no compatibility feature");
        }
    }

    pub fn add_duplicate_platform(&mut self, platform: impl Into<String>) {
        let platform = platform.into();
        if self.duplicate_platforms.insert(platform.clone()) {
            trace!(platform = %platform, "duplicate platform version configured");
        }
    }

    pub fn set_versionless(&mut self, name: impl Into<String>, resolved_to: Option<String>) {
        let name = name.into();
        if !self.versionless.contains_key(&name) {
            trace!(feature = %name, resolved_to = ?resolved_to, "versionless outcome");
            self.versionless.insert(name, resolved_to);
        }
    }

    /// The facts that survive a permutation copy: missing features,
    /// non-public roots, wrong process types, and platform outcomes.
    /// Resolved features and conflicts are recomputed by re-walking.
    pub(crate) fn sticky_copy(&self) -> ResolutionResult {
        ResolutionResult {
            resolved: IndexSet::new(),
            missing: self.missing.clone(),
            non_public_roots: self.non_public_roots.clone(),
            wrong_process_types: self.wrong_process_types.clone(),
            conflicts: BTreeMap::new(),
            resolved_platforms: self.resolved_platforms.clone(),
            missing_platforms: self.missing_platforms.clone(),
            duplicate_platforms: self.duplicate_platforms.clone(),
            versionless: self.versionless.clone(),
        }
    }

    /// Fold another result's diagnostics into this one. Used across
    /// auto-feature iterations; the resolved set is already carried forward
    /// through pre-resolved seeding.
    pub(crate) fn merge_diagnostics(&mut self, other: &ResolutionResult) {
        for name in &other.missing {
            self.add_missing(name.clone());
        }
        for name in &other.non_public_roots {
            self.add_non_public_root(name.clone());
        }
        for (name, chain) in &other.wrong_process_types {
            self.add_wrong_process_type(name.clone(), chain.clone());
        }
        for (base, chains) in &other.conflicts {
            self.add_conflict(base.clone(), chains.clone());
        }
        for p in &other.resolved_platforms {
            self.add_resolved_platform(p.clone());
        }
        for p in &other.missing_platforms {
            self.add_missing_platform(p.clone());
        }
        for p in &other.duplicate_platforms {
            self.add_duplicate_platform(p.clone());
        }
        for (name, to) in &other.versionless {
            self.set_versionless(name.clone(), to.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain() -> Chain {
        Chain::new(
            vec!["a-1.0".to_string()],
            vec!["b-1.0".to_string()],
            "1.0",
            "b-1.0",
        )
    }

    #[test]
    fn test_add_resolved_preserves_order() {
        let mut result = ResolutionResult::new();
        assert!(result.add_resolved("c-1.0"));
        assert!(result.add_resolved("a-1.0"));
        assert!(!result.add_resolved("c-1.0"));
        let order: Vec<&str> = result.resolved().iter().map(String::as_str).collect();
        assert_eq!(order, vec!["c-1.0", "a-1.0"]);
    }

    #[test]
    fn test_remove_resolved_base() {
        let mut result = ResolutionResult::new();
        result.add_resolved("b-1.0");
        result.add_resolved("b-2.0");
        result.add_resolved("c-1.0");
        result.remove_resolved_base("b");
        let order: Vec<&str> = result.resolved().iter().map(String::as_str).collect();
        assert_eq!(order, vec!["c-1.0"]);
    }

    #[test]
    fn test_add_conflict_idempotent() {
        let mut result = ResolutionResult::new();
        result.add_conflict("b", vec![chain()]);
        result.add_conflict("b", vec![]);
        assert_eq!(result.conflicts()["b"].len(), 1);
    }

    #[test]
    fn test_add_missing_idempotent() {
        let mut result = ResolutionResult::new();
        result.add_missing("x-1.0");
        result.add_missing("x-1.0");
        assert_eq!(result.missing().len(), 1);
    }

    #[test]
    fn test_is_complete() {
        let mut result = ResolutionResult::new();
        result.add_resolved("a-1.0");
        assert!(result.is_complete());
        result.add_missing("x-1.0");
        assert!(!result.is_complete());
    }

    #[test]
    fn test_sticky_copy_drops_resolved_and_conflicts() {
        let mut result = ResolutionResult::new();
        result.add_resolved("a-1.0");
        result.add_missing("x-1.0");
        result.add_conflict("b", vec![chain()]);
        result.set_versionless("servlet", None);
        let copy = result.sticky_copy();
        assert!(copy.resolved().is_empty());
        assert!(copy.conflicts().is_empty());
        assert_eq!(copy.missing().len(), 1);
        assert_eq!(copy.versionless().len(), 1);
    }

    #[test]
    fn test_merge_diagnostics() {
        let mut first = ResolutionResult::new();
        first.add_missing("x-1.0");
        first.add_conflict("b", vec![chain()]);
        let mut second = ResolutionResult::new();
        second.add_resolved("a-1.0");
        second.merge_diagnostics(&first);
        assert!(second.missing().contains("x-1.0"));
        assert!(second.conflicts().contains_key("b"));
        assert_eq!(second.resolved().len(), 1);
    }
}
