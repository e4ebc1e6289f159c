// src/resolver/permutation.rs

//! Backtrackable resolver state
//!
//! A [`Permutation`] is the full working memory for one resolution attempt:
//! committed selections, postponed decisions, blocked base names, roots
//! contributed by versionless bindings, and the accumulating result.
//! Permutations form a stack; the copy taken at each decision point must not
//! share mutable substructure with the state it was copied from.

use crate::feature::base_name;
use crate::resolver::chain::{Chain, Chains};
use crate::resolver::result::ResolutionResult;
use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Default)]
pub(crate) struct Permutation {
    /// Base name -> the winning chain (exactly one candidate)
    pub selected: HashMap<String, Chain>,
    /// Base name -> competing chains awaiting a decision, FIFO by insertion
    pub postponed: IndexMap<String, Chains>,
    /// Postponed decisions originating from versionless bindings
    pub postponed_versionless: IndexMap<String, Chains>,
    /// Base names excluded this attempt due to an unresolved conflict
    pub blocked: HashSet<String>,
    /// Extra roots committed by versionless decisions; walked like roots
    pub versionless_roots: Vec<String>,
    /// Pre-resolved features: already installed, immune to conflict
    /// exclusion
    pub pinned: HashSet<String>,
    pub result: ResolutionResult,
}

impl Permutation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pinned(pinned: HashSet<String>) -> Self {
        Self {
            pinned,
            ..Self::new()
        }
    }

    /// Snapshot for the backtrack stack.
    ///
    /// Selections, postponed chains (with their attempted marks), committed
    /// versionless roots, and the sticky result facts survive the copy.
    /// `blocked` does not: a restored snapshot replays a different candidate
    /// choice and must re-derive its exclusions, never reuse stale ones.
    pub fn snapshot(&self) -> Permutation {
        Permutation {
            selected: self.selected.clone(),
            postponed: self.postponed.clone(),
            postponed_versionless: self.postponed_versionless.clone(),
            blocked: HashSet::new(),
            versionless_roots: self.versionless_roots.clone(),
            pinned: self.pinned.clone(),
            result: self.result.sticky_copy(),
        }
    }

    pub fn has_postponed(&self) -> bool {
        !self.postponed.is_empty() || !self.postponed_versionless.is_empty()
    }

    pub fn postpone(&mut self, base: &str, chain: Chain) {
        self.postponed
            .entry(base.to_string())
            .or_insert_with(Chains::new)
            .add(chain);
    }

    pub fn postpone_versionless(&mut self, base: &str, chain: Chain) {
        self.postponed_versionless
            .entry(base.to_string())
            .or_insert_with(Chains::new)
            .add(chain);
    }

    /// The next postponed base name in FIFO order, versioned buckets first
    pub fn next_postponed(&self) -> Option<(String, bool)> {
        if let Some(base) = self.postponed.keys().next() {
            return Some((base.clone(), false));
        }
        self.postponed_versionless
            .keys()
            .next()
            .map(|base| (base.clone(), true))
    }

    pub fn clear_postponed(&mut self) {
        self.postponed.clear();
        self.postponed_versionless.clear();
    }

    /// Record a conflict for a base name and exclude it from this attempt.
    /// Pinned (already installed) versions of the base stay resolved.
    pub fn block(&mut self, base: &str, chains: Vec<Chain>) {
        self.result.add_conflict(base, chains);
        self.blocked.insert(base.to_string());
        let keep: Vec<String> = self
            .result
            .resolved()
            .iter()
            .filter(|n| base_name(n) == base && self.pinned.contains(*n))
            .cloned()
            .collect();
        self.result.remove_resolved_base(base);
        for name in keep {
            self.result.add_resolved(name);
        }
    }
}
