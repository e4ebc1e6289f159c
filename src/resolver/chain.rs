// src/resolver/chain.rs

//! Candidate chains
//!
//! A [`Chain`] records one candidate-resolution path for a dependency slot:
//! the dependency path that led to the requirement, the competing candidate
//! names (preferred first), the preferred version text, and the originating
//! requirement. A [`Chains`] bucket collects the competing chains for one
//! base feature name while the decision between them is postponed.

use serde::Serialize;
use std::fmt;

/// An immutable record of one candidate-resolution path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chain {
    chain: Vec<String>,
    candidates: Vec<String>,
    preferred_version: String,
    requirement: String,
}

impl Chain {
    pub fn new(
        chain: Vec<String>,
        candidates: Vec<String>,
        preferred_version: impl Into<String>,
        requirement: impl Into<String>,
    ) -> Self {
        Self {
            chain,
            candidates,
            preferred_version: preferred_version.into(),
            requirement: requirement.into(),
        }
    }

    /// The dependency path that led here, outermost dependent first
    pub fn path(&self) -> &[String] {
        &self.chain
    }

    /// Competing candidate names, preferred first
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// The single candidate of a committed chain
    ///
    /// Selected chains always carry exactly one candidate; for postponed
    /// chains this is the preferred candidate.
    pub fn candidate(&self) -> &str {
        self.candidates.first().map(String::as_str).unwrap_or("")
    }

    pub fn preferred_version(&self) -> &str {
        &self.preferred_version
    }

    /// The symbolic name of the originating requirement
    pub fn requirement(&self) -> &str {
        &self.requirement
    }

    pub fn contains_candidate(&self, name: &str) -> bool {
        self.candidates.iter().any(|c| c == name)
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.chain.is_empty() {
            write!(f, "root")?;
        } else {
            write!(f, "{}", self.chain.join(" -> "))?;
        }
        write!(
            f,
            " requires {} [{}]",
            self.requirement,
            self.candidates.join(", ")
        )
    }
}

/// The competing chains for one base feature name
///
/// Chains stay sorted ascending by preferred version text, stable on
/// insertion order for ties, so the lowest declared version is tried first.
/// The attempted set records candidates already committed and rolled back;
/// it survives permutation copies so a failed candidate is never retried.
#[derive(Debug, Clone, Default)]
pub struct Chains {
    chains: Vec<Chain>,
    attempted: Vec<String>,
}

impl Chains {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a chain, keeping the version ordering. Identical chains
    /// (same path and candidates) are ignored so re-walks stay idempotent.
    pub fn add(&mut self, chain: Chain) {
        if self.chains.contains(&chain) {
            return;
        }
        // Sort is lexicographic on the validated version text; ties keep
        // insertion order.
        let pos = self
            .chains
            .iter()
            .position(|c| c.preferred_version() > chain.preferred_version())
            .unwrap_or(self.chains.len());
        self.chains.insert(pos, chain);
    }

    pub fn chains(&self) -> &[Chain] {
        &self.chains
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    pub fn mark_attempted(&mut self, name: &str) {
        if !self.was_attempted(name) {
            self.attempted.push(name.to_string());
        }
    }

    pub fn was_attempted(&self, name: &str) -> bool {
        self.attempted.iter().any(|a| a == name)
    }

    /// Whether a candidate appears in every competing chain
    pub fn in_all_chains(&self, name: &str) -> bool {
        !self.chains.is_empty() && self.chains.iter().all(|c| c.contains_candidate(name))
    }

    /// Find a candidate acceptable to every competing chain.
    ///
    /// First pass tries each chain's preferred (lowest-version) candidate;
    /// if none is common to all chains the search widens to every candidate
    /// of every chain. Attempted candidates are skipped in both passes.
    pub fn find_winner(&self) -> Option<String> {
        for chain in &self.chains {
            if let Some(preferred) = chain.candidates().first() {
                if !self.was_attempted(preferred) && self.in_all_chains(preferred) {
                    return Some(preferred.clone());
                }
            }
        }
        for chain in &self.chains {
            for candidate in chain.candidates() {
                if !self.was_attempted(candidate) && self.in_all_chains(candidate) {
                    return Some(candidate.clone());
                }
            }
        }
        None
    }

    /// Two representative competing chains, for conflict reporting
    pub fn representatives(&self) -> Vec<Chain> {
        self.chains.iter().take(2).cloned().collect()
    }

    /// Human-readable rendering of the competing chains
    pub fn describe(&self) -> String {
        self.chains
            .iter()
            .map(Chain::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}
