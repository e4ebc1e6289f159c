// src/lib.rs

//! Provisor
//!
//! Backtracking feature dependency resolver. A feature universe is a set of
//! versioned, possibly-singleton capability definitions with tolerated
//! alternate versions, visibility rules, process-type constraints, platform
//! bindings, and auto-activation conjunctions. Given a set of requested
//! roots, the resolver computes the deterministic set of features to
//! provision plus a full diagnostic report of everything that could not be
//! satisfied.
//!
//! # Architecture
//!
//! - Definitions are immutable; [`FeatureRepository`] is a read-only view
//! - Resolution walks depth-first, postponing multi-candidate singleton
//!   decisions and backtracking through permutation snapshots
//! - Versionless requests bind to a platform before the walk and map back
//!   to their concrete feature afterwards
//! - Auto-features activate in a fixed-point loop on top of core resolution

mod error;
pub mod feature;
pub mod repository;
pub mod resolver;

pub use error::{Error, Result};
pub use feature::{
    base_name, split_name_and_version, version_of, FeatureDefinition, FeatureRequirement,
    FeatureVersion, ProcessType, Visibility,
};
pub use repository::{FeatureRepository, StaticRepository};
pub use resolver::{Chain, Chains, FeatureResolver, ResolutionResult, ResolveRequest};
