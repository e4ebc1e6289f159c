// src/resolver/mod.rs

//! Feature dependency resolution
//!
//! The resolver turns a set of requested root features into the complete,
//! deterministic set of features to provision, honoring singleton
//! constraints, visibility, process types, tolerated versions, platform
//! bindings, and auto-feature activation. The traversal itself lives in the
//! engine module; this module re-exports the public surface.

mod chain;
mod engine;
mod permutation;
mod platform;
mod result;

pub use chain::{Chain, Chains};
pub use engine::{FeatureResolver, ResolveRequest};
pub use result::ResolutionResult;
