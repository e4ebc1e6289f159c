// src/error.rs

//! Error types for the feature resolver
//!
//! Almost every bad condition the resolver encounters (missing features,
//! conflicting singleton versions, access violations) is recoverable and is
//! recorded in the [`ResolutionResult`](crate::ResolutionResult) rather than
//! raised. The variants here cover the few conditions that abort a call:
//! corrupt repository data and authoring-contract violations.

use thiserror::Error;

/// Errors that abort a resolution or repository load
#[derive(Error, Debug)]
pub enum Error {
    /// An included feature referenced another feature by its short name.
    ///
    /// Features included by other features must be referenced by their
    /// fully-qualified symbolic name. A short-name reference indicates a
    /// definition-authoring bug, not a runtime condition.
    #[error("feature '{dependent}' requires '{requirement}' by short name; included features must use the symbolic name")]
    ShortNameRequirement {
        dependent: String,
        requirement: String,
    },

    /// A feature definition failed validation
    #[error("invalid feature definition: {0}")]
    Definition(String),

    /// A repository document could not be parsed
    #[error("repository parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type for resolver operations
pub type Result<T> = std::result::Result<T, Error>;
