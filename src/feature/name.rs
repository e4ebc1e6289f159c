// src/feature/name.rs

//! Symbolic-name parsing
//!
//! A symbolic name carries an optional version suffix: "servlet-6.0" splits
//! into base name "servlet" and version "6.0" at the last `-` whose suffix
//! parses as a dotted-number version. Names like "admin-center" have no
//! version suffix and split into themselves.

use super::version::FeatureVersion;

/// Split a symbolic name into base name and optional version text
///
/// The split point is the last `-` in the name, and only when everything
/// after it parses as a dotted-number version.
pub fn split_name_and_version(symbolic_name: &str) -> (&str, Option<&str>) {
    if let Some(idx) = symbolic_name.rfind('-') {
        let suffix = &symbolic_name[idx + 1..];
        if FeatureVersion::parse(suffix).is_some() {
            return (&symbolic_name[..idx], Some(suffix));
        }
    }
    (symbolic_name, None)
}

/// The feature name with any trailing `-version` suffix stripped
pub fn base_name(symbolic_name: &str) -> &str {
    split_name_and_version(symbolic_name).0
}

/// The version suffix of a symbolic name, when present
pub fn version_of(symbolic_name: &str) -> Option<&str> {
    split_name_and_version(symbolic_name).1
}
