// src/resolver/platform.rs

//! Versionless request binding
//!
//! A versionless root ("servlet") is a platform-generic request that must
//! bind to one compatibility feature ("jakartaee-9.0") before core
//! resolution. Candidate platforms are merged from three sources, in
//! precedence order:
//!
//! 1. the explicitly configured platform list (two versions of the same
//!    platform family are an error, not silently resolved),
//! 2. the preference-ordered platform list, consulted per family only when
//!    the configured list left that family unbound,
//! 3. the unanimous intersection of platform declarations across the
//!    non-versionless roots, kept only when exactly one candidate survives
//!    per family.
//!
//! Pre-processing rewrites versionless roots onto concrete features;
//! post-processing records the platform outcome and the
//! versionless-to-concrete mapping on the accepted result.

use crate::feature::base_name;
use crate::repository::FeatureRepository;
use crate::resolver::chain::Chain;
use crate::resolver::result::ResolutionResult;
use std::collections::{BTreeMap, HashSet};
use tracing::debug;

/// One versionless request and the concrete candidates its platform offers
#[derive(Debug, Clone)]
pub(crate) struct VersionlessBinding {
    pub request: String,
    pub candidates: Vec<String>,
}

/// The outcome of platform pre-processing
#[derive(Debug, Default)]
pub(crate) struct PlatformPlan {
    /// Roots for core resolution: the non-versionless requests plus the
    /// concrete rewrites of versionless ones
    pub roots: Vec<String>,
    /// Versionless requests whose platform offers several tolerable
    /// versions; seeded into the versionless postponement bucket
    pub deferred: Vec<(String, Chain)>,
    /// Bindings to finalize against the accepted resolved set
    pub bindings: Vec<VersionlessBinding>,
    /// Versionless requests spliced back after resolution (multiple-versions
    /// mode filters them out of the root set entirely)
    pub spliced: Vec<VersionlessBinding>,
    /// Platform diagnostics and null outcomes discovered before resolution
    pub seed: ResolutionResult,
}

/// Bind platforms and rewrite versionless roots onto concrete features
pub(crate) fn preprocess<R: FeatureRepository + ?Sized>(
    repo: &R,
    roots: &[String],
    root_platforms: &[String],
    preferred_platforms: &[String],
    multiple_versions: bool,
) -> PlatformPlan {
    let mut plan = PlatformPlan::default();

    let mut versionless = Vec::new();
    for name in roots {
        match repo.feature(name) {
            Some(def) if def.versionless => versionless.push(def),
            _ => plan.roots.push(name.clone()),
        }
    }
    if versionless.is_empty() && root_platforms.is_empty() {
        return plan;
    }

    // Family -> canonical platform name. A family with two configured
    // versions is poisoned: it binds nothing and is reported as an error.
    let mut bound: BTreeMap<String, String> = BTreeMap::new();
    let mut poisoned: HashSet<String> = HashSet::new();

    for platform in root_platforms {
        let family = base_name(platform).to_ascii_lowercase();
        let Some(compat) = repo.compatibility_feature(platform) else {
            plan.seed.add_missing_platform(platform.clone());
            continue;
        };
        let canonical = compat
            .platforms
            .iter()
            .find(|p| p.eq_ignore_ascii_case(platform))
            .cloned()
            .unwrap_or_else(|| platform.clone());
        match bound.get(&family) {
            Some(existing) if !existing.eq_ignore_ascii_case(&canonical) => {
                plan.seed.add_duplicate_platform(existing.clone());
                plan.seed.add_duplicate_platform(canonical);
                bound.remove(&family);
                poisoned.insert(family);
            }
            _ => {
                if !poisoned.contains(&family) {
                    bound.insert(family, canonical);
                }
            }
        }
    }

    for platform in preferred_platforms {
        let family = base_name(platform).to_ascii_lowercase();
        if bound.contains_key(&family) || poisoned.contains(&family) {
            continue;
        }
        if let Some(compat) = repo.compatibility_feature(platform) {
            let canonical = compat
                .platforms
                .iter()
                .find(|p| p.eq_ignore_ascii_case(platform))
                .cloned()
                .unwrap_or_else(|| platform.clone());
            bound.insert(family, canonical);
        }
    }

    bind_from_root_declarations(repo, &plan.roots, &mut bound, &poisoned);

    debug!(bound = ?bound, "platform binding");

    for def in versionless {
        let request = def.symbolic_name.clone();
        let platform = def.platforms.iter().find_map(|p| {
            let family = base_name(p).to_ascii_lowercase();
            bound
                .get(&family)
                .filter(|b| b.eq_ignore_ascii_case(p))
                .cloned()
        });
        let Some(platform) = platform else {
            plan.seed.set_versionless(request, None);
            continue;
        };
        plan.seed.add_resolved_platform(platform.clone());
        let Some(compat) = repo.compatibility_feature(&platform) else {
            plan.seed.add_missing_platform(platform);
            plan.seed.set_versionless(request, None);
            continue;
        };
        let requirement = compat.requirements.iter().find(|r| {
            base_name(&r.symbolic_name).eq_ignore_ascii_case(def.base_name())
        });
        let Some(requirement) = requirement else {
            plan.seed.set_versionless(request, None);
            continue;
        };

        let req_base = base_name(&requirement.symbolic_name).to_string();
        let mut candidates = Vec::new();
        let mut names = vec![requirement.symbolic_name.clone()];
        names.extend(
            requirement
                .tolerates
                .iter()
                .map(|v| format!("{req_base}-{v}")),
        );
        for name in names {
            if let Some(found) = repo.feature(&name) {
                if !candidates.contains(&found.symbolic_name) {
                    candidates.push(found.symbolic_name.clone());
                }
            }
        }

        if candidates.is_empty() {
            plan.seed.add_missing(requirement.symbolic_name.clone());
            plan.seed.set_versionless(request, None);
        } else if multiple_versions {
            plan.spliced.push(VersionlessBinding { request, candidates });
        } else if candidates.len() == 1 {
            plan.roots.push(candidates[0].clone());
            plan.bindings.push(VersionlessBinding { request, candidates });
        } else {
            let version = crate::feature::version_of(&candidates[0])
                .unwrap_or_default()
                .to_string();
            plan.deferred.push((
                req_base,
                Chain::new(Vec::new(), candidates.clone(), version, request.clone()),
            ));
            plan.bindings.push(VersionlessBinding { request, candidates });
        }
    }

    plan
}

/// Source (3): bind each still-open family to the single platform every
/// platform-declaring non-versionless root agrees on.
fn bind_from_root_declarations<R: FeatureRepository + ?Sized>(
    repo: &R,
    concrete_roots: &[String],
    bound: &mut BTreeMap<String, String>,
    poisoned: &HashSet<String>,
) {
    let mut per_family: BTreeMap<String, Vec<HashSet<String>>> = BTreeMap::new();
    for root in concrete_roots {
        let Some(def) = repo.feature(root) else { continue };
        let mut families: BTreeMap<String, HashSet<String>> = BTreeMap::new();
        for p in &def.platforms {
            families
                .entry(base_name(p).to_ascii_lowercase())
                .or_default()
                .insert(p.to_ascii_lowercase());
        }
        for (family, platforms) in families {
            per_family.entry(family).or_default().push(platforms);
        }
    }
    for (family, declarations) in per_family {
        if bound.contains_key(&family) || poisoned.contains(&family) {
            continue;
        }
        let mut intersection = declarations[0].clone();
        for declaration in &declarations[1..] {
            intersection.retain(|p| declaration.contains(p));
        }
        if intersection.len() == 1 {
            let platform = intersection.into_iter().next().unwrap_or_default();
            if let Some(compat) = repo.compatibility_feature(&platform) {
                let canonical = compat
                    .platforms
                    .iter()
                    .find(|p| p.eq_ignore_ascii_case(&platform))
                    .cloned()
                    .unwrap_or(platform);
                bound.insert(family, canonical);
            }
        }
    }
}

/// Record the versionless-to-concrete mapping on the accepted result, and
/// splice multiple-versions-mode requests back on.
pub(crate) fn finalize(plan: &PlatformPlan, result: &mut ResolutionResult) {
    for binding in &plan.bindings {
        let hit = binding
            .candidates
            .iter()
            .find(|c| result.resolved().contains(*c))
            .cloned();
        result.set_versionless(binding.request.clone(), hit);
    }
    for binding in &plan.spliced {
        if let Some(first) = binding.candidates.first() {
            result.add_resolved(first.clone());
            result.set_versionless(binding.request.clone(), Some(first.clone()));
        }
    }
}
