// src/resolver/engine.rs

//! Core resolution engine
//!
//! Resolution is a depth-first walk from the requested roots. Every
//! dependency edge gathers its candidate versions (preferred first, then
//! tolerated), filtered for accessibility and process type. Singleton bases
//! with several surviving candidates are postponed; postponed decisions are
//! settled one at a time against every competing chain, with a permutation
//! snapshot pushed before each commit so a later dead end can rewind and try
//! the next candidate. A fixed point over auto-feature activation wraps the
//! whole thing.

use crate::error::{Error, Result};
use crate::feature::{
    split_name_and_version, version_of, FeatureDefinition, FeatureRequirement, ProcessType,
    Visibility,
};
use crate::repository::FeatureRepository;
use crate::resolver::chain::Chain;
use crate::resolver::permutation::Permutation;
use crate::resolver::platform::{self, PlatformPlan};
use crate::resolver::result::ResolutionResult;
use indexmap::IndexSet;
use std::collections::HashSet;
use tracing::{debug, trace};

/// One resolution request
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    /// Requested root feature names (symbolic or short)
    pub roots: Vec<String>,
    /// Already-installed features; resolved unconditionally and immune to
    /// conflict exclusion
    pub pre_resolved: Vec<String>,
    /// Singleton relaxation: `None` enforces singletons strictly, an empty
    /// set relaxes every base name, a non-empty set relaxes only the named
    /// base names.
    pub allowed_multiple_versions: Option<HashSet<String>>,
    /// Process types the resolution is for
    pub process_types: Vec<ProcessType>,
    /// Explicitly configured platform versions
    pub root_platforms: Vec<String>,
    /// Preference-ordered platform fallbacks
    pub preferred_platforms: Vec<String>,
}

impl Default for ResolveRequest {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            pre_resolved: Vec::new(),
            allowed_multiple_versions: None,
            process_types: vec![ProcessType::Server],
            root_platforms: Vec::new(),
            preferred_platforms: Vec::new(),
        }
    }
}

impl ResolveRequest {
    pub fn new(roots: &[&str]) -> Self {
        Self {
            roots: roots.iter().map(|r| r.to_string()).collect(),
            ..Self::default()
        }
    }
}

/// One dependency edge being processed during the walk
struct Edge<'p> {
    path: &'p [String],
    base: String,
    preferred_version: String,
    requirement: String,
}

/// Mutable state for one `resolve_once` call: the working permutation, the
/// backtrack stack, and the best conflicted attempt seen so far.
struct SelectionContext<'a> {
    process_types: &'a [ProcessType],
    allowed_multiple: Option<&'a HashSet<String>>,
    current: Permutation,
    stack: Vec<Permutation>,
    best: Option<ResolutionResult>,
}

impl<'a> SelectionContext<'a> {
    fn new(request: &'a ResolveRequest, pinned: HashSet<String>) -> Self {
        Self {
            process_types: &request.process_types,
            allowed_multiple: request.allowed_multiple_versions.as_ref(),
            current: Permutation::with_pinned(pinned),
            stack: Vec::new(),
            best: None,
        }
    }

    /// Whether the singleton constraint is enforced for a base name
    fn singleton_enforced(&self, base: &str) -> bool {
        match self.allowed_multiple {
            None => true,
            Some(relaxed) => !(relaxed.is_empty() || relaxed.contains(base)),
        }
    }

    fn push(&mut self) {
        self.stack.push(self.current.snapshot());
    }

    fn pop(&mut self) -> bool {
        match self.stack.pop() {
            Some(restored) => {
                self.current = restored;
                true
            }
            None => false,
        }
    }

    /// Remember the current result when it beats the best conflicted
    /// attempt seen so far.
    fn note_outcome(&mut self) {
        let count = self.current.result.conflict_count();
        if self.best.as_ref().map_or(true, |b| count < b.conflict_count()) {
            self.best = Some(self.current.result.clone());
        }
    }

    fn take_best(&mut self) -> ResolutionResult {
        match self.best.take() {
            Some(best) if best.conflict_count() < self.current.result.conflict_count() => best,
            _ => std::mem::take(&mut self.current.result),
        }
    }
}

/// Feature dependency resolver
#[derive(Debug, Default)]
pub struct FeatureResolver;

impl FeatureResolver {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the request against the repository.
    ///
    /// `kernel` names features that count as present for auto-feature
    /// activation without ever appearing in the resolved set.
    pub fn resolve<R: FeatureRepository + ?Sized>(
        &self,
        repo: &R,
        kernel: &[FeatureDefinition],
        request: &ResolveRequest,
    ) -> Result<ResolutionResult> {
        let plan = platform::preprocess(
            repo,
            &request.roots,
            &request.root_platforms,
            &request.preferred_platforms,
            request.allowed_multiple_versions.is_some(),
        );

        let mut roots = plan.roots.clone();
        let mut pre_resolved: IndexSet<String> = request.pre_resolved.iter().cloned().collect();
        let mut activated: HashSet<String> = HashSet::new();
        let mut carried: Option<ResolutionResult> = None;
        let mut require_public = true;

        loop {
            let mut result =
                self.resolve_once(repo, request, &plan, &roots, &pre_resolved, require_public)?;
            if let Some(previous) = carried.take() {
                result.merge_diagnostics(&previous);
            }

            let mut present: HashSet<String> = result
                .resolved()
                .iter()
                .map(|n| n.to_ascii_lowercase())
                .collect();
            present.extend(kernel.iter().map(|k| k.symbolic_name.to_ascii_lowercase()));

            let mut newly_active = Vec::new();
            for auto in repo.auto_features() {
                let key = auto.symbolic_name.to_ascii_lowercase();
                if activated.contains(&key) || present.contains(&key) {
                    continue;
                }
                if !auto.supports_any(&request.process_types) {
                    continue;
                }
                if auto.activation_satisfied(&present) {
                    activated.insert(key);
                    newly_active.push(auto.symbolic_name.clone());
                }
            }
            if newly_active.is_empty() {
                platform::finalize(&plan, &mut result);
                return Ok(result);
            }
            debug!(features = ?newly_active, "auto features activated");
            pre_resolved = result.resolved().clone();
            carried = Some(result);
            roots = newly_active;
            require_public = false;
        }
    }

    /// One full resolution attempt: walk to a fixed point, backtrack while
    /// the conflict count exceeds the first-pass floor.
    fn resolve_once<R: FeatureRepository + ?Sized>(
        &self,
        repo: &R,
        request: &ResolveRequest,
        plan: &PlatformPlan,
        roots: &[String],
        pre_resolved: &IndexSet<String>,
        require_public: bool,
    ) -> Result<ResolutionResult> {
        let pinned: HashSet<String> = pre_resolved.iter().cloned().collect();
        let mut ctx = SelectionContext::new(request, pinned);
        ctx.current.result.merge_diagnostics(&plan.seed);

        let roots = self.check_roots(repo, &mut ctx, roots, pre_resolved, require_public);
        for name in pre_resolved {
            self.prime(repo, &mut ctx, name);
        }
        for name in &roots {
            if repo.feature(name).map_or(false, |def| def.singleton) {
                self.prime(repo, &mut ctx, name);
            }
        }

        let mut floor: Option<usize> = None;
        loop {
            self.run_to_fixed_point(repo, &mut ctx, plan, &roots, pre_resolved, &mut floor)?;
            let conflicts = ctx.current.result.conflict_count();
            if conflicts <= floor.unwrap_or(0) {
                debug!(conflicts, "resolution accepted");
                return Ok(std::mem::take(&mut ctx.current.result));
            }
            ctx.note_outcome();
            if !ctx.pop() {
                debug!("alternatives exhausted; keeping the best attempt");
                return Ok(ctx.take_best());
            }
            debug!("backtracking to the previous decision point");
        }
    }

    /// Validate the requested roots, returning their canonical symbolic
    /// names. Roots already pre-resolved are dropped silently.
    fn check_roots<R: FeatureRepository + ?Sized>(
        &self,
        repo: &R,
        ctx: &mut SelectionContext<'_>,
        roots: &[String],
        pre_resolved: &IndexSet<String>,
        require_public: bool,
    ) -> Vec<String> {
        let mut accepted = Vec::new();
        for name in roots {
            let Some(def) = repo.feature(name) else {
                ctx.current.result.add_missing(name.clone());
                continue;
            };
            let symbolic = def.symbolic_name.clone();
            if pre_resolved.contains(&symbolic) {
                trace!(feature = %symbolic, "root already pre-resolved");
                continue;
            }
            if require_public && def.visibility != Visibility::Public {
                ctx.current.result.add_non_public_root(name.clone());
                continue;
            }
            if !def.supports_any(ctx.process_types) {
                let chain = Chain::new(
                    Vec::new(),
                    vec![symbolic.clone()],
                    def.version().unwrap_or_default(),
                    name.clone(),
                );
                ctx.current.result.add_wrong_process_type(name.clone(), chain);
                continue;
            }
            if !accepted.contains(&symbolic) {
                accepted.push(symbolic);
            }
        }
        accepted
    }

    /// Seed a pre-selected winner for a singleton base name. Competing
    /// seeds for the same base conflict immediately.
    fn prime<R: FeatureRepository + ?Sized>(
        &self,
        repo: &R,
        ctx: &mut SelectionContext<'_>,
        name: &str,
    ) {
        let (base, version) = split_name_and_version(name);
        if let Some(def) = repo.feature(name) {
            if !def.singleton {
                return;
            }
        }
        if !ctx.singleton_enforced(base) {
            return;
        }
        let chain = Chain::new(
            Vec::new(),
            vec![name.to_string()],
            version.unwrap_or_default(),
            name,
        );
        match ctx.current.selected.get(base) {
            Some(existing) if existing.candidate() != name => {
                let existing = existing.clone();
                ctx.current.block(base, vec![existing, chain]);
            }
            Some(_) => {}
            None => {
                ctx.current.selected.insert(base.to_string(), chain);
            }
        }
    }

    fn run_to_fixed_point<R: FeatureRepository + ?Sized>(
        &self,
        repo: &R,
        ctx: &mut SelectionContext<'_>,
        plan: &PlatformPlan,
        roots: &[String],
        pre_resolved: &IndexSet<String>,
        floor: &mut Option<usize>,
    ) -> Result<()> {
        loop {
            self.walk_pass(repo, ctx, plan, roots, pre_resolved)?;
            if floor.is_none() {
                // Conflicts already present after the very first pass set
                // the floor; backtracking only fights conflicts above it.
                *floor = Some(ctx.current.result.conflict_count());
            }
            if !ctx.current.has_postponed() {
                return Ok(());
            }
            self.process_postponed(ctx);
        }
    }

    /// One traversal of the whole graph from the roots. The resolved set is
    /// rebuilt from scratch; selections, postponements, and sticky
    /// diagnostics carry over.
    fn walk_pass<R: FeatureRepository + ?Sized>(
        &self,
        repo: &R,
        ctx: &mut SelectionContext<'_>,
        plan: &PlatformPlan,
        roots: &[String],
        pre_resolved: &IndexSet<String>,
    ) -> Result<()> {
        ctx.current.result.clear_resolved();
        for name in pre_resolved {
            ctx.current.result.add_resolved(name.clone());
        }
        // Versionless bindings with several tolerable versions are not
        // reachable by walking, so their pending decisions are re-seeded
        // every pass until one is committed or conflicted.
        for (base, chain) in &plan.deferred {
            if ctx.current.selected.contains_key(base) || ctx.current.blocked.contains(base) {
                continue;
            }
            if chain
                .candidates()
                .iter()
                .any(|c| ctx.current.result.resolved().contains(c))
            {
                continue;
            }
            ctx.current.postpone_versionless(base, chain.clone());
        }
        let committed = ctx.current.versionless_roots.clone();
        for name in roots.iter().chain(committed.iter()) {
            let Some(def) = repo.feature(name) else { continue };
            let edge = Edge {
                path: &[],
                base: def.base_name().to_string(),
                preferred_version: def.version().unwrap_or_default().to_string(),
                requirement: def.symbolic_name.clone(),
            };
            self.process_candidates(
                repo,
                ctx,
                edge,
                def.singleton,
                vec![def.symbolic_name.clone()],
                Vec::new(),
            )?;
        }
        Ok(())
    }

    /// Gather and filter the candidate versions for one dependency edge
    fn process_requirement<R: FeatureRepository + ?Sized>(
        &self,
        repo: &R,
        ctx: &mut SelectionContext<'_>,
        path: &[String],
        dependent: &FeatureDefinition,
        requirement: &FeatureRequirement,
    ) -> Result<()> {
        let req_name = &requirement.symbolic_name;
        if let Some(found) = repo.feature(req_name) {
            if !found.symbolic_name.eq_ignore_ascii_case(req_name) {
                // Dependency edges must use symbolic names; a short-name
                // reference is a definition error, not a resolution outcome.
                return Err(Error::ShortNameRequirement {
                    dependent: dependent.symbolic_name.clone(),
                    requirement: req_name.clone(),
                });
            }
        }
        let (base, preferred) = split_name_and_version(req_name);

        let mut names: Vec<String> = vec![req_name.clone()];
        let configured = repo.configured_tolerates(base);
        for version in requirement.tolerates.iter().chain(configured.iter()) {
            let full = format!("{base}-{version}");
            if !names.contains(&full) {
                names.push(full);
            }
        }

        let mut candidates: Vec<String> = Vec::new();
        let mut ineligible: Vec<String> = Vec::new();
        let mut singleton = false;
        for name in &names {
            let Some(found) = repo.feature(name) else { continue };
            if !found.symbolic_name.eq_ignore_ascii_case(name) {
                continue;
            }
            if found.versionless {
                continue;
            }
            if found.visibility == Visibility::Private && found.origin != dependent.origin {
                trace!(
                    feature = %found.symbolic_name,
                    dependent = %dependent.symbolic_name,
                    "private feature not accessible across origins"
                );
                continue;
            }
            if !found.supports_any(ctx.process_types) {
                if !ineligible.contains(&found.symbolic_name) {
                    ineligible.push(found.symbolic_name.clone());
                }
                continue;
            }
            if !candidates.contains(&found.symbolic_name) {
                singleton = singleton || found.singleton;
                candidates.push(found.symbolic_name.clone());
            }
        }

        let edge = Edge {
            path,
            base: base.to_string(),
            preferred_version: preferred.unwrap_or_default().to_string(),
            requirement: req_name.clone(),
        };
        self.process_candidates(repo, ctx, edge, singleton, candidates, ineligible)
    }

    /// Decide what to do with the surviving candidates of one edge:
    /// recurse, postpone, or report.
    fn process_candidates<R: FeatureRepository + ?Sized>(
        &self,
        repo: &R,
        ctx: &mut SelectionContext<'_>,
        edge: Edge<'_>,
        singleton: bool,
        mut candidates: Vec<String>,
        ineligible: Vec<String>,
    ) -> Result<()> {
        let enforce = singleton && ctx.singleton_enforced(&edge.base);
        if enforce {
            if ctx.current.blocked.contains(&edge.base) {
                return Ok(());
            }
            if let Some(winner) = ctx.current.selected.get(&edge.base) {
                let name = winner.candidate().to_string();
                if candidates.iter().any(|c| *c == name) {
                    candidates = vec![name];
                } else if !candidates.is_empty() {
                    let existing = winner.clone();
                    let conflicting = Chain::new(
                        edge.path.to_vec(),
                        candidates,
                        edge.preferred_version,
                        edge.requirement,
                    );
                    ctx.current.block(&edge.base, vec![existing, conflicting]);
                    return Ok(());
                }
            }
        }
        if candidates.is_empty() {
            if !ineligible.is_empty() {
                let chain = Chain::new(
                    edge.path.to_vec(),
                    ineligible,
                    edge.preferred_version,
                    edge.requirement.clone(),
                );
                ctx.current
                    .result
                    .add_wrong_process_type(edge.requirement.clone(), chain);
            }
            ctx.current.result.add_missing(edge.requirement);
            return Ok(());
        }
        if !enforce {
            for candidate in candidates {
                self.resolve_selected(repo, ctx, edge.path, &candidate)?;
            }
            return Ok(());
        }
        if candidates.len() == 1 {
            let only = candidates.remove(0);
            let chain = Chain::new(
                edge.path.to_vec(),
                vec![only.clone()],
                edge.preferred_version,
                edge.requirement,
            );
            ctx.current.selected.entry(edge.base).or_insert(chain);
            self.resolve_selected(repo, ctx, edge.path, &only)
        } else {
            let chain = Chain::new(
                edge.path.to_vec(),
                candidates,
                edge.preferred_version,
                edge.requirement,
            );
            trace!(base = %edge.base, chain = %chain, "postponing singleton decision");
            ctx.current.postpone(&edge.base, chain);
            Ok(())
        }
    }

    /// Add a feature to the resolved set and walk its requirements
    fn resolve_selected<R: FeatureRepository + ?Sized>(
        &self,
        repo: &R,
        ctx: &mut SelectionContext<'_>,
        path: &[String],
        name: &str,
    ) -> Result<()> {
        // A candidate already on the path is a dependency cycle; recursion
        // stops here and the earlier visit stands.
        if path.iter().any(|p| p == name) {
            trace!(feature = %name, "dependency cycle");
            return Ok(());
        }
        let Some(def) = repo.feature(name) else {
            ctx.current.result.add_missing(name.to_string());
            return Ok(());
        };
        if !ctx.current.result.add_resolved(def.symbolic_name.clone()) {
            return Ok(());
        }
        trace!(feature = %def.symbolic_name, "resolved");
        let mut next_path = path.to_vec();
        next_path.push(def.symbolic_name.clone());
        for requirement in &def.requirements {
            self.process_requirement(repo, ctx, &next_path, def, requirement)?;
        }
        Ok(())
    }

    /// Settle the next postponed decision in FIFO order
    fn process_postponed(&self, ctx: &mut SelectionContext<'_>) {
        let Some((base, versionless)) = ctx.current.next_postponed() else {
            return;
        };
        let chains = if versionless {
            ctx.current.postponed_versionless.get(&base).cloned()
        } else {
            ctx.current.postponed.get(&base).cloned()
        }
        .unwrap_or_default();

        if ctx.current.blocked.contains(&base) {
            Self::remove_bucket(ctx, &base, versionless);
            return;
        }

        let winner = chains.find_winner();
        let selected = ctx.current.selected.get(&base).cloned();
        match (winner, selected) {
            (Some(winner), Some(existing)) => {
                Self::remove_bucket(ctx, &base, versionless);
                if existing.candidate() == winner {
                    return;
                }
                // Another edge already selected a different version through
                // its only candidate; the postponed preference cannot be
                // honored.
                let mut report = vec![existing];
                report.extend(chains.chains().first().cloned());
                debug!(base = %base, "postponed preference contradicts an existing selection");
                ctx.current.block(&base, report);
            }
            (Some(winner), None) => {
                if versionless {
                    if let Some(bucket) = ctx.current.postponed_versionless.get_mut(&base) {
                        bucket.mark_attempted(&winner);
                    }
                } else if let Some(bucket) = ctx.current.postponed.get_mut(&base) {
                    bucket.mark_attempted(&winner);
                }
                ctx.push();
                debug!(base = %base, winner = %winner, "committed postponed decision");
                let version = version_of(&winner).unwrap_or_default().to_string();
                ctx.current.selected.insert(
                    base.clone(),
                    Chain::new(Vec::new(), vec![winner.clone()], version, base.clone()),
                );
                if versionless && !ctx.current.versionless_roots.contains(&winner) {
                    ctx.current.versionless_roots.push(winner);
                }
                ctx.current.clear_postponed();
            }
            (None, selected) => {
                Self::remove_bucket(ctx, &base, versionless);
                let mut report = chains.representatives();
                if let Some(existing) = selected {
                    report.insert(0, existing);
                    report.truncate(2);
                }
                debug!(
                    base = %base,
                    chains = %chains.describe(),
                    "no acceptable candidate; conflict recorded"
                );
                ctx.current.block(&base, report);
            }
        }
    }

    fn remove_bucket(ctx: &mut SelectionContext<'_>, base: &str, versionless: bool) {
        if versionless {
            ctx.current.postponed_versionless.shift_remove(base);
        } else {
            ctx.current.postponed.shift_remove(base);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::StaticRepository;

    fn resolve(repo: &StaticRepository, roots: &[&str]) -> ResolutionResult {
        FeatureResolver::new()
            .resolve(repo, &[], &ResolveRequest::new(roots))
            .unwrap()
    }

    fn resolved(result: &ResolutionResult) -> Vec<&str> {
        result.resolved().iter().map(String::as_str).collect()
    }

    #[test]
    fn test_transitive_resolution_in_traversal_order() {
        let repo = StaticRepository::new(vec![
            FeatureDefinition::new("a-1.0").public().requires("b-1.0"),
            FeatureDefinition::new("b-1.0").protected().requires("c-1.0"),
            FeatureDefinition::new("c-1.0").protected(),
        ]);
        let result = resolve(&repo, &["a-1.0"]);
        assert_eq!(resolved(&result), vec!["a-1.0", "b-1.0", "c-1.0"]);
        assert!(result.is_complete());
    }

    #[test]
    fn test_missing_root() {
        let repo = StaticRepository::new(vec![FeatureDefinition::new("a-1.0").public()]);
        let result = resolve(&repo, &["nope-1.0", "a-1.0"]);
        assert!(result.missing().contains("nope-1.0"));
        assert_eq!(resolved(&result), vec!["a-1.0"]);
    }

    #[test]
    fn test_missing_dependency_does_not_stop_siblings() {
        let repo = StaticRepository::new(vec![
            FeatureDefinition::new("a-1.0")
                .public()
                .requires("ghost-1.0")
                .requires("b-1.0"),
            FeatureDefinition::new("b-1.0").protected(),
        ]);
        let result = resolve(&repo, &["a-1.0"]);
        assert!(result.missing().contains("ghost-1.0"));
        assert!(result.resolved().contains("b-1.0"));
    }

    #[test]
    fn test_non_public_root_rejected() {
        let repo = StaticRepository::new(vec![FeatureDefinition::new("internal-1.0").protected()]);
        let result = resolve(&repo, &["internal-1.0"]);
        assert!(result.non_public_roots().contains("internal-1.0"));
        assert!(result.resolved().is_empty());
    }

    #[test]
    fn test_wrong_process_type_root() {
        let repo = StaticRepository::new(vec![FeatureDefinition::new("ui-1.0")
            .public()
            .client_only()]);
        let result = resolve(&repo, &["ui-1.0"]);
        assert!(result.wrong_process_types().contains_key("ui-1.0"));
        assert!(result.resolved().is_empty());
    }

    #[test]
    fn test_wrong_process_type_dependency_is_also_missing() {
        let repo = StaticRepository::new(vec![
            FeatureDefinition::new("a-1.0").public().requires("srv-1.0"),
            FeatureDefinition::new("srv-1.0").protected().client_only(),
        ]);
        let result = resolve(&repo, &["a-1.0"]);
        assert!(result.wrong_process_types().contains_key("srv-1.0"));
        assert!(result.missing().contains("srv-1.0"));
        assert!(result.resolved().contains("a-1.0"));
    }

    #[test]
    fn test_root_resolvable_by_short_name() {
        let repo = StaticRepository::new(vec![FeatureDefinition::new("web-1.0")
            .public()
            .with_short_name("web")]);
        let result = resolve(&repo, &["web"]);
        assert_eq!(resolved(&result), vec!["web-1.0"]);
    }

    #[test]
    fn test_short_name_requirement_is_an_error() {
        let repo = StaticRepository::new(vec![
            FeatureDefinition::new("a-1.0").public().requires("web"),
            FeatureDefinition::new("web-1.0")
                .protected()
                .with_short_name("web"),
        ]);
        let err = FeatureResolver::new()
            .resolve(&repo, &[], &ResolveRequest::new(&["a-1.0"]))
            .unwrap_err();
        match err {
            Error::ShortNameRequirement { dependent, requirement } => {
                assert_eq!(dependent, "a-1.0");
                assert_eq!(requirement, "web");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_singleton_conflict_excludes_base() {
        let repo = StaticRepository::new(vec![
            FeatureDefinition::new("a-1.0")
                .public()
                .requires_tolerating("b-1.0", &["2.0"]),
            FeatureDefinition::new("c-1.0").public().requires("b-2.0"),
            FeatureDefinition::new("b-1.0").protected().singleton(),
            FeatureDefinition::new("b-2.0").protected().singleton(),
        ]);
        let result = resolve(&repo, &["a-1.0", "c-1.0"]);
        let chains = &result.conflicts()["b"];
        assert_eq!(chains.len(), 2);
        let paths: Vec<&[String]> = chains.iter().map(Chain::path).collect();
        assert!(paths.iter().any(|p| p.contains(&"a-1.0".to_string())));
        assert!(paths.iter().any(|p| p.contains(&"c-1.0".to_string())));
        assert!(result.resolved().contains("a-1.0"));
        assert!(result.resolved().contains("c-1.0"));
        assert!(!result.resolved().contains("b-1.0"));
        assert!(!result.resolved().contains("b-2.0"));
    }

    #[test]
    fn test_non_singleton_versions_coexist() {
        let repo = StaticRepository::new(vec![
            FeatureDefinition::new("a-1.0")
                .public()
                .requires_tolerating("b-1.0", &["2.0"]),
            FeatureDefinition::new("c-1.0").public().requires("b-2.0"),
            FeatureDefinition::new("b-1.0").protected(),
            FeatureDefinition::new("b-2.0").protected(),
        ]);
        let result = resolve(&repo, &["a-1.0", "c-1.0"]);
        assert!(result.conflicts().is_empty());
        assert!(result.resolved().contains("b-1.0"));
        assert!(result.resolved().contains("b-2.0"));
    }

    #[test]
    fn test_tolerated_common_version_wins() {
        let repo = StaticRepository::new(vec![
            FeatureDefinition::new("a-1.0")
                .public()
                .requires_tolerating("b-1.0", &["2.0"]),
            FeatureDefinition::new("c-1.0")
                .public()
                .requires_tolerating("b-2.0", &["3.0"]),
            FeatureDefinition::new("b-1.0").protected().singleton(),
            FeatureDefinition::new("b-2.0").protected().singleton(),
            FeatureDefinition::new("b-3.0").protected().singleton(),
        ]);
        let result = resolve(&repo, &["a-1.0", "c-1.0"]);
        assert!(result.conflicts().is_empty());
        assert!(result.resolved().contains("b-2.0"));
        assert!(!result.resolved().contains("b-1.0"));
        assert!(!result.resolved().contains("b-3.0"));
    }

    #[test]
    fn test_lowest_common_version_preferred() {
        let repo = StaticRepository::new(vec![
            FeatureDefinition::new("a-1.0")
                .public()
                .requires_tolerating("b-1.0", &["2.0"]),
            FeatureDefinition::new("c-1.0")
                .public()
                .requires_tolerating("b-1.0", &["2.0"]),
            FeatureDefinition::new("b-1.0").protected().singleton(),
            FeatureDefinition::new("b-2.0").protected().singleton(),
        ]);
        let result = resolve(&repo, &["a-1.0", "c-1.0"]);
        assert!(result.resolved().contains("b-1.0"));
        assert!(!result.resolved().contains("b-2.0"));
    }

    #[test]
    fn test_backtracking_recovers_from_greedy_choice() {
        // Committing c-1.0 first leads to a d-1.0 / d-2.0 dead end; the
        // rewind tries c-2.0, whose dependency agrees with e's.
        let repo = StaticRepository::new(vec![
            FeatureDefinition::new("a-1.0")
                .public()
                .requires_tolerating("c-1.0", &["2.0"]),
            FeatureDefinition::new("b-1.0")
                .public()
                .requires_tolerating("c-1.0", &["2.0"]),
            FeatureDefinition::new("e-1.0").public().requires("d-2.0"),
            FeatureDefinition::new("c-1.0")
                .protected()
                .singleton()
                .requires("d-1.0"),
            FeatureDefinition::new("c-2.0")
                .protected()
                .singleton()
                .requires("d-2.0"),
            FeatureDefinition::new("d-1.0").protected().singleton(),
            FeatureDefinition::new("d-2.0").protected().singleton(),
        ]);
        let result = resolve(&repo, &["a-1.0", "b-1.0", "e-1.0"]);
        assert!(result.conflicts().is_empty(), "{:?}", result.conflicts());
        assert!(result.resolved().contains("c-2.0"));
        assert!(result.resolved().contains("d-2.0"));
        assert!(!result.resolved().contains("c-1.0"));
        assert!(!result.resolved().contains("d-1.0"));
    }

    #[test]
    fn test_allowed_multiple_versions_relaxes_all() {
        let repo = StaticRepository::new(vec![
            FeatureDefinition::new("a-1.0")
                .public()
                .requires_tolerating("b-1.0", &["2.0"]),
            FeatureDefinition::new("c-1.0").public().requires("b-2.0"),
            FeatureDefinition::new("b-1.0").protected().singleton(),
            FeatureDefinition::new("b-2.0").protected().singleton(),
        ]);
        let mut request = ResolveRequest::new(&["a-1.0", "c-1.0"]);
        request.allowed_multiple_versions = Some(HashSet::new());
        let result = FeatureResolver::new().resolve(&repo, &[], &request).unwrap();
        assert!(result.conflicts().is_empty());
        assert!(result.resolved().contains("b-1.0"));
        assert!(result.resolved().contains("b-2.0"));
    }

    #[test]
    fn test_allowed_multiple_versions_named_bases_only() {
        let repo = StaticRepository::new(vec![
            FeatureDefinition::new("a-1.0")
                .public()
                .requires_tolerating("b-1.0", &["2.0"])
                .requires("z-1.0"),
            FeatureDefinition::new("c-1.0")
                .public()
                .requires("b-2.0")
                .requires("z-2.0"),
            FeatureDefinition::new("b-1.0").protected().singleton(),
            FeatureDefinition::new("b-2.0").protected().singleton(),
            FeatureDefinition::new("z-1.0").protected().singleton(),
            FeatureDefinition::new("z-2.0").protected().singleton(),
        ]);
        let mut request = ResolveRequest::new(&["a-1.0", "c-1.0"]);
        request.allowed_multiple_versions = Some(["b".to_string()].into_iter().collect());
        let result = FeatureResolver::new().resolve(&repo, &[], &request).unwrap();
        // b is relaxed; z stays a strict singleton and conflicts.
        assert!(result.resolved().contains("b-1.0"));
        assert!(result.resolved().contains("b-2.0"));
        assert!(result.conflicts().contains_key("z"));
    }

    #[test]
    fn test_pre_resolved_survives_conflict() {
        let repo = StaticRepository::new(vec![
            FeatureDefinition::new("a-1.0").public().requires("b-2.0"),
            FeatureDefinition::new("b-1.0").protected().singleton(),
            FeatureDefinition::new("b-2.0").protected().singleton(),
        ]);
        let mut request = ResolveRequest::new(&["a-1.0"]);
        request.pre_resolved = vec!["b-1.0".to_string()];
        let result = FeatureResolver::new().resolve(&repo, &[], &request).unwrap();
        assert!(result.conflicts().contains_key("b"));
        assert!(result.resolved().contains("b-1.0"));
        assert!(!result.resolved().contains("b-2.0"));
        assert!(result.resolved().contains("a-1.0"));
    }

    #[test]
    fn test_pre_resolved_root_dropped_silently() {
        let repo = StaticRepository::new(vec![FeatureDefinition::new("a-1.0").public()]);
        let mut request = ResolveRequest::new(&["a-1.0"]);
        request.pre_resolved = vec!["a-1.0".to_string()];
        let result = FeatureResolver::new().resolve(&repo, &[], &request).unwrap();
        assert_eq!(resolved(&result), vec!["a-1.0"]);
        assert!(result.is_complete());
    }

    #[test]
    fn test_dependency_cycle_resolves_without_error() {
        let repo = StaticRepository::new(vec![
            FeatureDefinition::new("a-1.0").public().requires("b-1.0"),
            FeatureDefinition::new("b-1.0").protected().requires("a-1.0"),
        ]);
        let result = resolve(&repo, &["a-1.0"]);
        assert!(result.resolved().contains("a-1.0"));
        assert!(result.resolved().contains("b-1.0"));
        assert!(result.is_complete());
    }

    #[test]
    fn test_private_dependency_requires_same_origin() {
        let repo = StaticRepository::new(vec![
            FeatureDefinition::new("a-1.0")
                .public()
                .with_origin("usr")
                .requires("int-1.0"),
            FeatureDefinition::new("b-1.0")
                .public()
                .with_origin("core")
                .requires("int-1.0"),
            FeatureDefinition::new("int-1.0").private().with_origin("core"),
        ]);
        let cross = resolve(&repo, &["a-1.0"]);
        assert!(cross.missing().contains("int-1.0"));
        let same = resolve(&repo, &["b-1.0"]);
        assert!(same.resolved().contains("int-1.0"));
    }

    #[test]
    fn test_configured_tolerates_extend_candidates() {
        let repo = StaticRepository::new(vec![
            FeatureDefinition::new("a-1.0").public().requires("b-1.0"),
            FeatureDefinition::new("b-2.0").protected().singleton(),
        ])
        .with_tolerates("b", &["2.0"]);
        let result = resolve(&repo, &["a-1.0"]);
        assert!(result.resolved().contains("b-2.0"));
        assert!(result.missing().is_empty());
    }

    #[test]
    fn test_auto_feature_activation() {
        let repo = StaticRepository::new(vec![
            FeatureDefinition::new("a-1.0").public(),
            FeatureDefinition::new("b-1.0").public(),
            FeatureDefinition::new("x-1.0").auto_activated_by(&["a-1.0", "b-1.0"]),
        ]);
        let mut request = ResolveRequest::new(&["a-1.0"]);
        request.pre_resolved = vec!["b-1.0".to_string()];
        let result = FeatureResolver::new().resolve(&repo, &[], &request).unwrap();
        assert!(result.resolved().contains("x-1.0"));
        assert!(result.resolved().contains("a-1.0"));
        assert!(result.resolved().contains("b-1.0"));
    }

    #[test]
    fn test_auto_feature_not_activated_without_all_triggers() {
        let repo = StaticRepository::new(vec![
            FeatureDefinition::new("a-1.0").public(),
            FeatureDefinition::new("b-1.0").public(),
            FeatureDefinition::new("x-1.0").auto_activated_by(&["a-1.0", "b-1.0"]),
        ]);
        let result = resolve(&repo, &["a-1.0"]);
        assert!(!result.resolved().contains("x-1.0"));
    }

    #[test]
    fn test_auto_feature_chain_reaches_fixed_point() {
        let repo = StaticRepository::new(vec![
            FeatureDefinition::new("a-1.0").public(),
            FeatureDefinition::new("x-1.0").auto_activated_by(&["a-1.0"]),
            FeatureDefinition::new("y-1.0").auto_activated_by(&["x-1.0"]),
        ]);
        let result = resolve(&repo, &["a-1.0"]);
        assert!(result.resolved().contains("x-1.0"));
        assert!(result.resolved().contains("y-1.0"));
    }

    #[test]
    fn test_kernel_features_trigger_but_never_resolve() {
        let repo = StaticRepository::new(vec![
            FeatureDefinition::new("a-1.0").public(),
            FeatureDefinition::new("x-1.0").auto_activated_by(&["a-1.0", "kernel-1.0"]),
        ]);
        let kernel = vec![FeatureDefinition::new("kernel-1.0")];
        let result = FeatureResolver::new()
            .resolve(&repo, &kernel, &ResolveRequest::new(&["a-1.0"]))
            .unwrap();
        assert!(result.resolved().contains("x-1.0"));
        assert!(!result.resolved().contains("kernel-1.0"));
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let repo = StaticRepository::new(vec![
            FeatureDefinition::new("a-1.0")
                .public()
                .requires_tolerating("b-1.0", &["2.0"]),
            FeatureDefinition::new("c-1.0").public().requires("b-2.0"),
            FeatureDefinition::new("b-1.0").protected().singleton(),
            FeatureDefinition::new("b-2.0").protected().singleton(),
        ]);
        let first = resolve(&repo, &["a-1.0", "c-1.0"]);
        let second = resolve(&repo, &["a-1.0", "c-1.0"]);
        assert_eq!(first, second);
    }
}
