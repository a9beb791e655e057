//! Route matching engine
//!
//! Owns every piece of matching state: the record arena and name registry,
//! the trie, the compiled patterns, the fast-path table, the match cache
//! and the tuning feedback. Lookups go cache, then fast path, then trie.

use crate::adaptive::AdaptiveCache;
use crate::cache::{cache_key, LruCache};
use crate::compiler::PathCompiler;
use crate::config::MatcherConfig;
use crate::fast_path::{FastEntry, FastLookup, FastPathIndex};
use crate::hotspot::HotspotTracker;
use crate::location::{normalize_path, parse_location};
use crate::record::{RecordId, RouteDefinition, RouteRecord};
use crate::{Error, Params, Result};
use percent_encoding::percent_decode_str;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace, warn};
use waypoint_trie::{parse_pattern, split_path, Segment, Trie};
use web_time::{Duration, Instant};

/// Outcome of a successful path match
#[derive(Debug, Clone)]
pub struct MatchResult {
    /// Primary record (a default child when one applies)
    pub record: Arc<RouteRecord>,
    /// Matched records, outermost first, ending with `record`
    pub matched: Vec<Arc<RouteRecord>>,
    /// Extracted, percent-decoded parameters
    pub params: Params,
    /// Path segments that were matched
    pub segments: Vec<String>,
}

impl MatchResult {
    pub fn name(&self) -> Option<&str> {
        self.record.name()
    }
}

impl PartialEq for MatchResult {
    fn eq(&self, other: &Self) -> bool {
        self.record.id == other.record.id
            && self.params == other.params
            && self.segments == other.segments
            && self.matched.len() == other.matched.len()
            && self
                .matched
                .iter()
                .zip(&other.matched)
                .all(|(a, b)| a.id == b.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    /// Counts toward hit rate, latency and hotspots
    Tracked,
    /// Populates the cache without touching any statistics
    Warm,
}

/// Route registry and matcher
///
/// # Example
/// ```
/// use waypoint_core::{RouteDefinition, RouteMatcher};
///
/// let mut matcher = RouteMatcher::new();
/// matcher.add_route(RouteDefinition::new("/user/:id").name("user")).unwrap();
/// matcher.add_route(RouteDefinition::new("/user/profile").name("profile")).unwrap();
///
/// let m = matcher.match_by_path("/user/profile").unwrap();
/// assert_eq!(m.name(), Some("profile"));
///
/// let m = matcher.match_by_path("/user/42").unwrap();
/// assert_eq!(m.params["id"], "42");
/// ```
#[derive(Debug)]
pub struct RouteMatcher {
    config: MatcherConfig,
    /// Arena indexed by `RecordId`; removed records leave `None`
    records: Vec<Option<Arc<RouteRecord>>>,
    /// Registry key (name or `@id`) to record
    names: HashMap<String, RecordId>,
    trie: Trie<RecordId>,
    compiler: PathCompiler,
    fast_path: FastPathIndex,
    cache: LruCache<String, MatchResult>,
    hotspots: HotspotTracker,
    adaptive: AdaptiveCache,
    hit_count: u64,
    miss_count: u64,
    lookups: u64,
    total_match_time: Duration,
    preheated: bool,
}

impl Default for RouteMatcher {
    fn default() -> Self {
        Self::with_config(MatcherConfig::default())
    }
}

impl RouteMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MatcherConfig) -> Self {
        let adaptive = AdaptiveCache::new(config.cache.clone());
        Self {
            cache: LruCache::new(adaptive.capacity()),
            hotspots: HotspotTracker::new(&config.hotspot),
            adaptive,
            config,
            records: Vec::new(),
            names: HashMap::new(),
            trie: Trie::new(),
            compiler: PathCompiler::new(),
            fast_path: FastPathIndex::new(),
            hit_count: 0,
            miss_count: 0,
            lookups: 0,
            total_match_time: Duration::ZERO,
            preheated: false,
        }
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a top-level route and, recursively, its children.
    ///
    /// A route whose name is already registered replaces the earlier one.
    /// On error nothing from `definition` stays registered.
    pub fn add_route(&mut self, definition: RouteDefinition) -> Result<Arc<RouteRecord>> {
        self.precompile(&definition, None)?;
        let outcome = self.register(definition, None);
        self.routes_changed();
        let id = outcome?;
        self.record(id).ok_or_else(|| Error::not_found(id.to_string()))
    }

    /// Register a route under the record registered as `parent`.
    pub fn add_child_route(
        &mut self,
        parent: &str,
        definition: RouteDefinition,
    ) -> Result<Arc<RouteRecord>> {
        let parent_id = self
            .names
            .get(parent)
            .copied()
            .ok_or_else(|| Error::ParentNotFound(parent.to_string()))?;
        let parent_path = self
            .record(parent_id)
            .map(|p| p.path.clone())
            .ok_or_else(|| Error::ParentNotFound(parent.to_string()))?;
        self.precompile(&definition, Some(parent_path.as_str()))?;
        let outcome = self.register(definition, Some(parent_id));
        self.routes_changed();
        let id = outcome?;
        self.record(id).ok_or_else(|| Error::not_found(id.to_string()))
    }

    /// Remove a route and all of its descendants.
    pub fn remove_route(&mut self, name: &str) -> bool {
        let Some(id) = self.names.get(name).copied() else {
            return false;
        };
        let removed = self.unregister(id);
        self.routes_changed();
        debug!(name, removed, "route removed");
        true
    }

    fn register(&mut self, definition: RouteDefinition, parent: Option<RecordId>) -> Result<RecordId> {
        let RouteDefinition {
            path,
            name,
            components,
            children,
            meta,
            redirect,
            props,
            before_enter,
            aliases,
        } = definition;

        if let Some(existing) = name.as_deref().and_then(|n| self.names.get(n)).copied() {
            debug!(name = ?name, replaced = %existing, "replacing route with the same name");
            self.unregister(existing);
        }

        let parent_path = match parent {
            Some(p) => Some(
                self.record(p)
                    .ok_or_else(|| Error::ParentNotFound(p.to_string()))?
                    .path
                    .clone(),
            ),
            None => None,
        };

        let (is_default, full, alias_paths) = absolute_paths(parent_path.as_deref(), &path, &aliases);

        let compiled = self.compiler.compile(&full)?;
        let alias_compiled = alias_paths
            .iter()
            .map(|alias| self.compiler.compile(alias))
            .collect::<Result<Vec<_>>>()?;

        let id = RecordId(self.records.len() as u32);

        let inserted = if is_default {
            self.trie.insert_default_child(&full, id)
        } else {
            self.trie.insert(&full, id)
        };
        let previous = inserted.map_err(|e| Error::invalid_pattern(&full, e))?;
        if let Some(previous) = previous {
            warn!(path = %full, previous = %previous, record = %id, "path already registered; later route wins");
        }
        for alias in &alias_paths {
            let previous = self
                .trie
                .insert(alias, id)
                .map_err(|e| Error::invalid_pattern(alias, e))?;
            if let Some(previous) = previous {
                warn!(path = %alias, previous = %previous, record = %id, "alias overwrites a registered path");
            }
        }

        let record = RouteRecord {
            id,
            path: full,
            name,
            components,
            children: SmallVec::new(),
            parent,
            default_child: None,
            is_default,
            meta,
            redirect,
            props,
            before_enter,
            aliases: alias_paths,
            compiled,
            alias_compiled,
        };
        let key = record.key();
        debug!(key = %key, path = %record.path, id = %id, default = is_default, "route registered");
        self.records.push(Some(Arc::new(record)));
        self.names.insert(key, id);

        if let Some(parent) = parent.and_then(|p| self.records.get_mut(p.index())?.as_mut()) {
            let parent = Arc::make_mut(parent);
            parent.children.push(id);
            if is_default {
                parent.default_child = Some(id);
            }
        }

        for child in children {
            if let Err(e) = self.register(child, Some(id)) {
                self.unregister(id);
                return Err(e);
            }
        }

        Ok(id)
    }

    /// Compile every pattern of `definition` and its descendants.
    ///
    /// Runs before anything is registered or replaced, so a bad pattern
    /// anywhere in the tree leaves the registry untouched.
    fn precompile(&mut self, definition: &RouteDefinition, parent_path: Option<&str>) -> Result<()> {
        let (_, full, aliases) = absolute_paths(parent_path, &definition.path, &definition.aliases);
        self.compiler.compile(&full)?;
        for alias in &aliases {
            self.compiler.compile(alias)?;
        }
        for child in &definition.children {
            self.precompile(child, Some(full.as_str()))?;
        }
        Ok(())
    }

    /// Drop a record and its descendants from the arena, the registry and
    /// the trie. Returns the number of records removed.
    fn unregister(&mut self, id: RecordId) -> usize {
        let Some(root) = self.record(id) else {
            return 0;
        };

        let mut removed = 0;
        let mut vacated = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let Some(record) = self.records.get_mut(next.index()).and_then(Option::take) else {
                continue;
            };
            stack.extend(record.children.iter().copied());

            if record.is_default {
                self.trie.remove_default_child(&record.path, next);
            } else if self.trie.remove_record(&record.path, next) {
                vacated.push(record.path.clone());
            }
            for alias in &record.aliases {
                if self.trie.remove_record(alias, next) {
                    vacated.push(alias.clone());
                }
            }

            let key = record.key();
            if self.names.get(&key) == Some(&next) {
                self.names.remove(&key);
            }
            removed += 1;
        }

        if let Some(parent) = root
            .parent
            .and_then(|p| self.records.get_mut(p.index())?.as_mut())
        {
            let parent = Arc::make_mut(parent);
            parent.children.retain(|child| *child != id);
            if parent.default_child == Some(id) {
                parent.default_child = None;
            }
        }

        self.restore_terminals(&vacated);
        removed
    }

    /// Hand each vacated trie terminal back to the newest live record that
    /// was registered with that path and lost it to a later registration.
    fn restore_terminals(&mut self, vacated: &[String]) {
        for path in vacated {
            let heir = {
                let trie = &self.trie;
                let Some(terminal) = trie.find_node(path) else {
                    continue;
                };
                self.records.iter().flatten().rev().find_map(|r| {
                    let main = (!r.is_default).then_some(&r.path);
                    main.into_iter()
                        .chain(&r.aliases)
                        .find(|p| trie.find_node(p).is_some_and(|n| std::ptr::eq(n, terminal)))
                        .map(|p| (r.id, p.clone()))
                })
            };
            let Some((heir, pattern)) = heir else {
                continue;
            };
            if let Ok(None) = self.trie.insert(&pattern, heir) {
                debug!(path = %pattern, record = %heir, "path handed back to earlier route");
            }
        }
    }

    /// Keep derived state coherent after any registration change.
    fn routes_changed(&mut self) {
        self.cache.clear();
        self.rebuild_fast_path();

        let routes = self.names.len();
        if let Some(capacity) = self.adaptive.on_route_count(routes) {
            self.cache.resize(capacity);
            debug!(capacity, routes, "match cache resized for route count");
        }
    }

    fn rebuild_fast_path(&mut self) {
        if !self.config.fast_path {
            return;
        }

        let live: Vec<&Arc<RouteRecord>> = self.records.iter().flatten().collect();
        let registered: Vec<&str> = live
            .iter()
            .flat_map(|r| r.patterns().map(|c| c.pattern()))
            .collect();

        let trie = &self.trie;
        let entries = live
            .iter()
            .filter(|r| !r.is_default)
            .flat_map(|r| {
                r.patterns()
                    // Skip patterns a later registration took over
                    .filter(move |c| {
                        trie.find_node(c.pattern()).and_then(|n| n.record()) == Some(r.id)
                    })
                    .map(move |c| FastEntry {
                        record: r.id,
                        compiled: c.clone(),
                        standalone: !r.is_nested() && walks_like_trie(trie, c.pattern()),
                    })
            })
            .collect();

        self.fast_path.rebuild(entries, &registered);
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Match a path. A query or hash on `path` is allowed; only the path
    /// part decides the match.
    ///
    /// `None` means no registered pattern matches.
    pub fn match_by_path(&mut self, path: &str) -> Option<MatchResult> {
        let (path, query, _) = parse_location(path);
        let path = normalize_path(path);
        self.lookup(&path, &query, Lookup::Tracked)
    }

    /// Record registered under `name` (or `@<id>` for unnamed routes)
    pub fn match_by_name(&self, name: &str) -> Option<Arc<RouteRecord>> {
        self.names.get(name).and_then(|id| self.record(*id))
    }

    /// Cached, tracked lookup of a normalized path
    pub(crate) fn lookup_tracked(
        &mut self,
        path: &str,
        query: &[(String, String)],
    ) -> Option<MatchResult> {
        self.lookup(path, query, Lookup::Tracked)
    }

    fn lookup(&mut self, path: &str, query: &[(String, String)], mode: Lookup) -> Option<MatchResult> {
        let key = cache_key(path, query);

        if mode == Lookup::Warm {
            if let Some(cached) = self.cache.peek(&key) {
                return Some(cached.clone());
            }
            let result = self.compute(path)?;
            self.cache.set(key, result.clone());
            return Some(result);
        }

        let start = Instant::now();
        let result = match self.cache.get(&key).cloned() {
            Some(hit) => {
                trace!(path, "match cache hit");
                self.hit_count += 1;
                self.adaptive.record_lookup(true);
                Some(hit)
            }
            None => {
                trace!(path, "match cache miss");
                self.miss_count += 1;
                self.adaptive.record_lookup(false);
                let result = self.compute(path);
                if let Some(result) = &result {
                    self.cache.set(key, result.clone());
                }
                result
            }
        };

        let now = Instant::now();
        let elapsed = now.saturating_duration_since(start);
        self.lookups += 1;
        self.total_match_time += elapsed;
        self.hotspots.record(path, elapsed, now);

        result
    }

    /// Uncached match: fast path first, then the trie walk.
    fn compute(&self, path: &str) -> Option<MatchResult> {
        if self.config.fast_path {
            if let FastLookup::Hit { record, params } = self.fast_path.lookup(path) {
                if let Some(record) = self.record(record) {
                    // No other pattern is a prefix of an eligible one
                    let matched = vec![record.clone()];
                    return Some(self.result(record, matched, params, path));
                }
            }
        }

        let found = self.trie.find_with(path, &self.compiler)?;
        let record = self.record(found.record)?;
        // Names follow the terminal record's own pattern, not the trie's
        // first-seen parameter names
        let params = record
            .patterns()
            .find_map(|compiled| compiled.extract(path))
            .unwrap_or_else(|| decode(found.params));
        let matched = found.chain.iter().filter_map(|id| self.record(*id)).collect();
        Some(self.result(record, matched, params, path))
    }

    fn result(
        &self,
        record: Arc<RouteRecord>,
        matched: Vec<Arc<RouteRecord>>,
        params: Params,
        path: &str,
    ) -> MatchResult {
        MatchResult {
            record,
            matched,
            params,
            segments: split_path(path).map(str::to_string).collect(),
        }
    }

    /// `record` and its ancestors, outermost first
    pub(crate) fn lineage(&self, record: &Arc<RouteRecord>) -> Vec<Arc<RouteRecord>> {
        let mut chain = vec![record.clone()];
        let mut parent = record.parent;
        while let Some(id) = parent {
            let Some(ancestor) = self.record(id) else {
                break;
            };
            parent = ancestor.parent;
            chain.push(ancestor);
        }
        chain.reverse();
        chain
    }

    // ========================================================================
    // Registry queries
    // ========================================================================

    /// Record by arena handle
    pub fn record(&self, id: RecordId) -> Option<Arc<RouteRecord>> {
        self.records.get(id.index())?.clone()
    }

    /// Live records in registration order
    pub fn routes(&self) -> Vec<Arc<RouteRecord>> {
        self.records.iter().flatten().cloned().collect()
    }

    pub fn has_route(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    /// Number of live records
    pub fn route_count(&self) -> usize {
        self.names.len()
    }

    // ========================================================================
    // Cache, preheat and tuning
    // ========================================================================

    /// Warm the match cache.
    ///
    /// Without explicit paths the most hit paths are used. Warming counts
    /// toward neither the hit rate nor the hotspots. Only the first call
    /// does anything until [`reset_preheat`](Self::reset_preheat).
    ///
    /// Returns the number of paths that matched and were cached.
    pub fn preheat(&mut self, paths: Option<&[&str]>) -> usize {
        if self.preheated {
            debug!("preheat skipped; already preheated");
            return 0;
        }

        let targets: Vec<String> = match paths {
            Some(paths) => paths.iter().map(|p| p.to_string()).collect(),
            None => self
                .hotspots
                .top(self.config.hotspot.preheat_top)
                .into_iter()
                .map(|h| h.path)
                .collect(),
        };

        let mut warmed = 0;
        for raw in &targets {
            let (path, query, _) = parse_location(raw);
            let path = normalize_path(path);
            if self.lookup(&path, &query, Lookup::Warm).is_some() {
                warmed += 1;
            }
        }

        self.preheated = true;
        debug!(requested = targets.len(), warmed, "match cache preheated");
        warmed
    }

    pub fn reset_preheat(&mut self) {
        self.preheated = false;
    }

    pub fn is_preheated(&self) -> bool {
        self.preheated
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Current match-cache capacity
    pub fn cache_capacity(&self) -> usize {
        self.cache.capacity()
    }

    /// Periodic tuning step, called by the host.
    ///
    /// Returns the new cache capacity when the hit rate moved it.
    pub fn tick(&mut self, now: Instant) -> Option<usize> {
        let capacity = self.adaptive.tick(now)?;
        self.cache.resize(capacity);
        debug!(capacity, "match cache resized for hit rate");
        Some(capacity)
    }

    pub(crate) fn sorted_query(&self) -> bool {
        self.config.sorted_query
    }

    pub(crate) fn counters(&self) -> (u64, u64, u64, Duration) {
        (self.hit_count, self.miss_count, self.lookups, self.total_match_time)
    }

    pub(crate) fn parts(&self) -> (&LruCache<String, MatchResult>, &HotspotTracker, &AdaptiveCache) {
        (&self.cache, &self.hotspots, &self.adaptive)
    }
}

/// Absolute main path and alias paths of a definition, and whether it is
/// its parent's default child (empty path under a parent).
fn absolute_paths(parent: Option<&str>, path: &str, aliases: &[String]) -> (bool, String, Vec<String>) {
    let is_default = parent.is_some() && split_path(path).next().is_none();
    let full = match parent {
        Some(parent) if is_default => parent.to_string(),
        Some(parent) => join_child(parent, path),
        None => normalize_path(path),
    };
    let aliases = aliases
        .iter()
        .map(|alias| match parent {
            Some(parent) => join_child(parent, alias),
            None => normalize_path(alias),
        })
        .collect();
    (is_default, full, aliases)
}

/// Resolve a child pattern against its parent's absolute pattern.
///
/// An absolute child already spelled out under the parent is kept as is;
/// anything else is appended to the parent.
fn join_child(parent: &str, child: &str) -> String {
    if child.starts_with('/') {
        let mut parent_segments = split_path(parent);
        let mut child_segments = split_path(child);
        let under_parent = parent_segments.all(|p| child_segments.next() == Some(p));
        if under_parent {
            return normalize_path(child);
        }
    }
    normalize_path(&format!("{}/{}", parent, child))
}

/// True if the trie accepts exactly what the pattern's regex accepts: no
/// optional parameter before the last segment, and every constraint is the
/// one the trie checks at that position.
fn walks_like_trie(trie: &Trie<RecordId>, pattern: &str) -> bool {
    let Ok(segments) = parse_pattern(pattern) else {
        return false;
    };
    let last = segments.len().saturating_sub(1);
    let mut node = trie.root();
    for (i, segment) in segments.iter().enumerate() {
        let next = match *segment {
            Segment::Static(text) => node.static_child(text),
            Segment::Param {
                optional,
                constraint,
                ..
            } => match node.param() {
                Some(param)
                    if (!optional || (i == last && param.is_optional()))
                        && param.constraint() == constraint =>
                {
                    Some(param.node())
                }
                _ => None,
            },
            Segment::Wildcard => node.wildcard(),
        };
        match next {
            Some(next) => node = next,
            None => return false,
        }
    }
    true
}

fn decode(params: Vec<(String, String)>) -> Params {
    params
        .into_iter()
        .map(|(k, v)| {
            let v = percent_decode_str(&v).decode_utf8_lossy().into_owned();
            (k, v)
        })
        .collect()
}
