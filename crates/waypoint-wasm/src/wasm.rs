//! WASM bindings for JavaScript interop
//! Params cross the boundary as flat `[key, value, ...]` string arrays

use crate::convert::{flatten_params, handler_chain, handler_id, unflatten_params, with_handler};
use crate::matcher::{LocationDescriptor, RouteDefinition, RouteMatcher};
use waypoint_core::{Instant, MatchResult, ResolvedLocation};
use wasm_bindgen::prelude::*;

// ============================================================================
// Matcher
// ============================================================================

/// WASM-exposed route matcher
#[wasm_bindgen]
pub struct WasmMatcher {
    inner: RouteMatcher,
}

#[wasm_bindgen]
impl WasmMatcher {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: RouteMatcher::new(),
        }
    }

    /// Register a top-level route, returns its record id
    pub fn add_route(&mut self, path: &str, name: Option<String>, handler_id: u32) -> Result<u32, JsError> {
        let record = self
            .inner
            .add_route(definition(path, name, handler_id))
            .map_err(|e| JsError::new(&e.to_string()))?;
        Ok(record.id().index() as u32)
    }

    /// Register a route under a named parent; an empty path makes it the
    /// parent's default child
    pub fn add_child_route(
        &mut self,
        parent: &str,
        path: &str,
        name: Option<String>,
        handler_id: u32,
    ) -> Result<u32, JsError> {
        let record = self
            .inner
            .add_child_route(parent, definition(path, name, handler_id))
            .map_err(|e| JsError::new(&e.to_string()))?;
        Ok(record.id().index() as u32)
    }

    /// Remove a route and its children
    pub fn remove_route(&mut self, name: &str) -> bool {
        self.inner.remove_route(name)
    }

    pub fn has_route(&self, name: &str) -> bool {
        self.inner.has_route(name)
    }

    /// Match a path, returns WasmMatch
    pub fn match_path(&mut self, path: &str) -> WasmMatch {
        match self.inner.match_by_path(path) {
            Some(m) => WasmMatch::from(m),
            None => WasmMatch::not_found(),
        }
    }

    /// Resolve `/path?query#hash`
    pub fn resolve(&mut self, location: &str) -> Result<WasmLocation, JsError> {
        self.inner
            .resolve(location)
            .map(WasmLocation::from)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Resolve a named route with flat `[key, value, ...]` params
    pub fn resolve_named(&mut self, name: &str, params: Vec<String>) -> Result<WasmLocation, JsError> {
        let descriptor = LocationDescriptor::named(name).params(unflatten_params(&params));
        self.inner
            .resolve(descriptor)
            .map(WasmLocation::from)
            .map_err(|e| JsError::new(&e.to_string()))
    }

    /// Warm the match cache; an empty list uses the hottest paths
    pub fn preheat(&mut self, paths: Vec<String>) -> u32 {
        let paths: Vec<&str> = paths.iter().map(String::as_str).collect();
        let warmed = if paths.is_empty() {
            self.inner.preheat(None)
        } else {
            self.inner.preheat(Some(paths.as_slice()))
        };
        warmed as u32
    }

    pub fn reset_preheat(&mut self) {
        self.inner.reset_preheat();
    }

    pub fn clear_cache(&mut self) {
        self.inner.clear_cache();
    }

    /// Periodic tuning step; call from a host timer. Returns the new cache
    /// capacity, or 0 when unchanged
    pub fn tick(&mut self) -> u32 {
        self.inner
            .tick(Instant::now())
            .map_or(0, |capacity| capacity as u32)
    }

    pub fn stats(&self) -> WasmStats {
        let stats = self.inner.stats();
        WasmStats {
            hit_count: stats.hit_count as f64,
            miss_count: stats.miss_count as f64,
            hit_rate: stats.hit_rate(),
            average_match_micros: stats.average_match_time.as_secs_f64() * 1_000_000.0,
            cache_len: stats.cache.len as u32,
            cache_capacity: stats.cache.capacity as u32,
            routes: stats.routes as u32,
        }
    }
}

impl Default for WasmMatcher {
    fn default() -> Self {
        Self::new()
    }
}

fn definition(path: &str, name: Option<String>, handler: u32) -> RouteDefinition {
    let definition = with_handler(RouteDefinition::new(path), handler);
    match name {
        Some(name) => definition.name(name),
        None => definition,
    }
}

// ============================================================================
// Results
// ============================================================================

/// Path match result for WASM
#[wasm_bindgen]
pub struct WasmMatch {
    pub found: bool,
    pub handler_id: u32,
    name: Option<String>,
    params: Vec<String>,
    chain: Vec<u32>,
}

impl WasmMatch {
    fn not_found() -> Self {
        Self {
            found: false,
            handler_id: 0,
            name: None,
            params: Vec::new(),
            chain: Vec::new(),
        }
    }
}

impl From<MatchResult> for WasmMatch {
    fn from(m: MatchResult) -> Self {
        Self {
            found: true,
            handler_id: handler_id(&m.record),
            name: m.record.name().map(str::to_string),
            params: flatten_params(&m.params),
            chain: handler_chain(&m.matched),
        }
    }
}

#[wasm_bindgen]
impl WasmMatch {
    #[wasm_bindgen(getter)]
    pub fn name(&self) -> Option<String> {
        self.name.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn params(&self) -> Vec<String> {
        self.params.clone()
    }

    /// Handler ids of the matched chain, outermost first
    #[wasm_bindgen(getter)]
    pub fn chain(&self) -> Vec<u32> {
        self.chain.clone()
    }

    /// Params as a JS `Map`
    #[wasm_bindgen(getter)]
    pub fn params_map(&self) -> js_sys::Map {
        to_map(&self.params)
    }
}

/// Resolved location for WASM
#[wasm_bindgen]
pub struct WasmLocation {
    path: String,
    full_path: String,
    hash: String,
    name: Option<String>,
    params: Vec<String>,
    chain: Vec<u32>,
}

impl From<ResolvedLocation> for WasmLocation {
    fn from(loc: ResolvedLocation) -> Self {
        Self {
            chain: handler_chain(&loc.matched),
            params: flatten_params(&loc.params),
            path: loc.path,
            full_path: loc.full_path,
            hash: loc.hash,
            name: loc.name,
        }
    }
}

#[wasm_bindgen]
impl WasmLocation {
    #[wasm_bindgen(getter)]
    pub fn path(&self) -> String {
        self.path.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn full_path(&self) -> String {
        self.full_path.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn hash(&self) -> String {
        self.hash.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn name(&self) -> Option<String> {
        self.name.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn params(&self) -> Vec<String> {
        self.params.clone()
    }

    #[wasm_bindgen(getter)]
    pub fn chain(&self) -> Vec<u32> {
        self.chain.clone()
    }
}

/// Matcher statistics for WASM
/// Counters are f64 so they survive the trip to JS numbers
#[wasm_bindgen]
pub struct WasmStats {
    pub hit_count: f64,
    pub miss_count: f64,
    pub hit_rate: f64,
    pub average_match_micros: f64,
    pub cache_len: u32,
    pub cache_capacity: u32,
    pub routes: u32,
}

fn to_map(flat: &[String]) -> js_sys::Map {
    let map = js_sys::Map::new();
    for pair in flat.chunks_exact(2) {
        map.set(&JsValue::from_str(&pair[0]), &JsValue::from_str(&pair[1]));
    }
    map
}
