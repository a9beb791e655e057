//! Conversions between matcher types and flat JS-friendly values

use std::sync::Arc;
use waypoint_core::{Component, Params, RouteDefinition, RouteRecord};

/// Attach a handler id as the default-view component
pub fn with_handler(definition: RouteDefinition, handler: u32) -> RouteDefinition {
    definition.component(Component::resolved(handler))
}

/// Handler id carried by a record, 0 if it has none
pub fn handler_id(record: &RouteRecord) -> u32 {
    record
        .component()
        .and_then(|c| c.load().downcast_ref::<u32>().copied())
        .unwrap_or(0)
}

/// Handler ids along a matched chain, outermost first
pub fn handler_chain(matched: &[Arc<RouteRecord>]) -> Vec<u32> {
    matched.iter().map(|r| handler_id(r)).collect()
}

/// `[k1, v1, k2, v2, ...]`, ordered by key
pub fn flatten_params(params: &Params) -> Vec<String> {
    let mut pairs: Vec<(&String, &String)> = params.iter().collect();
    pairs.sort();
    pairs
        .into_iter()
        .flat_map(|(k, v)| [k.clone(), v.clone()])
        .collect()
}

/// Inverse of [`flatten_params`]; a trailing key without a value is dropped.
pub fn unflatten_params(flat: &[String]) -> Params {
    flat.chunks_exact(2)
        .map(|pair| (pair[0].clone(), pair[1].clone()))
        .collect()
}
