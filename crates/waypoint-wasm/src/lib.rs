//! waypoint-wasm: Client-side route matcher for WASM
//!
//! Nested route matching, named-route resolution and adaptive match
//! caching compiled to WebAssembly. Route payloads cross the boundary as
//! numeric handler ids owned by the JavaScript side.

pub mod convert;
pub mod matcher;

#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::*;

pub use convert::{flatten_params, handler_chain, handler_id, unflatten_params, with_handler};
pub use matcher::{MatchResult, RouteDefinition, RouteMatcher};
