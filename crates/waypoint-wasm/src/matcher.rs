//! Matcher - Re-exports from waypoint-core (SSOT)
//!
//! The matching engine lives in `waypoint-core` so native and WASM builds
//! resolve routes identically.

pub use waypoint_core::{
    Component, Error, LocationDescriptor, MatchResult, RouteDefinition, RouteMatcher,
    RouteRecord,
};
