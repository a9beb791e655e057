//! Error types for waypoint-core

use thiserror::Error;

/// Result type alias for waypoint operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for route registration and resolution
///
/// A path that simply matches nothing is not an error:
/// [`RouteMatcher::match_by_path`](crate::RouteMatcher::match_by_path)
/// returns `None` for it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// No pattern matches the path, or the name is not registered
    #[error("Route not found: {location}")]
    RouteNotFound { location: String },

    /// A required template parameter has no value
    #[error("Missing required parameter `{param}` for route `{route}`")]
    MissingParameter { route: String, param: String },

    /// Location descriptor with neither `name` nor `path`
    #[error("Invalid location: a name or a path is required")]
    InvalidLocation,

    /// Pattern rejected at compile time
    #[error("Invalid path pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// Child route added under a name that is not registered
    #[error("Parent route not found: {0}")]
    ParentNotFound(String),
}

impl Error {
    pub(crate) fn invalid_pattern(pattern: &str, reason: impl std::fmt::Display) -> Self {
        Error::InvalidPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn not_found(location: impl Into<String>) -> Self {
        Error::RouteNotFound {
            location: location.into(),
        }
    }
}
