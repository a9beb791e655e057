//! Location resolution
//!
//! Turns a raw string or a [`LocationDescriptor`] into a
//! [`ResolvedLocation`]: by path through the match pipeline, by name
//! through the registry and the record's path template.

use crate::location::{
    full_path, merge_query, normalize_hash, normalize_path, parse_location, LocationDescriptor,
    Query, ResolvedLocation, RouteLocationRaw,
};
use crate::matcher::RouteMatcher;
use crate::{Error, Params, Result};

impl RouteMatcher {
    /// Resolve a location.
    ///
    /// A descriptor with a name resolves by name even if it also has a
    /// path. Errors are [`Error::RouteNotFound`], [`Error::MissingParameter`]
    /// and [`Error::InvalidLocation`].
    ///
    /// # Example
    /// ```
    /// use waypoint_core::{LocationDescriptor, RouteDefinition, RouteMatcher};
    ///
    /// let mut matcher = RouteMatcher::new();
    /// matcher.add_route(RouteDefinition::new("/user/:id").name("user")).unwrap();
    ///
    /// let by_path = matcher.resolve("/user/42?tab=posts#top").unwrap();
    /// assert_eq!(by_path.params["id"], "42");
    /// assert_eq!(by_path.full_path, "/user/42?tab=posts#top");
    ///
    /// let by_name = matcher
    ///     .resolve(LocationDescriptor::named("user").param("id", "7"))
    ///     .unwrap();
    /// assert_eq!(by_name.path, "/user/7");
    /// ```
    pub fn resolve(&mut self, location: impl Into<RouteLocationRaw>) -> Result<ResolvedLocation> {
        match location.into() {
            RouteLocationRaw::Path(raw) => self.resolve_path(&raw, &[], None),
            RouteLocationRaw::Descriptor(descriptor) => self.resolve_descriptor(descriptor),
        }
    }

    fn resolve_descriptor(&mut self, descriptor: LocationDescriptor) -> Result<ResolvedLocation> {
        let LocationDescriptor {
            name,
            path,
            params,
            query,
            hash,
        } = descriptor;

        match (name, path) {
            (Some(name), _) => self.resolve_name(&name, params, query, hash.as_deref()),
            (None, Some(path)) => self.resolve_path(&path, &query, hash.as_deref()),
            (None, None) => Err(Error::InvalidLocation),
        }
    }

    /// Caller-supplied query keys and hash override those in `raw`.
    fn resolve_path(
        &mut self,
        raw: &str,
        query: &[(String, String)],
        hash: Option<&str>,
    ) -> Result<ResolvedLocation> {
        let (path, parsed_query, parsed_hash) = parse_location(raw);
        let path = normalize_path(path);
        let query = merge_query(parsed_query, query);
        let hash = match hash {
            Some(hash) => normalize_hash(hash),
            None => parsed_hash,
        };

        let matched = self
            .lookup_tracked(&path, &query)
            .ok_or_else(|| Error::not_found(raw))?;

        Ok(ResolvedLocation {
            full_path: full_path(&path, &query, &hash, self.sorted_query()),
            name: matched.record.name.clone(),
            path,
            params: matched.params,
            query,
            hash,
            matched: matched.matched,
        })
    }

    fn resolve_name(
        &mut self,
        name: &str,
        params: Params,
        query: Query,
        hash: Option<&str>,
    ) -> Result<ResolvedLocation> {
        let record = self.match_by_name(name).ok_or_else(|| Error::not_found(name))?;
        let path = record.compiled.build(&params)?;

        let names = record.compiled.param_names();
        let params: Params = params
            .into_iter()
            .filter(|(k, v)| !v.is_empty() && names.contains(k))
            .collect();
        let hash = hash.map(normalize_hash).unwrap_or_default();

        Ok(ResolvedLocation {
            full_path: full_path(&path, &query, &hash, self.sorted_query()),
            name: record.name.clone(),
            matched: self.lineage(&record),
            path,
            params,
            query,
            hash,
        })
    }
}
