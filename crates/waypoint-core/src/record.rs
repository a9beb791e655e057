//! Route definitions and normalized records
//!
//! A [`RouteDefinition`] is what the caller registers. Registration turns
//! it into a [`RouteRecord`]: path resolved against the parent, pattern
//! compiled, children replaced by [`RecordId`] handles into the matcher's
//! arena.
//!
//! Components, guards and computed props are opaque to the matcher; they
//! are carried verbatim for whatever renders or guards the navigation.

use crate::compiler::CompiledPath;
use crate::Params;
use smallvec::SmallVec;
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// View name used by [`RouteDefinition::component`]
pub const DEFAULT_VIEW: &str = "default";

/// Handle of a record in the matcher's arena
///
/// Allocated from a counter that only ever increases, so a handle is never
/// reused for a different record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(pub(crate) u32);

impl RecordId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.0)
    }
}

/// Type-erased, shareable payload
#[derive(Clone)]
pub struct Opaque(Arc<dyn Any + Send + Sync>);

impl Opaque {
    pub fn new<T: Any + Send + Sync>(value: T) -> Self {
        Opaque(Arc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }

    /// True if both handles point to the same payload
    pub fn ptr_eq(&self, other: &Opaque) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Opaque {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Opaque(..)")
    }
}

impl PartialEq for Opaque {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

/// Deferred component constructor
pub type Loader = Arc<dyn Fn() -> Opaque + Send + Sync>;

/// Component attached to a view
#[derive(Clone)]
pub enum Component {
    /// Already available
    Resolved(Opaque),
    /// Produced on demand, e.g. by a code-split import
    Lazy(Loader),
}

impl Component {
    pub fn resolved<T: Any + Send + Sync>(value: T) -> Self {
        Component::Resolved(Opaque::new(value))
    }

    pub fn lazy<F>(loader: F) -> Self
    where
        F: Fn() -> Opaque + Send + Sync + 'static,
    {
        Component::Lazy(Arc::new(loader))
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self, Component::Lazy(_))
    }

    /// The component payload, running the loader if needed
    pub fn load(&self) -> Opaque {
        match self {
            Component::Resolved(value) => value.clone(),
            Component::Lazy(loader) => loader(),
        }
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Resolved(_) => f.write_str("Component::Resolved(..)"),
            Component::Lazy(_) => f.write_str("Component::Lazy(..)"),
        }
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Component::Resolved(a), Component::Resolved(b)) => a.ptr_eq(b),
            (Component::Lazy(a), Component::Lazy(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Computes props from the matched parameters
pub type PropsFn = Arc<dyn Fn(&Params) -> HashMap<String, String> + Send + Sync>;

/// How a route's parameters become component props
#[derive(Clone, Default)]
pub enum Props {
    #[default]
    Disabled,
    /// Pass the matched parameters through
    Params,
    Static(HashMap<String, String>),
    Computed(PropsFn),
}

impl Props {
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&Params) -> HashMap<String, String> + Send + Sync + 'static,
    {
        Props::Computed(Arc::new(f))
    }

    /// Props for a match, or `None` when props are disabled
    pub fn resolve(&self, params: &Params) -> Option<HashMap<String, String>> {
        match self {
            Props::Disabled => None,
            Props::Params => Some(params.clone()),
            Props::Static(map) => Some(map.clone()),
            Props::Computed(f) => Some(f(params)),
        }
    }
}

impl fmt::Debug for Props {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Props::Disabled => f.write_str("Props::Disabled"),
            Props::Params => f.write_str("Props::Params"),
            Props::Static(map) => f.debug_tuple("Props::Static").field(map).finish(),
            Props::Computed(_) => f.write_str("Props::Computed(..)"),
        }
    }
}

/// Redirect target
#[derive(Debug, Clone, PartialEq)]
pub enum Redirect {
    Path(String),
    Named { name: String, params: Params },
}

impl Redirect {
    pub fn path(path: impl Into<String>) -> Self {
        Redirect::Path(path.into())
    }

    pub fn named(name: impl Into<String>) -> Self {
        Redirect::Named {
            name: name.into(),
            params: Params::new(),
        }
    }
}

/// Route as supplied by the caller
///
/// # Example
/// ```
/// use waypoint_core::{Component, RouteDefinition};
///
/// let def = RouteDefinition::new("/user/:id")
///     .name("user")
///     .component(Component::resolved("UserView"))
///     .meta("title", "User")
///     .child(RouteDefinition::new("").name("user-home"))
///     .child(RouteDefinition::new("posts").name("user-posts"));
/// assert_eq!(def.children.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RouteDefinition {
    /// Pattern; relative paths and `""` are resolved against the parent
    pub path: String,
    pub name: Option<String>,
    /// Components keyed by view name
    pub components: HashMap<String, Component>,
    pub children: Vec<RouteDefinition>,
    pub meta: HashMap<String, String>,
    pub redirect: Option<Redirect>,
    pub props: Props,
    /// Entry guard reference
    pub before_enter: Option<Opaque>,
    /// Additional patterns matching the same record
    pub aliases: Vec<String>,
}

impl RouteDefinition {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Component for the default view
    pub fn component(self, component: Component) -> Self {
        self.view(DEFAULT_VIEW, component)
    }

    /// Component for a named view
    pub fn view(mut self, view: impl Into<String>, component: Component) -> Self {
        self.components.insert(view.into(), component);
        self
    }

    pub fn child(mut self, child: RouteDefinition) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = RouteDefinition>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    pub fn redirect(mut self, redirect: Redirect) -> Self {
        self.redirect = Some(redirect);
        self
    }

    pub fn props(mut self, props: Props) -> Self {
        self.props = props;
        self
    }

    pub fn before_enter(mut self, guard: Opaque) -> Self {
        self.before_enter = Some(guard);
        self
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }
}

/// Normalized, registered route
#[derive(Debug, Clone)]
pub struct RouteRecord {
    pub(crate) id: RecordId,
    pub(crate) path: String,
    pub(crate) name: Option<String>,
    pub(crate) components: HashMap<String, Component>,
    pub(crate) children: SmallVec<[RecordId; 4]>,
    pub(crate) parent: Option<RecordId>,
    pub(crate) default_child: Option<RecordId>,
    /// Registered with an empty path under its parent
    pub(crate) is_default: bool,
    pub(crate) meta: HashMap<String, String>,
    pub(crate) redirect: Option<Redirect>,
    pub(crate) props: Props,
    pub(crate) before_enter: Option<Opaque>,
    pub(crate) aliases: Vec<String>,
    pub(crate) compiled: Arc<CompiledPath>,
    pub(crate) alias_compiled: Vec<Arc<CompiledPath>>,
}

impl RouteRecord {
    pub fn id(&self) -> RecordId {
        self.id
    }

    /// Absolute pattern
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Name the record is registered under: its own, or `@<id>`
    pub fn key(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => self.id.to_string(),
        }
    }

    pub fn components(&self) -> &HashMap<String, Component> {
        &self.components
    }

    /// Component of the default view
    pub fn component(&self) -> Option<&Component> {
        self.components.get(DEFAULT_VIEW)
    }

    pub fn children(&self) -> &[RecordId] {
        &self.children
    }

    pub fn parent(&self) -> Option<RecordId> {
        self.parent
    }

    pub fn default_child(&self) -> Option<RecordId> {
        self.default_child
    }

    pub fn is_default(&self) -> bool {
        self.is_default
    }

    pub fn meta(&self) -> &HashMap<String, String> {
        &self.meta
    }

    pub fn redirect(&self) -> Option<&Redirect> {
        self.redirect.as_ref()
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn before_enter(&self) -> Option<&Opaque> {
        self.before_enter.as_ref()
    }

    /// Absolute alias patterns
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn compiled(&self) -> &Arc<CompiledPath> {
        &self.compiled
    }

    /// Compiled main pattern followed by the compiled aliases
    pub(crate) fn patterns(&self) -> impl Iterator<Item = &Arc<CompiledPath>> {
        std::iter::once(&self.compiled).chain(self.alias_compiled.iter())
    }

    /// Part of a nested route tree, so never served by the fast path
    pub(crate) fn is_nested(&self) -> bool {
        self.parent.is_some() || !self.children.is_empty() || self.default_child.is_some()
    }
}

impl PartialEq for RouteRecord {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
