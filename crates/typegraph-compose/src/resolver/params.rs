//! Resolve-time parameters and function types.

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_graphql::{SelectionField, Value};
use futures_util::future::BoxFuture;
use futures_util::stream::BoxStream;
use indexmap::IndexMap;

/// Per-request context shared with every resolve function.
pub type ContextValue = Arc<dyn Any + Send + Sync>;

/// Request data entry carrying the [`ContextValue`].
///
/// Add it to a request with `Request::data(RequestContext(..))`.
#[derive(Clone)]
pub struct RequestContext(pub ContextValue);

/// Result of a resolve function.
pub type ResolveResult = async_graphql::Result<Option<Value>>;

/// A field resolution function.
pub type ResolveFn = Arc<dyn Fn(ResolveParams) -> BoxFuture<'static, ResolveResult> + Send + Sync>;

/// Stream of subscription payloads.
pub type PayloadStream = BoxStream<'static, async_graphql::Result<Value>>;

/// A subscription source; each payload becomes the `source` of the field's resolve.
pub type SubscribeFn =
    Arc<dyn Fn(ResolveParams) -> BoxFuture<'static, async_graphql::Result<PayloadStream>> + Send + Sync>;

/// Mutable accumulator threaded through filter `query` callbacks.
pub type RawQuery = IndexMap<String, Value>;

/// Wraps an async closure into a [`ResolveFn`].
pub fn resolve_fn<F, Fut>(f: F) -> ResolveFn
where
    F: Fn(ResolveParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ResolveResult> + Send + 'static,
{
    Arc::new(move |rp| Box::pin(f(rp)))
}

/// Wraps an async closure into a [`SubscribeFn`].
pub fn subscribe_fn<F, Fut>(f: F) -> SubscribeFn
where
    F: Fn(ResolveParams) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = async_graphql::Result<PayloadStream>> + Send + 'static,
{
    Arc::new(move |rp| Box::pin(f(rp)))
}

/// Requested-field tree: each key maps to the projection of its sub-selection.
/// A leaf is an empty projection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    fields: IndexMap<String, Projection>,
}

impl Projection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a flat projection from field names.
    pub fn from_fields<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: names.into_iter().map(|n| (n.into(), Projection::new())).collect(),
        }
    }

    /// Builds a projection from the live selection set of a field.
    pub fn from_selection(field: &SelectionField<'_>) -> Self {
        let mut projection = Self::new();
        for child in field.selection_set() {
            projection
                .fields
                .insert(child.name().to_string(), Self::from_selection(&child));
        }
        projection
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.fields.insert(name.into(), Projection::new());
        self
    }

    #[must_use]
    pub fn nested(mut self, name: impl Into<String>, sub: Projection) -> Self {
        self.fields.insert(name.into(), sub);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Projection> {
        self.fields.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Merges `other` into `self`; keys of `other` win.
    pub fn merge(&mut self, other: &Projection) {
        for (name, sub) in &other.fields {
            self.fields.insert(name.clone(), sub.clone());
        }
    }

    #[must_use]
    pub fn merged(&self, other: &Projection) -> Self {
        let mut merged = self.clone();
        merged.merge(other);
        merged
    }
}

/// Static information about the field being resolved.
#[derive(Debug, Clone, Default)]
pub struct ResolveInfo {
    pub field_name: String,
    pub parent_type: String,
    pub return_type: String,
}

/// Everything a resolve function receives.
#[derive(Clone)]
pub struct ResolveParams {
    /// The parent value (`Null` on root fields).
    pub source: Value,
    /// Field arguments, enum values already mapped to their internal values.
    pub args: IndexMap<String, Value>,
    pub context: Option<ContextValue>,
    pub info: ResolveInfo,
    pub projection: Projection,
    pub raw_query: Option<RawQuery>,
}

impl ResolveParams {
    #[must_use]
    pub fn new(source: Value) -> Self {
        Self {
            source,
            args: IndexMap::new(),
            context: None,
            info: ResolveInfo::default(),
            projection: Projection::new(),
            raw_query: None,
        }
    }

    #[must_use]
    pub fn with_arg(mut self, name: impl Into<String>, value: Value) -> Self {
        self.args.insert(name.into(), value);
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: ContextValue) -> Self {
        self.context = Some(context);
        self
    }

    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    /// Downcasts the request context.
    pub fn context_as<T: 'static>(&self) -> Option<&T> {
        self.context.as_deref().and_then(|c| c.downcast_ref::<T>())
    }
}

impl fmt::Debug for ResolveParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolveParams")
            .field("source", &self.source)
            .field("args", &self.args)
            .field("has_context", &self.context.is_some())
            .field("info", &self.info)
            .field("projection", &self.projection)
            .field("raw_query", &self.raw_query)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_merge_later_wins() {
        let request = Projection::from_fields(["id", "name"]);
        let resolver = Projection::new().nested("author", Projection::from_fields(["id"]));
        let call_site = Projection::new().nested("author", Projection::from_fields(["email"]));

        let merged = request.merged(&resolver).merged(&call_site);
        let names: Vec<_> = merged.names().cloned().collect();
        assert_eq!(names, vec!["id", "name", "author"]);
        assert!(merged.get("author").unwrap().contains("email"));
        assert!(!merged.get("author").unwrap().contains("id"));
    }

    #[test]
    fn test_context_downcast() {
        let rp = ResolveParams::new(Value::Null).with_context(Arc::new(42_u32));
        assert_eq!(rp.context_as::<u32>(), Some(&42));
        assert_eq!(rp.context_as::<String>(), None);
    }
}
