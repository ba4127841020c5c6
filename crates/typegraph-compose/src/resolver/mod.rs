//! Resolvers: named, typed, argument-bearing resolution units.
//!
//! A [`Resolver`] is a handle; setters change the shared resolver in place.
//! Composition methods (`wrap*`, [`Resolver::clone_with`],
//! [`Resolver::add_filter_arg`], [`Resolver::add_sort_arg`],
//! [`Resolver::with_middlewares`]) return a new resolver whose `parent` is
//! the one it was derived from, leaving the original untouched.

mod filter;
mod middleware;
mod params;
mod sort;

pub use filter::{FilterArgOptions, FilterQueryFn};
pub use middleware::{Middleware, middleware};
pub use params::{
    ContextValue, PayloadStream, Projection, RawQuery, RequestContext, ResolveFn, ResolveInfo,
    ResolveParams, ResolveResult, SubscribeFn, resolve_fn, subscribe_fn,
};
pub use sort::{SortArgOptions, SortValue, SortValueFn};

use std::cell::RefCell;
use std::fmt::{self, Write as _};
use std::rc::Rc;
use std::sync::Arc;

use async_graphql::Value;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::Result;
use crate::composers::{self, ArgumentConfig, FieldConfig, NamedTypeComposer};
use crate::error::ComposeError;
use crate::extensions::{self, Extensions};
use crate::mapper::{ArgumentDefinition, TypeDef};
use crate::schema::{SchemaComposer, WeakSchema};
use crate::type_ref::TypeReference;

/// Root operation a resolver is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolverKind {
    Query,
    Mutation,
    Subscription,
}

impl fmt::Display for ResolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
        };
        f.write_str(label)
    }
}

/// Everything needed to construct a [`Resolver`].
#[derive(Clone, Default)]
pub struct ResolverDefinition {
    pub name: String,
    pub type_: Option<TypeDef>,
    pub args: IndexMap<String, ArgumentDefinition>,
    pub resolve: Option<ResolveFn>,
    pub subscribe: Option<SubscribeFn>,
    pub kind: Option<ResolverKind>,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
    pub projection: Option<Projection>,
    pub extensions: Extensions,
}

impl ResolverDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn type_(mut self, type_: impl Into<TypeDef>) -> Self {
        self.type_ = Some(type_.into());
        self
    }

    #[must_use]
    pub fn arg(mut self, name: impl Into<String>, arg: impl Into<ArgumentDefinition>) -> Self {
        self.args.insert(name.into(), arg.into());
        self
    }

    #[must_use]
    pub fn resolve(mut self, resolve: ResolveFn) -> Self {
        self.resolve = Some(resolve);
        self
    }

    #[must_use]
    pub fn subscribe(mut self, subscribe: SubscribeFn) -> Self {
        self.subscribe = Some(subscribe);
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: ResolverKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn deprecated(mut self, reason: impl Into<String>) -> Self {
        self.deprecation_reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn projection(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    #[must_use]
    pub fn extension(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }
}

/// Values replaced on a clone before it is returned.
#[derive(Clone, Default)]
pub struct ResolverOverrides {
    pub name: Option<String>,
    pub type_: Option<TypeDef>,
    pub args: Option<IndexMap<String, ArgumentDefinition>>,
    pub resolve: Option<ResolveFn>,
    pub kind: Option<ResolverKind>,
    pub description: Option<String>,
    pub projection: Option<Projection>,
}

impl ResolverOverrides {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn type_(mut self, type_: impl Into<TypeDef>) -> Self {
        self.type_ = Some(type_.into());
        self
    }

    #[must_use]
    pub fn resolve(mut self, resolve: ResolveFn) -> Self {
        self.resolve = Some(resolve);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Options for [`Resolver::get_field_config`].
#[derive(Debug, Clone, Default)]
pub struct FieldConfigOptions {
    /// Call-site projection, merged over the resolver's own projection.
    pub projection: Option<Projection>,
}

#[derive(Clone)]
struct ResolverInner {
    sc: WeakSchema,
    name: String,
    display_name: Option<String>,
    type_: Option<TypeReference>,
    args: IndexMap<String, ArgumentConfig>,
    resolve: ResolveFn,
    subscribe: Option<SubscribeFn>,
    kind: Option<ResolverKind>,
    description: Option<String>,
    deprecation_reason: Option<String>,
    projection: Projection,
    extensions: Extensions,
    parent: Option<Resolver>,
}

/// A named resolution unit with its own output type and arguments.
#[derive(Clone)]
pub struct Resolver {
    inner: Rc<RefCell<ResolverInner>>,
}

fn noop_resolve() -> ResolveFn {
    resolve_fn(|_| async { Ok(None) })
}

impl Resolver {
    /// Creates a resolver owned by `sc`.
    ///
    /// # Errors
    ///
    /// Returns the mapper's error for an invalid type or argument definition.
    pub fn new(def: ResolverDefinition, sc: &SchemaComposer) -> Result<Self> {
        let resolver = Self {
            inner: Rc::new(RefCell::new(ResolverInner {
                sc: sc.downgrade(),
                name: def.name,
                display_name: None,
                type_: None,
                args: IndexMap::new(),
                resolve: def.resolve.unwrap_or_else(noop_resolve),
                subscribe: def.subscribe,
                kind: def.kind,
                description: def.description,
                deprecation_reason: def.deprecation_reason,
                projection: def.projection.unwrap_or_default(),
                extensions: def.extensions,
                parent: None,
            })),
        };
        if let Some(type_) = def.type_ {
            resolver.set_type(type_)?;
        }
        resolver.set_args(def.args)?;
        Ok(resolver)
    }

    pub fn schema_composer(&self) -> Result<SchemaComposer> {
        self.inner.borrow().sc.upgrade()
    }

    pub fn ptr_eq(&self, other: &Resolver) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn get_name(&self) -> String {
        self.inner.borrow().name.clone()
    }

    pub fn set_name(&self, name: impl Into<String>) -> &Self {
        self.inner.borrow_mut().name = name.into();
        self
    }

    pub fn get_display_name(&self) -> Option<String> {
        self.inner.borrow().display_name.clone()
    }

    pub fn set_display_name(&self, name: impl Into<String>) -> &Self {
        self.inner.borrow_mut().display_name = Some(name.into());
        self
    }

    /// The resolver this one was wrapped from.
    pub fn get_parent(&self) -> Option<Resolver> {
        self.inner.borrow().parent.clone()
    }

    /// Name of this resolver followed by the nested names of its wrap chain,
    /// e.g. `wrap(wrap(User.findMany))`.
    pub fn get_nested_name(&self) -> String {
        let (name, parent) = {
            let inner = self.inner.borrow();
            (
                inner.display_name.clone().unwrap_or_else(|| inner.name.clone()),
                inner.parent.clone(),
            )
        };
        match parent {
            Some(parent) => format!("{name}({})", parent.get_nested_name()),
            None => name,
        }
    }

    /// # Errors
    ///
    /// Returns `MalformedDefinition` if no type was set.
    pub fn get_type(&self) -> Result<TypeReference> {
        let inner = self.inner.borrow();
        inner
            .type_
            .clone()
            .ok_or_else(|| ComposeError::malformed(format!("resolver `{}` has no type", inner.name)))
    }

    pub fn get_type_name(&self) -> Result<String> {
        self.get_type()?.get_type_name()
    }

    pub fn get_type_composer(&self) -> Result<NamedTypeComposer> {
        self.get_type()?.named_composer()
    }

    /// Sets the output type.
    ///
    /// # Errors
    ///
    /// Returns `WrongKind` for an input-only type.
    pub fn set_type(&self, def: impl Into<TypeDef>) -> Result<&Self> {
        let type_ = self
            .schema_composer()?
            .type_mapper()
            .convert_output_type_definition(def)
            .map_err(|e| e.at_path(self.get_name()))?;
        self.inner.borrow_mut().type_ = Some(type_);
        Ok(self)
    }

    pub fn get_resolve(&self) -> ResolveFn {
        self.inner.borrow().resolve.clone()
    }

    pub fn set_resolve(&self, resolve: ResolveFn) -> &Self {
        self.inner.borrow_mut().resolve = resolve;
        self
    }

    pub fn get_subscribe(&self) -> Option<SubscribeFn> {
        self.inner.borrow().subscribe.clone()
    }

    pub fn set_subscribe(&self, subscribe: SubscribeFn) -> &Self {
        self.inner.borrow_mut().subscribe = Some(subscribe);
        self
    }

    pub fn get_kind(&self) -> Option<ResolverKind> {
        self.inner.borrow().kind
    }

    pub fn set_kind(&self, kind: ResolverKind) -> &Self {
        self.inner.borrow_mut().kind = Some(kind);
        self
    }

    pub fn get_description(&self) -> Option<String> {
        self.inner.borrow().description.clone()
    }

    pub fn set_description(&self, description: impl Into<String>) -> &Self {
        self.inner.borrow_mut().description = Some(description.into());
        self
    }

    pub fn get_deprecation_reason(&self) -> Option<String> {
        self.inner.borrow().deprecation_reason.clone()
    }

    pub fn set_deprecation_reason(&self, reason: Option<String>) -> &Self {
        self.inner.borrow_mut().deprecation_reason = reason;
        self
    }

    pub fn get_projection(&self) -> Projection {
        self.inner.borrow().projection.clone()
    }

    pub fn set_projection(&self, projection: Projection) -> &Self {
        self.inner.borrow_mut().projection = projection;
        self
    }

    pub fn get_extensions(&self) -> Extensions {
        self.inner.borrow().extensions.clone()
    }

    pub fn set_extensions(&self, extensions: Extensions) -> &Self {
        self.inner.borrow_mut().extensions = extensions;
        self
    }

    pub fn extend_extensions(&self, extensions: Extensions) -> &Self {
        extensions::merge_extensions(&mut self.inner.borrow_mut().extensions, extensions);
        self
    }

    pub fn clear_extensions(&self) -> &Self {
        self.inner.borrow_mut().extensions.clear();
        self
    }

    pub fn get_extension(&self, key: &str) -> Option<serde_json::Value> {
        self.inner.borrow().extensions.get(key).cloned()
    }

    pub fn has_extension(&self, key: &str) -> bool {
        self.inner.borrow().extensions.contains_key(key)
    }

    pub fn set_extension(&self, key: impl Into<String>, value: serde_json::Value) -> &Self {
        self.inner.borrow_mut().extensions.insert(key.into(), value);
        self
    }

    pub fn remove_extension(&self, key: &str) -> &Self {
        self.inner.borrow_mut().extensions.shift_remove(key);
        self
    }

    // Arguments

    pub fn get_args(&self) -> IndexMap<String, ArgumentConfig> {
        self.inner.borrow().args.clone()
    }

    pub fn get_arg_names(&self) -> Vec<String> {
        self.inner.borrow().args.keys().cloned().collect()
    }

    pub fn has_arg(&self, name: &str) -> bool {
        self.inner.borrow().args.contains_key(name)
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the argument does not exist.
    pub fn get_arg(&self, name: &str) -> Result<ArgumentConfig> {
        let inner = self.inner.borrow();
        inner
            .args
            .get(name)
            .cloned()
            .ok_or_else(|| ComposeError::arg_not_found(inner.name.clone(), name))
    }

    pub fn get_arg_type(&self, name: &str) -> Result<TypeReference> {
        Ok(self.get_arg(name)?.type_)
    }

    pub fn get_arg_type_name(&self, name: &str) -> Result<String> {
        self.get_arg(name)?.type_.get_type_name()
    }

    pub fn get_arg_tc(&self, name: &str) -> Result<NamedTypeComposer> {
        self.get_arg(name)?.type_.named_composer()
    }

    pub fn get_arg_default_value(&self, name: &str) -> Option<Value> {
        self.inner
            .borrow()
            .args
            .get(name)
            .and_then(|arg| arg.default_value.clone())
    }

    pub fn set_arg_default_value(&self, name: &str, value: Option<Value>) -> Result<&Self> {
        self.update_arg(name, |arg| {
            arg.default_value = value;
            Ok(())
        })?;
        Ok(self)
    }

    fn convert_arg(&self, name: &str, def: ArgumentDefinition) -> Result<ArgumentConfig> {
        self.schema_composer()?
            .type_mapper()
            .convert_arg_config(def)
            .map_err(|e| e.at_path(format!("{}({name})", self.get_name())))
    }

    fn convert_args<I, K, V>(&self, args: I) -> Result<IndexMap<String, ArgumentConfig>>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ArgumentDefinition>,
    {
        args.into_iter()
            .map(|(name, def)| {
                let name = name.into();
                let config = self.convert_arg(&name, def.into())?;
                Ok((name, config))
            })
            .collect()
    }

    /// Replaces every argument.
    pub fn set_args<I, K, V>(&self, args: I) -> Result<&Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ArgumentDefinition>,
    {
        let args = self.convert_args(args)?;
        self.inner.borrow_mut().args = args;
        Ok(self)
    }

    /// Adds or replaces arguments, keeping the position of existing ones.
    pub fn add_args<I, K, V>(&self, args: I) -> Result<&Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ArgumentDefinition>,
    {
        let args = self.convert_args(args)?;
        self.inner.borrow_mut().args.extend(args);
        Ok(self)
    }

    pub fn set_arg(&self, name: &str, def: impl Into<ArgumentDefinition>) -> Result<&Self> {
        let def: ArgumentDefinition = def.into();
        self.add_args([(name, def)])
    }

    pub fn remove_arg(&self, name: &str) -> &Self {
        self.inner.borrow_mut().args.shift_remove(name);
        self
    }

    pub fn remove_args(&self, names: &[&str]) -> &Self {
        let mut inner = self.inner.borrow_mut();
        for name in names {
            inner.args.shift_remove(*name);
        }
        drop(inner);
        self
    }

    pub fn remove_other_args(&self, keep: &[&str]) -> &Self {
        self.inner
            .borrow_mut()
            .args
            .retain(|name, _| keep.contains(&name.as_str()));
        self
    }

    /// Moves the listed arguments to the front. Unknown names are skipped.
    pub fn reorder_args(&self, order: &[&str]) -> &Self {
        let reordered = composers::fields::reorder(&self.inner.borrow().args, order);
        self.inner.borrow_mut().args = reordered;
        self
    }

    fn update_arg<F>(&self, name: &str, f: F) -> Result<()>
    where
        F: FnOnce(&mut ArgumentConfig) -> Result<()>,
    {
        let mut arg = self.get_arg(name)?;
        f(&mut arg)?;
        self.inner.borrow_mut().args.insert(name.to_string(), arg);
        Ok(())
    }

    /// Wraps the listed arguments in non-null. Unknown names are skipped.
    pub fn make_arg_non_null(&self, names: &[&str]) -> Result<&Self> {
        for name in names.iter().filter(|name| self.has_arg(name)) {
            self.update_arg(name, |arg| {
                arg.type_ = TypeReference::non_null(arg.type_.clone());
                Ok(())
            })?;
        }
        Ok(self)
    }

    /// Removes the outer non-null of the listed arguments. Unknown names are skipped.
    pub fn make_arg_nullable(&self, names: &[&str]) -> Result<&Self> {
        for name in names.iter().filter(|name| self.has_arg(name)) {
            self.update_arg(name, |arg| {
                arg.type_ = arg.type_.nullable()?;
                Ok(())
            })?;
        }
        Ok(self)
    }

    pub fn make_required(&self, names: &[&str]) -> Result<&Self> {
        self.make_arg_non_null(names)
    }

    pub fn make_optional(&self, names: &[&str]) -> Result<&Self> {
        self.make_arg_nullable(names)
    }

    /// Replaces the input type of argument `name` with an unregistered copy
    /// named `new_type_name`, keeping list and non-null wrappers.
    ///
    /// # Errors
    ///
    /// Returns `WrongKind` if the argument is not input-object typed and
    /// `InvalidName` for an empty, invalid or unchanged name.
    pub fn clone_arg(&self, name: &str, new_type_name: &str) -> Result<&Self> {
        let arg = self.get_arg(name)?;
        let itc = match arg.type_.named_composer()? {
            NamedTypeComposer::Input(itc) => itc,
            other => {
                return Err(ComposeError::wrong_kind(format!(
                    "argument `{name}` of resolver `{}` has {} type `{}`, only input object types can be cloned",
                    self.get_name(),
                    other.kind(),
                    other.get_type_name()
                )));
            }
        };
        composers::check_clone_name(&itc.get_type_name(), new_type_name)?;

        let cloned = NamedTypeComposer::Input(itc.clone_as(new_type_name)?);
        self.update_arg(name, |arg| {
            arg.type_ = arg.type_.map_named(|_| Ok(cloned))?;
            Ok(())
        })?;
        Ok(self)
    }

    // Composition

    /// Independent copy: arguments are copied, the display name is cleared,
    /// then `overrides` are applied. The parent link is kept.
    pub fn clone_with(&self, overrides: ResolverOverrides) -> Result<Resolver> {
        let mut inner = self.inner.borrow().clone();
        inner.display_name = None;
        let resolver = Resolver {
            inner: Rc::new(RefCell::new(inner)),
        };
        resolver.apply_overrides(overrides)?;
        Ok(resolver)
    }

    fn apply_overrides(&self, overrides: ResolverOverrides) -> Result<()> {
        if let Some(name) = overrides.name {
            self.set_name(name);
        }
        if let Some(type_) = overrides.type_ {
            self.set_type(type_)?;
        }
        if let Some(args) = overrides.args {
            self.set_args(args)?;
        }
        if let Some(resolve) = overrides.resolve {
            self.set_resolve(resolve);
        }
        if let Some(kind) = overrides.kind {
            self.set_kind(kind);
        }
        if let Some(description) = overrides.description {
            self.set_description(description);
        }
        if let Some(projection) = overrides.projection {
            self.set_projection(projection);
        }
        Ok(())
    }

    /// Derives a new resolver named `wrap` whose parent is `self`.
    pub fn wrap(&self) -> Result<Resolver> {
        self.wrap_with(ResolverOverrides::default(), |clone, _| Ok(clone))
    }

    /// Clones `self`, applies `overrides`, links the clone to `self` and hands
    /// both to `cb`. The callback's result is returned.
    pub fn wrap_with<F>(&self, overrides: ResolverOverrides, cb: F) -> Result<Resolver>
    where
        F: FnOnce(Resolver, &Resolver) -> Result<Resolver>,
    {
        let overrides = ResolverOverrides {
            name: Some(overrides.name.clone().unwrap_or_else(|| "wrap".to_string())),
            ..overrides
        };
        let clone = self.clone_with(overrides)?;
        clone.inner.borrow_mut().parent = Some(self.clone());
        trace!(resolver = %clone.get_nested_name(), "Wrapped resolver");
        cb(clone, self)
    }

    /// Derives a resolver whose resolve function is `f(previous resolve)`.
    pub fn wrap_resolve<F>(&self, f: F) -> Result<Resolver>
    where
        F: FnOnce(ResolveFn) -> ResolveFn,
    {
        self.wrap_with(ResolverOverrides::named("wrapResolve"), |clone, prev| {
            clone.set_resolve(f(prev.get_resolve()));
            Ok(clone)
        })
    }

    /// Derives a resolver whose arguments are `f(previous arguments)`.
    pub fn wrap_args<F>(&self, f: F) -> Result<Resolver>
    where
        F: FnOnce(IndexMap<String, ArgumentConfig>) -> Result<IndexMap<String, ArgumentConfig>>,
    {
        self.wrap_with(ResolverOverrides::named("wrapArgs"), |clone, _| {
            let args = f(clone.get_args())?;
            clone.set_args(args)?;
            Ok(clone)
        })
    }

    /// Derives a resolver whose type is `f(previous type)`.
    pub fn wrap_type<F>(&self, f: F) -> Result<Resolver>
    where
        F: FnOnce(TypeReference) -> Result<TypeReference>,
    {
        self.wrap_with(ResolverOverrides::named("wrapType"), |clone, _| {
            let type_ = f(clone.get_type()?)?;
            clone.set_type(type_)?;
            Ok(clone)
        })
    }

    /// Derives a resolver with argument `name` retyped to a copy of its input type.
    pub fn wrap_clone_arg(&self, name: &str, new_type_name: &str) -> Result<Resolver> {
        self.wrap_with(ResolverOverrides::named("cloneArg"), |clone, _| {
            clone.clone_arg(name, new_type_name)?;
            Ok(clone)
        })
    }

    /// Field config for attaching this resolver to a type.
    ///
    /// At call time the projection seen by the resolve function is the
    /// request-derived projection, overlaid with the resolver's projection,
    /// overlaid with `options.projection`.
    ///
    /// # Errors
    ///
    /// Returns `MalformedDefinition` if the resolver has no type.
    pub fn get_field_config(&self, options: FieldConfigOptions) -> Result<FieldConfig> {
        let type_ = self.get_type()?;
        let inner = self.inner.borrow();

        let projection = match &options.projection {
            Some(call_site) => inner.projection.merged(call_site),
            None => inner.projection.clone(),
        };
        let resolve = if projection.is_empty() {
            inner.resolve.clone()
        } else {
            let resolve = inner.resolve.clone();
            let projection = Arc::new(projection);
            resolve_fn(move |mut rp: ResolveParams| {
                rp.projection.merge(&projection);
                resolve(rp)
            })
        };

        let mut config = FieldConfig {
            type_,
            args: inner.args.clone(),
            resolve: Some(resolve),
            subscribe: inner.subscribe.clone(),
            description: inner.description.clone(),
            deprecation_reason: inner.deprecation_reason.clone(),
            projection: None,
            extensions: inner.extensions.clone(),
            directives: Vec::new(),
        };
        extensions::reconcile_deprecation(&mut config.deprecation_reason, &mut config.directives);
        Ok(config)
    }

    /// Multi-line description of the resolver and its wrap chain.
    pub fn to_debug_string(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Resolver `{}` {{", self.get_nested_name());
        if let Some(kind) = self.get_kind() {
            let _ = writeln!(out, "  kind: {kind}");
        }
        match self.get_type().and_then(|t| t.type_string()) {
            Ok(type_) => {
                let _ = writeln!(out, "  type: {type_}");
            }
            Err(err) => {
                let _ = writeln!(out, "  type: <{err}>");
            }
        }
        let args = self.get_args();
        if !args.is_empty() {
            let _ = writeln!(out, "  args: {{");
            for (name, arg) in &args {
                let type_ = arg.type_.type_string().unwrap_or_else(|_| "?".to_string());
                match &arg.default_value {
                    Some(default) => {
                        let _ = writeln!(out, "    {name}: {type_} = {default}");
                    }
                    None => {
                        let _ = writeln!(out, "    {name}: {type_}");
                    }
                }
            }
            let _ = writeln!(out, "  }}");
        }
        if let Some(description) = self.get_description() {
            let _ = writeln!(out, "  description: {description}");
        }
        out.push('}');
        out
    }
}

impl fmt::Debug for Resolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Resolver")
            .field("name", &inner.name)
            .field("display_name", &inner.display_name)
            .field("type_", &inner.type_)
            .field("args", &inner.args.keys().collect::<Vec<_>>())
            .field("kind", &inner.kind)
            .field("has_parent", &inner.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find_many(sc: &SchemaComposer) -> Resolver {
        sc.create_object_tc("type User { id: ID name: String }").unwrap();
        sc.create_resolver(
            ResolverDefinition::new("findMany")
                .type_("[User]")
                .arg("limit", ArgumentDefinition::new("Int").default_value(Value::Number(20.into())))
                .resolve(resolve_fn(|_| async { Ok(Some(Value::List(vec![]))) })),
        )
        .unwrap()
    }

    #[test]
    fn test_wrap_leaves_parent_args_alone() {
        let sc = SchemaComposer::new();
        let resolver = find_many(&sc);

        let wrapped = resolver.wrap().unwrap();
        wrapped.set_arg("skip", "Int").unwrap();
        wrapped.remove_arg("limit");

        assert!(!resolver.has_arg("skip"));
        assert!(resolver.has_arg("limit"));
        assert!(wrapped.get_parent().unwrap().ptr_eq(&resolver));
    }

    #[test]
    fn test_nested_name_follows_wrap_chain() {
        let sc = SchemaComposer::new();
        let resolver = find_many(&sc);

        let name = resolver
            .wrap()
            .unwrap()
            .wrap()
            .unwrap()
            .wrap()
            .unwrap()
            .get_nested_name();
        assert_eq!(name, "wrap(wrap(wrap(findMany)))");
    }

    #[test]
    fn test_clone_clears_display_name() {
        let sc = SchemaComposer::new();
        let resolver = find_many(&sc);
        resolver.set_display_name("User.findMany");

        let copy = resolver.clone_with(ResolverOverrides::default()).unwrap();
        assert_eq!(copy.get_display_name(), None);
        assert_eq!(copy.get_name(), "findMany");
        assert!(copy.get_parent().is_none());
    }

    #[test]
    fn test_set_type_rejects_input() {
        let sc = SchemaComposer::new();
        let resolver = find_many(&sc);
        sc.create_input_tc("input UserFilter { id: ID }").unwrap();

        let err = resolver.set_type("UserFilter").unwrap_err();
        assert_eq!(err.root_cause().error_code(), "WRONG_KIND");
    }

    #[test]
    fn test_make_arg_non_null_and_back() {
        let sc = SchemaComposer::new();
        let resolver = find_many(&sc);
        resolver.set_arg("ids", "[ID!]").unwrap();

        resolver.make_required(&["ids", "missing"]).unwrap();
        assert_eq!(resolver.get_arg_type("ids").unwrap().type_string().unwrap(), "[ID!]!");
        resolver.make_optional(&["ids"]).unwrap();
        assert_eq!(resolver.get_arg_type("ids").unwrap().type_string().unwrap(), "[ID!]");
    }

    #[test]
    fn test_clone_arg() {
        let sc = SchemaComposer::new();
        let resolver = find_many(&sc);
        let itc = sc.create_input_tc("input UserFilter { id: ID }").unwrap();
        resolver.set_arg("filter", "UserFilter!").unwrap();

        assert_eq!(
            resolver.clone_arg("filter", "UserFilter").unwrap_err().error_code(),
            "INVALID_NAME"
        );
        assert_eq!(resolver.clone_arg("limit", "X").unwrap_err().error_code(), "WRONG_KIND");

        let derived = resolver.wrap_clone_arg("filter", "AdminFilter").unwrap();
        assert_eq!(
            derived.get_arg_type("filter").unwrap().type_string().unwrap(),
            "AdminFilter!"
        );
        assert_eq!(resolver.get_arg_type_name("filter").unwrap(), "UserFilter");

        derived
            .get_arg_tc("filter")
            .unwrap()
            .as_input()
            .unwrap()
            .set_field("role", "String")
            .unwrap();
        assert!(!itc.has_field("role"));
    }

    #[test]
    fn test_reorder_args() {
        let sc = SchemaComposer::new();
        let resolver = find_many(&sc);
        resolver.add_args([("skip", "Int"), ("sort", "String")]).unwrap();

        resolver.reorder_args(&["sort", "nope", "skip"]);
        assert_eq!(resolver.get_arg_names(), vec!["sort", "skip", "limit"]);
    }

    #[tokio::test]
    async fn test_wrap_resolve_chains_previous() {
        let sc = SchemaComposer::new();
        let resolver = find_many(&sc);

        let wrapped = resolver
            .wrap_resolve(|next| {
                resolve_fn(move |rp| {
                    let next = next.clone();
                    async move {
                        let inner = next(rp).await?;
                        Ok(inner.map(|v| Value::List(vec![v])))
                    }
                })
            })
            .unwrap();

        let result = (wrapped.get_resolve())(ResolveParams::new(Value::Null)).await.unwrap();
        assert_eq!(result, Some(Value::List(vec![Value::List(vec![])])));
        let original = (resolver.get_resolve())(ResolveParams::new(Value::Null)).await.unwrap();
        assert_eq!(original, Some(Value::List(vec![])));
    }

    #[tokio::test]
    async fn test_field_config_merges_projection() {
        let sc = SchemaComposer::new();
        sc.create_object_tc("type User { id: ID name: String }").unwrap();
        let resolver = sc
            .create_resolver(
                ResolverDefinition::new("findOne")
                    .type_("User")
                    .projection(Projection::from_fields(["id"]))
                    .resolve(resolve_fn(|rp: ResolveParams| async move {
                        let names: Vec<Value> = rp
                            .projection
                            .names()
                            .map(|n| Value::String(n.clone()))
                            .collect();
                        Ok(Some(Value::List(names)))
                    })),
            )
            .unwrap();

        let config = resolver
            .get_field_config(FieldConfigOptions {
                projection: Some(Projection::from_fields(["email"])),
            })
            .unwrap();
        let mut rp = ResolveParams::new(Value::Null);
        rp.projection = Projection::from_fields(["name"]);

        let resolve = config.resolve.unwrap();
        let result = resolve(rp).await.unwrap();
        assert_eq!(
            result,
            Some(Value::List(vec![
                Value::String("name".into()),
                Value::String("id".into()),
                Value::String("email".into()),
            ]))
        );
    }

    #[test]
    fn test_debug_string() {
        let sc = SchemaComposer::new();
        let resolver = find_many(&sc);
        let debug = resolver.wrap().unwrap().to_debug_string();

        assert!(debug.starts_with("Resolver `wrap(findMany)` {"));
        assert!(debug.contains("type: [User]"));
        assert!(debug.contains("limit: Int = 20"));
    }
}
