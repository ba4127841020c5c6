//! Relation fields: fields backed by an existing resolver.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use async_graphql::Value;
use indexmap::IndexMap;
use tracing::error;

use crate::Result;
use crate::error::ComposeError;
use crate::extensions::Extensions;
use crate::mapper::{ArgumentDefinition, FieldDef, FieldDefinition, TypeDef};
use crate::resolver::{FieldConfigOptions, Projection, ResolveFn, ResolveParams, Resolver, resolve_fn};

/// The resolver a relation delegates to.
#[derive(Clone)]
pub enum RelationResolver {
    Resolver(Resolver),
    /// Looked up when the field is first materialized.
    Thunk(Rc<dyn Fn() -> Result<Resolver>>),
}

impl RelationResolver {
    fn get(&self) -> Result<Resolver> {
        match self {
            Self::Resolver(resolver) => Ok(resolver.clone()),
            Self::Thunk(thunk) => thunk(),
        }
    }
}

impl From<Resolver> for RelationResolver {
    fn from(resolver: Resolver) -> Self {
        Self::Resolver(resolver)
    }
}

/// How one resolver argument is supplied by the relation instead of the caller.
#[derive(Clone)]
pub enum PrepareArg {
    /// Drop the argument before calling the resolver.
    Remove,
    /// Always pass this value.
    Value(Value),
    /// Compute the value from the call's params (the parent value is `rp.source`).
    Compute(Arc<dyn Fn(&ResolveParams) -> Value + Send + Sync>),
}

impl PrepareArg {
    pub fn compute<F>(f: F) -> Self
    where
        F: Fn(&ResolveParams) -> Value + Send + Sync + 'static,
    {
        Self::Compute(Arc::new(f))
    }
}

impl fmt::Debug for PrepareArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Remove => f.write_str("Remove"),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Compute(_) => f.write_str("Compute(..)"),
        }
    }
}

/// Options of `ObjectTypeComposer::add_relation`.
///
/// Either `resolver` (with optional `prepare_args`, `projection` and
/// `catch_errors`) or a plain field given by `type_` and `resolve`.
#[derive(Clone, Default)]
pub struct RelationOptions {
    pub resolver: Option<RelationResolver>,
    pub prepare_args: IndexMap<String, PrepareArg>,
    pub projection: Option<Projection>,
    /// Turns a failing resolve into `null`. Falls back to
    /// `ComposerConfig::relation_catch_errors`.
    pub catch_errors: Option<bool>,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
    pub extensions: Extensions,
    pub type_: Option<TypeDef>,
    pub resolve: Option<ResolveFn>,
    pub args: IndexMap<String, ArgumentDefinition>,
}

impl RelationOptions {
    pub fn resolver(resolver: impl Into<RelationResolver>) -> Self {
        Self {
            resolver: Some(resolver.into()),
            ..Default::default()
        }
    }

    /// Relation whose resolver is looked up lazily, e.g. from a type declared later.
    pub fn resolver_thunk<F>(f: F) -> Self
    where
        F: Fn() -> Result<Resolver> + 'static,
    {
        Self {
            resolver: Some(RelationResolver::Thunk(Rc::new(f))),
            ..Default::default()
        }
    }

    /// Relation given as a plain field.
    pub fn field(type_: impl Into<TypeDef>, resolve: ResolveFn) -> Self {
        Self {
            type_: Some(type_.into()),
            resolve: Some(resolve),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn prepare_arg(mut self, name: impl Into<String>, prepare: PrepareArg) -> Self {
        self.prepare_args.insert(name.into(), prepare);
        self
    }

    #[must_use]
    pub fn projection(mut self, projection: Projection) -> Self {
        self.projection = Some(projection);
        self
    }

    #[must_use]
    pub fn catch_errors(mut self, catch_errors: bool) -> Self {
        self.catch_errors = Some(catch_errors);
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
    pub fn extension(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }

    #[must_use]
    pub fn arg(mut self, name: impl Into<String>, arg: impl Into<ArgumentDefinition>) -> Self {
        self.args.insert(name.into(), arg.into());
        self
    }

    /// Rejects option sets mixing a resolver with a literal field shape.
    pub(crate) fn validate(&self, path: &str) -> Result<()> {
        if self.resolver.is_some() && self.type_.is_some() {
            return Err(ComposeError::malformed(format!(
                "relation {path} must not set both `resolver` and `type`"
            )));
        }
        if self.resolver.is_some() && self.resolve.is_some() {
            return Err(ComposeError::malformed(format!(
                "relation {path} must not set both `resolver` and `resolve`"
            )));
        }
        if self.resolver.is_none() && self.type_.is_none() {
            return Err(ComposeError::malformed(format!(
                "relation {path} needs either `resolver` or `type`"
            )));
        }
        Ok(())
    }

    /// Turns the options into a field definition. The resolver variant is
    /// deferred until the field is first read.
    pub(crate) fn into_field_def(self, path: String, default_catch_errors: bool) -> Result<FieldDef> {
        self.validate(&path)?;

        let Some(resolver) = self.resolver.clone() else {
            return Ok(FieldDef::Definition(FieldDefinition {
                type_: self.type_,
                args: self.args,
                resolve: self.resolve,
                description: self.description,
                deprecation_reason: self.deprecation_reason,
                projection: self.projection,
                extensions: self.extensions,
                ..Default::default()
            }));
        };

        let catch_errors = self.catch_errors.unwrap_or(default_catch_errors);
        let options = self;
        Ok(FieldDef::thunk(move || {
            let resolver = resolver.get().map_err(|e| e.at_path(path.clone()))?;
            let mut config = resolver.get_field_config(FieldConfigOptions {
                projection: options.projection.clone(),
            })?;

            config.args.retain(|name, _| !options.prepare_args.contains_key(name));
            config.resolve = Some(wrap_relation_resolve(
                config.resolve.take(),
                Arc::new(options.prepare_args.clone()),
                catch_errors,
                path.clone(),
            ));
            if options.description.is_some() {
                config.description = options.description.clone();
            }
            if options.deprecation_reason.is_some() {
                config.deprecation_reason = options.deprecation_reason.clone();
            }
            crate::extensions::merge_extensions(&mut config.extensions, options.extensions.clone());

            Ok(FieldDefinition::from(config))
        }))
    }
}

fn wrap_relation_resolve(
    original: Option<ResolveFn>,
    prepare_args: Arc<IndexMap<String, PrepareArg>>,
    catch_errors: bool,
    path: String,
) -> ResolveFn {
    resolve_fn(move |mut rp: ResolveParams| {
        let original = original.clone();
        let prepare_args = prepare_args.clone();
        let path = path.clone();
        async move {
            for (name, prepare) in prepare_args.iter() {
                match prepare {
                    PrepareArg::Remove => {
                        rp.args.shift_remove(name);
                    }
                    PrepareArg::Value(value) => {
                        rp.args.insert(name.clone(), value.clone());
                    }
                    PrepareArg::Compute(compute) => {
                        let value = compute(&rp);
                        rp.args.insert(name.clone(), value);
                    }
                }
            }

            let Some(resolve) = original else {
                return Ok(None);
            };
            match resolve(rp).await {
                Ok(value) => Ok(value),
                Err(err) if catch_errors => {
                    error!(field = %path, error = %err.message, "Relation resolve failed, returning null");
                    Ok(None)
                }
                Err(err) => Err(err),
            }
        }
    })
}

impl fmt::Debug for RelationOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelationOptions")
            .field("has_resolver", &self.resolver.is_some())
            .field("prepare_args", &self.prepare_args)
            .field("projection", &self.projection)
            .field("catch_errors", &self.catch_errors)
            .field("type_", &self.type_.is_some())
            .field("has_resolve", &self.resolve.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relation_rejects_resolver_with_type() {
        let options = RelationOptions {
            resolver: Some(RelationResolver::Thunk(Rc::new(|| {
                Err(ComposeError::malformed("unused"))
            }))),
            type_: Some("String".into()),
            ..Default::default()
        };
        let err = options.validate("User.friends").unwrap_err();
        assert_eq!(err.error_code(), "MALFORMED_DEFINITION");
    }

    #[test]
    fn test_relation_requires_resolver_or_type() {
        let err = RelationOptions::default().validate("User.friends").unwrap_err();
        assert_eq!(err.error_code(), "MALFORMED_DEFINITION");
    }

    #[tokio::test]
    async fn test_prepare_args_applied_before_resolve() {
        let original = resolve_fn(|rp: ResolveParams| async move {
            Ok(Some(Value::List(rp.args.values().cloned().collect())))
        });
        let mut prepare = IndexMap::new();
        prepare.insert("limit".to_string(), PrepareArg::Value(Value::Number(10.into())));
        prepare.insert("secret".to_string(), PrepareArg::Remove);
        prepare.insert(
            "authorId".to_string(),
            PrepareArg::compute(|rp| rp.source.clone()),
        );

        let wrapped = wrap_relation_resolve(Some(original), Arc::new(prepare), true, "Post.author".into());
        let rp = ResolveParams::new(Value::String("u1".into()))
            .with_arg("secret", Value::Boolean(true))
            .with_arg("filter", Value::Null);
        let result = wrapped(rp).await.unwrap().unwrap();

        assert_eq!(
            result,
            Value::List(vec![
                Value::Null,
                Value::Number(10.into()),
                Value::String("u1".into()),
            ])
        );
    }

    #[tokio::test]
    async fn test_catch_errors_returns_null() {
        let failing = resolve_fn(|_rp: ResolveParams| async move { Err("boom".into()) });

        let caught = wrap_relation_resolve(Some(failing.clone()), Arc::new(IndexMap::new()), true, "A.b".into());
        assert_eq!(caught(ResolveParams::new(Value::Null)).await.unwrap(), None);

        let raised = wrap_relation_resolve(Some(failing), Arc::new(IndexMap::new()), false, "A.b".into());
        assert!(raised(ResolveParams::new(Value::Null)).await.is_err());
    }
}
