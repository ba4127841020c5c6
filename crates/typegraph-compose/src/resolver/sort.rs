//! `sort` argument injection.

use std::fmt;
use std::sync::Arc;

use async_graphql::Value;

use super::{ResolveParams, Resolver, ResolverOverrides, resolve_fn};
use crate::Result;
use crate::composers::{EnumValueConfig, NamedTypeComposer};
use crate::error::ComposeError;
use crate::value;

/// Computes the sort value for a call.
pub type SortValueFn = Arc<dyn Fn(&ResolveParams) -> Value + Send + Sync>;

/// What a sort enum value stands for.
#[derive(Clone)]
pub enum SortValue {
    /// Stored as the enum value's internal value.
    Value(Value),
    /// Evaluated per call when the incoming `sort` argument selects this value.
    Compute(SortValueFn),
}

impl fmt::Debug for SortValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Compute(_) => f.write_str("Compute(..)"),
        }
    }
}

/// Options for [`Resolver::add_sort_arg`].
#[derive(Debug, Clone)]
pub struct SortArgOptions {
    /// Enum value name.
    pub name: String,
    pub value: SortValue,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
    /// Enum type created when the resolver has no `sort` argument yet.
    pub sort_type_name_fallback: Option<String>,
}

impl SortArgOptions {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value: SortValue::Value(value),
            description: None,
            deprecation_reason: None,
            sort_type_name_fallback: None,
        }
    }

    pub fn computed<F>(name: impl Into<String>, compute: F) -> Self
    where
        F: Fn(&ResolveParams) -> Value + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            value: SortValue::Compute(Arc::new(compute)),
            description: None,
            deprecation_reason: None,
            sort_type_name_fallback: None,
        }
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
    pub fn fallback_type_name(mut self, name: impl Into<String>) -> Self {
        self.sort_type_name_fallback = Some(name.into());
        self
    }
}

const SORT_ARG: &str = "sort";

impl Resolver {
    /// Derives a resolver with value `options.name` added to its `sort` enum
    /// argument.
    ///
    /// A computed value is stored as a marker equal to the value's own name;
    /// when a call's `sort` argument equals the marker, the function's result
    /// replaces it before the previous resolve function runs.
    ///
    /// # Errors
    ///
    /// - `MalformedDefinition` if `name` is empty
    /// - `InvalidName` if no `sort` argument exists and no fallback type name was given
    /// - `WrongKind` if the existing `sort` argument is not enum typed
    pub fn add_sort_arg(&self, options: SortArgOptions) -> Result<Resolver> {
        if options.name.is_empty() {
            return Err(ComposeError::malformed(format!(
                "add_sort_arg on `{}` requires a value name",
                self.get_name()
            )));
        }
        let sc = self.schema_composer()?;

        self.wrap_with(ResolverOverrides::named("addSortArg"), |resolver, _| {
            let etc = if resolver.has_arg(SORT_ARG) {
                match resolver.get_arg_tc(SORT_ARG)? {
                    NamedTypeComposer::Enum(etc) => etc,
                    other => {
                        return Err(ComposeError::wrong_kind(format!(
                            "`sort` argument of `{}` has {} type `{}`, expected an enum",
                            resolver.get_name(),
                            other.kind(),
                            other.get_type_name()
                        )));
                    }
                }
            } else {
                let fallback = options
                    .sort_type_name_fallback
                    .as_deref()
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| {
                        ComposeError::invalid_name(format!(
                            "add_sort_arg `{}` needs a fallback type name for the `sort` argument",
                            options.name
                        ))
                    })?;
                let etc = sc.get_or_create_etc(fallback)?;
                resolver.set_arg(SORT_ARG, NamedTypeComposer::Enum(etc.clone()))?;
                etc
            };

            let mut config = EnumValueConfig {
                description: options.description.clone(),
                deprecation_reason: options.deprecation_reason.clone(),
                ..EnumValueConfig::default()
            };
            match &options.value {
                SortValue::Value(value) => config.value = Some(value.clone()),
                SortValue::Compute(compute) => {
                    config.value = Some(Value::String(options.name.clone()));
                    let marker = options.name.clone();
                    let compute = compute.clone();
                    let previous = resolver.get_resolve();
                    resolver.set_resolve(resolve_fn(move |mut rp: ResolveParams| {
                        let selected = rp
                            .args
                            .get(SORT_ARG)
                            .is_some_and(|sort| value::is_name_value(sort, &marker));
                        if selected {
                            let computed = compute(&rp);
                            rp.args.insert(SORT_ARG.to_string(), computed);
                        }
                        previous(rp)
                    }));
                }
            }
            etc.set_field(options.name.clone(), config);

            Ok(resolver)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SchemaComposer;
    use crate::resolver::ResolverDefinition;

    fn base(sc: &SchemaComposer) -> Resolver {
        sc.create_object_tc("type User { id: ID age: Int }").unwrap();
        sc.create_resolver(
            ResolverDefinition::new("findMany")
                .type_("[User]")
                .resolve(resolve_fn(|rp: ResolveParams| async move {
                    Ok(rp.args.get("sort").cloned())
                })),
        )
        .unwrap()
    }

    #[test]
    fn test_literal_sort_values() {
        let sc = SchemaComposer::new();
        let resolver = base(&sc)
            .add_sort_arg(
                SortArgOptions::new("AGE_ASC", Value::String("age".into()))
                    .fallback_type_name("SortUser"),
            )
            .unwrap()
            .add_sort_arg(SortArgOptions::new("AGE_DESC", Value::String("-age".into())))
            .unwrap();

        let etc = sc.get_etc("SortUser").unwrap();
        assert_eq!(etc.get_field_names(), vec!["AGE_ASC", "AGE_DESC"]);
        assert_eq!(
            etc.get_internal_value("AGE_DESC").unwrap(),
            Value::String("-age".into())
        );
        assert_eq!(resolver.get_arg_type_name("sort").unwrap(), "SortUser");
    }

    #[test]
    fn test_sort_arg_must_be_enum() {
        let sc = SchemaComposer::new();
        let resolver = base(&sc);
        resolver.set_arg("sort", "String").unwrap();

        let err = resolver
            .add_sort_arg(SortArgOptions::new("AGE_ASC", Value::Null))
            .unwrap_err();
        assert_eq!(err.error_code(), "WRONG_KIND");

        let err = base(&sc)
            .add_sort_arg(SortArgOptions::new("AGE_ASC", Value::Null))
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_NAME");
    }

    #[tokio::test]
    async fn test_computed_value_substituted_for_marker() {
        let sc = SchemaComposer::new();
        let resolver = base(&sc)
            .add_sort_arg(
                SortArgOptions::computed("RELEVANCE", |rp| {
                    let term = rp.arg("q").cloned().unwrap_or(Value::Null);
                    Value::List(vec![Value::String("score".into()), term])
                })
                .fallback_type_name("SortUser"),
            )
            .unwrap();

        let etc = sc.get_etc("SortUser").unwrap();
        assert_eq!(
            etc.get_internal_value("RELEVANCE").unwrap(),
            Value::String("RELEVANCE".into())
        );

        let rp = ResolveParams::new(Value::Null)
            .with_arg("sort", Value::String("RELEVANCE".into()))
            .with_arg("q", Value::String("ann".into()));
        let result = (resolver.get_resolve())(rp).await.unwrap();
        assert_eq!(
            result,
            Some(Value::List(vec![
                Value::String("score".into()),
                Value::String("ann".into())
            ]))
        );

        let rp = ResolveParams::new(Value::Null).with_arg("sort", Value::String("OTHER".into()));
        let result = (resolver.get_resolve())(rp).await.unwrap();
        assert_eq!(result, Some(Value::String("OTHER".into())));
    }
}
