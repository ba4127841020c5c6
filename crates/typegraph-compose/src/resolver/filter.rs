//! `filter` argument injection.

use std::fmt;
use std::sync::Arc;

use async_graphql::Value;

use super::{ResolveParams, Resolver, ResolverOverrides, resolve_fn};
use crate::Result;
use crate::composers::NamedTypeComposer;
use crate::error::ComposeError;
use crate::mapper::{InputFieldDefinition, TypeDef};
use crate::value;

/// Writes the effect of one filter field into the raw query accumulator.
/// Receives the accumulator, the non-null filter value and the call params.
pub type FilterQueryFn = Arc<dyn Fn(&mut super::RawQuery, &Value, &ResolveParams) + Send + Sync>;

/// Options for [`Resolver::add_filter_arg`].
#[derive(Clone, Default)]
pub struct FilterArgOptions {
    /// Field name on the filter input type.
    pub name: String,
    pub type_: Option<TypeDef>,
    pub description: Option<String>,
    pub query: Option<FilterQueryFn>,
    /// Input type created when the resolver has no `filter` argument yet.
    pub filter_type_name_fallback: Option<String>,
    /// Merged into the `filter` argument's default object under `name`.
    pub default_value: Option<Value>,
}

impl FilterArgOptions {
    pub fn new(name: impl Into<String>, type_: impl Into<TypeDef>) -> Self {
        Self {
            name: name.into(),
            type_: Some(type_.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn query<F>(mut self, query: F) -> Self
    where
        F: Fn(&mut super::RawQuery, &Value, &ResolveParams) + Send + Sync + 'static,
    {
        self.query = Some(Arc::new(query));
        self
    }

    #[must_use]
    pub fn fallback_type_name(mut self, name: impl Into<String>) -> Self {
        self.filter_type_name_fallback = Some(name.into());
        self
    }

    #[must_use]
    pub fn default_value(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }
}

impl fmt::Debug for FilterArgOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterArgOptions")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("has_query", &self.query.is_some())
            .field("filter_type_name_fallback", &self.filter_type_name_fallback)
            .field("default_value", &self.default_value)
            .finish()
    }
}

const FILTER_ARG: &str = "filter";

impl Resolver {
    /// Derives a resolver with field `options.name` added to its `filter`
    /// input argument.
    ///
    /// When `options.query` is set, the derived resolve function reads
    /// `args.filter.<name>` and, if it is present and not null, lets the
    /// query function write into `raw_query` before calling the previous
    /// resolve function.
    ///
    /// # Errors
    ///
    /// - `MalformedDefinition` if `name` or `type_` is missing
    /// - `InvalidName` if no `filter` argument exists and no fallback type name was given
    /// - `WrongKind` if the existing `filter` argument is not input-object typed
    pub fn add_filter_arg(&self, options: FilterArgOptions) -> Result<Resolver> {
        if options.name.is_empty() {
            return Err(ComposeError::malformed(format!(
                "add_filter_arg on `{}` requires a field name",
                self.get_name()
            )));
        }
        let Some(type_) = options.type_.clone() else {
            return Err(ComposeError::malformed(format!(
                "add_filter_arg `{}` on `{}` requires a type",
                options.name,
                self.get_name()
            )));
        };
        let sc = self.schema_composer()?;

        self.wrap_with(ResolverOverrides::named("addFilterArg"), |resolver, _| {
            let itc = if resolver.has_arg(FILTER_ARG) {
                match resolver.get_arg_tc(FILTER_ARG)? {
                    NamedTypeComposer::Input(itc) => itc,
                    other => {
                        return Err(ComposeError::wrong_kind(format!(
                            "`filter` argument of `{}` has {} type `{}`, expected an input object",
                            resolver.get_name(),
                            other.kind(),
                            other.get_type_name()
                        )));
                    }
                }
            } else {
                let fallback = options
                    .filter_type_name_fallback
                    .as_deref()
                    .filter(|name| !name.is_empty())
                    .ok_or_else(|| {
                        ComposeError::invalid_name(format!(
                            "add_filter_arg `{}` needs a fallback type name for the `filter` argument",
                            options.name
                        ))
                    })?;
                let itc = sc.get_or_create_itc(fallback)?;
                resolver.set_arg(FILTER_ARG, NamedTypeComposer::Input(itc.clone()))?;
                itc
            };

            let mut field = InputFieldDefinition::new(type_);
            field.description = options.description.clone();
            itc.set_field(&options.name, field)?;

            if let Some(default) = options.default_value.clone() {
                let mut merged = resolver
                    .get_arg_default_value(FILTER_ARG)
                    .unwrap_or_else(|| Value::Object(Default::default()));
                value::set_key(&mut merged, &options.name, default);
                resolver.set_arg_default_value(FILTER_ARG, Some(merged))?;
            }

            if let Some(query) = options.query.clone() {
                let field_name = options.name.clone();
                let previous = resolver.get_resolve();
                resolver.set_resolve(resolve_fn(move |mut rp: ResolveParams| {
                    let previous = previous.clone();
                    let filter_value = rp
                        .args
                        .get(FILTER_ARG)
                        .and_then(|filter| value::get_key(filter, &field_name))
                        .filter(|value| !matches!(value, Value::Null))
                        .cloned();
                    if let Some(filter_value) = filter_value {
                        let mut raw_query = rp.raw_query.take().unwrap_or_default();
                        query(&mut raw_query, &filter_value, &rp);
                        rp.raw_query = Some(raw_query);
                    }
                    previous(rp)
                }));
            }

            Ok(resolver)
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::SchemaComposer;
    use crate::resolver::ResolverDefinition;
    use crate::value::json_to_graphql_value;

    fn base(sc: &SchemaComposer) -> Resolver {
        sc.create_object_tc("type User { id: ID age: Int active: Boolean }")
            .unwrap();
        sc.create_resolver(
            ResolverDefinition::new("findMany")
                .type_("[User]")
                .resolve(resolve_fn(|rp: ResolveParams| async move {
                    let raw = rp.raw_query.unwrap_or_default();
                    Ok(Some(Value::Object(
                        raw.into_iter()
                            .map(|(k, v)| (async_graphql::Name::new(k), v))
                            .collect(),
                    )))
                })),
        )
        .unwrap()
    }

    #[test]
    fn test_default_values_merge() {
        let sc = SchemaComposer::new();
        let resolver = base(&sc)
            .add_filter_arg(
                FilterArgOptions::new("age", "Int")
                    .fallback_type_name("UserFilter")
                    .default_value(Value::Number(20.into())),
            )
            .unwrap()
            .add_filter_arg(
                FilterArgOptions::new("active", "Boolean").default_value(Value::Boolean(true)),
            )
            .unwrap();

        assert_eq!(
            resolver.get_arg_default_value("filter"),
            Some(json_to_graphql_value(json!({ "age": 20, "active": true })))
        );
        assert_eq!(resolver.get_arg_type_name("filter").unwrap(), "UserFilter");
        let filter = sc.get_itc("UserFilter").unwrap();
        assert_eq!(filter.get_field_names(), vec!["age", "active"]);
    }

    #[test]
    fn test_fallback_required() {
        let sc = SchemaComposer::new();
        let err = base(&sc)
            .add_filter_arg(FilterArgOptions::new("age", "Int"))
            .unwrap_err();
        assert_eq!(err.error_code(), "INVALID_NAME");

        let mut missing_type = FilterArgOptions::new("age", "Int");
        missing_type.type_ = None;
        let err = base(&sc).add_filter_arg(missing_type).unwrap_err();
        assert_eq!(err.error_code(), "MALFORMED_DEFINITION");
    }

    #[test]
    fn test_original_untouched() {
        let sc = SchemaComposer::new();
        let resolver = base(&sc);
        let filtered = resolver
            .add_filter_arg(FilterArgOptions::new("age", "Int").fallback_type_name("UserFilter"))
            .unwrap();

        assert!(filtered.has_arg("filter"));
        assert!(!resolver.has_arg("filter"));
        assert_eq!(filtered.get_nested_name(), "addFilterArg(findMany)");
    }

    #[tokio::test]
    async fn test_query_functions_share_raw_query() {
        let sc = SchemaComposer::new();
        let resolver = base(&sc)
            .add_filter_arg(
                FilterArgOptions::new("age", "Int")
                    .fallback_type_name("UserFilter")
                    .query(|raw, value, _| {
                        raw.insert("age_gte".to_string(), value.clone());
                    }),
            )
            .unwrap()
            .add_filter_arg(FilterArgOptions::new("active", "Boolean").query(|raw, value, _| {
                let seen = Value::Boolean(raw.contains_key("age_gte"));
                raw.insert("active".to_string(), value.clone());
                raw.insert("saw_age".to_string(), seen);
            }))
            .unwrap();

        let rp = ResolveParams::new(Value::Null).with_arg(
            "filter",
            json_to_graphql_value(json!({ "age": 30, "active": null })),
        );
        let result = (resolver.get_resolve())(rp).await.unwrap();
        assert_eq!(result, Some(json_to_graphql_value(json!({ "age_gte": 30 }))));

        let rp = ResolveParams::new(Value::Null).with_arg(
            "filter",
            json_to_graphql_value(json!({ "age": 30, "active": true })),
        );
        let result = (resolver.get_resolve())(rp).await.unwrap();
        assert_eq!(
            result,
            Some(json_to_graphql_value(
                json!({ "active": true, "saw_age": false, "age_gte": 30 })
            ))
        );
    }
}
