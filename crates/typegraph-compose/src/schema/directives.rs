//! Directive definitions known to a schema composer.
//!
//! `@include`, `@skip`, `@deprecated` and `@specifiedBy` are always present.
//! Definitions added from SDL or by hand are used to coerce the arguments of
//! applied directives and are printed with the schema.

use std::fmt::Write as _;

use async_graphql::Value;
use async_graphql_parser::types::DirectiveLocation;
use indexmap::IndexMap;

use super::WeakSchema;
use crate::Result;
use crate::composers::ArgumentConfig;
use crate::names::DEFAULT_DEPRECATION_REASON;
use crate::type_ref::TypeReference;

/// Names of the directives every schema carries.
pub const BUILTIN_DIRECTIVES: [&str; 4] = ["include", "skip", "deprecated", "specifiedBy"];

/// A `directive @name(...) on ...` declaration.
#[derive(Debug, Clone)]
pub struct DirectiveDefinition {
    pub name: String,
    pub description: Option<String>,
    pub args: IndexMap<String, ArgumentConfig>,
    pub locations: Vec<DirectiveLocation>,
    pub is_repeatable: bool,
}

impl DirectiveDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            args: IndexMap::new(),
            locations: Vec::new(),
            is_repeatable: false,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn arg(mut self, name: impl Into<String>, arg: ArgumentConfig) -> Self {
        self.args.insert(name.into(), arg);
        self
    }

    #[must_use]
    pub fn location(mut self, location: DirectiveLocation) -> Self {
        self.locations.push(location);
        self
    }

    #[must_use]
    pub fn repeatable(mut self) -> Self {
        self.is_repeatable = true;
        self
    }

    pub fn is_builtin(&self) -> bool {
        BUILTIN_DIRECTIVES.contains(&self.name.as_str())
    }

    /// Renders the definition as SDL.
    ///
    /// # Errors
    ///
    /// Returns the error raised while forcing a deferred argument type.
    pub fn to_sdl(&self) -> Result<String> {
        let mut out = String::new();
        if let Some(description) = &self.description {
            let _ = writeln!(out, "\"\"\"{description}\"\"\"");
        }
        let _ = write!(out, "directive @{}", self.name);
        if !self.args.is_empty() {
            let mut args = Vec::with_capacity(self.args.len());
            for (name, arg) in &self.args {
                let mut rendered = format!("{name}: {}", arg.type_.type_string()?);
                if let Some(default) = &arg.default_value {
                    let _ = write!(rendered, " = {default}");
                }
                args.push(rendered);
            }
            let _ = write!(out, "({})", args.join(", "));
        }
        if self.is_repeatable {
            out.push_str(" repeatable");
        }
        let locations: Vec<String> = self.locations.iter().map(location_name).collect();
        let _ = write!(out, " on {}", locations.join(" | "));
        Ok(out)
    }
}

/// `FieldDefinition` -> `FIELD_DEFINITION`.
pub fn location_name(location: &DirectiveLocation) -> String {
    let camel = format!("{location:?}");
    let mut out = String::with_capacity(camel.len() + 4);
    for (i, ch) in camel.chars().enumerate() {
        if ch.is_ascii_uppercase() && i > 0 {
            out.push('_');
        }
        out.push(ch.to_ascii_uppercase());
    }
    out
}

fn scalar_arg(sc: &WeakSchema, scalar: &'static str) -> TypeReference {
    let sc = sc.clone();
    TypeReference::thunk(
        move || Ok(TypeReference::Named(sc.upgrade()?.get_any_tc(scalar)?)),
        Some(scalar.to_string()),
    )
}

pub(super) fn builtin_directives(sc: &WeakSchema) -> Vec<DirectiveDefinition> {
    let condition = || ArgumentConfig::new(TypeReference::non_null(scalar_arg(sc, "Boolean")));

    let include = DirectiveDefinition::new("include")
        .description("Directs the executor to include this field or fragment only when the `if` argument is true.")
        .arg("if", condition())
        .location(DirectiveLocation::Field)
        .location(DirectiveLocation::FragmentSpread)
        .location(DirectiveLocation::InlineFragment);

    let skip = DirectiveDefinition::new("skip")
        .description("Directs the executor to skip this field or fragment when the `if` argument is true.")
        .arg("if", condition())
        .location(DirectiveLocation::Field)
        .location(DirectiveLocation::FragmentSpread)
        .location(DirectiveLocation::InlineFragment);

    let mut reason = ArgumentConfig::new(scalar_arg(sc, "String"));
    reason.default_value = Some(Value::String(DEFAULT_DEPRECATION_REASON.to_string()));
    let deprecated = DirectiveDefinition::new("deprecated")
        .description("Marks an element of a GraphQL schema as no longer supported.")
        .arg("reason", reason)
        .location(DirectiveLocation::FieldDefinition)
        .location(DirectiveLocation::ArgumentDefinition)
        .location(DirectiveLocation::InputFieldDefinition)
        .location(DirectiveLocation::EnumValue);

    let specified_by = DirectiveDefinition::new("specifiedBy")
        .description("Exposes a URL that specifies the behaviour of this scalar.")
        .arg(
            "url",
            ArgumentConfig::new(TypeReference::non_null(scalar_arg(sc, "String"))),
        )
        .location(DirectiveLocation::Scalar);

    vec![include, skip, deprecated, specified_by]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SchemaComposer;

    #[test]
    fn test_location_names() {
        assert_eq!(location_name(&DirectiveLocation::FieldDefinition), "FIELD_DEFINITION");
        assert_eq!(location_name(&DirectiveLocation::Object), "OBJECT");
        assert_eq!(
            location_name(&DirectiveLocation::InputFieldDefinition),
            "INPUT_FIELD_DEFINITION"
        );
    }

    #[test]
    fn test_builtin_deprecated_sdl() {
        let sc = SchemaComposer::new();
        let deprecated = sc.get_directive("deprecated").unwrap();
        assert!(deprecated.is_builtin());
        assert_eq!(
            deprecated.to_sdl().unwrap().lines().last().unwrap(),
            "directive @deprecated(reason: String = \"No longer supported\") on FIELD_DEFINITION | ARGUMENT_DEFINITION | INPUT_FIELD_DEFINITION | ENUM_VALUE"
        );
    }

    #[test]
    fn test_custom_directive_sdl() {
        let sc = SchemaComposer::new();
        let mut weight = ArgumentConfig::new(TypeReference::Named(sc.get_any_tc("Int").unwrap()));
        weight.default_value = Some(Value::Number(1.into()));
        sc.add_directive(
            DirectiveDefinition::new("cost")
                .arg("weight", weight)
                .location(DirectiveLocation::FieldDefinition)
                .location(DirectiveLocation::Object)
                .repeatable(),
        );

        let cost = sc.get_directive("cost").unwrap();
        assert!(!cost.is_builtin());
        assert_eq!(
            cost.to_sdl().unwrap(),
            "directive @cost(weight: Int = 1) repeatable on FIELD_DEFINITION | OBJECT"
        );
    }
}
