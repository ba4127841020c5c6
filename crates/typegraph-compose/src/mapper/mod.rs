//! Type mapper: turns raw type and field definitions into type references
//! and converted field configs.
//!
//! Accepted shapes, checked in this order:
//!
//! 1. an existing composer or [`TypeReference`] (passed through)
//! 2. a one-element list (`[T]`)
//! 3. a thunk (becomes a deferred reference)
//! 4. SDL text declaring a type (parsed once, cached by its literal text)
//! 5. a type name, possibly wrapped (`[User!]!`), looked up in the registry
//!    or synthesized for built-in scalars
//!
//! A programmatic [`TypeConfig`] creates a new unregistered type.

mod coerce;
mod definitions;
mod sdl;

pub use definitions::{
    ArgumentDefinition, ComposerDef, EnumTypeConfig, FieldDef, FieldDefinition, FieldPatch, FieldThunk,
    InputFieldDef, InputFieldDefinition, InputFieldThunk, InputTypeConfig, InterfaceTypeConfig,
    ObjectTypeConfig, ScalarTypeConfig, TypeConfig, TypeDef, UnionTypeConfig,
};

use indexmap::IndexMap;
use tracing::trace;

use crate::Result;
use crate::composers::{
    ArgumentConfig, EnumTypeComposer, FieldConfig, InputTypeComposer, InterfaceTypeComposer,
    NamedTypeComposer, ObjectTypeComposer, ScalarTypeComposer, UnionTypeComposer,
};
use crate::error::ComposeError;
use crate::extensions;
use crate::names;
use crate::schema::{SchemaComposer, WeakSchema};
use crate::type_ref::TypeReference;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Output,
    Input,
}

impl Position {
    fn accepts(self, tc: &NamedTypeComposer) -> bool {
        match self {
            Self::Output => tc.is_output_type(),
            Self::Input => tc.is_input_type(),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Output => "output",
            Self::Input => "input",
        }
    }
}

/// Converts definitions for one [`SchemaComposer`].
#[derive(Clone)]
pub struct TypeMapper {
    sc: WeakSchema,
}

impl TypeMapper {
    pub(crate) fn new(sc: WeakSchema) -> Self {
        Self { sc }
    }

    fn schema(&self) -> Result<SchemaComposer> {
        self.sc.upgrade()
    }

    /// Converts a type usable in output position (fields, resolver types).
    ///
    /// # Errors
    ///
    /// Returns `WrongKind` for input object types, `NotFound` for unknown
    /// names and `MalformedDefinition` for unparsable text.
    pub fn convert_output_type_definition(&self, def: impl Into<TypeDef>) -> Result<TypeReference> {
        self.convert_type_definition(def.into(), Position::Output)
    }

    /// Converts a type usable in input position (arguments, input fields).
    ///
    /// # Errors
    ///
    /// Returns `WrongKind` for object, interface and union types.
    pub fn convert_input_type_definition(&self, def: impl Into<TypeDef>) -> Result<TypeReference> {
        self.convert_type_definition(def.into(), Position::Input)
    }

    fn convert_type_definition(&self, def: TypeDef, position: Position) -> Result<TypeReference> {
        let reference = match def {
            TypeDef::Ref(reference) => reference,
            TypeDef::List(mut items) => {
                if items.len() != 1 {
                    return Err(ComposeError::malformed(format!(
                        "list type definition must contain exactly one element, got {}",
                        items.len()
                    )));
                }
                let inner = items.remove(0);
                TypeReference::list(self.convert_type_definition(inner, position)?)
            }
            TypeDef::Thunk(thunk) => {
                let mapper = self.clone();
                return Ok(TypeReference::thunk(
                    move || mapper.convert_type_definition(thunk()?, position),
                    None,
                ));
            }
            TypeDef::Text(text) => self.convert_text(text.trim(), position)?,
            TypeDef::Config(config) => TypeReference::Named(self.create_from_config(*config)?),
        };
        check_position(&reference, position)?;
        Ok(reference)
    }

    fn convert_text(&self, text: &str, position: Position) -> Result<TypeReference> {
        if names::is_valid_graphql_name(text) {
            return Ok(TypeReference::Named(self.schema()?.get_any_tc(text)?));
        }
        if names::is_wrapped_type_name(text) {
            if let Some(inner) = text.strip_suffix('!') {
                return Ok(TypeReference::non_null(self.convert_text(inner, position)?));
            }
            if let Some(inner) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
                return Ok(TypeReference::list(self.convert_text(inner, position)?));
            }
        }
        if text.is_empty() {
            return Err(ComposeError::malformed("empty type definition"));
        }
        Ok(TypeReference::Named(self.convert_sdl_type_definition(text)?))
    }

    /// Parses SDL text declaring exactly one type and registers the result.
    /// The same text yields the same composer on every call.
    ///
    /// # Errors
    ///
    /// Returns `MalformedDefinition` if the text does not parse or declares
    /// anything but a single type.
    pub fn convert_sdl_type_definition(&self, sdl: &str) -> Result<NamedTypeComposer> {
        let sc = self.schema()?;
        if let Some(cached) = sc.cached_sdl_type(sdl) {
            return Ok(cached);
        }
        let tc = sdl::build_single_type(self, &sc, sdl, true)?;
        sc.cache_sdl_type(sdl, tc.clone());
        Ok(tc)
    }

    /// Parses SDL text declaring exactly one type, without registering it.
    pub fn build_sdl_type(&self, sdl: &str) -> Result<NamedTypeComposer> {
        let sc = self.schema()?;
        sdl::build_single_type(self, &sc, sdl, false)
    }

    /// Parses a whole SDL document. Every declared type is registered.
    ///
    /// Extensions may precede their base declaration; directive definitions
    /// are added to the schema composer; a `schema { .. }` block is checked
    /// against the conventional root names.
    pub fn parse_types_from_string(&self, sdl: &str) -> Result<IndexMap<String, NamedTypeComposer>> {
        let sc = self.schema()?;
        sdl::build_document(self, &sc, sdl)
    }

    /// Creates an unregistered composer from a programmatic config.
    pub fn create_from_config(&self, config: TypeConfig) -> Result<NamedTypeComposer> {
        let sc = self.schema()?;
        trace!(type_name = %config.name(), "Creating type from config");
        Ok(match config {
            TypeConfig::Object(c) => ObjectTypeComposer::from_config(c, &sc)?.into(),
            TypeConfig::Input(c) => InputTypeComposer::from_config(c, &sc)?.into(),
            TypeConfig::Enum(c) => EnumTypeComposer::from_config(c, &sc)?.into(),
            TypeConfig::Scalar(c) => ScalarTypeComposer::from_config(c, &sc)?.into(),
            TypeConfig::Interface(c) => InterfaceTypeComposer::from_config(c, &sc)?.into(),
            TypeConfig::Union(c) => UnionTypeComposer::from_config(c, &sc)?.into(),
        })
    }

    /// Converts an output field definition of `type_name.field_name`.
    ///
    /// # Errors
    ///
    /// Errors carry the field (or `field(arg)`) path.
    pub fn convert_output_field_config(
        &self,
        def: FieldDefinition,
        type_name: &str,
        field_name: &str,
    ) -> Result<FieldConfig> {
        let path = format!("{type_name}.{field_name}");
        let type_def = def
            .type_
            .ok_or_else(|| ComposeError::malformed(format!("field {path} has no type")))?;
        let type_ = self
            .convert_output_type_definition(type_def)
            .map_err(|e| e.at_path(&path))?;

        let mut args = IndexMap::with_capacity(def.args.len());
        for (name, arg) in def.args {
            let config = self
                .convert_arg_config(arg)
                .map_err(|e| e.at_path(format!("{path}({name})")))?;
            args.insert(name, config);
        }

        let mut config = FieldConfig {
            type_,
            args,
            resolve: def.resolve,
            subscribe: def.subscribe,
            description: def.description,
            deprecation_reason: def.deprecation_reason,
            projection: def.projection,
            extensions: def.extensions,
            directives: def.directives,
        };
        extensions::reconcile_deprecation(&mut config.deprecation_reason, &mut config.directives);
        Ok(config)
    }

    /// Converts an argument definition.
    ///
    /// The default value is coerced to the argument type (see
    /// [`coerce`](self::coerce)), so a string default for an enum-typed
    /// argument is read as the enum value name.
    pub fn convert_arg_config(&self, def: ArgumentDefinition) -> Result<ArgumentConfig> {
        let type_def = def
            .type_
            .ok_or_else(|| ComposeError::malformed("argument has no type"))?;
        let type_ = self.convert_input_type_definition(type_def)?;

        let default_value = def
            .default_value
            .map(|default| coerce::coerce_const_value(&default, &type_))
            .transpose()
            .map_err(|e| e.at_path("default value"))?;

        let mut config = ArgumentConfig {
            type_,
            default_value,
            description: def.description,
            deprecation_reason: def.deprecation_reason,
            extensions: def.extensions,
            directives: def.directives,
        };
        extensions::reconcile_deprecation(&mut config.deprecation_reason, &mut config.directives);
        Ok(config)
    }

    /// Converts an input field definition of `type_name.field_name`.
    pub fn convert_input_field_config(
        &self,
        def: InputFieldDefinition,
        type_name: &str,
        field_name: &str,
    ) -> Result<ArgumentConfig> {
        let path = format!("{type_name}.{field_name}");
        if def.type_.is_none() {
            return Err(ComposeError::malformed(format!("input field {path} has no type")));
        }
        self.convert_arg_config(def).map_err(|e| e.at_path(path))
    }
}

/// Rejects a reference whose (already known) named type does not fit `position`.
fn check_position(reference: &TypeReference, position: Position) -> Result<()> {
    match reference.peek_named() {
        Some(tc) if !position.accepts(&tc) => Err(ComposeError::wrong_kind(format!(
            "{} `{}` cannot be used as an {} type",
            tc.kind(),
            tc.get_type_name(),
            position.label()
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use async_graphql::{Name, Value};

    use super::*;

    #[test]
    fn test_wrapped_names() {
        let sc = SchemaComposer::new();
        sc.create_object_tc("type User { id: ID }").unwrap();
        let mapper = sc.type_mapper();

        let reference = mapper.convert_output_type_definition("[User!]!").unwrap();
        assert_eq!(reference.type_string().unwrap(), "[User!]!");
        assert_eq!(reference.get_type_name().unwrap(), "User");
    }

    #[test]
    fn test_input_type_rejected_in_output_position() {
        let sc = SchemaComposer::new();
        sc.create_input_tc("input UserInput { id: ID }").unwrap();
        let mapper = sc.type_mapper();

        let err = mapper.convert_output_type_definition("UserInput").unwrap_err();
        assert_eq!(err.error_code(), "WRONG_KIND");
        assert!(mapper.convert_input_type_definition("[UserInput]").is_ok());
    }

    #[test]
    fn test_list_sugar_requires_one_element() {
        let sc = SchemaComposer::new();
        let mapper = sc.type_mapper();

        assert!(mapper.convert_output_type_definition(TypeDef::list("Int")).is_ok());
        let err = mapper
            .convert_output_type_definition(TypeDef::List(vec!["Int".into(), "String".into()]))
            .unwrap_err();
        assert_eq!(err.error_code(), "MALFORMED_DEFINITION");
        assert!(mapper.convert_output_type_definition(TypeDef::List(vec![])).is_err());
    }

    #[test]
    fn test_unknown_name() {
        let sc = SchemaComposer::new();
        let err = sc.type_mapper().convert_output_type_definition("Ghost").unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[test]
    fn test_sdl_text_cached() {
        let sc = SchemaComposer::new();
        let mapper = sc.type_mapper();
        let sdl = "type Tag { label: String }";

        let first = mapper.convert_output_type_definition(sdl).unwrap();
        let second = mapper.convert_output_type_definition(sdl).unwrap();
        assert!(first.is_same(&second));
        assert!(sc.has("Tag"));
    }

    #[test]
    fn test_thunk_defers_lookup() {
        let sc = SchemaComposer::new();
        let mapper = sc.type_mapper();
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();

        let reference = mapper
            .convert_output_type_definition(TypeDef::thunk(move || {
                counter.set(counter.get() + 1);
                Ok("Later".into())
            }))
            .unwrap();
        assert_eq!(calls.get(), 0);

        sc.create_object_tc("type Later { x: Int }").unwrap();
        assert_eq!(reference.get_type_name().unwrap(), "Later");
        assert_eq!(reference.get_type_name().unwrap(), "Later");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_enum_default_from_string() {
        let sc = SchemaComposer::new();
        sc.create_enum_tc("enum Order { ASC DESC }").unwrap();
        let config = sc
            .type_mapper()
            .convert_arg_config(ArgumentDefinition::new("Order").default_value(Value::String("ASC".to_string())))
            .unwrap();
        assert_eq!(config.default_value, Some(Value::Enum(Name::new("ASC"))));
    }

    #[test]
    fn test_list_and_input_defaults_coerced() {
        let sc = SchemaComposer::new();
        sc.add_type_defs(
            r#"
            enum Order { ASC DESC }
            input Sort { order: Order = DESC }
            type Query { items(orders: [Order] = ASC, sort: Sort = {}): [Int] }
            "#,
        )
        .unwrap();

        let query = sc.query().unwrap();
        assert_eq!(
            query.get_field_arg("items", "orders").unwrap().default_value,
            Some(Value::List(vec![Value::Enum(Name::new("ASC"))]))
        );
        assert_eq!(
            query.get_field_arg("items", "sort").unwrap().default_value,
            Some(Value::Object(IndexMap::from([(
                Name::new("order"),
                Value::Enum(Name::new("DESC"))
            )])))
        );
    }

    #[test]
    fn test_mistyped_default_rejected() {
        let sc = SchemaComposer::new();
        let err = sc
            .type_mapper()
            .convert_arg_config(ArgumentDefinition::new("Int").default_value(Value::String("ten".to_string())))
            .unwrap_err();
        assert_eq!(err.root_cause().error_code(), "MALFORMED_DEFINITION");
    }

    #[test]
    fn test_field_error_carries_path() {
        let sc = SchemaComposer::new();
        let err = sc
            .type_mapper()
            .convert_output_field_config(
                FieldDefinition::new("String").arg("by", "Ghost"),
                "Query",
                "users",
            )
            .unwrap_err();
        assert!(err.to_string().starts_with("Query.users(by):"));
    }
}
