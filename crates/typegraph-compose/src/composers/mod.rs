//! Named type composers.
//!
//! Every composer is a cheap handle (`Rc<RefCell<..>>`) around one named
//! type. Cloning the handle shares the type; use `clone_as(new_name)` for an
//! independent copy. Composers hold a weak link to their
//! [`SchemaComposer`](crate::SchemaComposer).

use std::fmt;
use std::sync::Arc;

use async_graphql::Value;
use async_graphql::dynamic;
use indexmap::IndexMap;

use crate::Result;
use crate::error::ComposeError;
use crate::extensions::{Directive, Extensions};
use crate::resolver::{Projection, ResolveFn, SubscribeFn};
use crate::schema::WeakSchema;
use crate::storage::HasTypeName;
use crate::type_ref::TypeReference;

#[macro_use]
mod macros;

pub(crate) mod fields;
mod enums;
mod input;
mod input_convert;
mod interface;
mod object;
mod relation;
mod scalar;
mod union;

pub use enums::EnumTypeComposer;
pub use fields::Deprecation;
pub use input::InputTypeComposer;
pub use interface::InterfaceTypeComposer;
pub use object::{ObjectTypeComposer, RecordIdFn};
pub use relation::{PrepareArg, RelationOptions, RelationResolver};
pub use scalar::ScalarTypeComposer;
pub use union::UnionTypeComposer;

/// Picks the concrete object type for a value of an abstract type.
pub type ResolveTypeFn = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

/// Checks whether a value belongs to a given object type.
pub type IsTypeOfFn = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// A converted output field.
#[derive(Clone)]
pub struct FieldConfig {
    pub type_: TypeReference,
    pub args: IndexMap<String, ArgumentConfig>,
    pub resolve: Option<ResolveFn>,
    pub subscribe: Option<SubscribeFn>,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
    pub projection: Option<Projection>,
    pub extensions: Extensions,
    pub directives: Vec<Directive>,
}

impl FieldConfig {
    pub fn new(type_: TypeReference) -> Self {
        Self {
            type_,
            args: IndexMap::new(),
            resolve: None,
            subscribe: None,
            description: None,
            deprecation_reason: None,
            projection: None,
            extensions: Extensions::new(),
            directives: Vec::new(),
        }
    }
}

impl fmt::Debug for FieldConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldConfig")
            .field("type_", &self.type_)
            .field("args", &self.args)
            .field("has_resolve", &self.resolve.is_some())
            .field("has_subscribe", &self.subscribe.is_some())
            .field("description", &self.description)
            .field("deprecation_reason", &self.deprecation_reason)
            .field("projection", &self.projection)
            .field("extensions", &self.extensions)
            .field("directives", &self.directives)
            .finish()
    }
}

/// A converted argument or input field.
#[derive(Debug, Clone)]
pub struct ArgumentConfig {
    pub type_: TypeReference,
    pub default_value: Option<Value>,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
    pub extensions: Extensions,
    pub directives: Vec<Directive>,
}

/// Input fields share the argument shape.
pub type InputFieldConfig = ArgumentConfig;

impl ArgumentConfig {
    pub fn new(type_: TypeReference) -> Self {
        Self {
            type_,
            default_value: None,
            description: None,
            deprecation_reason: None,
            extensions: Extensions::new(),
            directives: Vec::new(),
        }
    }
}

/// One enum value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnumValueConfig {
    /// Internal value handed to resolvers; the value's own name when unset.
    pub value: Option<Value>,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
    pub extensions: Extensions,
    pub directives: Vec<Directive>,
}

impl EnumValueConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
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
}

/// Discriminant of a [`NamedTypeComposer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerKind {
    Object,
    Input,
    Enum,
    Scalar,
    Interface,
    Union,
}

impl fmt::Display for ComposerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Object => "object",
            Self::Input => "input",
            Self::Enum => "enum",
            Self::Scalar => "scalar",
            Self::Interface => "interface",
            Self::Union => "union",
        };
        f.write_str(label)
    }
}

/// Any named type composer.
#[derive(Clone)]
pub enum NamedTypeComposer {
    Object(ObjectTypeComposer),
    Input(InputTypeComposer),
    Enum(EnumTypeComposer),
    Scalar(ScalarTypeComposer),
    Interface(InterfaceTypeComposer),
    Union(UnionTypeComposer),
}

macro_rules! each_composer {
    ($value:expr, $tc:ident => $body:expr) => {
        match $value {
            NamedTypeComposer::Object($tc) => $body,
            NamedTypeComposer::Input($tc) => $body,
            NamedTypeComposer::Enum($tc) => $body,
            NamedTypeComposer::Scalar($tc) => $body,
            NamedTypeComposer::Interface($tc) => $body,
            NamedTypeComposer::Union($tc) => $body,
        }
    };
}

impl NamedTypeComposer {
    pub fn get_type_name(&self) -> String {
        each_composer!(self, tc => tc.get_type_name())
    }

    pub fn kind(&self) -> ComposerKind {
        match self {
            Self::Object(_) => ComposerKind::Object,
            Self::Input(_) => ComposerKind::Input,
            Self::Enum(_) => ComposerKind::Enum,
            Self::Scalar(_) => ComposerKind::Scalar,
            Self::Interface(_) => ComposerKind::Interface,
            Self::Union(_) => ComposerKind::Union,
        }
    }

    /// Object, interface, union, enum and scalar types may appear in output position.
    pub fn is_output_type(&self) -> bool {
        !matches!(self, Self::Input(_))
    }

    /// Input, enum and scalar types may appear in input position.
    pub fn is_input_type(&self) -> bool {
        matches!(self, Self::Input(_) | Self::Enum(_) | Self::Scalar(_))
    }

    pub fn get_description(&self) -> Option<String> {
        each_composer!(self, tc => tc.get_description())
    }

    pub fn get_extensions(&self) -> Extensions {
        each_composer!(self, tc => tc.get_extensions())
    }

    pub fn get_directives(&self) -> Vec<Directive> {
        each_composer!(self, tc => tc.get_directives())
    }

    /// Builds the engine type for this composer.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while forcing deferred field types.
    pub fn get_type(&self) -> Result<dynamic::Type> {
        Ok(match self {
            Self::Object(tc) => tc.get_type()?.into(),
            Self::Input(tc) => tc.get_type()?.into(),
            Self::Enum(tc) => tc.get_type().into(),
            Self::Scalar(tc) => tc.get_type().into(),
            Self::Interface(tc) => tc.get_type()?.into(),
            Self::Union(tc) => tc.get_type()?.into(),
        })
    }

    /// Returns true when both handles point at the same composer.
    pub fn ptr_eq(&self, other: &NamedTypeComposer) -> bool {
        match (self, other) {
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            (Self::Input(a), Self::Input(b)) => a.ptr_eq(b),
            (Self::Enum(a), Self::Enum(b)) => a.ptr_eq(b),
            (Self::Scalar(a), Self::Scalar(b)) => a.ptr_eq(b),
            (Self::Interface(a), Self::Interface(b)) => a.ptr_eq(b),
            (Self::Union(a), Self::Union(b)) => a.ptr_eq(b),
            _ => false,
        }
    }

    pub(crate) fn weak_schema(&self) -> WeakSchema {
        each_composer!(self, tc => tc.weak_schema())
    }

    pub fn as_object(&self) -> Option<&ObjectTypeComposer> {
        match self {
            Self::Object(tc) => Some(tc),
            _ => None,
        }
    }

    pub fn as_input(&self) -> Option<&InputTypeComposer> {
        match self {
            Self::Input(tc) => Some(tc),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumTypeComposer> {
        match self {
            Self::Enum(tc) => Some(tc),
            _ => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&ScalarTypeComposer> {
        match self {
            Self::Scalar(tc) => Some(tc),
            _ => None,
        }
    }

    pub fn as_interface(&self) -> Option<&InterfaceTypeComposer> {
        match self {
            Self::Interface(tc) => Some(tc),
            _ => None,
        }
    }

    pub fn as_union(&self) -> Option<&UnionTypeComposer> {
        match self {
            Self::Union(tc) => Some(tc),
            _ => None,
        }
    }

    /// Returns the named types this one refers to, forcing deferred references.
    pub(crate) fn referenced_types(&self) -> Result<Vec<NamedTypeComposer>> {
        let mut out = Vec::new();
        match self {
            Self::Object(tc) => {
                collect_output_refs(&tc.get_fields()?, &mut out)?;
                for iface in tc.get_interfaces()? {
                    out.push(NamedTypeComposer::Interface(iface));
                }
            }
            Self::Interface(tc) => {
                collect_output_refs(&tc.get_fields()?, &mut out)?;
                for iface in tc.get_interfaces()? {
                    out.push(NamedTypeComposer::Interface(iface));
                }
            }
            Self::Input(tc) => {
                for field in tc.get_fields()?.values() {
                    out.push(field.type_.named_composer()?);
                }
            }
            Self::Union(tc) => {
                for member in tc.get_types()? {
                    out.push(NamedTypeComposer::Object(member));
                }
            }
            Self::Enum(_) | Self::Scalar(_) => {}
        }
        Ok(out)
    }
}

/// Validates the target name of a `clone_as` call.
pub(crate) fn check_clone_name(current: &str, new_name: &str) -> Result<()> {
    if new_name.is_empty() {
        return Err(ComposeError::invalid_name(format!(
            "cannot clone `{current}` without a new type name"
        )));
    }
    if new_name == current {
        return Err(ComposeError::invalid_name(format!(
            "cannot clone `{current}` under its own name"
        )));
    }
    if !crate::names::is_valid_graphql_name(new_name) {
        return Err(ComposeError::invalid_name(format!(
            "`{new_name}` is not a valid type name"
        )));
    }
    Ok(())
}

fn collect_output_refs(
    fields: &IndexMap<String, FieldConfig>,
    out: &mut Vec<NamedTypeComposer>,
) -> Result<()> {
    for field in fields.values() {
        out.push(field.type_.named_composer()?);
        for arg in field.args.values() {
            out.push(arg.type_.named_composer()?);
        }
    }
    Ok(())
}

impl fmt::Debug for NamedTypeComposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        each_composer!(self, tc => fmt::Debug::fmt(tc, f))
    }
}

impl HasTypeName for NamedTypeComposer {
    fn type_name_hint(&self) -> Option<String> {
        Some(self.get_type_name())
    }
}

impl_composer_conversions!(ObjectTypeComposer, Object);
impl_composer_conversions!(InputTypeComposer, Input);
impl_composer_conversions!(EnumTypeComposer, Enum);
impl_composer_conversions!(ScalarTypeComposer, Scalar);
impl_composer_conversions!(InterfaceTypeComposer, Interface);
impl_composer_conversions!(UnionTypeComposer, Union);
