//! Raw type and field definitions accepted at the API boundary.
//!
//! These are converted once, by the [`TypeMapper`](super::TypeMapper), into
//! [`TypeReference`]s and field configs. Nothing past the mapper branches on
//! the shape a definition was written in.

use std::rc::Rc;

use async_graphql::Value;
use indexmap::IndexMap;

use crate::Result;
use crate::composers::{
    ArgumentConfig, EnumValueConfig, FieldConfig, IsTypeOfFn, NamedTypeComposer, ResolveTypeFn,
};
use crate::extensions::{Directive, Extensions};
use crate::resolver::{Projection, ResolveFn, Resolver, SubscribeFn};
use crate::type_ref::TypeReference;

/// A type written in any of the accepted shapes.
#[derive(Clone)]
pub enum TypeDef {
    /// An existing composer or reference, passed through.
    Ref(TypeReference),
    /// A type name (`User`), wrapped name (`[User!]!`) or a full SDL declaration.
    Text(String),
    /// List sugar; must hold exactly one element.
    List(Vec<TypeDef>),
    /// Deferred definition, evaluated on first use.
    Thunk(Rc<dyn Fn() -> Result<TypeDef>>),
    /// Programmatic config creating a new, unregistered type.
    Config(Box<TypeConfig>),
}

impl TypeDef {
    pub fn thunk<F>(f: F) -> Self
    where
        F: Fn() -> Result<TypeDef> + 'static,
    {
        Self::Thunk(Rc::new(f))
    }

    pub fn list(inner: impl Into<TypeDef>) -> Self {
        Self::List(vec![inner.into()])
    }
}

impl From<&str> for TypeDef {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for TypeDef {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<TypeReference> for TypeDef {
    fn from(reference: TypeReference) -> Self {
        Self::Ref(reference)
    }
}

impl From<NamedTypeComposer> for TypeDef {
    fn from(tc: NamedTypeComposer) -> Self {
        Self::Ref(TypeReference::Named(tc))
    }
}

impl From<TypeConfig> for TypeDef {
    fn from(config: TypeConfig) -> Self {
        Self::Config(Box::new(config))
    }
}

/// Programmatic configs for every composer kind.
#[derive(Clone)]
pub enum TypeConfig {
    Object(ObjectTypeConfig),
    Input(InputTypeConfig),
    Enum(EnumTypeConfig),
    Scalar(ScalarTypeConfig),
    Interface(InterfaceTypeConfig),
    Union(UnionTypeConfig),
}

impl TypeConfig {
    pub fn name(&self) -> &str {
        match self {
            Self::Object(c) => &c.name,
            Self::Input(c) => &c.name,
            Self::Enum(c) => &c.name,
            Self::Scalar(c) => &c.name,
            Self::Interface(c) => &c.name,
            Self::Union(c) => &c.name,
        }
    }
}

/// A field whose definition is produced on first read.
pub type FieldThunk = Rc<dyn Fn() -> Result<FieldDefinition>>;

/// An input field whose definition is produced on first read.
pub type InputFieldThunk = Rc<dyn Fn() -> Result<InputFieldDefinition>>;

/// An output field in any accepted shape.
#[derive(Clone)]
pub enum FieldDef {
    Definition(FieldDefinition),
    Thunk(FieldThunk),
    /// Uses the resolver's field config.
    Resolver(Resolver),
}

impl FieldDef {
    pub fn thunk<F>(f: F) -> Self
    where
        F: Fn() -> Result<FieldDefinition> + 'static,
    {
        Self::Thunk(Rc::new(f))
    }
}

/// An input field in any accepted shape.
#[derive(Clone)]
pub enum InputFieldDef {
    Definition(InputFieldDefinition),
    Thunk(InputFieldThunk),
}

impl InputFieldDef {
    pub fn thunk<F>(f: F) -> Self
    where
        F: Fn() -> Result<InputFieldDefinition> + 'static,
    {
        Self::Thunk(Rc::new(f))
    }
}

/// Unconverted output field.
#[derive(Clone, Default)]
pub struct FieldDefinition {
    pub type_: Option<TypeDef>,
    pub args: IndexMap<String, ArgumentDefinition>,
    pub resolve: Option<ResolveFn>,
    pub subscribe: Option<SubscribeFn>,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
    pub projection: Option<Projection>,
    pub extensions: Extensions,
    pub directives: Vec<Directive>,
}

impl FieldDefinition {
    pub fn new(type_: impl Into<TypeDef>) -> Self {
        Self {
            type_: Some(type_.into()),
            ..Default::default()
        }
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

    #[must_use]
    pub fn directive(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }
}

impl From<FieldConfig> for FieldDefinition {
    fn from(config: FieldConfig) -> Self {
        Self {
            type_: Some(TypeDef::Ref(config.type_)),
            args: config
                .args
                .into_iter()
                .map(|(name, arg)| (name, ArgumentDefinition::from(arg)))
                .collect(),
            resolve: config.resolve,
            subscribe: config.subscribe,
            description: config.description,
            deprecation_reason: config.deprecation_reason,
            projection: config.projection,
            extensions: config.extensions,
            directives: config.directives,
        }
    }
}

/// Unconverted argument or input field.
#[derive(Clone, Default)]
pub struct ArgumentDefinition {
    pub type_: Option<TypeDef>,
    pub default_value: Option<Value>,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
    pub extensions: Extensions,
    pub directives: Vec<Directive>,
}

/// Input fields share the argument shape.
pub type InputFieldDefinition = ArgumentDefinition;

impl ArgumentDefinition {
    pub fn new(type_: impl Into<TypeDef>) -> Self {
        Self {
            type_: Some(type_.into()),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
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
    pub fn directive(mut self, directive: Directive) -> Self {
        self.directives.push(directive);
        self
    }
}

impl From<ArgumentConfig> for ArgumentDefinition {
    fn from(config: ArgumentConfig) -> Self {
        Self {
            type_: Some(TypeDef::Ref(config.type_)),
            default_value: config.default_value,
            description: config.description,
            deprecation_reason: config.deprecation_reason,
            extensions: config.extensions,
            directives: config.directives,
        }
    }
}

macro_rules! type_shorthand_conversions {
    ($($target:ty),* $(,)?) => {
        $(
            impl From<&str> for $target {
                fn from(text: &str) -> Self {
                    Self::new(text)
                }
            }

            impl From<String> for $target {
                fn from(text: String) -> Self {
                    Self::new(text)
                }
            }

            impl From<TypeReference> for $target {
                fn from(reference: TypeReference) -> Self {
                    Self::new(reference)
                }
            }

            impl From<NamedTypeComposer> for $target {
                fn from(tc: NamedTypeComposer) -> Self {
                    Self::new(tc)
                }
            }

            impl From<TypeDef> for $target {
                fn from(type_: TypeDef) -> Self {
                    Self::new(type_)
                }
            }
        )*
    };
}

type_shorthand_conversions!(FieldDefinition, ArgumentDefinition);

macro_rules! definition_conversions {
    ($target:ty => $definition:ty: $($source:ty),* $(,)?) => {
        $(
            impl From<$source> for $target {
                fn from(def: $source) -> Self {
                    Self::Definition(<$definition>::from(def))
                }
            }
        )*
    };
}

definition_conversions!(FieldDef => FieldDefinition: &str, String, TypeReference, NamedTypeComposer, TypeDef, FieldConfig);
definition_conversions!(InputFieldDef => InputFieldDefinition: &str, String, TypeReference, NamedTypeComposer, TypeDef, ArgumentConfig);

impl From<FieldDefinition> for FieldDef {
    fn from(def: FieldDefinition) -> Self {
        Self::Definition(def)
    }
}

impl From<InputFieldDefinition> for InputFieldDef {
    fn from(def: InputFieldDefinition) -> Self {
        Self::Definition(def)
    }
}

impl From<Resolver> for FieldDef {
    fn from(resolver: Resolver) -> Self {
        Self::Resolver(resolver)
    }
}

/// Partial update applied by `extend_field`.
///
/// `extensions` are merged key by key; every other set member replaces the
/// current value. `args`, `resolve` and `projection` only apply to output fields.
#[derive(Clone, Default)]
pub struct FieldPatch {
    pub type_: Option<TypeDef>,
    pub args: Option<IndexMap<String, ArgumentDefinition>>,
    pub resolve: Option<ResolveFn>,
    pub description: Option<String>,
    pub deprecation_reason: Option<String>,
    pub default_value: Option<Value>,
    pub projection: Option<Projection>,
    pub extensions: Extensions,
    pub directives: Option<Vec<Directive>>,
}

impl FieldPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn type_(mut self, type_: impl Into<TypeDef>) -> Self {
        self.type_ = Some(type_.into());
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
    pub fn resolve(mut self, resolve: ResolveFn) -> Self {
        self.resolve = Some(resolve);
        self
    }

    #[must_use]
    pub fn extension(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extensions.insert(key.into(), value);
        self
    }
}

/// How a composer is created: by name / SDL text, or from a config.
#[derive(Clone)]
pub enum ComposerDef<C> {
    /// A bare type name creates an empty type; anything else is parsed as SDL.
    Text(String),
    Config(C),
}

impl<C> From<&str> for ComposerDef<C> {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl<C> From<String> for ComposerDef<C> {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

macro_rules! type_config {
    (
        $(#[$meta:meta])*
        $config:ident, $variant:ident {
            $($(#[$field_meta:meta])* $field:ident : $field_ty:ty),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Default)]
        pub struct $config {
            pub name: String,
            pub description: Option<String>,
            $($(#[$field_meta])* pub $field: $field_ty,)*
            pub extensions: Extensions,
            pub directives: Vec<Directive>,
        }

        impl $config {
            pub fn new(name: impl Into<String>) -> Self {
                Self {
                    name: name.into(),
                    ..Default::default()
                }
            }

            #[must_use]
            pub fn description(mut self, description: impl Into<String>) -> Self {
                self.description = Some(description.into());
                self
            }

            #[must_use]
            pub fn extension(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
                self.extensions.insert(key.into(), value);
                self
            }

            #[must_use]
            pub fn directive(mut self, directive: Directive) -> Self {
                self.directives.push(directive);
                self
            }
        }

        impl From<$config> for ComposerDef<$config> {
            fn from(config: $config) -> Self {
                Self::Config(config)
            }
        }

        impl From<$config> for TypeConfig {
            fn from(config: $config) -> Self {
                Self::$variant(config)
            }
        }

        impl From<$config> for TypeDef {
            fn from(config: $config) -> Self {
                Self::Config(Box::new(TypeConfig::$variant(config)))
            }
        }
    };
}

type_config!(
    /// Config for an object type.
    ObjectTypeConfig, Object {
        fields: IndexMap<String, FieldDef>,
        interfaces: Vec<TypeDef>,
        /// Tags values of abstract-typed fields as this object.
        is_type_of: Option<IsTypeOfFn>,
    }
);

type_config!(
    /// Config for an input object type.
    InputTypeConfig, Input {
        fields: IndexMap<String, InputFieldDef>,
    }
);

type_config!(
    /// Config for an enum type.
    EnumTypeConfig, Enum {
        values: IndexMap<String, EnumValueConfig>,
    }
);

type_config!(
    /// Config for a custom scalar.
    ScalarTypeConfig, Scalar {
        specified_by_url: Option<String>,
    }
);

type_config!(
    /// Config for an interface type.
    InterfaceTypeConfig, Interface {
        fields: IndexMap<String, FieldDef>,
        interfaces: Vec<TypeDef>,
        resolve_type: Option<ResolveTypeFn>,
    }
);

type_config!(
    /// Config for a union type.
    UnionTypeConfig, Union {
        types: Vec<TypeDef>,
        resolve_type: Option<ResolveTypeFn>,
    }
);

impl ObjectTypeConfig {
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, def: impl Into<FieldDef>) -> Self {
        self.fields.insert(name.into(), def.into());
        self
    }

    #[must_use]
    pub fn interface(mut self, interface: impl Into<TypeDef>) -> Self {
        self.interfaces.push(interface.into());
        self
    }
}

impl InterfaceTypeConfig {
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, def: impl Into<FieldDef>) -> Self {
        self.fields.insert(name.into(), def.into());
        self
    }

    #[must_use]
    pub fn resolve_type(mut self, resolve_type: ResolveTypeFn) -> Self {
        self.resolve_type = Some(resolve_type);
        self
    }
}

impl InputTypeConfig {
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, def: impl Into<InputFieldDef>) -> Self {
        self.fields.insert(name.into(), def.into());
        self
    }
}

impl EnumTypeConfig {
    /// Adds a value whose internal value is its own name.
    #[must_use]
    pub fn value(mut self, name: impl Into<String>) -> Self {
        self.values.insert(name.into(), EnumValueConfig::default());
        self
    }

    #[must_use]
    pub fn value_with(mut self, name: impl Into<String>, config: EnumValueConfig) -> Self {
        self.values.insert(name.into(), config);
        self
    }
}

impl ScalarTypeConfig {
    #[must_use]
    pub fn specified_by_url(mut self, url: impl Into<String>) -> Self {
        self.specified_by_url = Some(url.into());
        self
    }
}

impl UnionTypeConfig {
    #[must_use]
    pub fn member(mut self, member: impl Into<TypeDef>) -> Self {
        self.types.push(member.into());
        self
    }

    #[must_use]
    pub fn resolve_type(mut self, resolve_type: ResolveTypeFn) -> Self {
        self.resolve_type = Some(resolve_type);
        self
    }
}
