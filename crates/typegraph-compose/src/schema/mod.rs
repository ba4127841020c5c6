//! The schema composer.
//!
//! A [`SchemaComposer`] owns the type registry, the type mapper and the
//! directive definitions, hands out composers and resolvers bound to it, and
//! turns the composed graph into an executable `async-graphql` schema.
//!
//! ## Building
//!
//! 1. Collect the roots, must-have types and everything they reach
//! 2. Compute which types keep at least one field (cycle-safe fixed point)
//! 3. Build engine types, dropping fields that point at empty types
//! 4. Register everything with `dynamic::Schema::build`

mod build;
mod directives;
pub(crate) mod runtime;

pub use build::{BuildOptions, SchemaConfig};
pub use directives::{BUILTIN_DIRECTIVES, DirectiveDefinition, location_name};

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use tracing::debug;

use crate::Result;
use crate::composers::{
    EnumTypeComposer, InputTypeComposer, InterfaceTypeComposer, NamedTypeComposer,
    ObjectTypeComposer, ScalarTypeComposer, UnionTypeComposer,
};
use crate::config::ComposerConfig;
use crate::error::ComposeError;
use crate::mapper::{
    ComposerDef, EnumTypeConfig, FieldPatch, InputTypeConfig, InterfaceTypeConfig,
    ObjectTypeConfig, ScalarTypeConfig, TypeMapper, UnionTypeConfig,
};
use crate::names;
use crate::resolver::{ResolveFn, Resolver, ResolverDefinition};
use crate::storage::TypeStorage;

pub(crate) struct SchemaInner {
    registry: RefCell<TypeStorage<NamedTypeComposer>>,
    sdl_cache: RefCell<HashMap<String, NamedTypeComposer>>,
    placeholders: RefCell<HashSet<String>>,
    must_have: RefCell<IndexMap<String, NamedTypeComposer>>,
    directives: RefCell<IndexMap<String, DirectiveDefinition>>,
    config: RefCell<ComposerConfig>,
    mapper: TypeMapper,
}

/// Owner of a type graph.
///
/// Cloning the handle shares the registry.
#[derive(Clone)]
pub struct SchemaComposer {
    inner: Rc<SchemaInner>,
}

/// Non-owning link from composers, resolvers and deferred references back to
/// their schema composer.
#[derive(Clone)]
pub(crate) struct WeakSchema(Weak<SchemaInner>);

impl WeakSchema {
    /// # Errors
    ///
    /// Returns `Ownership` if the schema composer was dropped.
    pub(crate) fn upgrade(&self) -> Result<SchemaComposer> {
        self.0
            .upgrade()
            .map(|inner| SchemaComposer { inner })
            .ok_or_else(|| ComposeError::ownership("schema composer was dropped"))
    }
}

impl Default for SchemaComposer {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaComposer {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ComposerConfig::default())
    }

    #[must_use]
    pub fn with_config(config: ComposerConfig) -> Self {
        let inner = Rc::new_cyclic(|weak: &Weak<SchemaInner>| {
            let sc = WeakSchema(weak.clone());
            let directives = directives::builtin_directives(&sc)
                .into_iter()
                .map(|d| (d.name.clone(), d))
                .collect();
            SchemaInner {
                registry: RefCell::new(TypeStorage::new()),
                sdl_cache: RefCell::new(HashMap::new()),
                placeholders: RefCell::new(HashSet::new()),
                must_have: RefCell::new(IndexMap::new()),
                directives: RefCell::new(directives),
                config: RefCell::new(config),
                mapper: TypeMapper::new(sc),
            }
        });
        Self { inner }
    }

    pub(crate) fn downgrade(&self) -> WeakSchema {
        WeakSchema(Rc::downgrade(&self.inner))
    }

    /// Returns true when both handles share one registry.
    pub fn ptr_eq(&self, other: &SchemaComposer) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn config(&self) -> ComposerConfig {
        self.inner.config.borrow().clone()
    }

    pub fn set_config(&self, config: ComposerConfig) -> &Self {
        *self.inner.config.borrow_mut() = config;
        self
    }

    /// Converter from the accepted definition shapes into composers and references.
    pub fn type_mapper(&self) -> &TypeMapper {
        &self.inner.mapper
    }

    // Registry

    /// # Errors
    ///
    /// Returns `NotFound` if no type is registered under `name`.
    pub fn get(&self, name: &str) -> Result<NamedTypeComposer> {
        self.inner.registry.borrow().get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.inner.registry.borrow().has(name)
    }

    /// Registers `tc` under `name`, replacing any previous entry.
    pub fn set(&self, name: impl Into<String>, tc: impl Into<NamedTypeComposer>) -> &Self {
        self.inner.registry.borrow_mut().set(name, tc.into());
        self
    }

    /// Registers `tc` under its own type name and returns that name.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName` if the type name is not a valid GraphQL name.
    pub fn add(&self, tc: impl Into<NamedTypeComposer>) -> Result<String> {
        let tc = tc.into();
        let name = tc.get_type_name();
        if !names::is_valid_graphql_name(&name) {
            return Err(ComposeError::invalid_name(format!(
                "cannot register type with name `{name}`"
            )));
        }
        self.inner
            .registry
            .borrow_mut()
            .add(tc)
            .ok_or_else(|| ComposeError::invalid_name(format!("cannot register type `{name}`")))
    }

    /// Returns the registered type, or registers `tc` under `name`.
    pub fn get_or_set(&self, name: &str, tc: impl Into<NamedTypeComposer>) -> NamedTypeComposer {
        self.inner.registry.borrow_mut().get_or_set(name, tc.into())
    }

    /// Returns the registered type; on a miss calls `make` once and registers
    /// what it produced. A `None` leaves the miss in place.
    pub fn get_or_set_with<F>(&self, name: &str, make: F) -> Option<NamedTypeComposer>
    where
        F: FnOnce() -> Option<NamedTypeComposer>,
    {
        if let Ok(existing) = self.get(name) {
            return Some(existing);
        }
        let tc = make()?;
        self.set(name, tc.clone());
        Some(tc)
    }

    pub fn delete(&self, name: &str) -> Option<NamedTypeComposer> {
        let removed = self.inner.registry.borrow_mut().delete(name);
        self.inner.must_have.borrow_mut().shift_remove(name);
        removed
    }

    pub fn keys(&self) -> Vec<String> {
        self.inner.registry.borrow().keys().cloned().collect()
    }

    pub fn values(&self) -> Vec<NamedTypeComposer> {
        self.inner.registry.borrow().values().cloned().collect()
    }

    pub fn entries(&self) -> Vec<(String, NamedTypeComposer)> {
        self.inner
            .registry
            .borrow()
            .entries()
            .map(|(name, tc)| (name.clone(), tc.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.registry.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.registry.borrow().is_empty()
    }

    /// Forgets every type, cached SDL text, must-have type and custom directive.
    pub fn clear(&self) -> &Self {
        self.inner.registry.borrow_mut().clear();
        self.inner.sdl_cache.borrow_mut().clear();
        self.inner.placeholders.borrow_mut().clear();
        self.inner.must_have.borrow_mut().clear();
        self.inner
            .directives
            .borrow_mut()
            .retain(|_, d| d.is_builtin());
        debug!("Cleared schema composer");
        self
    }

    /// Registered type or a built-in scalar, synthesized and registered on
    /// first use.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for any other name.
    pub fn get_any_tc(&self, name: &str) -> Result<NamedTypeComposer> {
        if let Ok(tc) = self.get(name) {
            return Ok(tc);
        }
        let Some(description) = names::builtin_scalar_description(name) else {
            return Err(ComposeError::type_not_found(name));
        };
        let tc = ScalarTypeComposer::create(ScalarTypeConfig::new(name).description(description), self)?;
        Ok(NamedTypeComposer::Scalar(tc))
    }

    // Typed lookups

    /// # Errors
    ///
    /// Returns `NotFound` if missing and `WrongKind` if `name` is not an object type.
    pub fn get_otc(&self, name: &str) -> Result<ObjectTypeComposer> {
        match self.get(name)? {
            NamedTypeComposer::Object(tc) => Ok(tc),
            other => Err(wrong_kind(name, "object", &other)),
        }
    }

    pub fn get_itc(&self, name: &str) -> Result<InputTypeComposer> {
        match self.get(name)? {
            NamedTypeComposer::Input(tc) => Ok(tc),
            other => Err(wrong_kind(name, "input", &other)),
        }
    }

    pub fn get_etc(&self, name: &str) -> Result<EnumTypeComposer> {
        match self.get(name)? {
            NamedTypeComposer::Enum(tc) => Ok(tc),
            other => Err(wrong_kind(name, "enum", &other)),
        }
    }

    pub fn get_stc(&self, name: &str) -> Result<ScalarTypeComposer> {
        match self.get_any_tc(name)? {
            NamedTypeComposer::Scalar(tc) => Ok(tc),
            other => Err(wrong_kind(name, "scalar", &other)),
        }
    }

    pub fn get_iftc(&self, name: &str) -> Result<InterfaceTypeComposer> {
        match self.get(name)? {
            NamedTypeComposer::Interface(tc) => Ok(tc),
            other => Err(wrong_kind(name, "interface", &other)),
        }
    }

    pub fn get_utc(&self, name: &str) -> Result<UnionTypeComposer> {
        match self.get(name)? {
            NamedTypeComposer::Union(tc) => Ok(tc),
            other => Err(wrong_kind(name, "union", &other)),
        }
    }

    // Factories

    /// Creates and registers an object type from a name, SDL text or config.
    ///
    /// # Errors
    ///
    /// Returns `MalformedDefinition` for unparsable SDL and `WrongKind` if the
    /// SDL declares another kind of type.
    pub fn create_object_tc(
        &self,
        def: impl Into<ComposerDef<ObjectTypeConfig>>,
    ) -> Result<ObjectTypeComposer> {
        ObjectTypeComposer::create(def, self)
    }

    pub fn create_input_tc(&self, def: impl Into<ComposerDef<InputTypeConfig>>) -> Result<InputTypeComposer> {
        InputTypeComposer::create(def, self)
    }

    pub fn create_enum_tc(&self, def: impl Into<ComposerDef<EnumTypeConfig>>) -> Result<EnumTypeComposer> {
        EnumTypeComposer::create(def, self)
    }

    pub fn create_scalar_tc(
        &self,
        def: impl Into<ComposerDef<ScalarTypeConfig>>,
    ) -> Result<ScalarTypeComposer> {
        ScalarTypeComposer::create(def, self)
    }

    pub fn create_interface_tc(
        &self,
        def: impl Into<ComposerDef<InterfaceTypeConfig>>,
    ) -> Result<InterfaceTypeComposer> {
        InterfaceTypeComposer::create(def, self)
    }

    pub fn create_union_tc(&self, def: impl Into<ComposerDef<UnionTypeConfig>>) -> Result<UnionTypeComposer> {
        UnionTypeComposer::create(def, self)
    }

    /// Returns the object type `name`, creating an empty one on a miss.
    ///
    /// # Errors
    ///
    /// Returns `WrongKind` if `name` is registered as another kind of type.
    pub fn get_or_create_otc(&self, name: &str) -> Result<ObjectTypeComposer> {
        if self.has(name) {
            return self.get_otc(name);
        }
        self.create_object_tc(ObjectTypeConfig::new(name))
    }

    pub fn get_or_create_itc(&self, name: &str) -> Result<InputTypeComposer> {
        if self.has(name) {
            return self.get_itc(name);
        }
        self.create_input_tc(InputTypeConfig::new(name))
    }

    pub fn get_or_create_etc(&self, name: &str) -> Result<EnumTypeComposer> {
        if self.has(name) {
            return self.get_etc(name);
        }
        self.create_enum_tc(EnumTypeConfig::new(name))
    }

    pub fn get_or_create_stc(&self, name: &str) -> Result<ScalarTypeComposer> {
        if self.has(name) || names::builtin_scalar_description(name).is_some() {
            return self.get_stc(name);
        }
        self.create_scalar_tc(ScalarTypeConfig::new(name))
    }

    pub fn get_or_create_iftc(&self, name: &str) -> Result<InterfaceTypeComposer> {
        if self.has(name) {
            return self.get_iftc(name);
        }
        self.create_interface_tc(InterfaceTypeConfig::new(name))
    }

    pub fn get_or_create_utc(&self, name: &str) -> Result<UnionTypeComposer> {
        if self.has(name) {
            return self.get_utc(name);
        }
        self.create_union_tc(UnionTypeConfig::new(name))
    }

    /// Creates and registers a type of any kind from SDL text. A bare name
    /// returns the registered type or built-in scalar.
    ///
    /// # Errors
    ///
    /// Returns `MalformedDefinition` unless the text declares exactly one type.
    pub fn create_tc(&self, sdl: &str) -> Result<NamedTypeComposer> {
        if names::is_valid_graphql_name(sdl) {
            return self.get_any_tc(sdl);
        }
        let tc = self.type_mapper().build_sdl_type(sdl)?;
        self.add(tc.clone())?;
        Ok(tc)
    }

    /// Registers every declaration of an SDL document and returns the
    /// declared types by name. Extensions may precede their base type; root
    /// types merge into already registered ones.
    ///
    /// # Errors
    ///
    /// Returns `MalformedDefinition` for unparsable SDL or invalid directive
    /// arguments, and `WrongKind` when a declaration conflicts with an
    /// existing type of another kind.
    pub fn add_type_defs(&self, sdl: &str) -> Result<IndexMap<String, NamedTypeComposer>> {
        let types = self.type_mapper().parse_types_from_string(sdl)?;
        debug!(types = types.len(), "Added type definitions");
        Ok(types)
    }

    /// Installs resolve functions on existing fields: `type -> field -> resolve`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for a missing type or field, without installing
    /// anything. Returns `WrongKind` if a type is not an object type.
    pub fn add_resolve_methods<I, T>(&self, methods: I) -> Result<&Self>
    where
        I: IntoIterator<Item = (T, IndexMap<String, ResolveFn>)>,
        T: Into<String>,
    {
        let mut targets = Vec::new();
        for (type_name, fields) in methods {
            let type_name = type_name.into();
            let otc = self.get_otc(&type_name)?;
            for field in fields.keys() {
                if !otc.has_field(field) {
                    return Err(ComposeError::field_not_found(&type_name, field));
                }
            }
            targets.push((otc, fields));
        }
        for (otc, fields) in targets {
            for (field, resolve) in fields {
                otc.extend_field(&field, FieldPatch::new().resolve(resolve))?;
            }
        }
        Ok(self)
    }

    /// Creates a resolver owned by this schema composer.
    ///
    /// # Errors
    ///
    /// Returns the error raised while converting the type or arguments.
    pub fn create_resolver(&self, def: ResolverDefinition) -> Result<Resolver> {
        Resolver::new(def, self)
    }

    // Roots

    /// The `Query` root, created on first access.
    ///
    /// # Errors
    ///
    /// Returns `WrongKind` if `Query` is registered as another kind of type.
    pub fn query(&self) -> Result<ObjectTypeComposer> {
        self.get_or_create_otc(names::QUERY)
    }

    pub fn mutation(&self) -> Result<ObjectTypeComposer> {
        self.get_or_create_otc(names::MUTATION)
    }

    pub fn subscription(&self) -> Result<ObjectTypeComposer> {
        self.get_or_create_otc(names::SUBSCRIPTION)
    }

    /// Emits `tc` in every built schema, even when nothing references it.
    pub fn add_schema_must_have_type(&self, tc: impl Into<NamedTypeComposer>) -> &Self {
        let tc = tc.into();
        self.inner.must_have.borrow_mut().insert(tc.get_type_name(), tc);
        self
    }

    pub fn get_schema_must_have_types(&self) -> Vec<NamedTypeComposer> {
        self.inner.must_have.borrow().values().cloned().collect()
    }

    pub fn remove_schema_must_have_type(&self, name: &str) -> &Self {
        self.inner.must_have.borrow_mut().shift_remove(name);
        self
    }

    // Directives

    /// Adds or replaces a directive definition.
    pub fn add_directive(&self, directive: DirectiveDefinition) -> &Self {
        self.inner
            .directives
            .borrow_mut()
            .insert(directive.name.clone(), directive);
        self
    }

    pub fn get_directive(&self, name: &str) -> Option<DirectiveDefinition> {
        self.inner.directives.borrow().get(name).cloned()
    }

    pub fn has_directive(&self, name: &str) -> bool {
        self.inner.directives.borrow().contains_key(name)
    }

    pub fn remove_directive(&self, name: &str) -> &Self {
        self.inner.directives.borrow_mut().shift_remove(name);
        self
    }

    pub fn get_directives(&self) -> Vec<DirectiveDefinition> {
        self.inner.directives.borrow().values().cloned().collect()
    }

    // Type mapper bookkeeping

    pub(crate) fn cached_sdl_type(&self, sdl: &str) -> Option<NamedTypeComposer> {
        self.inner.sdl_cache.borrow().get(sdl).cloned()
    }

    pub(crate) fn cache_sdl_type(&self, sdl: &str, tc: NamedTypeComposer) {
        self.inner.sdl_cache.borrow_mut().insert(sdl.to_string(), tc);
    }

    /// Marks `name` as created by an extension that arrived before its base type.
    pub(crate) fn mark_placeholder(&self, name: &str) {
        self.inner.placeholders.borrow_mut().insert(name.to_string());
    }

    /// Consumes the placeholder mark of `name`.
    pub(crate) fn take_placeholder(&self, name: &str) -> bool {
        self.inner.placeholders.borrow_mut().remove(name)
    }
}

fn wrong_kind(name: &str, expected: &str, found: &NamedTypeComposer) -> ComposeError {
    ComposeError::wrong_kind(format!(
        "type `{name}` is {} type, expected {expected} type",
        found.kind()
    ))
}

impl fmt::Debug for SchemaComposer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaComposer")
            .field("types", &self.keys())
            .field(
                "directives",
                &self.inner.directives.borrow().keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}
