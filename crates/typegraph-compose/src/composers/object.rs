use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

use async_graphql::{Value, dynamic};
use indexmap::IndexMap;
use tracing::{trace, warn};

use crate::Result;
use crate::composers::fields::{self, FieldStore};
use crate::composers::{FieldConfig, InputTypeComposer, IsTypeOfFn, NamedTypeComposer, RelationOptions};
use crate::error::ComposeError;
use crate::extensions::{Directive, Extensions};
use crate::mapper::{FieldDef, ObjectTypeConfig};
use crate::resolver::{ResolveFn, Resolver, ResolverOverrides};
use crate::schema::{SchemaComposer, WeakSchema, runtime};
use crate::type_ref::TypeReference;

/// Extracts a record id from a value of this type.
pub type RecordIdFn = Arc<dyn Fn(&Value) -> Option<String> + Send + Sync>;

pub(crate) struct ObjectInner {
    sc: WeakSchema,
    name: String,
    description: Option<String>,
    fields: FieldStore<FieldConfig>,
    interfaces: Vec<TypeReference>,
    resolvers: IndexMap<String, Resolver>,
    relations: IndexMap<String, RelationOptions>,
    record_id_fn: Option<RecordIdFn>,
    is_type_of: Option<IsTypeOfFn>,
    pub(super) input_tc: Option<InputTypeComposer>,
    extensions: Extensions,
    directives: Vec<Directive>,
}

/// Composer for an object type, including the Query/Mutation/Subscription roots.
#[derive(Clone)]
pub struct ObjectTypeComposer {
    pub(super) inner: Rc<RefCell<ObjectInner>>,
}

impl_composer_common!(ObjectTypeComposer);
impl_composer_factory!(ObjectTypeComposer, ObjectTypeConfig, Object);
impl_field_methods!(ObjectTypeComposer, FieldConfig, FieldDef);
impl_field_args_methods!(ObjectTypeComposer);
impl_interface_methods!(ObjectTypeComposer);

impl ObjectTypeComposer {
    pub(crate) fn from_config(config: ObjectTypeConfig, sc: &SchemaComposer) -> Result<Self> {
        let tc = Self {
            inner: Rc::new(RefCell::new(ObjectInner {
                sc: sc.downgrade(),
                name: config.name,
                description: config.description,
                fields: FieldStore::default(),
                interfaces: Vec::new(),
                resolvers: IndexMap::new(),
                relations: IndexMap::new(),
                record_id_fn: None,
                is_type_of: config.is_type_of,
                input_tc: None,
                extensions: config.extensions,
                directives: config.directives,
            })),
        };
        fields::set_fields(&tc, config.fields.into_iter().collect())?;
        tc.set_interfaces(config.interfaces)?;
        Ok(tc)
    }

    /// Independent copy under `new_name`, not registered.
    ///
    /// The field map is copied shallowly (the types fields point at stay
    /// shared). Attached resolvers are cloned one by one.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName` for an empty name or the current name.
    pub fn clone_as(&self, new_name: &str) -> Result<Self> {
        super::check_clone_name(&self.get_type_name(), new_name)?;
        let inner = self.inner.borrow();
        let resolvers = inner
            .resolvers
            .iter()
            .map(|(name, resolver)| Ok((name.clone(), resolver.clone_with(ResolverOverrides::default())?)))
            .collect::<Result<IndexMap<_, _>>>()?;

        Ok(Self {
            inner: Rc::new(RefCell::new(ObjectInner {
                sc: inner.sc.clone(),
                name: new_name.to_string(),
                description: inner.description.clone(),
                fields: inner.fields.clone(),
                interfaces: inner.interfaces.clone(),
                resolvers,
                relations: inner.relations.clone(),
                record_id_fn: inner.record_id_fn.clone(),
                is_type_of: inner.is_type_of.clone(),
                input_tc: None,
                extensions: inner.extensions.clone(),
                directives: inner.directives.clone(),
            })),
        })
    }

    /// Returns the object type behind a field.
    ///
    /// # Errors
    ///
    /// Returns `WrongKind` if the field type is not an object type.
    pub fn get_field_otc(&self, name: &str) -> Result<ObjectTypeComposer> {
        match self.get_field_tc(name)? {
            NamedTypeComposer::Object(tc) => Ok(tc),
            other => Err(ComposeError::wrong_kind(format!(
                "field {}.{name} has {} type `{}`, expected an object type",
                self.get_type_name(),
                other.kind(),
                other.get_type_name()
            ))),
        }
    }

    // Resolvers

    pub fn has_resolver(&self, name: &str) -> bool {
        self.inner.borrow().resolvers.contains_key(name)
    }

    /// # Errors
    ///
    /// Returns `NotFound` if no resolver is registered under `name`.
    pub fn get_resolver(&self, name: &str) -> Result<Resolver> {
        self.inner
            .borrow()
            .resolvers
            .get(name)
            .cloned()
            .ok_or_else(|| ComposeError::resolver_not_found(self.get_type_name(), name))
    }

    pub fn get_resolvers(&self) -> IndexMap<String, Resolver> {
        self.inner.borrow().resolvers.clone()
    }

    pub fn get_resolver_names(&self) -> Vec<String> {
        self.inner.borrow().resolvers.keys().cloned().collect()
    }

    /// Registers `resolver` under `name` and stamps its display name to
    /// `<TypeName>.<ResolverName>`.
    ///
    /// # Errors
    ///
    /// Returns `Ownership` if the resolver belongs to another schema composer.
    pub fn set_resolver(&self, name: &str, resolver: Resolver) -> Result<&Self> {
        let sc = self.schema_composer()?;
        if !resolver.schema_composer()?.ptr_eq(&sc) {
            return Err(ComposeError::ownership(format!(
                "resolver `{}` was created by another schema composer than `{}`",
                resolver.get_name(),
                self.get_type_name()
            )));
        }
        resolver.set_display_name(format!("{}.{}", self.get_type_name(), resolver.get_name()));
        self.inner.borrow_mut().resolvers.insert(name.to_string(), resolver);
        Ok(self)
    }

    /// Registers `resolver` under its own name.
    pub fn add_resolver(&self, resolver: Resolver) -> Result<&Self> {
        let name = resolver.get_name();
        if name.is_empty() {
            return Err(ComposeError::malformed(format!(
                "resolver added to `{}` has no name",
                self.get_type_name()
            )));
        }
        self.set_resolver(&name, resolver)
    }

    pub fn remove_resolver(&self, name: &str) -> &Self {
        self.inner.borrow_mut().resolvers.shift_remove(name);
        self
    }

    /// Replaces resolver `name` with a wrapped derivative built by `cb`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the resolver does not exist, or the error of `cb`.
    pub fn wrap_resolver<F>(&self, name: &str, cb: F) -> Result<&Self>
    where
        F: FnOnce(Resolver) -> Result<Resolver>,
    {
        self.wrap_resolver_as(name, name, cb)
    }

    /// Wraps resolver `from` and registers the derivative as `new_name`.
    pub fn wrap_resolver_as<F>(&self, new_name: &str, from: &str, cb: F) -> Result<&Self>
    where
        F: FnOnce(Resolver) -> Result<Resolver>,
    {
        let resolver = self.get_resolver(from)?;
        let wrapped = resolver.wrap_with(ResolverOverrides::default(), |clone, _| cb(clone))?;
        self.set_resolver(new_name, wrapped)
    }

    /// Replaces the resolve function of resolver `name` with a wrapped one.
    pub fn wrap_resolver_resolve<F>(&self, name: &str, f: F) -> Result<&Self>
    where
        F: FnOnce(ResolveFn) -> ResolveFn,
    {
        let wrapped = self.get_resolver(name)?.wrap_resolve(f)?;
        self.set_resolver(name, wrapped)
    }

    // Relations

    /// Adds a field backed by a resolver (see [`RelationOptions`]).
    ///
    /// # Errors
    ///
    /// Returns `MalformedDefinition`, before touching the type, for options
    /// that combine `resolver` with `type_` or `resolve`.
    pub fn add_relation(&self, field_name: &str, options: RelationOptions) -> Result<&Self> {
        let path = format!("{}.{field_name}", self.get_type_name());
        let default_catch = self.schema_composer()?.config().relation_catch_errors;
        let def = options.clone().into_field_def(path, default_catch)?;

        fields::add_fields(self, vec![(field_name.to_string(), def)])?;
        self.inner
            .borrow_mut()
            .relations
            .insert(field_name.to_string(), options);
        Ok(self)
    }

    pub fn get_relations(&self) -> IndexMap<String, RelationOptions> {
        self.inner.borrow().relations.clone()
    }

    pub fn has_relation(&self, field_name: &str) -> bool {
        self.inner.borrow().relations.contains_key(field_name)
    }

    // Record id & abstract type tagging

    pub fn set_record_id_fn<F>(&self, f: F) -> &Self
    where
        F: Fn(&Value) -> Option<String> + Send + Sync + 'static,
    {
        self.inner.borrow_mut().record_id_fn = Some(Arc::new(f));
        self
    }

    pub fn has_record_id_fn(&self) -> bool {
        self.inner.borrow().record_id_fn.is_some()
    }

    /// Applies the record id function to `source`.
    ///
    /// # Errors
    ///
    /// Returns `MalformedDefinition` if no record id function was set.
    pub fn get_record_id(&self, source: &Value) -> Result<Option<String>> {
        let record_id_fn = self.inner.borrow().record_id_fn.clone().ok_or_else(|| {
            ComposeError::malformed(format!("type `{}` has no record id function", self.get_type_name()))
        })?;
        Ok(record_id_fn(source))
    }

    pub fn set_is_type_of<F>(&self, f: F) -> &Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.inner.borrow_mut().is_type_of = Some(Arc::new(f));
        self
    }

    pub fn get_is_type_of(&self) -> Option<IsTypeOfFn> {
        self.inner.borrow().is_type_of.clone()
    }

    // Input counterpart

    /// Returns the input counterpart `<Name>Input`, deriving and registering
    /// it on first call. See [`super::input_convert`].
    pub fn get_input_type_composer(&self) -> Result<InputTypeComposer> {
        super::input_convert::to_input_type_composer(self)
    }

    /// Alias of [`get_input_type_composer`](Self::get_input_type_composer).
    pub fn get_itc(&self) -> Result<InputTypeComposer> {
        self.get_input_type_composer()
    }

    pub fn has_input_type_composer(&self) -> bool {
        self.inner.borrow().input_tc.is_some()
    }

    pub fn remove_input_type_composer(&self) -> &Self {
        self.inner.borrow_mut().input_tc = None;
        self
    }

    // Engine type

    /// Builds the engine type, forcing every deferred field.
    pub fn get_type(&self) -> Result<dynamic::Object> {
        self.build_type(&HashSet::new())
    }

    /// Builds the engine type, leaving out fields whose type or argument
    /// types are in `dead`.
    pub(crate) fn build_type(&self, dead: &HashSet<String>) -> Result<dynamic::Object> {
        let name = self.get_type_name();
        let fields = fields::materialize(self)?;
        trace!(type_name = %name, fields = fields.len(), "Building object type");

        let mut ty = dynamic::Object::new(name.as_str());
        if let Some(description) = self.get_description() {
            ty = ty.description(description);
        }
        for (field_name, config) in fields.iter() {
            if let Some(target) = runtime::dead_reference(config, dead)? {
                warn!(type_name = %name, field = %field_name, target = %target, "Dropping field referencing empty type");
                continue;
            }
            let field = runtime::build_output_field(&name, field_name, config)
                .map_err(|e| e.at_path(format!("{name}.{field_name}")))?;
            ty = ty.field(field);
        }
        for iface in self.get_interfaces()? {
            let iface_name = iface.get_type_name();
            if !dead.contains(&iface_name) {
                ty = ty.implement(iface_name);
            }
        }
        Ok(ty)
    }

    /// Builds the subscription root from this composer's fields.
    pub(crate) fn build_subscription(&self, dead: &HashSet<String>) -> Result<dynamic::Subscription> {
        let name = self.get_type_name();
        let fields = fields::materialize(self)?;

        let mut ty = dynamic::Subscription::new(name.as_str());
        if let Some(description) = self.get_description() {
            ty = ty.description(description);
        }
        for (field_name, config) in fields.iter() {
            if let Some(target) = runtime::dead_reference(config, dead)? {
                warn!(type_name = %name, field = %field_name, target = %target, "Dropping field referencing empty type");
                continue;
            }
            let field = runtime::build_subscription_field(&name, field_name, config)
                .map_err(|e| e.at_path(format!("{name}.{field_name}")))?;
            ty = ty.field(field);
        }
        Ok(ty)
    }
}
