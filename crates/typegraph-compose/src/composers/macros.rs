//! Method sets shared between composer kinds.

/// `From` conversions from a concrete composer into every definition shape.
macro_rules! impl_composer_conversions {
    ($composer:ident, $variant:ident) => {
        impl From<$composer> for $crate::composers::NamedTypeComposer {
            fn from(tc: $composer) -> Self {
                $crate::composers::NamedTypeComposer::$variant(tc)
            }
        }

        impl From<&$composer> for $crate::composers::NamedTypeComposer {
            fn from(tc: &$composer) -> Self {
                $crate::composers::NamedTypeComposer::$variant(tc.clone())
            }
        }

        impl From<$composer> for $crate::type_ref::TypeReference {
            fn from(tc: $composer) -> Self {
                Self::Named(tc.into())
            }
        }

        impl From<&$composer> for $crate::type_ref::TypeReference {
            fn from(tc: &$composer) -> Self {
                Self::Named(tc.into())
            }
        }

        impl From<$composer> for $crate::mapper::TypeDef {
            fn from(tc: $composer) -> Self {
                Self::Ref(tc.into())
            }
        }

        impl From<&$composer> for $crate::mapper::TypeDef {
            fn from(tc: &$composer) -> Self {
                Self::Ref(tc.into())
            }
        }

        impl From<$composer> for $crate::mapper::FieldDefinition {
            fn from(tc: $composer) -> Self {
                Self::new(tc)
            }
        }

        impl From<&$composer> for $crate::mapper::FieldDefinition {
            fn from(tc: &$composer) -> Self {
                Self::new(tc)
            }
        }

        impl From<$composer> for $crate::mapper::ArgumentDefinition {
            fn from(tc: $composer) -> Self {
                Self::new(tc)
            }
        }

        impl From<&$composer> for $crate::mapper::ArgumentDefinition {
            fn from(tc: &$composer) -> Self {
                Self::new(tc)
            }
        }

        impl From<$composer> for $crate::mapper::FieldDef {
            fn from(tc: $composer) -> Self {
                Self::Definition(tc.into())
            }
        }

        impl From<&$composer> for $crate::mapper::FieldDef {
            fn from(tc: &$composer) -> Self {
                Self::Definition(tc.into())
            }
        }

        impl From<$composer> for $crate::mapper::InputFieldDef {
            fn from(tc: $composer) -> Self {
                Self::Definition(tc.into())
            }
        }

        impl From<&$composer> for $crate::mapper::InputFieldDef {
            fn from(tc: &$composer) -> Self {
                Self::Definition(tc.into())
            }
        }
    };
}

/// `create` / `create_temp` from a type name, SDL text or config. The
/// composer must provide `from_config(config, sc)`.
macro_rules! impl_composer_factory {
    ($composer:ident, $config:ident, $variant:ident) => {
        impl $composer {
            /// Creates the type and registers it under its name.
            ///
            /// # Errors
            ///
            /// Returns `MalformedDefinition` for unparsable SDL and `WrongKind`
            /// if the SDL declares another kind of type.
            pub fn create(
                def: impl Into<$crate::mapper::ComposerDef<$crate::mapper::$config>>,
                sc: &$crate::SchemaComposer,
            ) -> $crate::Result<Self> {
                let tc = Self::create_temp(def, sc)?;
                sc.add(&tc)?;
                Ok(tc)
            }

            /// Creates the type without registering it.
            pub fn create_temp(
                def: impl Into<$crate::mapper::ComposerDef<$crate::mapper::$config>>,
                sc: &$crate::SchemaComposer,
            ) -> $crate::Result<Self> {
                match def.into() {
                    $crate::mapper::ComposerDef::Config(config) => Self::from_config(config, sc),
                    $crate::mapper::ComposerDef::Text(text)
                        if $crate::names::is_valid_graphql_name(&text) =>
                    {
                        Self::from_config($crate::mapper::$config::new(text), sc)
                    }
                    $crate::mapper::ComposerDef::Text(sdl) => {
                        match sc.type_mapper().build_sdl_type(&sdl)? {
                            $crate::composers::NamedTypeComposer::$variant(tc) => Ok(tc),
                            other => Err($crate::error::ComposeError::wrong_kind(format!(
                                "expected {} type definition, got {} `{}`",
                                $crate::composers::ComposerKind::$variant,
                                other.kind(),
                                other.get_type_name()
                            ))),
                        }
                    }
                }
            }
        }
    };
}

/// Name, description, extension and directive accessors. The composer's
/// inner struct must carry `sc`, `name`, `description`, `extensions` and
/// `directives`.
macro_rules! impl_composer_common {
    ($composer:ident) => {
        impl $composer {
            pub fn get_type_name(&self) -> String {
                self.inner.borrow().name.clone()
            }

            /// Renames the type. A registered type moves to the new registry key.
            ///
            /// # Errors
            ///
            /// Returns `InvalidName` for a name that is not a valid GraphQL name,
            /// or when a registered type would take a name already held by
            /// another registered type. Nothing changes on error.
            pub fn set_type_name(&self, name: &str) -> $crate::Result<&Self> {
                if !$crate::names::is_valid_graphql_name(name) {
                    return Err($crate::error::ComposeError::invalid_name(format!(
                        "`{name}` is not a valid type name"
                    )));
                }
                let sc = self.schema_composer()?;
                let this = $crate::composers::NamedTypeComposer::from(self);
                let previous = self.get_type_name();
                let registered = sc.get(&previous).is_ok_and(|existing| existing.ptr_eq(&this));
                if registered
                    && sc.get(name).is_ok_and(|existing| !existing.ptr_eq(&this))
                {
                    return Err($crate::error::ComposeError::invalid_name(format!(
                        "cannot rename `{previous}`: `{name}` is already registered"
                    )));
                }

                self.inner.borrow_mut().name = name.to_string();
                if registered {
                    sc.delete(&previous);
                    sc.add(this)?;
                }
                Ok(self)
            }

            pub fn get_description(&self) -> Option<String> {
                self.inner.borrow().description.clone()
            }

            pub fn set_description(&self, description: impl Into<String>) -> &Self {
                self.inner.borrow_mut().description = Some(description.into());
                self
            }

            /// Returns the owning schema composer.
            ///
            /// # Errors
            ///
            /// Returns `Ownership` if the schema composer was dropped.
            pub fn schema_composer(&self) -> $crate::Result<$crate::SchemaComposer> {
                self.inner.borrow().sc.upgrade()
            }

            pub(crate) fn weak_schema(&self) -> $crate::schema::WeakSchema {
                self.inner.borrow().sc.clone()
            }

            /// Returns true when both handles point at the same composer.
            pub fn ptr_eq(&self, other: &Self) -> bool {
                std::rc::Rc::ptr_eq(&self.inner, &other.inner)
            }

            /// `[Self]`.
            pub fn get_type_plural(&self) -> $crate::type_ref::TypeReference {
                $crate::type_ref::TypeReference::list(self.into())
            }

            /// `Self!`.
            pub fn get_type_non_null(&self) -> $crate::type_ref::TypeReference {
                $crate::type_ref::TypeReference::non_null(self.into())
            }

            pub fn get_extensions(&self) -> $crate::extensions::Extensions {
                self.inner.borrow().extensions.clone()
            }

            pub fn set_extensions(&self, extensions: $crate::extensions::Extensions) -> &Self {
                self.inner.borrow_mut().extensions = extensions;
                self
            }

            /// Merges `extensions` into the current bag, key by key.
            pub fn extend_extensions(&self, extensions: $crate::extensions::Extensions) -> &Self {
                $crate::extensions::merge_extensions(&mut self.inner.borrow_mut().extensions, extensions);
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

            pub fn get_directives(&self) -> Vec<$crate::extensions::Directive> {
                self.inner.borrow().directives.clone()
            }

            pub fn set_directives(&self, directives: Vec<$crate::extensions::Directive>) -> &Self {
                self.inner.borrow_mut().directives = directives;
                self
            }

            pub fn add_directive(&self, directive: $crate::extensions::Directive) -> &Self {
                self.inner.borrow_mut().directives.push(directive);
                self
            }

            pub fn get_directive_by_name(&self, name: &str) -> Option<$crate::extensions::Directive> {
                self.inner
                    .borrow()
                    .directives
                    .iter()
                    .find(|d| d.name == name)
                    .cloned()
            }

            pub fn remove_directive(&self, name: &str) -> &Self {
                self.inner.borrow_mut().directives.retain(|d| d.name != name);
                self
            }
        }

        impl std::fmt::Debug for $composer {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($composer), self.get_type_name())
            }
        }
    };
}

/// Field map accessors shared by object, interface and input composers.
/// Delegates to the generic operations in `fields`.
macro_rules! impl_field_methods {
    ($composer:ident, $config:ty, $def:ty) => {
        impl $composer {
            /// Returns every field, forcing deferred ones.
            pub fn get_fields(&self) -> $crate::Result<indexmap::IndexMap<String, $config>> {
                $crate::composers::fields::get_fields(self)
            }

            pub fn get_field_names(&self) -> Vec<String> {
                $crate::composers::fields::get_field_names(self)
            }

            pub fn has_field(&self, name: &str) -> bool {
                $crate::composers::fields::has_field(self, name)
            }

            /// Returns one field, forcing it if deferred.
            ///
            /// # Errors
            ///
            /// Returns `NotFound` if the field does not exist.
            pub fn get_field(&self, name: &str) -> $crate::Result<$config> {
                $crate::composers::fields::get_field(self, name)
            }

            /// Replaces the whole field map.
            pub fn set_fields<I, K, V>(&self, fields: I) -> $crate::Result<&Self>
            where
                I: IntoIterator<Item = (K, V)>,
                K: Into<String>,
                V: Into<$def>,
            {
                $crate::composers::fields::set_fields(
                    self,
                    fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
                )?;
                Ok(self)
            }

            /// Adds or replaces one field, keeping its position if it exists.
            pub fn set_field(&self, name: &str, def: impl Into<$def>) -> $crate::Result<&Self> {
                $crate::composers::fields::add_fields(self, vec![(name.to_string(), def.into())])?;
                Ok(self)
            }

            pub fn add_fields<I, K, V>(&self, fields: I) -> $crate::Result<&Self>
            where
                I: IntoIterator<Item = (K, V)>,
                K: Into<String>,
                V: Into<$def>,
            {
                $crate::composers::fields::add_fields(
                    self,
                    fields.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
                )?;
                Ok(self)
            }

            pub fn remove_field(&self, name: &str) -> &Self {
                $crate::composers::fields::remove_fields(self, &[name]);
                self
            }

            pub fn remove_fields(&self, names: &[&str]) -> &Self {
                $crate::composers::fields::remove_fields(self, names);
                self
            }

            /// Keeps only the listed fields.
            pub fn remove_other_fields(&self, keep: &[&str]) -> &Self {
                $crate::composers::fields::remove_other_fields(self, keep);
                self
            }

            /// Moves the listed fields to the front in the given order.
            pub fn reorder_fields(&self, order: &[&str]) -> &Self {
                $crate::composers::fields::reorder_fields(self, order);
                self
            }

            /// Merges `patch` into an existing field.
            ///
            /// # Errors
            ///
            /// Returns `NotFound` if the field does not exist.
            pub fn extend_field(
                &self,
                name: &str,
                patch: $crate::mapper::FieldPatch,
            ) -> $crate::Result<&Self> {
                $crate::composers::fields::extend_field(self, name, patch)?;
                Ok(self)
            }

            /// Deprecates fields; fails without changing anything if one is missing.
            pub fn deprecate_fields(
                &self,
                fields: impl Into<$crate::composers::Deprecation>,
            ) -> $crate::Result<&Self> {
                $crate::composers::fields::deprecate_fields(self, fields.into())?;
                Ok(self)
            }

            pub fn get_field_type(&self, name: &str) -> $crate::Result<$crate::type_ref::TypeReference> {
                Ok($crate::composers::fields::FieldSpec::type_ref(&self.get_field(name)?).clone())
            }

            pub fn get_field_type_name(&self, name: &str) -> $crate::Result<String> {
                self.get_field_type(name)?.get_type_name()
            }

            /// Returns the named composer behind a field's type.
            pub fn get_field_tc(&self, name: &str) -> $crate::Result<$crate::composers::NamedTypeComposer> {
                self.get_field_type(name)?.named_composer()
            }

            pub fn is_field_non_null(&self, name: &str) -> $crate::Result<bool> {
                self.get_field_type(name)?.is_non_null()
            }

            pub fn is_field_plural(&self, name: &str) -> $crate::Result<bool> {
                self.get_field_type(name)?.is_list()
            }

            /// Wraps the listed fields in non-null; missing names are skipped.
            pub fn make_field_non_null(&self, names: &[&str]) -> $crate::Result<&Self> {
                $crate::composers::fields::map_field_types(self, names, |t| {
                    Ok($crate::type_ref::TypeReference::non_null(t.clone()))
                })?;
                Ok(self)
            }

            /// Removes the non-null wrapper of the listed fields; missing names are skipped.
            pub fn make_field_nullable(&self, names: &[&str]) -> $crate::Result<&Self> {
                $crate::composers::fields::map_field_types(self, names, |t| t.nullable())?;
                Ok(self)
            }

            /// Wraps the listed fields in a list; missing names are skipped.
            pub fn make_field_plural(&self, names: &[&str]) -> $crate::Result<&Self> {
                $crate::composers::fields::map_field_types(self, names, |t| Ok(t.get_type_plural()))?;
                Ok(self)
            }

            /// Removes the list wrapper of the listed fields; missing names are skipped.
            pub fn make_field_non_plural(&self, names: &[&str]) -> $crate::Result<&Self> {
                $crate::composers::fields::map_field_types(self, names, |t| t.non_plural())?;
                Ok(self)
            }

            pub fn get_field_directives(&self, name: &str) -> $crate::Result<Vec<$crate::extensions::Directive>> {
                Ok($crate::composers::fields::FieldSpec::directives(&self.get_field(name)?).to_vec())
            }

            /// Replaces a field's directives; a `@deprecated` entry sets the deprecation reason.
            pub fn set_field_directives(
                &self,
                name: &str,
                directives: Vec<$crate::extensions::Directive>,
            ) -> $crate::Result<&Self> {
                $crate::composers::fields::update_field(self, name, |field| {
                    let (reason, slot) = $crate::composers::fields::FieldSpec::deprecation_parts(field);
                    $crate::extensions::set_directives(reason, slot, directives);
                    Ok(())
                })?;
                Ok(self)
            }

            pub fn get_field_extensions(&self, name: &str) -> $crate::Result<$crate::extensions::Extensions> {
                Ok($crate::composers::fields::FieldSpec::extensions(&self.get_field(name)?).clone())
            }

            pub fn set_field_extensions(
                &self,
                name: &str,
                extensions: $crate::extensions::Extensions,
            ) -> $crate::Result<&Self> {
                $crate::composers::fields::update_field(self, name, |field| {
                    *$crate::composers::fields::FieldSpec::extensions_mut(field) = extensions;
                    Ok(())
                })?;
                Ok(self)
            }

            pub fn extend_field_extensions(
                &self,
                name: &str,
                extensions: $crate::extensions::Extensions,
            ) -> $crate::Result<&Self> {
                $crate::composers::fields::update_field(self, name, |field| {
                    $crate::extensions::merge_extensions(
                        $crate::composers::fields::FieldSpec::extensions_mut(field),
                        extensions,
                    );
                    Ok(())
                })?;
                Ok(self)
            }

            pub fn remove_field_extension(&self, name: &str, key: &str) -> $crate::Result<&Self> {
                $crate::composers::fields::update_field(self, name, |field| {
                    $crate::composers::fields::FieldSpec::extensions_mut(field).shift_remove(key);
                    Ok(())
                })?;
                Ok(self)
            }
        }

        impl $crate::composers::fields::FieldHost for $composer {
            type Config = $config;

            fn with_store<R>(
                &self,
                f: impl FnOnce(&mut $crate::composers::fields::FieldStore<$config>) -> R,
            ) -> R {
                f(&mut self.inner.borrow_mut().fields)
            }

            fn host_name(&self) -> String {
                self.get_type_name()
            }

            fn host_schema(&self) -> $crate::Result<$crate::SchemaComposer> {
                self.schema_composer()
            }
        }
    };
}

/// Field argument accessors shared by object and interface composers.
macro_rules! impl_field_args_methods {
    ($composer:ident) => {
        impl $composer {
            pub fn get_field_args(
                &self,
                field: &str,
            ) -> $crate::Result<indexmap::IndexMap<String, $crate::composers::ArgumentConfig>> {
                Ok(self.get_field(field)?.args)
            }

            pub fn get_field_arg_names(&self, field: &str) -> $crate::Result<Vec<String>> {
                Ok(self.get_field(field)?.args.keys().cloned().collect())
            }

            /// # Errors
            ///
            /// Returns `NotFound` if the field or the argument does not exist.
            pub fn get_field_arg(
                &self,
                field: &str,
                arg: &str,
            ) -> $crate::Result<$crate::composers::ArgumentConfig> {
                self.get_field(field)?.args.get(arg).cloned().ok_or_else(|| {
                    $crate::error::ComposeError::arg_not_found(
                        format!("{}.{field}", self.get_type_name()),
                        arg,
                    )
                })
            }

            pub fn has_field_arg(&self, field: &str, arg: &str) -> bool {
                self.get_field(field)
                    .map(|f| f.args.contains_key(arg))
                    .unwrap_or(false)
            }

            pub fn get_field_arg_type(
                &self,
                field: &str,
                arg: &str,
            ) -> $crate::Result<$crate::type_ref::TypeReference> {
                Ok(self.get_field_arg(field, arg)?.type_)
            }

            /// Replaces every argument of a field.
            pub fn set_field_args<I, K, V>(&self, field: &str, args: I) -> $crate::Result<&Self>
            where
                I: IntoIterator<Item = (K, V)>,
                K: Into<String>,
                V: Into<$crate::mapper::ArgumentDefinition>,
            {
                let path = format!("{}.{field}", self.get_type_name());
                let converted = $crate::composers::fields::convert_args(self, &path, args)?;
                $crate::composers::fields::update_field(self, field, |config| {
                    config.args = converted;
                    Ok(())
                })?;
                Ok(self)
            }

            /// Adds or replaces arguments of a field.
            pub fn add_field_args<I, K, V>(&self, field: &str, args: I) -> $crate::Result<&Self>
            where
                I: IntoIterator<Item = (K, V)>,
                K: Into<String>,
                V: Into<$crate::mapper::ArgumentDefinition>,
            {
                let path = format!("{}.{field}", self.get_type_name());
                let converted = $crate::composers::fields::convert_args(self, &path, args)?;
                $crate::composers::fields::update_field(self, field, |config| {
                    config.args.extend(converted);
                    Ok(())
                })?;
                Ok(self)
            }

            pub fn set_field_arg(
                &self,
                field: &str,
                arg: &str,
                def: impl Into<$crate::mapper::ArgumentDefinition>,
            ) -> $crate::Result<&Self> {
                self.add_field_args(field, [(arg, def.into())])
            }

            pub fn remove_field_arg(&self, field: &str, args: &[&str]) -> $crate::Result<&Self> {
                $crate::composers::fields::update_field(self, field, |config| {
                    config.args.retain(|name, _| !args.contains(&name.as_str()));
                    Ok(())
                })?;
                Ok(self)
            }

            pub fn remove_other_field_args(&self, field: &str, keep: &[&str]) -> $crate::Result<&Self> {
                $crate::composers::fields::update_field(self, field, |config| {
                    config.args.retain(|name, _| keep.contains(&name.as_str()));
                    Ok(())
                })?;
                Ok(self)
            }
        }
    };
}

/// Implemented-interface accessors shared by object and interface composers.
/// The inner struct must carry `interfaces: Vec<TypeReference>`.
macro_rules! impl_interface_methods {
    ($composer:ident) => {
        impl $composer {
            /// Returns the implemented interfaces, forcing deferred references.
            ///
            /// # Errors
            ///
            /// Returns `WrongKind` if a reference resolves to something other
            /// than an interface.
            pub fn get_interfaces(
                &self,
            ) -> $crate::Result<Vec<$crate::composers::InterfaceTypeComposer>> {
                let refs = self.inner.borrow().interfaces.clone();
                refs.iter()
                    .map(|reference| match reference.named_composer()? {
                        $crate::composers::NamedTypeComposer::Interface(iface) => Ok(iface),
                        other => Err($crate::error::ComposeError::wrong_kind(format!(
                            "`{}` lists {} `{}` as an interface",
                            self.get_type_name(),
                            other.kind(),
                            other.get_type_name()
                        ))),
                    })
                    .collect()
            }

            pub fn get_interface_names(&self) -> Vec<String> {
                self.inner
                    .borrow()
                    .interfaces
                    .iter()
                    .filter_map(|reference| reference.get_type_name().ok())
                    .collect()
            }

            pub fn has_interface(&self, name: &str) -> bool {
                self.get_interface_names().iter().any(|n| n == name)
            }

            /// Replaces the interface list.
            pub fn set_interfaces<I, D>(&self, interfaces: I) -> $crate::Result<&Self>
            where
                I: IntoIterator<Item = D>,
                D: Into<$crate::mapper::TypeDef>,
            {
                let refs = interfaces
                    .into_iter()
                    .map(|def| self.convert_interface(def.into()))
                    .collect::<$crate::Result<Vec<_>>>()?;
                self.inner.borrow_mut().interfaces = refs;
                Ok(self)
            }

            /// Adds an interface unless one with the same name is present.
            pub fn add_interface(&self, def: impl Into<$crate::mapper::TypeDef>) -> $crate::Result<&Self> {
                let reference = self.convert_interface(def.into())?;
                if let Ok(name) = reference.get_type_name()
                    && self.has_interface(&name)
                {
                    return Ok(self);
                }
                self.inner.borrow_mut().interfaces.push(reference);
                Ok(self)
            }

            pub fn add_interfaces<I, D>(&self, interfaces: I) -> $crate::Result<&Self>
            where
                I: IntoIterator<Item = D>,
                D: Into<$crate::mapper::TypeDef>,
            {
                for def in interfaces {
                    self.add_interface(def)?;
                }
                Ok(self)
            }

            pub fn remove_interface(&self, name: &str) -> &Self {
                self.inner
                    .borrow_mut()
                    .interfaces
                    .retain(|reference| reference.get_type_name().map(|n| n != name).unwrap_or(true));
                self
            }

            fn convert_interface(
                &self,
                def: $crate::mapper::TypeDef,
            ) -> $crate::Result<$crate::type_ref::TypeReference> {
                let reference = self
                    .schema_composer()?
                    .type_mapper()
                    .convert_output_type_definition(def)?;
                match reference.peek_named() {
                    Some($crate::composers::NamedTypeComposer::Interface(_)) | None => Ok(reference),
                    Some(other) => Err($crate::error::ComposeError::wrong_kind(format!(
                        "`{}` cannot implement {} `{}`",
                        self.get_type_name(),
                        other.kind(),
                        other.get_type_name()
                    ))),
                }
            }
        }
    };
}

/// Concrete-type selection shared by interface and union composers. The inner
/// struct must carry `resolve_type: Option<ResolveTypeFn>` and
/// `type_resolvers: Vec<(ObjectTypeComposer, IsTypeOfFn)>`.
macro_rules! impl_type_resolver_methods {
    ($composer:ident) => {
        impl $composer {
            pub fn get_resolve_type(&self) -> Option<$crate::composers::ResolveTypeFn> {
                self.inner.borrow().resolve_type.clone()
            }

            pub fn set_resolve_type(&self, resolve_type: $crate::composers::ResolveTypeFn) -> &Self {
                self.inner.borrow_mut().resolve_type = Some(resolve_type);
                self
            }

            /// Registers `check` as the test for values of `otc`. Checks run in
            /// insertion order after `resolve_type`.
            pub fn add_type_resolver<F>(&self, otc: &$crate::composers::ObjectTypeComposer, check: F) -> &Self
            where
                F: Fn(&async_graphql::Value) -> bool + Send + Sync + 'static,
            {
                let name = otc.get_type_name();
                let mut inner = self.inner.borrow_mut();
                inner.type_resolvers.retain(|(tc, _)| tc.get_type_name() != name);
                inner.type_resolvers.push((otc.clone(), std::sync::Arc::new(check)));
                drop(inner);
                self
            }

            pub fn remove_type_resolver(&self, type_name: &str) -> &Self {
                self.inner
                    .borrow_mut()
                    .type_resolvers
                    .retain(|(tc, _)| tc.get_type_name() != type_name);
                self
            }

            pub fn has_type_resolver(&self, type_name: &str) -> bool {
                self.inner
                    .borrow()
                    .type_resolvers
                    .iter()
                    .any(|(tc, _)| tc.get_type_name() == type_name)
            }

            pub fn get_type_resolvers(
                &self,
            ) -> Vec<($crate::composers::ObjectTypeComposer, $crate::composers::IsTypeOfFn)> {
                self.inner.borrow().type_resolvers.clone()
            }

            pub fn clear_type_resolvers(&self) -> &Self {
                self.inner.borrow_mut().type_resolvers.clear();
                self
            }

            /// Picks the concrete type name for `value` the way field
            /// resolution does.
            pub fn pick_type(&self, value: &async_graphql::Value) -> Option<String> {
                self.abstract_shape().pick(value)
            }

            pub(crate) fn abstract_shape(&self) -> $crate::schema::runtime::AbstractShape {
                let inner = self.inner.borrow();
                $crate::schema::runtime::AbstractShape {
                    resolve_type: inner.resolve_type.clone(),
                    candidates: inner
                        .type_resolvers
                        .iter()
                        .map(|(tc, check)| (tc.get_type_name(), check.clone()))
                        .collect(),
                }
            }
        }
    };
}
