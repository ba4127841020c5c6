//! Generic field-map operations.
//!
//! Object, interface and input composers keep their fields in a
//! [`FieldStore`]. Every mutation computes a new slot map and hands it to
//! [`FieldStore::replace`], which drops the materialized cache.

use std::rc::Rc;

use indexmap::IndexMap;
use tracing::trace;

use crate::Result;
use crate::composers::{ArgumentConfig, FieldConfig};
use crate::error::ComposeError;
use crate::extensions::{self, Directive, Extensions};
use crate::mapper::{
    ArgumentDefinition, FieldDef, FieldDefinition, FieldPatch, InputFieldDef, TypeMapper,
};
use crate::resolver::FieldConfigOptions;
use crate::schema::SchemaComposer;
use crate::type_ref::TypeReference;

/// Reason applied by [`Deprecation::Fields`].
const GENERIC_DEPRECATION_REASON: &str = "deprecated";

/// Which fields to deprecate, and why.
#[derive(Debug, Clone)]
pub enum Deprecation {
    /// Listed fields get a generic reason.
    Fields(Vec<String>),
    /// Each field gets its own reason.
    Reasons(IndexMap<String, String>),
}

impl Deprecation {
    pub(crate) fn entries(self) -> Vec<(String, String)> {
        match self {
            Self::Fields(names) => names
                .into_iter()
                .map(|name| (name, GENERIC_DEPRECATION_REASON.to_string()))
                .collect(),
            Self::Reasons(reasons) => reasons.into_iter().collect(),
        }
    }
}

impl From<&str> for Deprecation {
    fn from(name: &str) -> Self {
        Self::Fields(vec![name.to_string()])
    }
}

impl From<&[&str]> for Deprecation {
    fn from(names: &[&str]) -> Self {
        Self::Fields(names.iter().map(|n| n.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Deprecation {
    fn from(names: [&str; N]) -> Self {
        Self::Fields(names.iter().map(|n| n.to_string()).collect())
    }
}

impl From<Vec<String>> for Deprecation {
    fn from(names: Vec<String>) -> Self {
        Self::Fields(names)
    }
}

impl From<IndexMap<String, String>> for Deprecation {
    fn from(reasons: IndexMap<String, String>) -> Self {
        Self::Reasons(reasons)
    }
}

/// Common view over output field configs and input field configs.
pub(crate) trait FieldSpec: Clone + 'static {
    type Definition: Clone + 'static;

    fn type_ref(&self) -> &TypeReference;
    fn set_type_ref(&mut self, type_: TypeReference);
    fn directives(&self) -> &[Directive];
    fn extensions(&self) -> &Extensions;
    fn extensions_mut(&mut self) -> &mut Extensions;
    fn deprecation_parts(&mut self) -> (&mut Option<String>, &mut Vec<Directive>);

    fn convert(
        mapper: &TypeMapper,
        def: Self::Definition,
        owner: &str,
        field: &str,
    ) -> Result<Self>;

    fn apply_patch(
        &mut self,
        mapper: &TypeMapper,
        patch: FieldPatch,
        owner: &str,
        field: &str,
    ) -> Result<()>;
}

impl FieldSpec for FieldConfig {
    type Definition = FieldDefinition;

    fn type_ref(&self) -> &TypeReference {
        &self.type_
    }

    fn set_type_ref(&mut self, type_: TypeReference) {
        self.type_ = type_;
    }

    fn directives(&self) -> &[Directive] {
        &self.directives
    }

    fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    fn deprecation_parts(&mut self) -> (&mut Option<String>, &mut Vec<Directive>) {
        (&mut self.deprecation_reason, &mut self.directives)
    }

    fn convert(mapper: &TypeMapper, def: FieldDefinition, owner: &str, field: &str) -> Result<Self> {
        mapper.convert_output_field_config(def, owner, field)
    }

    fn apply_patch(
        &mut self,
        mapper: &TypeMapper,
        patch: FieldPatch,
        owner: &str,
        field: &str,
    ) -> Result<()> {
        let path = format!("{owner}.{field}");
        if let Some(type_) = patch.type_ {
            self.type_ = mapper
                .convert_output_type_definition(type_)
                .map_err(|e| e.at_path(&path))?;
        }
        if let Some(args) = patch.args {
            for (name, arg) in args {
                let config = mapper
                    .convert_arg_config(arg)
                    .map_err(|e| e.at_path(format!("{path}({name})")))?;
                self.args.insert(name, config);
            }
        }
        if let Some(resolve) = patch.resolve {
            self.resolve = Some(resolve);
        }
        if let Some(projection) = patch.projection {
            self.projection = Some(projection);
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        apply_common_patch(
            &mut self.deprecation_reason,
            &mut self.directives,
            &mut self.extensions,
            patch.deprecation_reason,
            patch.directives,
            patch.extensions,
        );
        Ok(())
    }
}

impl FieldSpec for ArgumentConfig {
    type Definition = ArgumentDefinition;

    fn type_ref(&self) -> &TypeReference {
        &self.type_
    }

    fn set_type_ref(&mut self, type_: TypeReference) {
        self.type_ = type_;
    }

    fn directives(&self) -> &[Directive] {
        &self.directives
    }

    fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    fn deprecation_parts(&mut self) -> (&mut Option<String>, &mut Vec<Directive>) {
        (&mut self.deprecation_reason, &mut self.directives)
    }

    fn convert(mapper: &TypeMapper, def: ArgumentDefinition, owner: &str, field: &str) -> Result<Self> {
        mapper.convert_input_field_config(def, owner, field)
    }

    fn apply_patch(
        &mut self,
        mapper: &TypeMapper,
        patch: FieldPatch,
        owner: &str,
        field: &str,
    ) -> Result<()> {
        if let Some(type_) = patch.type_ {
            self.type_ = mapper
                .convert_input_type_definition(type_)
                .map_err(|e| e.at_path(format!("{owner}.{field}")))?;
        }
        if let Some(default_value) = patch.default_value {
            self.default_value = Some(default_value);
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        apply_common_patch(
            &mut self.deprecation_reason,
            &mut self.directives,
            &mut self.extensions,
            patch.deprecation_reason,
            patch.directives,
            patch.extensions,
        );
        Ok(())
    }
}

fn apply_common_patch(
    reason_slot: &mut Option<String>,
    directives_slot: &mut Vec<Directive>,
    extensions_slot: &mut Extensions,
    reason: Option<String>,
    directives: Option<Vec<Directive>>,
    extensions: Extensions,
) {
    if let Some(directives) = directives {
        extensions::set_directives(reason_slot, directives_slot, directives);
    }
    if let Some(reason) = reason {
        extensions::set_deprecation(reason_slot, directives_slot, Some(reason));
    }
    extensions::merge_extensions(extensions_slot, extensions);
}

/// A stored field: converted, or waiting for its thunk to run.
pub(crate) enum FieldSlot<C: FieldSpec> {
    Ready(C),
    Deferred(Rc<dyn Fn() -> Result<C::Definition>>),
}

impl<C: FieldSpec> Clone for FieldSlot<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Ready(config) => Self::Ready(config.clone()),
            Self::Deferred(thunk) => Self::Deferred(thunk.clone()),
        }
    }
}

/// Field slots plus the materialized (fully forced) view derived from them.
pub(crate) struct FieldStore<C: FieldSpec> {
    slots: IndexMap<String, FieldSlot<C>>,
    materialized: Option<Rc<IndexMap<String, C>>>,
    generation: u64,
}

impl<C: FieldSpec> Default for FieldStore<C> {
    fn default() -> Self {
        Self {
            slots: IndexMap::new(),
            materialized: None,
            generation: 0,
        }
    }
}

impl<C: FieldSpec> Clone for FieldStore<C> {
    fn clone(&self) -> Self {
        Self {
            slots: self.slots.clone(),
            materialized: None,
            generation: 0,
        }
    }
}

impl<C: FieldSpec> FieldStore<C> {
    /// The single mutation primitive: swaps the slot map and drops the
    /// materialized view.
    pub(crate) fn replace(&mut self, slots: IndexMap<String, FieldSlot<C>>) {
        self.slots = slots;
        self.materialized = None;
        self.generation += 1;
    }

    pub(crate) fn slots(&self) -> &IndexMap<String, FieldSlot<C>> {
        &self.slots
    }
}

/// Composers that own a [`FieldStore`].
pub(crate) trait FieldHost {
    type Config: FieldSpec;

    /// Runs `f` with the store borrowed. `f` must not call back into the composer.
    fn with_store<R>(&self, f: impl FnOnce(&mut FieldStore<Self::Config>) -> R) -> R;
    fn host_name(&self) -> String;
    fn host_schema(&self) -> Result<SchemaComposer>;
}

/// Definitions that can be turned into a slot.
pub(crate) trait IntoSlot<C: FieldSpec> {
    fn into_slot(self, mapper: &TypeMapper, owner: &str, field: &str) -> Result<FieldSlot<C>>;
}

impl IntoSlot<FieldConfig> for FieldDef {
    fn into_slot(self, mapper: &TypeMapper, owner: &str, field: &str) -> Result<FieldSlot<FieldConfig>> {
        match self {
            FieldDef::Definition(def) => Ok(FieldSlot::Ready(FieldConfig::convert(mapper, def, owner, field)?)),
            FieldDef::Thunk(thunk) => Ok(FieldSlot::Deferred(thunk)),
            FieldDef::Resolver(resolver) => Ok(FieldSlot::Ready(
                resolver
                    .get_field_config(FieldConfigOptions::default())
                    .map_err(|e| e.at_path(format!("{owner}.{field}")))?,
            )),
        }
    }
}

impl IntoSlot<ArgumentConfig> for InputFieldDef {
    fn into_slot(
        self,
        mapper: &TypeMapper,
        owner: &str,
        field: &str,
    ) -> Result<FieldSlot<ArgumentConfig>> {
        match self {
            InputFieldDef::Definition(def) => {
                Ok(FieldSlot::Ready(ArgumentConfig::convert(mapper, def, owner, field)?))
            }
            InputFieldDef::Thunk(thunk) => Ok(FieldSlot::Deferred(thunk)),
        }
    }
}

impl<C: FieldSpec> IntoSlot<C> for FieldSlot<C> {
    fn into_slot(self, _mapper: &TypeMapper, _owner: &str, _field: &str) -> Result<FieldSlot<C>> {
        Ok(self)
    }
}

/// Forces one slot and writes the converted config back.
pub(crate) fn force_field<H: FieldHost>(host: &H, name: &str) -> Result<Option<H::Config>> {
    let slot = host.with_store(|store| store.slots.get(name).cloned());
    let thunk = match slot {
        None => return Ok(None),
        Some(FieldSlot::Ready(config)) => return Ok(Some(config)),
        Some(FieldSlot::Deferred(thunk)) => thunk,
    };

    let owner = host.host_name();
    trace!(type_name = %owner, field = %name, "Forcing deferred field");
    let def = thunk().map_err(|e| e.at_path(format!("{owner}.{name}")))?;
    let sc = host.host_schema()?;
    let config = H::Config::convert(sc.type_mapper(), def, &owner, name)?;

    host.with_store(|store| {
        if let Some(slot) = store.slots.get_mut(name)
            && let FieldSlot::Deferred(current) = slot
            && Rc::ptr_eq(current, &thunk)
        {
            *slot = FieldSlot::Ready(config.clone());
        }
    });
    Ok(Some(config))
}

/// Returns the materialized view, building it when the cache is empty.
pub(crate) fn materialize<H: FieldHost>(host: &H) -> Result<Rc<IndexMap<String, H::Config>>> {
    let (cached, names, generation) = host.with_store(|store| {
        (
            store.materialized.clone(),
            store.slots.keys().cloned().collect::<Vec<_>>(),
            store.generation,
        )
    });
    if let Some(cached) = cached {
        return Ok(cached);
    }

    let mut fields = IndexMap::with_capacity(names.len());
    for name in names {
        if let Some(config) = force_field(host, &name)? {
            fields.insert(name, config);
        }
    }

    let fields = Rc::new(fields);
    host.with_store(|store| {
        if store.generation == generation {
            store.materialized = Some(fields.clone());
        }
    });
    Ok(fields)
}

pub(crate) fn get_fields<H: FieldHost>(host: &H) -> Result<IndexMap<String, H::Config>> {
    Ok((*materialize(host)?).clone())
}

pub(crate) fn get_field_names<H: FieldHost>(host: &H) -> Vec<String> {
    host.with_store(|store| store.slots.keys().cloned().collect())
}

pub(crate) fn has_field<H: FieldHost>(host: &H, name: &str) -> bool {
    host.with_store(|store| store.slots.contains_key(name))
}

pub(crate) fn get_field<H: FieldHost>(host: &H, name: &str) -> Result<H::Config> {
    force_field(host, name)?.ok_or_else(|| ComposeError::field_not_found(host.host_name(), name))
}

fn convert_slots<H, D>(host: &H, defs: Vec<(String, D)>) -> Result<Vec<(String, FieldSlot<H::Config>)>>
where
    H: FieldHost,
    D: IntoSlot<H::Config>,
{
    let owner = host.host_name();
    let sc = host.host_schema()?;
    defs.into_iter()
        .map(|(name, def)| {
            let slot = def.into_slot(sc.type_mapper(), &owner, &name)?;
            Ok((name, slot))
        })
        .collect()
}

/// Replaces the whole map. All definitions are converted before anything is stored.
pub(crate) fn set_fields<H, D>(host: &H, defs: Vec<(String, D)>) -> Result<()>
where
    H: FieldHost,
    D: IntoSlot<H::Config>,
{
    let slots = convert_slots(host, defs)?;
    host.with_store(|store| store.replace(slots.into_iter().collect()));
    Ok(())
}

/// Adds or replaces fields; replaced fields keep their position.
pub(crate) fn add_fields<H, D>(host: &H, defs: Vec<(String, D)>) -> Result<()>
where
    H: FieldHost,
    D: IntoSlot<H::Config>,
{
    let converted = convert_slots(host, defs)?;
    host.with_store(|store| {
        let mut slots = store.slots.clone();
        slots.extend(converted);
        store.replace(slots);
    });
    Ok(())
}

pub(crate) fn remove_fields<H: FieldHost>(host: &H, names: &[&str]) {
    host.with_store(|store| {
        let mut slots = store.slots.clone();
        slots.retain(|name, _| !names.contains(&name.as_str()));
        store.replace(slots);
    });
}

pub(crate) fn remove_other_fields<H: FieldHost>(host: &H, keep: &[&str]) {
    host.with_store(|store| {
        let mut slots = store.slots.clone();
        slots.retain(|name, _| keep.contains(&name.as_str()));
        store.replace(slots);
    });
}

/// Listed names first in the given order, the rest after in their prior order.
/// Unknown names are skipped.
pub(crate) fn reorder_fields<H: FieldHost>(host: &H, order: &[&str]) {
    host.with_store(|store| {
        let slots = reorder(&store.slots, order);
        store.replace(slots);
    });
}

pub(crate) fn reorder<V: Clone>(map: &IndexMap<String, V>, order: &[&str]) -> IndexMap<String, V> {
    let mut reordered = IndexMap::with_capacity(map.len());
    for name in order {
        if let Some(value) = map.get(*name) {
            reordered.insert(name.to_string(), value.clone());
        }
    }
    for (name, value) in map {
        if !reordered.contains_key(name) {
            reordered.insert(name.clone(), value.clone());
        }
    }
    reordered
}

/// Applies `f` to one field and stores the result.
pub(crate) fn update_field<H, F>(host: &H, name: &str, f: F) -> Result<()>
where
    H: FieldHost,
    F: FnOnce(&mut H::Config) -> Result<()>,
{
    let mut config = get_field(host, name)?;
    f(&mut config)?;
    host.with_store(|store| {
        let mut slots = store.slots.clone();
        slots.insert(name.to_string(), FieldSlot::Ready(config));
        store.replace(slots);
    });
    Ok(())
}

pub(crate) fn extend_field<H: FieldHost>(host: &H, name: &str, patch: FieldPatch) -> Result<()> {
    let owner = host.host_name();
    let sc = host.host_schema()?;
    update_field(host, name, |config| {
        config.apply_patch(sc.type_mapper(), patch, &owner, name)
    })
}

/// Checks every name first; nothing changes if one is missing.
pub(crate) fn deprecate_fields<H: FieldHost>(host: &H, deprecation: Deprecation) -> Result<()> {
    let entries = deprecation.entries();
    let owner = host.host_name();

    if let Some((missing, _)) = entries.iter().find(|(name, _)| !has_field(host, name)) {
        return Err(ComposeError::field_not_found(owner, missing.clone()));
    }

    let mut updated = Vec::with_capacity(entries.len());
    for (name, reason) in entries {
        let mut config = get_field(host, &name)?;
        let (reason_slot, directives) = config.deprecation_parts();
        extensions::set_deprecation(reason_slot, directives, Some(reason));
        updated.push((name, FieldSlot::Ready(config)));
    }

    host.with_store(|store| {
        let mut slots = store.slots.clone();
        slots.extend(updated);
        store.replace(slots);
    });
    Ok(())
}

/// Rewrites the type of each listed field that exists.
pub(crate) fn map_field_types<H, F>(host: &H, names: &[&str], f: F) -> Result<()>
where
    H: FieldHost,
    F: Fn(&TypeReference) -> Result<TypeReference>,
{
    let mut updated = Vec::new();
    for name in names {
        if !has_field(host, name) {
            continue;
        }
        let mut config = get_field(host, name)?;
        let type_ = f(config.type_ref())?;
        config.set_type_ref(type_);
        updated.push((name.to_string(), FieldSlot::Ready(config)));
    }

    if !updated.is_empty() {
        host.with_store(|store| {
            let mut slots = store.slots.clone();
            slots.extend(updated);
            store.replace(slots);
        });
    }
    Ok(())
}

/// Converts argument definitions for `path` (`Type.field`).
pub(crate) fn convert_args<H, I, K, V>(
    host: &H,
    path: &str,
    args: I,
) -> Result<IndexMap<String, ArgumentConfig>>
where
    H: FieldHost,
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<ArgumentDefinition>,
{
    let sc = host.host_schema()?;
    args.into_iter()
        .map(|(name, def)| {
            let name = name.into();
            let config = sc
                .type_mapper()
                .convert_arg_config(def.into())
                .map_err(|e| e.at_path(format!("{path}({name})")))?;
            Ok((name, config))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reorder_moves_listed_first() {
        let map: IndexMap<String, u8> = [("a", 1), ("b", 2), ("c", 3), ("d", 4)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();

        let reordered = reorder(&map, &["c", "missing", "a"]);
        let keys: Vec<_> = reordered.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["c", "a", "b", "d"]);
    }

    #[test]
    fn test_deprecation_entries() {
        let entries = Deprecation::from(["a", "b"]).entries();
        assert_eq!(entries[0], ("a".to_string(), GENERIC_DEPRECATION_REASON.to_string()));

        let mut reasons = IndexMap::new();
        reasons.insert("c".to_string(), "use d".to_string());
        let entries = Deprecation::from(reasons).entries();
        assert_eq!(entries, vec![("c".to_string(), "use d".to_string())]);
    }
}
