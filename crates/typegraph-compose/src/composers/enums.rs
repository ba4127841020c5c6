use std::cell::RefCell;
use std::rc::Rc;

use async_graphql::{Value, dynamic};
use indexmap::IndexMap;

use crate::Result;
use crate::composers::{Deprecation, EnumValueConfig};
use crate::error::ComposeError;
use crate::extensions::{self, Directive, Extensions};
use crate::mapper::EnumTypeConfig;
use crate::schema::{SchemaComposer, WeakSchema};

pub(crate) struct EnumInner {
    sc: WeakSchema,
    name: String,
    description: Option<String>,
    values: IndexMap<String, EnumValueConfig>,
    extensions: Extensions,
    directives: Vec<Directive>,
}

/// Composer for an enum type. Values are addressed with the field API
/// (`get_fields`, `set_field`, ...).
#[derive(Clone)]
pub struct EnumTypeComposer {
    inner: Rc<RefCell<EnumInner>>,
}

impl_composer_common!(EnumTypeComposer);
impl_composer_factory!(EnumTypeComposer, EnumTypeConfig, Enum);

fn normalize(mut config: EnumValueConfig) -> EnumValueConfig {
    extensions::reconcile_deprecation(&mut config.deprecation_reason, &mut config.directives);
    config
}

impl EnumTypeComposer {
    pub(crate) fn from_config(config: EnumTypeConfig, sc: &SchemaComposer) -> Result<Self> {
        Ok(Self {
            inner: Rc::new(RefCell::new(EnumInner {
                sc: sc.downgrade(),
                name: config.name,
                description: config.description,
                values: config
                    .values
                    .into_iter()
                    .map(|(name, value)| (name, normalize(value)))
                    .collect(),
                extensions: config.extensions,
                directives: config.directives,
            })),
        })
    }

    pub fn get_fields(&self) -> IndexMap<String, EnumValueConfig> {
        self.inner.borrow().values.clone()
    }

    pub fn get_field_names(&self) -> Vec<String> {
        self.inner.borrow().values.keys().cloned().collect()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.inner.borrow().values.contains_key(name)
    }

    /// # Errors
    ///
    /// Returns `NotFound` if the value does not exist.
    pub fn get_field(&self, name: &str) -> Result<EnumValueConfig> {
        self.inner
            .borrow()
            .values
            .get(name)
            .cloned()
            .ok_or_else(|| ComposeError::enum_value_not_found(self.get_type_name(), name))
    }

    /// Alias of [`get_field`](Self::get_field).
    pub fn get_value_config(&self, name: &str) -> Result<EnumValueConfig> {
        self.get_field(name)
    }

    /// Replaces every value.
    pub fn set_fields<I, K>(&self, values: I) -> &Self
    where
        I: IntoIterator<Item = (K, EnumValueConfig)>,
        K: Into<String>,
    {
        let values = values
            .into_iter()
            .map(|(name, value)| (name.into(), normalize(value)))
            .collect();
        self.inner.borrow_mut().values = values;
        self
    }

    pub fn set_field(&self, name: impl Into<String>, value: EnumValueConfig) -> &Self {
        self.add_fields([(name, value)])
    }

    pub fn add_fields<I, K>(&self, values: I) -> &Self
    where
        I: IntoIterator<Item = (K, EnumValueConfig)>,
        K: Into<String>,
    {
        let mut merged = self.get_fields();
        merged.extend(values.into_iter().map(|(name, value)| (name.into(), normalize(value))));
        self.set_fields(merged)
    }

    pub fn remove_field(&self, name: &str) -> &Self {
        self.remove_fields(&[name])
    }

    pub fn remove_fields(&self, names: &[&str]) -> &Self {
        let mut values = self.get_fields();
        values.retain(|name, _| !names.contains(&name.as_str()));
        self.set_fields(values)
    }

    pub fn remove_other_fields(&self, keep: &[&str]) -> &Self {
        let mut values = self.get_fields();
        values.retain(|name, _| keep.contains(&name.as_str()));
        self.set_fields(values)
    }

    pub fn reorder_fields(&self, order: &[&str]) -> &Self {
        let values = super::fields::reorder(&self.get_fields(), order);
        self.set_fields(values)
    }

    /// Merges the set parts of `patch` into an existing value.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the value does not exist.
    pub fn extend_field(&self, name: &str, patch: EnumValueConfig) -> Result<&Self> {
        let mut current = self.get_field(name)?;
        if patch.value.is_some() {
            current.value = patch.value;
        }
        if patch.description.is_some() {
            current.description = patch.description;
        }
        if !patch.directives.is_empty() {
            extensions::set_directives(
                &mut current.deprecation_reason,
                &mut current.directives,
                patch.directives,
            );
        }
        if patch.deprecation_reason.is_some() {
            extensions::set_deprecation(
                &mut current.deprecation_reason,
                &mut current.directives,
                patch.deprecation_reason,
            );
        }
        extensions::merge_extensions(&mut current.extensions, patch.extensions);
        self.inner.borrow_mut().values.insert(name.to_string(), current);
        Ok(self)
    }

    /// Deprecates values; nothing changes if one of them is missing.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` naming the first missing value.
    pub fn deprecate_fields(&self, fields: impl Into<Deprecation>) -> Result<&Self> {
        let entries = fields.into().entries();
        if let Some((missing, _)) = entries.iter().find(|(name, _)| !self.has_field(name)) {
            return Err(ComposeError::enum_value_not_found(self.get_type_name(), missing.clone()));
        }

        let mut inner = self.inner.borrow_mut();
        for (name, reason) in entries {
            if let Some(value) = inner.values.get_mut(&name) {
                extensions::set_deprecation(&mut value.deprecation_reason, &mut value.directives, Some(reason));
            }
        }
        Ok(self)
    }

    pub fn get_field_directives(&self, name: &str) -> Result<Vec<Directive>> {
        Ok(self.get_field(name)?.directives)
    }

    pub fn set_field_directives(&self, name: &str, directives: Vec<Directive>) -> Result<&Self> {
        let mut value = self.get_field(name)?;
        extensions::set_directives(&mut value.deprecation_reason, &mut value.directives, directives);
        self.inner.borrow_mut().values.insert(name.to_string(), value);
        Ok(self)
    }

    /// Returns the value resolvers see for `name`: the configured internal
    /// value, or the name itself.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the value does not exist.
    pub fn get_internal_value(&self, name: &str) -> Result<Value> {
        let config = self.get_field(name)?;
        Ok(config.value.unwrap_or_else(|| Value::String(name.to_string())))
    }

    /// Every value name with its internal value.
    pub(crate) fn internal_values(&self) -> Vec<(String, Value)> {
        self.inner
            .borrow()
            .values
            .iter()
            .map(|(name, config)| {
                let value = config.value.clone().unwrap_or_else(|| Value::String(name.clone()));
                (name.clone(), value)
            })
            .collect()
    }

    /// Independent copy under `new_name`, not registered.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName` for an empty name or the current name.
    pub fn clone_as(&self, new_name: &str) -> Result<Self> {
        super::check_clone_name(&self.get_type_name(), new_name)?;
        let inner = self.inner.borrow();
        Ok(Self {
            inner: Rc::new(RefCell::new(EnumInner {
                sc: inner.sc.clone(),
                name: new_name.to_string(),
                description: inner.description.clone(),
                values: inner.values.clone(),
                extensions: inner.extensions.clone(),
                directives: inner.directives.clone(),
            })),
        })
    }

    pub fn get_type(&self) -> dynamic::Enum {
        let inner = self.inner.borrow();
        let mut ty = dynamic::Enum::new(inner.name.as_str());
        if let Some(description) = &inner.description {
            ty = ty.description(description.as_str());
        }
        for (name, config) in &inner.values {
            let mut item = dynamic::EnumItem::new(name.as_str());
            if let Some(description) = &config.description {
                item = item.description(description.as_str());
            }
            if let Some(reason) = &config.deprecation_reason {
                item = item.deprecation(Some(reason.as_str()));
            }
            ty = ty.item(item);
        }
        ty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color(sc: &SchemaComposer) -> EnumTypeComposer {
        EnumTypeComposer::create(
            EnumTypeConfig::new("Color")
                .value("RED")
                .value_with("GREEN", EnumValueConfig::new().value(Value::Number(2.into())))
                .value("BLUE"),
            sc,
        )
        .unwrap()
    }

    #[test]
    fn test_internal_value_defaults_to_name() {
        let sc = SchemaComposer::new();
        let tc = color(&sc);
        assert_eq!(tc.get_internal_value("RED").unwrap(), Value::String("RED".into()));
        assert_eq!(tc.get_internal_value("GREEN").unwrap(), Value::Number(2.into()));
        assert!(tc.get_internal_value("PINK").is_err());
    }

    #[test]
    fn test_deprecate_values_all_or_nothing() {
        let sc = SchemaComposer::new();
        let tc = color(&sc);

        assert!(tc.deprecate_fields(["RED", "PINK"]).is_err());
        assert!(tc.get_field("RED").unwrap().deprecation_reason.is_none());

        tc.deprecate_fields(["RED"]).unwrap();
        let red = tc.get_field("RED").unwrap();
        assert!(red.deprecation_reason.is_some());
        assert!(red.directives.iter().any(|d| d.name == "deprecated"));
    }

    #[test]
    fn test_reorder_values() {
        let sc = SchemaComposer::new();
        let tc = color(&sc);
        tc.reorder_fields(&["BLUE"]);
        assert_eq!(tc.get_field_names(), vec!["BLUE", "RED", "GREEN"]);
    }

    #[test]
    fn test_enum_from_sdl_reads_deprecated_directive() {
        let sc = SchemaComposer::new();
        let tc = EnumTypeComposer::create(
            r#"enum Status { ACTIVE OLD @deprecated(reason: "gone") }"#,
            &sc,
        )
        .unwrap();
        assert_eq!(tc.get_field("OLD").unwrap().deprecation_reason.as_deref(), Some("gone"));
    }
}
