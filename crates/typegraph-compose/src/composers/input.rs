use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use async_graphql::dynamic;
use tracing::{trace, warn};

use crate::Result;
use crate::composers::ArgumentConfig;
use crate::composers::fields::{self, FieldStore};
use crate::extensions::{Directive, Extensions};
use crate::mapper::{InputFieldDef, InputTypeConfig};
use crate::schema::{SchemaComposer, WeakSchema, runtime};

pub(crate) struct InputInner {
    sc: WeakSchema,
    name: String,
    description: Option<String>,
    fields: FieldStore<ArgumentConfig>,
    extensions: Extensions,
    directives: Vec<Directive>,
}

/// Composer for an input object type.
#[derive(Clone)]
pub struct InputTypeComposer {
    inner: Rc<RefCell<InputInner>>,
}

impl_composer_common!(InputTypeComposer);
impl_composer_factory!(InputTypeComposer, InputTypeConfig, Input);
impl_field_methods!(InputTypeComposer, ArgumentConfig, InputFieldDef);

impl InputTypeComposer {
    pub(crate) fn from_config(config: InputTypeConfig, sc: &SchemaComposer) -> Result<Self> {
        let tc = Self {
            inner: Rc::new(RefCell::new(InputInner {
                sc: sc.downgrade(),
                name: config.name,
                description: config.description,
                fields: FieldStore::default(),
                extensions: config.extensions,
                directives: config.directives,
            })),
        };
        fields::set_fields(&tc, config.fields.into_iter().collect())?;
        Ok(tc)
    }

    /// Independent copy under `new_name`, not registered. Field configs are
    /// copied; the types they point at are shared.
    ///
    /// # Errors
    ///
    /// Returns `InvalidName` for an empty name or the current name.
    pub fn clone_as(&self, new_name: &str) -> Result<Self> {
        super::check_clone_name(&self.get_type_name(), new_name)?;
        let inner = self.inner.borrow();
        Ok(Self {
            inner: Rc::new(RefCell::new(InputInner {
                sc: inner.sc.clone(),
                name: new_name.to_string(),
                description: inner.description.clone(),
                fields: inner.fields.clone(),
                extensions: inner.extensions.clone(),
                directives: inner.directives.clone(),
            })),
        })
    }

    /// Builds the engine type, forcing every deferred field.
    pub fn get_type(&self) -> Result<dynamic::InputObject> {
        self.build_type(&HashSet::new())
    }

    /// Builds the engine type without fields whose type is in `dead`.
    pub(crate) fn build_type(&self, dead: &HashSet<String>) -> Result<dynamic::InputObject> {
        let name = self.get_type_name();
        let fields = fields::materialize(self)?;
        trace!(type_name = %name, fields = fields.len(), "Building input type");

        let mut ty = dynamic::InputObject::new(name.as_str());
        if let Some(description) = self.get_description() {
            ty = ty.description(description);
        }
        for (field_name, config) in fields.iter() {
            let target = config.type_.get_type_name()?;
            if dead.contains(&target) {
                warn!(type_name = %name, field = %field_name, target = %target, "Dropping input field of empty type");
                continue;
            }
            let value = runtime::build_input_value(field_name, config)
                .map_err(|e| e.at_path(format!("{name}.{field_name}")))?;
            ty = ty.field(value);
        }
        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::ArgumentDefinition;

    #[test]
    fn test_input_fields_from_config() {
        let sc = SchemaComposer::new();
        let itc = InputTypeComposer::create(
            InputTypeConfig::new("UserFilter")
                .field("name", "String")
                .field("age", ArgumentDefinition::new("Int").default_value(async_graphql::Value::Number(18.into()))),
            &sc,
        )
        .unwrap();

        assert_eq!(itc.get_field_names(), vec!["name", "age"]);
        assert_eq!(itc.get_field_type_name("age").unwrap(), "Int");
        assert!(itc.get_field("age").unwrap().default_value.is_some());
    }

    #[test]
    fn test_input_rejects_output_type() {
        let sc = SchemaComposer::new();
        sc.create_object_tc("User").unwrap();
        let err = InputTypeComposer::create(InputTypeConfig::new("Bad").field("user", "User"), &sc)
            .unwrap_err();
        assert_eq!(err.error_code(), "WRONG_KIND");
    }

    #[test]
    fn test_make_input_field_non_null() {
        let sc = SchemaComposer::new();
        let itc = InputTypeComposer::create("input Login { email: String, password: String }", &sc)
            .unwrap();
        itc.make_field_non_null(&["email", "missing"]).unwrap();
        assert!(itc.is_field_non_null("email").unwrap());
        assert!(!itc.is_field_non_null("password").unwrap());
    }
}
