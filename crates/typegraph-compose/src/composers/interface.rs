use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use async_graphql::dynamic;
use tracing::{trace, warn};

use crate::Result;
use crate::composers::fields::{self, FieldStore};
use crate::composers::{FieldConfig, IsTypeOfFn, ObjectTypeComposer, ResolveTypeFn};
use crate::extensions::{Directive, Extensions};
use crate::mapper::{FieldDef, InterfaceTypeConfig};
use crate::schema::{SchemaComposer, WeakSchema, runtime};
use crate::type_ref::TypeReference;

pub(crate) struct InterfaceInner {
    sc: WeakSchema,
    name: String,
    description: Option<String>,
    fields: FieldStore<FieldConfig>,
    interfaces: Vec<TypeReference>,
    resolve_type: Option<ResolveTypeFn>,
    type_resolvers: Vec<(ObjectTypeComposer, IsTypeOfFn)>,
    extensions: Extensions,
    directives: Vec<Directive>,
}

/// Composer for an interface type.
#[derive(Clone)]
pub struct InterfaceTypeComposer {
    inner: Rc<RefCell<InterfaceInner>>,
}

impl_composer_common!(InterfaceTypeComposer);
impl_composer_factory!(InterfaceTypeComposer, InterfaceTypeConfig, Interface);
impl_field_methods!(InterfaceTypeComposer, FieldConfig, FieldDef);
impl_field_args_methods!(InterfaceTypeComposer);
impl_interface_methods!(InterfaceTypeComposer);
impl_type_resolver_methods!(InterfaceTypeComposer);

impl InterfaceTypeComposer {
    pub(crate) fn from_config(config: InterfaceTypeConfig, sc: &SchemaComposer) -> Result<Self> {
        let tc = Self {
            inner: Rc::new(RefCell::new(InterfaceInner {
                sc: sc.downgrade(),
                name: config.name,
                description: config.description,
                fields: FieldStore::default(),
                interfaces: Vec::new(),
                resolve_type: config.resolve_type,
                type_resolvers: Vec::new(),
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
    /// # Errors
    ///
    /// Returns `InvalidName` for an empty name or the current name.
    pub fn clone_as(&self, new_name: &str) -> Result<Self> {
        super::check_clone_name(&self.get_type_name(), new_name)?;
        let inner = self.inner.borrow();
        Ok(Self {
            inner: Rc::new(RefCell::new(InterfaceInner {
                sc: inner.sc.clone(),
                name: new_name.to_string(),
                description: inner.description.clone(),
                fields: inner.fields.clone(),
                interfaces: inner.interfaces.clone(),
                resolve_type: inner.resolve_type.clone(),
                type_resolvers: inner.type_resolvers.clone(),
                extensions: inner.extensions.clone(),
                directives: inner.directives.clone(),
            })),
        })
    }

    /// Builds the engine type, forcing every deferred field.
    pub fn get_type(&self) -> Result<dynamic::Interface> {
        self.build_type(&HashSet::new())
    }

    pub(crate) fn build_type(&self, dead: &HashSet<String>) -> Result<dynamic::Interface> {
        let name = self.get_type_name();
        let fields = fields::materialize(self)?;
        trace!(type_name = %name, fields = fields.len(), "Building interface type");

        let mut ty = dynamic::Interface::new(name.as_str());
        if let Some(description) = self.get_description() {
            ty = ty.description(description);
        }
        for (field_name, config) in fields.iter() {
            if let Some(target) = runtime::dead_reference(config, dead)? {
                warn!(type_name = %name, field = %field_name, target = %target, "Dropping field referencing empty type");
                continue;
            }
            let field = runtime::build_interface_field(field_name, config)
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
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_graphql::Value;

    use super::*;

    #[test]
    fn test_type_resolvers_keep_insertion_order() {
        let sc = SchemaComposer::new();
        let node = sc.create_interface_tc("interface Node { id: ID! }").unwrap();
        let user = sc.create_object_tc("type User implements Node { id: ID! }").unwrap();
        let post = sc.create_object_tc("type Post implements Node { id: ID! }").unwrap();

        node.add_type_resolver(&user, |_| false);
        node.add_type_resolver(&post, |_| true);
        assert!(node.has_type_resolver("User"));

        let picked = node.pick_type(&Value::Null);
        assert_eq!(picked.as_deref(), Some("Post"));

        node.remove_type_resolver("Post");
        assert_eq!(node.pick_type(&Value::Null), None);
    }

    #[test]
    fn test_resolve_type_wins_over_type_resolvers() {
        let sc = SchemaComposer::new();
        let node = sc.create_interface_tc("interface Node { id: ID! }").unwrap();
        let user = sc.create_object_tc("type User implements Node { id: ID! }").unwrap();
        node.add_type_resolver(&user, |_| true);
        node.set_resolve_type(Arc::new(|_| Some("Admin".to_string())));

        assert_eq!(node.pick_type(&Value::Null).as_deref(), Some("Admin"));
    }
}
